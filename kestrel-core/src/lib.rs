mod build_config;
pub mod dead_code;
pub mod decoration;
pub mod semantic_analysis;
#[cfg(test)]
mod test_utils;
pub mod type_system;

pub use build_config::BuildConfig;
pub use decoration::Decorations;
pub use semantic_analysis::{analyze, Analysis, DeclId};

use kestrel_ast::Program;
use kestrel_error::handler::{ErrorEmitted, Handler};
use std::{path::PathBuf, sync::Arc};

/// A parsed and analysed program.
#[derive(Debug)]
pub struct CompiledProgram {
    pub program: Program,
    pub analysis: Analysis,
    /// Declarations that nothing uses.
    pub dead: Vec<DeclId>,
}

impl CompiledProgram {
    pub fn is_valid(&self) -> bool {
        self.analysis.is_valid()
    }
}

/// Parses `input` and analyses the resulting program.
///
/// Lexical and syntax errors stop compilation and yield `Err`. Semantic errors
/// are reported to `handler` and leave the verdict in
/// [`CompiledProgram::is_valid`].
///
/// # Example
/// ```
/// # use kestrel_core::{compile_to_ast, BuildConfig};
/// # use kestrel_error::handler::Handler;
/// let handler = Handler::default();
/// let input = "integer f(integer x) { return x * 2; } integer y := f(3);";
/// let compiled = compile_to_ast(&handler, input.into(), None, &BuildConfig::default()).unwrap();
/// assert!(compiled.is_valid());
/// ```
pub fn compile_to_ast(
    handler: &Handler,
    input: Arc<str>,
    path: Option<Arc<PathBuf>>,
    config: &BuildConfig,
) -> Result<CompiledProgram, ErrorEmitted> {
    let program = kestrel_parse::parse_file(handler, input, path)?;
    tracing::debug!(
        "parsed {} class(es), {} function(s), {} statement(s)",
        program.classes.len(),
        program.functions.len(),
        program.statements.len()
    );
    let analysis = analyze(handler, &program, config);
    let dead = dead_code::report(handler, &program, &analysis.decorations, config);
    Ok(CompiledProgram {
        program,
        analysis,
        dead,
    })
}
