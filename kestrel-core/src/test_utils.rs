use crate::{
    compile_to_ast,
    semantic_analysis::{self, DeclId, DeclRegistry, ProgramDecls},
    Analysis, BuildConfig, CompiledProgram,
};

use kestrel_ast::{Program, StatementKind};
use kestrel_error::{error::CompileError, handler::Handler, warning::CompileWarning};

pub struct AnalyzeResult {
    pub program: Program,
    pub analysis: Analysis,
    pub dead: Vec<DeclId>,
    pub errors: Vec<CompileError>,
    pub warnings: Vec<CompileWarning>,
}

impl AnalyzeResult {
    /// Usage counter of the first free or operator function named `name`.
    pub fn usage_of_function(&self, name: &str) -> u32 {
        DeclRegistry::function_ids(&self.program)
            .find(|id| self.program.function_decl(*id).name.as_str() == name)
            .map(|id| self.analysis.decorations.function_usage(id))
            .unwrap_or_else(|| panic!("no function named {name}"))
    }
}

/// Parses and analyses `input`. Panics if it doesn't parse.
pub fn analyze(input: &str) -> AnalyzeResult {
    let handler = Handler::default();
    let compiled = compile_to_ast(&handler, input.into(), None, &BuildConfig::default());
    let (errors, warnings) = handler.consume();
    let CompiledProgram {
        program,
        analysis,
        dead,
    } = compiled.unwrap_or_else(|_| panic!("{input:?} failed to parse: {errors:?}"));
    AnalyzeResult {
        program,
        analysis,
        dead,
        errors,
        warnings,
    }
}

pub fn errors_of(input: &str) -> Vec<CompileError> {
    analyze(input).errors
}

/// Parses `input` without analysing it. Panics if it doesn't parse.
pub fn parse(input: &str) -> Program {
    let handler = Handler::default();
    kestrel_parse::parse_file(&handler, input.into(), None)
        .unwrap_or_else(|_| panic!("{input:?} failed to parse: {:?}", handler.consume().0))
}

/// Analyses a program built or rearranged by a test.
pub fn errors_of_program(program: &Program) -> Vec<CompileError> {
    let handler = Handler::default();
    semantic_analysis::analyze(&handler, program, &BuildConfig::default());
    handler.consume().0
}

/// The inferred type of the last top-level statement: an expression
/// statement, or the initialiser of a variable declaration.
pub fn type_of_last_statement(input: &str) -> String {
    let result = analyze(input);
    let statement = result
        .program
        .statements
        .last()
        .unwrap_or_else(|| panic!("{input:?} has no statements"));
    let expr = match &statement.kind {
        StatementKind::Expr(expr) => expr,
        StatementKind::VarDecl(decl) => match &decl.init {
            Some((_, init)) => init,
            None => panic!("the last declaration of {input:?} has no initialiser"),
        },
        other => panic!("unexpected last statement {other:?}"),
    };
    match result.analysis.decorations.type_of(expr.id()) {
        Some(ty) => ty.to_string(),
        None => panic!("no type recorded for `{expr}`: {:?}", result.errors),
    }
}
