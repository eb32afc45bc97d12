mod log;

use anyhow::{Context, Result};
use clap::Parser;
use kestrel_core::{compile_to_ast, BuildConfig};
use kestrel_error::{error::location_string, handler::Handler};
use kestrel_types::Spanned;
use log::{init_tracing_subscriber, println_green_err, println_red_err, println_yellow_err};
use std::{fs, path::PathBuf, process, sync::Arc};

/// Parse and check Kestrel source files.
#[derive(Debug, Parser)]
#[clap(name = "kestrelc", version)]
struct Cli {
    /// Source files, concatenated in the given order before parsing.
    #[clap(required = true)]
    files: Vec<PathBuf>,

    /// Print the syntax tree as JSON after analysis.
    #[clap(long)]
    print_tree: bool,

    /// Use verbose output: `-v` for debug, `-vv` for trace.
    #[clap(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Silence all output.
    #[clap(short, long)]
    silent: bool,

    /// Don't warn about declarations that are never used.
    #[clap(long)]
    no_dead_code_warnings: bool,
}

impl Cli {
    fn build_config(&self) -> BuildConfig {
        BuildConfig::default()
            .dead_code_warnings(!self.no_dead_code_warnings)
            .print_tree(self.print_tree)
    }

    /// The concatenated sources, and the path to report in diagnostics when
    /// there is a single file.
    fn read_sources(&self) -> Result<(Arc<str>, Option<Arc<PathBuf>>)> {
        let mut src = String::new();
        for file in &self.files {
            let contents = fs::read_to_string(file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            src.push_str(&contents);
            if !contents.ends_with('\n') {
                src.push('\n');
            }
        }
        let path = match self.files.as_slice() {
            [single] => Some(Arc::new(single.clone())),
            _ => None,
        };
        Ok((src.into(), path))
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing_subscriber(log::TracingSubscriberOptions {
        verbosity: cli.verbose,
        silent: cli.silent,
    })?;
    let valid = run(&cli)?;
    if !valid {
        process::exit(1);
    }
    Ok(())
}

/// Compiles the input files, prints the outcome and returns the verdict.
fn run(cli: &Cli) -> Result<bool> {
    let config = cli.build_config();
    let (src, path) = cli.read_sources()?;
    let handler = Handler::default();
    let compiled = compile_to_ast(&handler, src, path, &config);
    let (errors, warnings) = handler.consume();

    for warning in &warnings {
        println_yellow_err(&format!(
            "{}: warning: {}",
            location_string(&warning.span()),
            warning.to_friendly_warning_string()
        ));
    }
    for error in &errors {
        println_red_err(&format!("{}: error: {}", error.location(), error));
    }

    let Ok(compiled) = compiled else {
        println_red_err("invalid");
        return Ok(false);
    };
    if config.should_print_tree() {
        let tree = serde_json::to_string_pretty(&compiled.program)
            .context("failed to serialize the syntax tree")?;
        println!("{tree}");
    }
    if compiled.is_valid() {
        println_green_err("valid");
    } else {
        println_red_err("invalid");
    }
    Ok(compiled.is_valid())
}
