//! Pati CLI: run or lint a program file.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use pati::{Error, Interpreter, LanguageOptions, LineScanner, Linter, ProgramParser, Variables};

/// Exit status for `--strict` runs that recorded faults
const STRICT_FAILURE: u8 = 2;

/// Pati CLI.
#[derive(Parser)]
#[command(name = "pati", version, about = "Pati: a line-oriented BASIC interpreter")]
struct Cli {
    /// Enable debug logging on stderr (RUST_LOG takes precedence).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a program.
    Run(RunArgs),
    /// Report suspicious constructs without running.
    Lint(LintArgs),
}

#[derive(Args)]
struct RunArgs {
    /// Program source file.
    file: PathBuf,

    /// JSON options file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Do not print a prompt before each INPUT value.
    #[arg(long)]
    no_prompt: bool,

    /// Maximum CALL nesting depth.
    #[arg(long, value_name = "N")]
    max_call_depth: Option<usize>,

    /// Exit with status 2 when any error is reported.
    #[arg(long)]
    strict: bool,
}

#[derive(Args)]
struct LintArgs {
    /// Program source file.
    file: PathBuf,

    /// JSON options file.
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Run(args) => run(args),
        Commands::Lint(args) => lint(args),
    }
}

/// Logs go to stderr so they never mix with program output.
fn init_tracing(verbose: bool) {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_options(config: Option<&Path>) -> anyhow::Result<LanguageOptions> {
    match config {
        Some(path) => LanguageOptions::load(path),
        None => Ok(LanguageOptions::default()),
    }
}

fn read_source(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

fn run(args: RunArgs) -> anyhow::Result<ExitCode> {
    let mut options = load_options(args.config.as_deref())?;
    if args.no_prompt {
        options.input_prompts = false;
    }
    if let Some(limit) = args.max_call_depth {
        options.call_depth_limit = limit;
    }
    debug!(?options, file = %args.file.display(), "running");

    let source = read_source(&args.file)?;
    let tokens = LineScanner::new(&source)
        .with_comments(options.comments_enabled)
        .scan_tokens();

    let program = match ProgramParser::new(tokens).parse() {
        Ok(program) => program,
        Err(e) => {
            println!("{}", describe("Parsing", &e));
            return Ok(exit_status(args.strict, true));
        }
    };

    let mut vars = Variables::new();
    let report = {
        let mut interpreter =
            Interpreter::with_options(std::io::stdin().lock(), std::io::stdout().lock(), options);
        interpreter.run(&program, &mut vars)
    };

    for fault in report.faults() {
        println!("{}", describe("Runtime", fault));
    }
    info!(
        lines = report.lines_executed,
        faults = report.faults().count(),
        "program finished"
    );
    Ok(exit_status(args.strict, !report.is_clean()))
}

fn lint(args: LintArgs) -> anyhow::Result<ExitCode> {
    let options = load_options(args.config.as_deref())?;
    let source = read_source(&args.file)?;
    let warnings = Linter::with_options(options).lint(&source);

    if warnings.is_empty() {
        println!("No issues found.");
    } else {
        println!("Linter Warnings:");
        for warning in &warnings {
            println!("- {}", warning);
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn describe(stage: &str, error: &Error) -> String {
    format!(
        "{} error at line {}: error code {} ({})",
        stage,
        error.line(),
        error.code(),
        error
    )
}

fn exit_status(strict: bool, failed: bool) -> ExitCode {
    if strict && failed {
        ExitCode::from(STRICT_FAILURE)
    } else {
        ExitCode::SUCCESS
    }
}
