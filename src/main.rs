//! # scriptlang
//!
//! Command-line runner for scriptlang programs.
//!
//! ## Usage
//!
//! - Run a script: `scriptlang demo.sl` (logs to `logs/demo.log` next to the script)
//! - Choose the log file: `scriptlang demo.sl --log-file run.log`
//! - Skip the log file: `scriptlang demo.sl --no-log`
//! - Interactive shell: `scriptlang`
//!
//! Exit codes: `0` success, `1` invocation or file error, `2` lexical or
//! syntax error, `3` runtime error.

use clap::Parser as ClapParser;
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process;

use scriptlang::diagnostics::{self, DiagnosticSink, FileSink, NullSink};
use scriptlang::error::{ParseError, ScriptError};
use scriptlang::interpreter::Interpreter;
use scriptlang::parser;

const PKG_VERSION: &str = env!("CARGO_PKG_VERSION");

/// CLI arguments for the scriptlang runner.
#[derive(ClapParser)]
#[command(name = "scriptlang")]
#[command(version = PKG_VERSION)]
#[command(about = "Run scriptlang programs", long_about = None)]
struct Cli {
    /// Script file to execute; starts an interactive shell when omitted
    #[arg(value_name = "FILE")]
    script: Option<PathBuf>,

    /// Write diagnostic records to this file instead of logs/<script>.log
    #[arg(long, value_name = "PATH", conflicts_with = "no_log")]
    log_file: Option<PathBuf>,

    /// Do not write diagnostic records anywhere
    #[arg(long)]
    no_log: bool,
}

/// Entry point for the CLI tool.
fn main() {
    init_tracing();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            process::exit(if e.use_stderr() { 1 } else { 0 });
        }
    };

    match cli.script {
        Some(ref path) => {
            if let Err(e) = execute_script(path, &cli) {
                report(&e, path);
                process::exit(e.exit_code());
            }
        }
        None => run_repl(&cli),
    }
}

/// Route `tracing` events to stderr when `RUST_LOG` is set.
fn init_tracing() {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    if std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(io::stderr).with_target(true))
            .with(EnvFilter::from_default_env())
            .init();
    }
}

/// Pick the diagnostic sink requested on the command line.
fn open_sink(cli: &Cli, script: Option<&Path>) -> Result<Box<dyn DiagnosticSink>, ScriptError> {
    if cli.no_log {
        return Ok(Box::new(NullSink));
    }
    let path = match (&cli.log_file, script) {
        (Some(path), _) => path.clone(),
        (None, Some(script)) => diagnostics::default_log_path(script),
        (None, None) => return Ok(Box::new(NullSink)),
    };
    let sink = FileSink::open(&path).map_err(|source| ScriptError::LogFile { path, source })?;
    tracing::debug!(log = %sink.path().display(), "diagnostic log opened");
    Ok(Box::new(sink))
}

/// Read, parse and execute a script file.
fn execute_script(path: &Path, cli: &Cli) -> Result<(), ScriptError> {
    let source = fs::read_to_string(path).map_err(|source| ScriptError::Source {
        path: path.to_path_buf(),
        source,
    })?;

    let program = parser::parse_script(&source).inspect_err(|e| print_parse_error(e, &source, Some(path)))?;

    let sink = open_sink(cli, Some(path))?;
    let mut interpreter = Interpreter::with_stdout(sink);
    interpreter.run(&program)?;
    Ok(())
}

/// Print errors that `print_parse_error` has not already shown.
fn report(error: &ScriptError, path: &Path) {
    match error {
        ScriptError::Parse(_) => {}
        ScriptError::Runtime(e) => eprintln!("[runtime error] {}: {}", path.display(), e),
        other => eprintln!("error: {other}"),
    }
}

/// Print a lexical or syntax error with the offending source line.
fn print_parse_error(error: &ParseError, source: &str, filename: Option<&Path>) {
    let (line, col) = error.position();
    let file_prefix = filename
        .map(|f| format!("{}:", f.display()))
        .unwrap_or_default();
    eprintln!("[{}] {}{}:{}: {}", stage(error), file_prefix, line, col, error);

    if let Some(line_content) = get_line(source, line) {
        let gutter = line.to_string();
        eprintln!();
        eprintln!("  {} | {}", gutter, line_content);
        eprintln!(
            "  {} | {}^",
            " ".repeat(gutter.len()),
            " ".repeat(col.saturating_sub(1))
        );
    }
}

fn stage(error: &ParseError) -> &'static str {
    match error {
        ParseError::Lex(_) => "lexical error",
        ParseError::Syntax(_) => "syntax error",
    }
}

/// Get a specific line from source code.
fn get_line(source: &str, line_num: usize) -> Option<&str> {
    source.lines().nth(line_num.checked_sub(1)?)
}

/// Interactive shell: each line is parsed and run against one interpreter,
/// so variables and functions persist between lines.
fn run_repl(cli: &Cli) {
    println!("scriptlang {}", PKG_VERSION);
    println!("Type 'exit' or press Ctrl+D to quit\n");

    let sink = match open_sink(cli, None) {
        Ok(sink) => sink,
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(e.exit_code());
        }
    };
    let mut interpreter = Interpreter::with_stdout(sink);

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut lines = stdin.lock().lines();

    loop {
        print!("> ");
        let _ = stdout.flush();

        let input = match lines.next() {
            None => {
                println!("\nGoodbye!");
                break;
            }
            Some(Ok(input)) => input,
            Some(Err(e)) => {
                eprintln!("Error reading input: {}", e);
                break;
            }
        };

        let input = input.trim();
        if input == "exit" || input == "quit" {
            println!("Goodbye!");
            break;
        }
        if input.is_empty() {
            continue;
        }

        match parser::parse_script(input) {
            Ok(program) => {
                if let Err(e) = interpreter.run(&program) {
                    eprintln!("[runtime error] {}", e);
                }
            }
            Err(e) => print_parse_error(&e, input, None),
        }
    }
}
