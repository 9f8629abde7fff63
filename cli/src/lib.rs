mod repl;

use clap::{Parser, Subcommand};
use log::debug;
use rustyline::error::ReadlineError;
use schemer::{Interpreter, RunError};
use std::io::{self, Read};
use thiserror::Error;

pub use crate::repl::ReplSession;

const DEFAULT_STACK_MB: usize = 64;

#[derive(Parser)]
#[command(name = "schemer")]
#[command(about = "Schemer - a small Scheme evaluator", long_about = None)]
#[command(version)]
pub struct Cli {
  /// Log definitions and applications at debug level
  #[arg(short, long, global = true)]
  pub verbose: bool,

  /// Interpreter stack size in MiB (defaults to SCHEMER_STACK_MB or 64)
  #[arg(long, value_name = "MIB", global = true)]
  pub stack_size: Option<usize>,

  #[command(subcommand)]
  pub command: Option<Commands>,
}

impl Cli {
  pub fn stack_size_bytes(&self) -> usize {
    let megabytes = self
      .stack_size
      .or_else(|| {
        std::env::var("SCHEMER_STACK_MB")
          .ok()
          .and_then(|s| s.parse().ok())
      })
      .unwrap_or(DEFAULT_STACK_MB);

    megabytes.max(1) * 1024 * 1024
  }
}

#[derive(Subcommand)]
pub enum Commands {
  /// Start an interactive REPL
  Repl,
  /// Run a Scheme program; reads standard input when no files are given
  Run {
    /// Evaluate an expression from the command line
    #[arg(short, long, conflicts_with = "files")]
    eval: Option<String>,
    /// Scheme files, evaluated in order against one global frame
    #[arg(value_name = "FILES")]
    files: Vec<String>,
  },
}

#[derive(Debug, Error)]
pub enum CliError {
  /// The interpreter has already printed the failure.
  #[error("{0}")]
  Halted(#[from] RunError),

  #[error("failed to read '{path}': {source}")]
  Read { path: String, source: io::Error },

  #[error("REPL error: {0}")]
  Repl(#[from] ReadlineError),

  #[error("failed to start the interpreter thread: {0}")]
  Spawn(io::Error),

  #[error("interpreter thread panicked")]
  Panicked,
}

impl CliError {
  pub fn is_reported(&self) -> bool {
    matches!(self, CliError::Halted(_))
  }
}

fn read_source(path: &str) -> Result<String, CliError> {
  std::fs::read_to_string(path).map_err(|source| CliError::Read {
    path: path.to_string(),
    source,
  })
}

pub fn run_repl() -> Result<(), CliError> {
  let mut session = ReplSession::new()?;
  session.run()
}

pub fn run_eval(expression: &str) -> Result<(), CliError> {
  let mut interpreter: Interpreter = Interpreter::default();
  interpreter.run_source(expression)?;
  Ok(())
}

pub fn run_file(path: &str) -> Result<(), CliError> {
  run_files(&[path.to_string()])
}

/// Files share one global frame, so later files see earlier definitions.
pub fn run_files(paths: &[String]) -> Result<(), CliError> {
  let mut interpreter: Interpreter = Interpreter::default();

  for path in paths {
    let contents = read_source(path)?;
    debug!("running {}", path);
    interpreter.run_source(&contents)?;
  }

  Ok(())
}

pub fn run_stdin() -> Result<(), CliError> {
  let mut source = String::new();
  io::stdin()
    .read_to_string(&mut source)
    .map_err(|source| CliError::Read {
      path: "<stdin>".to_string(),
      source,
    })?;

  let mut interpreter: Interpreter = Interpreter::default();
  interpreter.run_source(&source)?;
  Ok(())
}
