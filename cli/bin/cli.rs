use clap::Parser;
use cli::{Cli, CliError, Commands, run_eval, run_file, run_files, run_repl, run_stdin};
use colored::*;
use log::{LevelFilter, debug};
use std::io::{self, IsTerminal};
use std::{process, thread};

fn init_logger(verbose: bool) {
  let mut builder =
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("off"));
  if verbose {
    builder.filter_level(LevelFilter::Debug);
  }
  builder.init();
}

fn dispatch(command: Option<Commands>) -> Result<(), CliError> {
  match command {
    Some(Commands::Repl) => run_repl(),
    Some(Commands::Run {
      eval: Some(expr), ..
    }) => run_eval(&expr),
    Some(Commands::Run { eval: None, files }) => match files.len() {
      0 => run_stdin(),
      1 => run_file(&files[0]),
      _ => run_files(&files),
    },
    None if io::stdin().is_terminal() => run_repl(),
    None => run_stdin(),
  }
}

fn main() {
  let cli = Cli::parse();
  init_logger(cli.verbose);

  let stack_size = cli.stack_size_bytes();
  debug!("interpreter stack: {} bytes", stack_size);

  let command = cli.command;
  let result = thread::Builder::new()
    .name("schemer".to_string())
    .stack_size(stack_size)
    .spawn(move || dispatch(command))
    .map_err(CliError::Spawn)
    .and_then(|handler| handler.join().unwrap_or(Err(CliError::Panicked)));

  if let Err(e) = result {
    if !e.is_reported() {
      eprintln!("{} {}", "Error:".red().bold(), e);
    }
    process::exit(1);
  }
}
