use colored::*;
use log::debug;
use rustyline::config::Configurer;
use rustyline::error::ReadlineError;
use rustyline::history::{DefaultHistory, History};
use rustyline::Editor;
use schemer::RunError;
use std::env;
use std::path::{Path, PathBuf};

use super::helper::ReplHelper;
use super::input::{InputHandler, LineResult, handle_eof, handle_interrupt, print_results};
use crate::CliError;

const VERSION: &str = env!("CARGO_PKG_VERSION");
const DEFAULT_HISTORY_SIZE: usize = 1000;
const HISTORY_SHOWN: usize = 20;

pub struct ReplSession {
  editor: Editor<ReplHelper, DefaultHistory>,
  history_file: PathBuf,
  input_handler: InputHandler,
}

impl ReplSession {
  pub fn new() -> Result<Self, CliError> {
    let mut editor = Editor::new()?;
    editor.set_helper(Some(ReplHelper::new()));

    let history_file = get_history_file();
    editor.set_max_history_size(get_history_size())?;

    // A missing history file is normal on the first run.
    if editor.load_history(&history_file).is_err() {
      debug!("no history loaded from {}", history_file.display());
    }

    Ok(Self {
      editor,
      history_file,
      input_handler: InputHandler::new(),
    })
  }

  /// Reads and evaluates until `:quit`, end of input, or the first
  /// evaluation error, which ends the session with that error.
  pub fn run(&mut self) -> Result<(), CliError> {
    print_banner();

    let outcome = self.read_loop();

    if let Err(e) = self.editor.save_history(&self.history_file) {
      eprintln!("Warning: Could not save history: {}", e);
    }

    outcome
  }

  fn read_loop(&mut self) -> Result<(), CliError> {
    loop {
      let prompt = self.create_prompt();

      match self.editor.readline(&prompt) {
        Ok(line) => {
          if !self.input_handler.is_multiline() {
            if line.trim().is_empty() {
              continue;
            }

            match self.handle_command(&line)? {
              CommandResult::Exit => {
                handle_eof();
                return Ok(());
              }
              CommandResult::Continue => continue,
              CommandResult::Evaluate => {}
            }
          }

          match self.input_handler.handle_line(line, &mut self.editor)? {
            LineResult::Complete(results) => print_results(&results),
            LineResult::NeedMore => {}
            LineResult::SyntaxError(err) => {
              eprintln!("{} {}", "Syntax error:".red().bold(), err);
            }
            LineResult::Fatal { results, error } => {
              print_results(&results);
              eprintln!("{} {}", "Evaluation error:".red().bold(), error);
              return Err(CliError::Halted(RunError::Eval(error)));
            }
          }
        }
        Err(ReadlineError::Interrupted) => handle_interrupt(&mut self.input_handler),
        Err(ReadlineError::Eof) => {
          handle_eof();
          return Ok(());
        }
        Err(err) => return Err(err.into()),
      }
    }
  }

  fn create_prompt(&self) -> String {
    if self.input_handler.is_multiline() {
      "  ".to_string()
    } else {
      format!(
        "{}{}> ",
        "schemer".bright_cyan().bold(),
        format!("[{}]", self.input_handler.form_number()).bright_black()
      )
    }
  }

  fn handle_command(&mut self, line: &str) -> Result<CommandResult, CliError> {
    let mut words = line.split_whitespace();

    let result = match words.next().unwrap_or("") {
      ":quit" | ":exit" => CommandResult::Exit,
      ":help" => {
        print_help();
        CommandResult::Continue
      }
      ":history" => {
        print_history(&self.editor);
        CommandResult::Continue
      }
      ":l" | ":load" => {
        self.load_file(words.next().unwrap_or(""))?;
        CommandResult::Continue
      }
      _ => CommandResult::Evaluate,
    };

    Ok(result)
  }

  /// Runs a file against the session's global frame. Only an evaluation
  /// error inside the file ends the session.
  fn load_file(&mut self, file: &str) -> Result<(), CliError> {
    if file.is_empty() {
      eprintln!(
        "{} Please provide a file path: {} or {}",
        "Error:".red().bold(),
        ":l <path>".bright_green(),
        ":load <path>".bright_green()
      );
      return Ok(());
    }

    let path = Path::new(file);
    let contents = match std::fs::read_to_string(path) {
      Ok(contents) => contents,
      Err(e) => {
        eprintln!(
          "{} Cannot read {}: {}",
          "Error:".red().bold(),
          path.display().to_string().bright_yellow(),
          e
        );
        return Ok(());
      }
    };

    match self.input_handler.interpreter_mut().run_source(&contents) {
      Ok(()) => {
        println!(
          "{} Loaded {}",
          "ok".bright_green().bold(),
          path.display().to_string().bright_cyan()
        );
        Ok(())
      }
      Err(RunError::Parse(_)) => Ok(()),
      Err(err) => Err(err.into()),
    }
  }
}

#[derive(Debug)]
enum CommandResult {
  Exit,
  Continue,
  Evaluate,
}

fn print_banner() {
  println!(
    "{} {}",
    "schemer".bright_cyan().bold(),
    format!("v{}", VERSION).bright_black()
  );
  println!(
    "  {} {} | {} {}\n",
    "Type".bright_white(),
    ":help".bright_green().bold(),
    ":quit".bright_green().bold(),
    "to exit".bright_white(),
  );
}

fn print_help() {
  let separator = "━".repeat(50).bright_black().to_string();

  println!("\n{}", separator);
  println!("  {}", "Schemer REPL".bright_cyan().bold());
  println!("{}", separator);

  println!("\n  {}", "Commands".bright_yellow().bold());
  println!("    {:12} Show this help", ":help".bright_green());
  println!("    {:12} Exit the REPL", ":quit".bright_green());
  println!("    {:12} Show history", ":history".bright_green());
  println!("    {:12} Load and evaluate a file", ":l <file>".bright_green());

  println!("\n  {}", "Special forms".bright_yellow().bold());
  println!("    if let letrec quote define lambda set!");

  println!("\n  {}", "Primitives".bright_yellow().bold());
  println!("    + < equal? cons car cdr null? append");

  println!("\n  {}", "Navigation".bright_yellow().bold());
  println!("    {:12} Browse history", "Up/Down".bright_magenta());
  println!("    {:12} Search history", "Ctrl+R".bright_magenta());
  println!("    {:12} Interrupt", "Ctrl+C".bright_magenta());
  println!("    {:12} Exit", "Ctrl+D".bright_magenta());

  println!(
    "\n  {}",
    "An evaluation error ends the session.".italic().bright_blue()
  );
  println!("\n{}\n", separator);
}

fn print_history(editor: &Editor<ReplHelper, DefaultHistory>) {
  let history = editor.history();
  let separator = "─".repeat(60);

  println!("\n{}", separator.bright_black());
  println!("{}", "  REPL History  ".bright_cyan().bold());
  println!("{}", separator.bright_black());

  if history.is_empty() {
    println!("  {}", "No history entries yet".bright_black().italic());
  } else {
    let total = history.len();
    let start = total.saturating_sub(HISTORY_SHOWN);

    if start > 0 {
      println!("  {} {} entries omitted", "...".bright_black(), start);
    }

    for (i, entry) in history.iter().enumerate().skip(start) {
      println!(
        "  {} {}",
        format!("{:>3}:", i + 1).bright_black(),
        entry.bright_white()
      );
    }
  }

  println!("{}\n", separator.bright_black());
}

fn get_history_file() -> PathBuf {
  if let Ok(path) = env::var("SCHEMER_REPL_HISTORY") {
    return PathBuf::from(path);
  }

  if let Some(mut home) = dirs::home_dir() {
    home.push(".schemer_history");
    return home;
  }

  PathBuf::from(".schemer_history")
}

fn get_history_size() -> usize {
  env::var("SCHEMER_REPL_HISTORY_SIZE")
    .ok()
    .and_then(|s| s.parse().ok())
    .unwrap_or(DEFAULT_HISTORY_SIZE)
}
