use rustyline::completion::{Completer, FilenameCompleter, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Context, Helper};

pub const COMMANDS: [&str; 5] = [":help", ":quit", ":exit", ":history", ":load"];

/// Completes session commands and the file argument of `:load`.
pub struct ReplHelper {
  file_completer: FilenameCompleter,
}

impl ReplHelper {
  pub fn new() -> Self {
    Self {
      file_completer: FilenameCompleter::new(),
    }
  }
}

fn load_argument_start(line: &str) -> Option<usize> {
  [":load ", ":l "]
    .iter()
    .find(|prefix| line.starts_with(*prefix))
    .map(|prefix| prefix.len())
}

fn matching_commands(prefix: &str) -> impl Iterator<Item = &'static str> + '_ {
  COMMANDS
    .into_iter()
    .filter(move |command| command.starts_with(prefix))
}

impl Helper for ReplHelper {}

impl Completer for ReplHelper {
  type Candidate = Pair;

  fn complete(
    &self,
    line: &str,
    pos: usize,
    ctx: &Context<'_>,
  ) -> Result<(usize, Vec<Pair>), ReadlineError> {
    if let Some(start) = load_argument_start(line)
      && pos >= start
    {
      let path_part = &line[start..pos];
      let (offset, candidates) = self
        .file_completer
        .complete(path_part, path_part.len(), ctx)?;
      return Ok((start + offset, candidates));
    }

    let typed = &line[..pos];
    if typed.starts_with(':') && !typed.contains(' ') {
      let candidates = matching_commands(typed)
        .map(|command| Pair {
          display: command.to_string(),
          replacement: command.to_string(),
        })
        .collect();
      return Ok((0, candidates));
    }

    Ok((pos, vec![]))
  }
}

impl Hinter for ReplHelper {
  type Hint = String;

  fn hint(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Option<String> {
    if pos < line.len() || !line.starts_with(':') || line.len() < 2 {
      return None;
    }

    matching_commands(line)
      .next()
      .filter(|command| command.len() > line.len())
      .map(|command| command[line.len()..].to_string())
  }
}

impl Highlighter for ReplHelper {}

impl Validator for ReplHelper {}
