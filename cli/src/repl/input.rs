use colored::*;
use rustyline::history::History;
use rustyline::{Editor, Helper, Result as RustyResult};
use schemer::{EvalError, Interpreter, ParseError, parser};

/// Buffers lines until they read as complete forms, then evaluates them
/// against the session's global frame.
pub struct InputHandler {
  buffer: String,
  interpreter: Interpreter,
}

impl InputHandler {
  pub fn new() -> Self {
    Self {
      buffer: String::new(),
      interpreter: Interpreter::default(),
    }
  }

  /// Counter shown in the prompt: the number of the next top-level form.
  pub fn form_number(&self) -> usize {
    self.interpreter.forms_evaluated() + 1
  }

  pub fn is_multiline(&self) -> bool {
    !self.buffer.is_empty()
  }

  pub fn clear_buffer(&mut self) {
    self.buffer.clear();
  }

  pub fn interpreter_mut(&mut self) -> &mut Interpreter {
    &mut self.interpreter
  }

  pub fn handle_line<H: Helper, I: History>(
    &mut self,
    line: String,
    editor: &mut Editor<H, I>,
  ) -> RustyResult<LineResult> {
    if !self.buffer.is_empty() {
      self.buffer.push('\n');
    }
    self.buffer.push_str(&line);

    let forms = match parser::parse_program(&self.buffer) {
      Ok(forms) => forms,
      Err(ParseError::Incomplete) => return Ok(LineResult::NeedMore),
      Err(err) => {
        editor.add_history_entry(self.buffer.as_str())?;
        self.buffer.clear();
        return Ok(LineResult::SyntaxError(err));
      }
    };

    editor.add_history_entry(self.buffer.as_str())?;
    self.buffer.clear();

    let mut results = Vec::new();
    for form in &forms {
      match self.interpreter.eval(form) {
        Ok(value) if value.is_void() => {}
        Ok(value) => results.push(value.to_string()),
        Err(error) => return Ok(LineResult::Fatal { results, error }),
      }
    }

    Ok(LineResult::Complete(results))
  }
}

pub enum LineResult {
  /// Printed forms of every non-void result, in order.
  Complete(Vec<String>),
  NeedMore,
  SyntaxError(ParseError),
  /// Results produced before the failing form, then the failure.
  Fatal {
    results: Vec<String>,
    error: EvalError,
  },
}

pub fn print_results(results: &[String]) {
  for result in results {
    println!("{} {}", "=>".bright_green().bold(), result.bright_white());
  }
}

pub fn handle_interrupt(handler: &mut InputHandler) {
  println!("{}", "^C".yellow());
  handler.clear_buffer();
}

pub fn handle_eof() {
  println!("\n{}", "Bye.".bright_cyan().italic());
}
