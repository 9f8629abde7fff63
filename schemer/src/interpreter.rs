use std::io;

use log::{debug, error};
use thiserror::Error;

use crate::env::{Env, Frame};
use crate::eval::{EvalError, eval};
use crate::io::{IoAdapter, StdioAdapter};
use crate::parser::{ParseError, parse_program};
use crate::primitives;
use crate::value::Value;

#[derive(Debug, Error)]
pub enum RunError {
  #[error("Syntax error: {0}")]
  Parse(#[from] ParseError),

  #[error("Evaluation error: {0}")]
  Eval(#[from] EvalError),

  #[error("Output error: {0}")]
  Io(#[from] io::Error),
}

/// Owns the global frame and evaluates top-level forms against it in order.
pub struct Interpreter<IO: IoAdapter = StdioAdapter> {
  io: IO,
  global: Env,
  forms_evaluated: usize,
}

impl<IO: IoAdapter> Interpreter<IO> {
  /// A fresh global frame holding every primitive.
  pub fn new(io: IO) -> Self {
    let global = Frame::global();
    primitives::install(&global);
    Self::with_environment(io, global)
  }

  /// Evaluate against an existing frame; nothing is installed into it.
  pub fn with_environment(io: IO, global: Env) -> Self {
    Self {
      io,
      global,
      forms_evaluated: 0,
    }
  }

  pub fn global(&self) -> &Env {
    &self.global
  }

  pub fn io(&self) -> &IO {
    &self.io
  }

  pub fn io_mut(&mut self) -> &mut IO {
    &mut self.io
  }

  pub fn forms_evaluated(&self) -> usize {
    self.forms_evaluated
  }

  pub fn eval(&mut self, form: &Value) -> Result<Value, EvalError> {
    self.forms_evaluated += 1;
    debug!("evaluating top-level form #{}", self.forms_evaluated);
    eval(form, &self.global)
  }

  /// Parse and evaluate `source` without printing, returning the last value.
  pub fn eval_str(&mut self, source: &str) -> Result<Value, RunError> {
    let forms = parse_program(source)?;
    let mut last = Value::Void;
    for form in &forms {
      last = self.eval(form)?;
    }
    Ok(last)
  }

  /// Run a whole program: every non-void result is printed on its own line.
  ///
  /// The source is read completely before anything is evaluated, so a syntax
  /// error means no form runs. The first evaluation error stops the program.
  /// Either failure is reported once on the output before it is returned.
  pub fn run_source(&mut self, source: &str) -> Result<(), RunError> {
    let result = self.run_forms(source);

    if let Err(err) = &result {
      error!("{}", err);
      self.io.println(&err.to_string())?;
    }

    result
  }

  fn run_forms(&mut self, source: &str) -> Result<(), RunError> {
    let forms = parse_program(source)?;
    debug!("read {} top-level form(s)", forms.len());

    for form in &forms {
      let value = self.eval(form)?;
      if !value.is_void() {
        self.io.println(&value.to_string())?;
      }
    }

    Ok(())
  }
}

impl Default for Interpreter<StdioAdapter> {
  fn default() -> Self {
    Self::new(StdioAdapter::new())
  }
}
