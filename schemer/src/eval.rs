use std::rc::Rc;
use std::str::FromStr;

use ecow::EcoString;
use log::{debug, trace};
use strum::{EnumString, IntoStaticStr};
use thiserror::Error;

use crate::env::{Env, Frame};
use crate::value::{Closure, Params, Value, list, list_items};

/// Every failure is terminal: nothing in the evaluator catches one of these.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
  #[error("symbol '{0}' wasn't found")]
  UnboundVariable(EcoString),

  #[error("wrong number of arguments for {form}: expected {expected}, got {got}")]
  ArityError {
    form: &'static str,
    expected: usize,
    got: usize,
  },

  #[error("wrong number of arguments for {form}: expected at least {min}, got {got}")]
  ArityAtLeast {
    form: &'static str,
    min: usize,
    got: usize,
  },

  #[error("cannot evaluate empty list")]
  EmptyApplication,

  #[error("{0} body is empty")]
  EmptyBody(&'static str),

  #[error("malformed binding in {form}: {binding}")]
  MalformedBinding { form: &'static str, binding: String },

  #[error("duplicate binding for '{0}'")]
  DuplicateBinding(EcoString),

  #[error("duplicate identifier '{0}' in parameter list")]
  DuplicateParam(EcoString),

  #[error("lambda parameter is not a symbol: {0}")]
  InvalidParameter(String),

  #[error("define name must be a symbol, got: {0}")]
  InvalidDefineName(String),

  #[error("set! target must be a symbol, got: {0}")]
  InvalidSetTarget(String),

  #[error("invalid letrec initializer for '{0}'")]
  InvalidLetrecExpr(EcoString),

  #[error("{0} expects a proper list of arguments")]
  ImproperList(&'static str),

  #[error("{name}: expected {expected}, got {got}")]
  TypeError {
    name: &'static str,
    expected: &'static str,
    got: String,
  },

  #[error("not a procedure: {0}")]
  NotApplicable(String),

  #[error("cannot evaluate a {0} value")]
  NotEvaluable(&'static str),
}

/// Keywords are recognised by name before any lookup, so a binding called
/// `if` never shadows the special form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
pub enum SpecialForm {
  If,
  Let,
  Letrec,
  Quote,
  Define,
  Lambda,
  #[strum(serialize = "set!")]
  Set,
}

impl SpecialForm {
  pub fn name(self) -> &'static str {
    self.into()
  }
}

/// The argument forms of `form`, which must be a proper list.
fn arguments<'a>(args: &'a Value, form: &'static str) -> Result<Vec<&'a Value>, EvalError> {
  list_items(args).ok_or(EvalError::ImproperList(form))
}

/// Extract exactly `count` argument forms.
fn exact_arguments<'a>(
  args: &'a Value,
  form: &'static str,
  count: usize,
) -> Result<Vec<&'a Value>, EvalError> {
  let items = arguments(args, form)?;
  if items.len() != count {
    return Err(EvalError::ArityError {
      form,
      expected: count,
      got: items.len(),
    });
  }
  Ok(items)
}

/// Evaluate body forms in order and return the value of the last one.
fn eval_sequence<'a>(
  forms: impl IntoIterator<Item = &'a Value>,
  env: &Env,
) -> Result<Value, EvalError> {
  let mut last = Value::Void;
  for form in forms {
    last = eval(form, env)?;
  }
  Ok(last)
}

/// A validated `(name expr)` entry of a `let` or `letrec` binding list.
struct Binding<'a> {
  name: &'a EcoString,
  expr: &'a Value,
}

fn parse_bindings<'a>(
  bindings: &'a Value,
  form: &'static str,
) -> Result<Vec<Binding<'a>>, EvalError> {
  let malformed = |binding: &Value| EvalError::MalformedBinding {
    form,
    binding: binding.to_string(),
  };

  let entries = list_items(bindings).ok_or_else(|| malformed(bindings))?;

  entries
    .into_iter()
    .map(|entry| match list_items(entry).as_deref() {
      Some(&[Value::Symbol(name), expr]) => Ok(Binding { name, expr }),
      _ => Err(malformed(entry)),
    })
    .collect()
}

fn split_let<'a>(
  args: &'a Value,
  form: &'static str,
) -> Result<(Vec<Binding<'a>>, Vec<&'a Value>), EvalError> {
  let items = arguments(args, form)?;
  let Some((bindings, body)) = items.split_first() else {
    return Err(EvalError::ArityAtLeast {
      form,
      min: 2,
      got: 0,
    });
  };

  if body.is_empty() {
    return Err(EvalError::EmptyBody(form));
  }

  Ok((parse_bindings(bindings, form)?, body.to_vec()))
}

fn eval_if(args: &Value, env: &Env) -> Result<Value, EvalError> {
  let items = exact_arguments(args, "if", 3)?;

  if eval(items[0], env)?.is_false() {
    eval(items[2], env)
  } else {
    eval(items[1], env)
  }
}

/// Initializers see the enclosing frame only, never each other.
fn eval_let(args: &Value, env: &Env) -> Result<Value, EvalError> {
  let (bindings, body) = split_let(args, "let")?;
  let frame = Frame::child(env);

  for Binding { name, expr } in bindings {
    if frame.contains_local(name) {
      return Err(EvalError::DuplicateBinding(name.clone()));
    }
    let value = eval(expr, env)?;
    frame.insert(name.clone(), value);
  }

  eval_sequence(body, &frame)
}

/// Every name is installed as an unspecified placeholder before any
/// initializer runs, so lambdas in the initializers can refer to any of them.
fn eval_letrec(args: &Value, env: &Env) -> Result<Value, EvalError> {
  let (bindings, body) = split_let(args, "letrec")?;
  let frame = Frame::child(env);

  for Binding { name, .. } in &bindings {
    frame.define_unique((*name).clone(), Value::Unspecified)?;
  }

  for Binding { name, expr } in &bindings {
    if matches!(expr, Value::Symbol(_)) {
      return Err(EvalError::InvalidLetrecExpr((*name).clone()));
    }

    let value = eval(expr, &frame)?;
    if matches!(value, Value::Unspecified | Value::Symbol(_)) {
      return Err(EvalError::InvalidLetrecExpr((*name).clone()));
    }

    frame.assign(name, value)?;
  }

  eval_sequence(body, &frame)
}

fn eval_quote(args: &Value) -> Result<Value, EvalError> {
  let items = exact_arguments(args, "quote", 1)?;
  Ok(items[0].clone())
}

fn eval_define(args: &Value, env: &Env) -> Result<Value, EvalError> {
  let items = exact_arguments(args, "define", 2)?;
  let name = items[0]
    .as_symbol()
    .ok_or_else(|| EvalError::InvalidDefineName(items[0].to_string()))?;

  if env.contains_local(name) {
    return Err(EvalError::DuplicateBinding(name.clone()));
  }

  let value = eval(items[1], env)?;
  env.insert(name.clone(), value);
  Ok(Value::Void)
}

fn parse_params(spec: &Value) -> Result<Params, EvalError> {
  match spec {
    Value::Symbol(rest) => Ok(Params::Variadic(rest.clone())),
    Value::Nil | Value::Cons(_, _) => {
      let items = list_items(spec).ok_or(EvalError::ImproperList("lambda"))?;
      let mut names: Vec<EcoString> = Vec::with_capacity(items.len());

      for item in items {
        let name = item
          .as_symbol()
          .ok_or_else(|| EvalError::InvalidParameter(item.to_string()))?;
        if names.contains(name) {
          return Err(EvalError::DuplicateParam(name.clone()));
        }
        names.push(name.clone());
      }

      Ok(Params::Fixed(names))
    }
    other => Err(EvalError::InvalidParameter(other.to_string())),
  }
}

fn eval_lambda(args: &Value, env: &Env) -> Result<Value, EvalError> {
  let items = arguments(args, "lambda")?;
  if items.len() < 2 {
    return Err(EvalError::ArityAtLeast {
      form: "lambda",
      min: 2,
      got: items.len(),
    });
  }

  let params = parse_params(items[0])?;
  let body = items[1..].iter().map(|&form| form.clone()).collect();

  Ok(Value::Closure(Rc::new(Closure {
    params,
    body,
    env: Rc::clone(env),
  })))
}

fn eval_set(args: &Value, env: &Env) -> Result<Value, EvalError> {
  let items = exact_arguments(args, "set!", 2)?;
  let name = items[0]
    .as_symbol()
    .ok_or_else(|| EvalError::InvalidSetTarget(items[0].to_string()))?;

  let value = eval(items[1], env)?;
  env.assign(name, value)?;
  Ok(Value::Void)
}

fn eval_special_form(form: SpecialForm, args: &Value, env: &Env) -> Result<Value, EvalError> {
  match form {
    SpecialForm::If => eval_if(args, env),
    SpecialForm::Let => eval_let(args, env),
    SpecialForm::Letrec => eval_letrec(args, env),
    SpecialForm::Quote => eval_quote(args),
    SpecialForm::Define => eval_define(args, env),
    SpecialForm::Lambda => eval_lambda(args, env),
    SpecialForm::Set => eval_set(args, env),
  }
}

pub fn eval(form: &Value, env: &Env) -> Result<Value, EvalError> {
  match form {
    Value::Integer(_) | Value::Float(_) | Value::String(_) | Value::Bool(_) => Ok(form.clone()),

    Value::Symbol(name) => env.lookup(name),

    Value::Nil => Err(EvalError::EmptyApplication),

    Value::Cons(head, args) => {
      if let Value::Symbol(name) = head.as_ref()
        && let Ok(special) = SpecialForm::from_str(name)
      {
        return eval_special_form(special, args, env);
      }

      let procedure = eval(head, env)?;
      let arguments = arguments(args, "application")?
        .into_iter()
        .map(|arg| eval(arg, env))
        .collect::<Result<Vec<_>, _>>()?;

      apply(&procedure, arguments)
    }

    Value::Void
    | Value::Unspecified
    | Value::Closure(_)
    | Value::Primitive(_) => Err(EvalError::NotEvaluable(form.type_name())),
  }
}

/// Closures run in a fresh frame under the frame they captured, not the
/// caller's. Parameters are paired with arguments until either runs out:
/// surplus arguments are dropped and surplus parameters stay unbound.
pub fn apply(procedure: &Value, arguments: Vec<Value>) -> Result<Value, EvalError> {
  match procedure {
    Value::Closure(closure) => {
      let frame = Frame::child(&closure.env);
      trace!(
        "applying closure to {} argument(s) at depth {}",
        arguments.len(),
        frame.depth()
      );

      match &closure.params {
        Params::Fixed(names) => {
          for (name, argument) in names.iter().zip(arguments) {
            frame.insert(name.clone(), argument);
          }
        }
        Params::Variadic(name) => frame.insert(name.clone(), list(arguments)),
      }

      eval_sequence(&closure.body, &frame)
    }

    Value::Primitive(primitive) => {
      trace!("applying {} to {} argument(s)", primitive, arguments.len());
      primitive.call(&arguments)
    }

    other => {
      debug!("refusing to apply a {}", other.type_name());
      let rendered = other.to_string();
      let operand = if rendered.is_empty() {
        other.type_name().to_string()
      } else {
        rendered
      };
      Err(EvalError::NotApplicable(operand))
    }
  }
}
