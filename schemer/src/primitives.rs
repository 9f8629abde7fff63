use log::debug;
use strum::{Display, EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};

use crate::env::Env;
use crate::eval::EvalError;
use crate::value::{Value, car, cdr, cons, list_items};

/// The built-in procedures bound in the global frame.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, EnumString, IntoStaticStr,
)]
pub enum Primitive {
  #[strum(serialize = "+")]
  Add,
  #[strum(serialize = "<")]
  LessThan,
  #[strum(serialize = "equal?")]
  Equal,
  #[strum(serialize = "cons")]
  Cons,
  #[strum(serialize = "car")]
  Car,
  #[strum(serialize = "cdr")]
  Cdr,
  #[strum(serialize = "null?")]
  IsNull,
  #[strum(serialize = "append")]
  Append,
}

/// Bind every primitive under its Scheme name in `env`.
pub fn install(env: &Env) {
  for primitive in Primitive::iter() {
    env.insert(primitive.name().into(), Value::Primitive(primitive));
  }
  debug!("installed {} primitives", Primitive::iter().count());
}

impl Primitive {
  pub fn name(self) -> &'static str {
    self.into()
  }

  pub fn call(self, args: &[Value]) -> Result<Value, EvalError> {
    match self {
      Primitive::Add => add(args),
      Primitive::LessThan => less_than(args),
      Primitive::Equal => equal(args),
      Primitive::Cons => {
        let [first, rest] = self.expect_args::<2>(args)?;
        Ok(cons(first.clone(), rest.clone()))
      }
      Primitive::Car => {
        let [pair] = self.expect_args::<1>(args)?;
        car(pair).cloned().ok_or_else(|| self.type_error("pair", pair))
      }
      Primitive::Cdr => {
        let [pair] = self.expect_args::<1>(args)?;
        cdr(pair).cloned().ok_or_else(|| self.type_error("pair", pair))
      }
      Primitive::IsNull => {
        let [value] = self.expect_args::<1>(args)?;
        Ok(Value::Bool(matches!(value, Value::Nil)))
      }
      Primitive::Append => append(args),
    }
  }

  /// Borrow `args` as exactly `N` values, or report the arity mismatch.
  fn expect_args<'a, const N: usize>(
    self,
    args: &'a [Value],
  ) -> Result<&'a [Value; N], EvalError> {
    args.try_into().map_err(|_| EvalError::ArityError {
      form: self.name(),
      expected: N,
      got: args.len(),
    })
  }

  fn type_error(self, expected: &'static str, got: &Value) -> EvalError {
    EvalError::TypeError {
      name: self.name(),
      expected,
      got: got.to_string(),
    }
  }
}

enum Sum {
  Integer(i64),
  Float(f64),
}

/// All-integer input stays integer; one float anywhere makes the sum a float.
fn add(args: &[Value]) -> Result<Value, EvalError> {
  let sum = args.iter().try_fold(Sum::Integer(0), |sum, arg| {
    Ok(match (sum, arg) {
      (Sum::Integer(total), Value::Integer(n)) => Sum::Integer(total.wrapping_add(*n)),
      (Sum::Integer(total), Value::Float(n)) => Sum::Float(total as f64 + n),
      (Sum::Float(total), Value::Integer(n)) => Sum::Float(total + *n as f64),
      (Sum::Float(total), Value::Float(n)) => Sum::Float(total + n),
      (_, other) => return Err(Primitive::Add.type_error("number", other)),
    })
  })?;

  Ok(match sum {
    Sum::Integer(total) => Value::Integer(total),
    Sum::Float(total) => Value::Float(total),
  })
}

/// Operands must share a numeric kind; `(< 1 2.0)` is an error.
fn less_than(args: &[Value]) -> Result<Value, EvalError> {
  let [left, right] = Primitive::LessThan.expect_args::<2>(args)?;
  match (left, right) {
    (Value::Integer(a), Value::Integer(b)) => Ok(Value::Bool(a < b)),
    (Value::Float(a), Value::Float(b)) => Ok(Value::Bool(a < b)),
    (Value::Integer(_), other) => Err(Primitive::LessThan.type_error("integer", other)),
    (Value::Float(_), other) => Err(Primitive::LessThan.type_error("float", other)),
    (other, _) => Err(Primitive::LessThan.type_error("number", other)),
  }
}

/// Numbers of the same kind and strings compare by value; any other pairing
/// is simply not equal.
fn equal(args: &[Value]) -> Result<Value, EvalError> {
  let [left, right] = Primitive::Equal.expect_args::<2>(args)?;
  let result = match (left, right) {
    (Value::Integer(a), Value::Integer(b)) => a == b,
    (Value::Float(a), Value::Float(b)) => a == b,
    (Value::String(a), Value::String(b)) => a == b,
    _ => false,
  };
  Ok(Value::Bool(result))
}

/// Copies the spine of the first list; the second argument becomes the shared
/// tail of the result.
fn append(args: &[Value]) -> Result<Value, EvalError> {
  let [first, second] = Primitive::Append.expect_args::<2>(args)?;
  let items = list_items(first).ok_or_else(|| Primitive::Append.type_error("list", first))?;

  Ok(
    items
      .into_iter()
      .rev()
      .fold(second.clone(), |tail, item| cons(item.clone(), tail)),
  )
}
