use std::{fmt, rc::Rc};

use ecow::EcoString;

use crate::env::Env;
use crate::primitives::Primitive;

#[derive(Debug, Clone)]
pub enum Value {
  Integer(i64),
  Float(f64),
  String(EcoString),
  Bool(bool),
  Symbol(EcoString),
  Nil,

  /// Result of `define` and `set!`; never printed at top level.
  Void,
  /// Placeholder held by a `letrec` binding until its initializer is evaluated.
  Unspecified,

  Cons(Rc<Value>, Rc<Value>),
  Closure(Rc<Closure>),
  Primitive(Primitive),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Params {
  /// `(lambda (a b c) ...)`, also `(lambda () ...)`
  Fixed(Vec<EcoString>),
  /// `(lambda args ...)`
  Variadic(EcoString),
}

pub struct Closure {
  pub params: Params,
  pub body: Vec<Value>,
  pub env: Env,
}

// The captured frame can hold this closure, so printing it would never end.
impl fmt::Debug for Closure {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Closure")
      .field("params", &self.params)
      .field("body", &self.body)
      .finish_non_exhaustive()
  }
}

impl Value {
  pub fn symbol(name: &str) -> Self {
    Value::Symbol(name.into())
  }

  pub fn is_void(&self) -> bool {
    matches!(self, Value::Void)
  }

  pub fn is_false(&self) -> bool {
    matches!(self, Value::Bool(false))
  }

  pub fn as_symbol(&self) -> Option<&EcoString> {
    match self {
      Value::Symbol(name) => Some(name),
      _ => None,
    }
  }

  pub fn type_name(&self) -> &'static str {
    match self {
      Value::Integer(_) => "integer",
      Value::Float(_) => "float",
      Value::String(_) => "string",
      Value::Bool(_) => "boolean",
      Value::Symbol(_) => "symbol",
      Value::Nil => "empty list",
      Value::Void => "void",
      Value::Unspecified => "unspecified",
      Value::Cons(_, _) => "pair",
      Value::Closure(_) => "procedure",
      Value::Primitive(_) => "primitive",
    }
  }

  pub fn iter(&self) -> ListIter<'_> {
    ListIter { current: self }
  }
}

impl PartialEq for Value {
  fn eq(&self, other: &Self) -> bool {
    match (self, other) {
      (Value::Integer(a), Value::Integer(b)) => a == b,
      (Value::Float(a), Value::Float(b)) => a == b,
      (Value::String(a), Value::String(b)) => a == b,
      (Value::Bool(a), Value::Bool(b)) => a == b,
      (Value::Symbol(a), Value::Symbol(b)) => a == b,
      (Value::Nil, Value::Nil) => true,
      (Value::Void, Value::Void) => true,
      (Value::Unspecified, Value::Unspecified) => true,
      (Value::Cons(a_head, a_tail), Value::Cons(b_head, b_tail)) => {
        a_head == b_head && a_tail == b_tail
      }
      (Value::Closure(a), Value::Closure(b)) => Rc::ptr_eq(a, b),
      (Value::Primitive(a), Value::Primitive(b)) => a == b,
      _ => false,
    }
  }
}

impl From<i64> for Value {
  fn from(value: i64) -> Self {
    Value::Integer(value)
  }
}

impl From<f64> for Value {
  fn from(value: f64) -> Self {
    Value::Float(value)
  }
}

impl From<&str> for Value {
  fn from(value: &str) -> Self {
    Value::String(value.into())
  }
}

impl From<bool> for Value {
  fn from(value: bool) -> Self {
    Value::Bool(value)
  }
}

impl fmt::Display for Value {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Value::Integer(value) => write!(f, "{}", value),
      Value::Float(value) => write!(f, "{:.6}", value),
      Value::String(value) => write!(f, "\"{}\"", value),
      Value::Bool(true) => write!(f, "#t"),
      Value::Bool(false) => write!(f, "#f"),
      Value::Symbol(name) => write!(f, "{}", name),
      Value::Nil => write!(f, "()"),
      Value::Void | Value::Unspecified => Ok(()),
      Value::Closure(_) | Value::Primitive(_) => write!(f, "#<procedure>"),
      Value::Cons(_, _) => {
        write!(f, "(")?;

        let mut items = self.iter();
        let mut first = true;

        for item in items.by_ref() {
          if !first {
            write!(f, " ")?;
          }
          write!(f, "{}", item)?;
          first = false;
        }

        if !matches!(items.rest(), Value::Nil) {
          write!(f, " . {}", items.rest())?;
        }

        write!(f, ")")
      }
    }
  }
}

/// Walks the `first` cells of a pair chain. After exhaustion, `rest` holds the
/// terminator: `Nil` for a proper list, anything else for an improper one.
pub struct ListIter<'a> {
  current: &'a Value,
}

impl<'a> ListIter<'a> {
  pub fn rest(&self) -> &'a Value {
    self.current
  }
}

impl<'a> Iterator for ListIter<'a> {
  type Item = &'a Value;

  fn next(&mut self) -> Option<Self::Item> {
    match self.current {
      Value::Cons(head, tail) => {
        self.current = tail;
        Some(head)
      }
      _ => None,
    }
  }
}

pub fn cons(a: Value, b: Value) -> Value {
  Value::Cons(Rc::new(a), Rc::new(b))
}

pub fn car(list: &Value) -> Option<&Value> {
  match list {
    Value::Cons(a, _) => Some(a),
    _ => None,
  }
}

pub fn cdr(list: &Value) -> Option<&Value> {
  match list {
    Value::Cons(_, b) => Some(b),
    _ => None,
  }
}

/// Items of a proper list, or `None` when the chain ends in anything but `()`.
pub fn list_items(value: &Value) -> Option<Vec<&Value>> {
  let mut items = value.iter();
  let collected: Vec<&Value> = items.by_ref().collect();
  matches!(items.rest(), Value::Nil).then_some(collected)
}

pub fn list(items: Vec<Value>) -> Value {
  items
    .into_iter()
    .rev()
    .fold(Value::Nil, |acc, item| cons(item, acc))
}

pub struct Symbol(pub &'static str);

impl From<Symbol> for Value {
  fn from(value: Symbol) -> Self {
    Value::Symbol(value.0.into())
  }
}

impl From<Vec<Value>> for Value {
  fn from(value: Vec<Value>) -> Self {
    list(value)
  }
}

#[macro_export]
macro_rules! scheme_list {
    [] => {
        $crate::value::Value::Nil
    };
    [$($elem:expr),* $(,)?] => {{
        let elems = vec![$(<$crate::value::Value as From<_>>::from($elem)),*];
        $crate::value::list(elems)
    }};
}

#[macro_export]
macro_rules! sym {
    ($s:expr) => {
        $crate::value::Symbol($s)
    };
}
