use std::{cell::RefCell, fmt, rc::Rc};

use ecow::EcoString;
use log::debug;

use crate::eval::EvalError;
use crate::value::Value;

/// Frames are shared by every closure and call site that captured them.
pub type Env = Rc<Frame>;

/// One lexical scope: its own bindings plus a link to the enclosing scope.
///
/// Bindings are stored oldest first and scanned newest first, so the most
/// recent binding of a name is the one that is found.
pub struct Frame {
  bindings: RefCell<Vec<(EcoString, Value)>>,
  parent: Option<Env>,
}

impl Frame {
  /// The parentless frame at the root of every chain.
  pub fn global() -> Env {
    Rc::new(Self {
      bindings: RefCell::new(Vec::new()),
      parent: None,
    })
  }

  pub fn child(parent: &Env) -> Env {
    Rc::new(Self {
      bindings: RefCell::new(Vec::new()),
      parent: Some(Rc::clone(parent)),
    })
  }

  fn chain(&self) -> impl Iterator<Item = &Frame> {
    std::iter::successors(Some(self), |frame| frame.parent.as_deref())
  }

  /// Resolve `name` against this frame, then each ancestor in turn.
  pub fn lookup(&self, name: &str) -> Result<Value, EvalError> {
    self
      .chain()
      .find_map(|frame| frame.get_local(name))
      .ok_or_else(|| EvalError::UnboundVariable(name.into()))
  }

  pub fn get_local(&self, name: &str) -> Option<Value> {
    self
      .bindings
      .borrow()
      .iter()
      .rev()
      .find(|(bound, _)| bound.as_str() == name)
      .map(|(_, value)| value.clone())
  }

  pub fn contains_local(&self, name: &str) -> bool {
    self.bindings.borrow().iter().any(|(bound, _)| bound.as_str() == name)
  }

  /// Add a binding to this frame only; parents are never consulted.
  pub fn insert(&self, name: EcoString, value: Value) {
    self.bindings.borrow_mut().push((name, value));
  }

  /// Like [`Frame::insert`], but a name already bound here is an error.
  pub fn define_unique(&self, name: EcoString, value: Value) -> Result<(), EvalError> {
    if self.contains_local(&name) {
      return Err(EvalError::DuplicateBinding(name));
    }
    debug!("binding `{}` to {}", name, value.type_name());
    self.insert(name, value);
    Ok(())
  }

  /// Overwrite the nearest existing binding of `name` in place. Every frame and
  /// closure that can see that binding observes the new value.
  pub fn assign(&self, name: &str, value: Value) -> Result<(), EvalError> {
    for frame in self.chain() {
      let mut bindings = frame.bindings.borrow_mut();
      if let Some((_, slot)) = bindings
        .iter_mut()
        .rev()
        .find(|(bound, _)| bound.as_str() == name)
      {
        *slot = value;
        return Ok(());
      }
    }

    Err(EvalError::UnboundVariable(name.into()))
  }

  pub fn depth(&self) -> usize {
    self.chain().count()
  }

  pub fn local_names(&self) -> Vec<EcoString> {
    self
      .bindings
      .borrow()
      .iter()
      .rev()
      .map(|(name, _)| name.clone())
      .collect()
  }
}

// Values may hold closures over this frame; only names are shown.
impl fmt::Debug for Frame {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Frame")
      .field("bindings", &self.local_names())
      .field("depth", &self.depth())
      .finish()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_lookup_walks_parents() {
    let global = Frame::global();
    global.insert("x".into(), Value::Integer(1));
    let inner = Frame::child(&Frame::child(&global));

    assert_eq!(inner.lookup("x"), Ok(Value::Integer(1)));
    assert_eq!(inner.depth(), 3);
  }

  #[test]
  fn test_lookup_unbound() {
    let global = Frame::global();
    assert_eq!(
      global.lookup("missing"),
      Err(EvalError::UnboundVariable("missing".into()))
    );
  }

  #[test]
  fn test_inner_binding_shadows_outer() {
    let global = Frame::global();
    global.insert("x".into(), Value::Integer(1));
    let inner = Frame::child(&global);
    inner.insert("x".into(), Value::Integer(2));

    assert_eq!(inner.lookup("x"), Ok(Value::Integer(2)));
    assert_eq!(global.lookup("x"), Ok(Value::Integer(1)));
  }

  #[test]
  fn test_most_recent_binding_wins() {
    let frame = Frame::global();
    frame.insert("x".into(), Value::Integer(1));
    frame.insert("x".into(), Value::Integer(2));

    assert_eq!(frame.lookup("x"), Ok(Value::Integer(2)));
    assert_eq!(
      frame.local_names(),
      vec![EcoString::from("x"), EcoString::from("x")]
    );
  }

  #[test]
  fn test_define_unique_rejects_duplicate() {
    let frame = Frame::global();
    frame
      .define_unique("x".into(), Value::Integer(1))
      .expect("first definition should succeed");

    assert_eq!(
      frame.define_unique("x".into(), Value::Integer(2)),
      Err(EvalError::DuplicateBinding("x".into()))
    );
    assert_eq!(frame.lookup("x"), Ok(Value::Integer(1)));
  }

  #[test]
  fn test_define_unique_ignores_parent_bindings() {
    let global = Frame::global();
    global.insert("x".into(), Value::Integer(1));
    let inner = Frame::child(&global);

    assert!(inner.define_unique("x".into(), Value::Integer(2)).is_ok());
  }

  #[test]
  fn test_assign_mutates_nearest_binding() {
    let global = Frame::global();
    global.insert("x".into(), Value::Integer(1));
    let inner = Frame::child(&global);
    let sibling = Frame::child(&global);

    inner
      .assign("x", Value::Integer(5))
      .expect("x is bound in the parent");

    assert_eq!(global.lookup("x"), Ok(Value::Integer(5)));
    assert_eq!(sibling.lookup("x"), Ok(Value::Integer(5)));
    assert!(!inner.contains_local("x"));
  }

  #[test]
  fn test_assign_unbound() {
    let global = Frame::global();
    assert_eq!(
      global.assign("y", Value::Integer(1)),
      Err(EvalError::UnboundVariable("y".into()))
    );
  }
}
