pub mod env;
pub mod eval;
pub mod interpreter;
pub mod io;
pub mod parser;
pub mod primitives;
pub mod value;

pub use env::{Env, Frame};
pub use eval::{EvalError, SpecialForm, apply, eval};
pub use interpreter::{Interpreter, RunError};
pub use io::{IoAdapter, StdioAdapter, StringIoAdapter};
pub use parser::ParseError;
pub use primitives::Primitive;
pub use value::Value;
