/// eval
///
/// Tree-walking evaluator of a parsed program. Variables live in a stack of
/// scopes: the global scope first, then one scope per active if-consequent,
/// for-loop and function call. Reads search from the innermost scope outward,
/// writes always go to the innermost scope.
///
/// Primitive values are copied around freely. Arrays, plain objects and
/// functions live in the store's heap and values only carry their position,
/// so all copies of an array value observe the same elements.

mod error;
mod executor;
mod store;
mod value;

pub use error::{EvalError, EvalErrorKind, EvalFrame};
pub use executor::{EvalResult, Interpreter, NativeCallback, MAX_EVAL_DEPTH};
pub use value::{FunctionObject, NativeFunctionObject, Object, Value};
