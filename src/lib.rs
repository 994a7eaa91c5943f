#[macro_use]
mod macros;

mod common;
pub mod logging;
mod script;

pub use script::{
    ast,
    compile,
    eval::{EvalError, EvalErrorKind, EvalFrame, EvalResult, Interpreter, NativeCallback, Object, Value, MAX_EVAL_DEPTH},
    input_source::{ErrorStatement, InputPosition, InputSource, InputSpan, StatementKind},
    parse,
    parser::{ParseError, ParseErrorKind, MAX_NESTING_DEPTH},
    tokenize,
    tokens::{Token, TokenKind},
    Error,
    Program,
};

#[cfg(feature = "ffi")]
pub mod ffi;
