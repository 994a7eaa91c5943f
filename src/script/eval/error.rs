use std::fmt;

use derive_more::Display;

use crate::script::input_source::{fmt_statements, ErrorStatement, InputSource, InputSpan, StatementKind};

#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum EvalErrorKind {
    #[display(fmt = "'{}' is not defined", _0)]
    UnboundIdentifier(String),
    #[display(fmt = "operator '{}' is not supported", _0)]
    UnsupportedOperator(&'static str),
    #[display(fmt = "expected a value of type {}, but found {}", expected, found)]
    TypeMismatch { expected: &'static str, found: &'static str },
    #[display(fmt = "index {} is out of range for an array of length {}", index, length)]
    IndexOutOfRange { index: i64, length: usize },
    #[display(fmt = "function '{}' expects {} arguments, but was called with {}", name, expected, found)]
    ArityMismatch { name: String, expected: usize, found: usize },
    #[display(fmt = "cannot evaluate {} in this position", _0)]
    UnsupportedNodeKind(&'static str),
    #[display(fmt = "evaluation nested deeper than {} levels", _0)]
    DepthExceeded(usize),
}

/// Represents a function call that was active when the error occurred
#[derive(Debug, Clone)]
pub struct EvalFrame {
    pub function: String,
    pub call_site: InputSpan,
}

impl fmt::Display for EvalFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "function {} called at {}:{}", &self.function, self.call_site.begin.line + 1, self.call_site.begin.column + 1)
    }
}

/// Represents an error that ocurred during evaluation. Contains error
/// statements just like in parsing errors. Additionally displays the function
/// calls that were active at the time.
#[derive(Debug, Clone)]
pub struct EvalError {
    pub kind: EvalErrorKind,
    pub(crate) statements: Vec<ErrorStatement>,
    pub(crate) frames: Vec<EvalFrame>,
}

impl EvalError {
    pub(crate) fn new(kind: EvalErrorKind, span: InputSpan, frames: Vec<EvalFrame>) -> Self {
        let message = kind.to_string();
        Self {
            kind,
            statements: vec![ErrorStatement::new(StatementKind::Error, span, message)],
            frames,
        }
    }

    pub fn attach_source(mut self, source: &InputSource) -> Self {
        for statement in self.statements.iter_mut() {
            statement.attach_source(source);
        }
        self
    }

    pub fn statements(&self) -> &[ErrorStatement] {
        &self.statements
    }

    pub fn frames(&self) -> &[EvalFrame] {
        &self.frames
    }
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Display error statement(s)
        fmt_statements(&self.statements, f)?;

        // Display stack trace
        if !self.frames.is_empty() {
            writeln!(f, " +-  Stack trace:")?;
            for frame in self.frames.iter().rev() {
                writeln!(f, " | {}", frame)?;
            }
        }

        Ok(())
    }
}

impl std::error::Error for EvalError {}
