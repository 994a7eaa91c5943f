use std::fmt;

use crate::common::*;
use crate::script::ast::FunctionDeclarationId;
use super::error::EvalErrorKind;

/// Runtime value. Objects live in the interpreter's store and are referred
/// to by position, so copying a `Value::Object` yields a second reference to
/// the same object rather than a copy of it.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Undefined,
    Null,
    Int(i64),
    Bool(bool),
    String(String),
    Object(HeapPos),
}

macro_rules! impl_value_expect {
    ($func_name:ident, $variant_name:path, $return_type:ty, $type_name:expr) => {
        impl Value {
            pub(crate) fn $func_name(&self) -> Result<$return_type, EvalErrorKind> {
                match self {
                    $variant_name(v) => Ok(*v),
                    _ => Err(EvalErrorKind::TypeMismatch { expected: $type_name, found: self.type_name() }),
                }
            }
        }
    }
}

impl_value_expect!(expect_int,    Value::Int,    i64,     "int");
impl_value_expect!(expect_bool,   Value::Bool,   bool,    "bool");
impl_value_expect!(expect_object, Value::Object, HeapPos, "object");

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "null",
            Value::Int(_) => "int",
            Value::Bool(_) => "bool",
            Value::String(_) => "string",
            Value::Object(_) => "object",
        }
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::Undefined
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => f.write_str("undefined"),
            Value::Null => f.write_str("null"),
            Value::Int(v) => write!(f, "{}", v),
            Value::Bool(v) => write!(f, "{}", v),
            Value::String(v) => f.write_str(v),
            Value::Object(_) => f.write_str("[object]"),
        }
    }
}

/// Heap-allocated object. Functions refer to their declaration inside the
/// program, natives refer to a callback registered with the interpreter.
#[derive(Debug, Clone)]
pub enum Object {
    PlainObject(HashMap<String, Value>),
    Array(Vec<Value>),
    Function(FunctionObject),
    NativeFunction(NativeFunctionObject),
}

#[derive(Debug, Clone)]
pub struct FunctionObject {
    pub declaration: FunctionDeclarationId,
}

#[derive(Debug, Clone)]
pub struct NativeFunctionObject {
    pub name: String,
    pub index: usize,
}

impl Object {
    pub fn type_name(&self) -> &'static str {
        match self {
            Object::PlainObject(_) => "plain object",
            Object::Array(_) => "array",
            Object::Function(_) => "function",
            Object::NativeFunction(_) => "native function",
        }
    }
}
