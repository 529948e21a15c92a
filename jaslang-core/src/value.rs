//! Runtime values and the invokable seam shared by functions and operators.

use std::fmt;
use std::io::{Read, Write};
use std::rc::Rc;

use crate::error::RuntimeError;

/// Type identity used for declarations and operator signatures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Type {
    Number,
    String,
    Boolean,
    Invokable,
    /// Type of the absence value.
    Void,
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Type::Number => "number",
            Type::String => "string",
            Type::Boolean => "boolean",
            Type::Invokable => "invokable",
            Type::Void => "void",
        };
        f.write_str(name)
    }
}

/// Streams available to native code while it runs.
pub struct Context<'a> {
    pub input: &'a mut dyn Read,
    pub output: &'a mut dyn Write,
    pub error: &'a mut dyn Write,
}

/// Anything callable with an ordered argument list.
pub trait Invokable {
    fn name(&self) -> &str;

    fn invoke(&self, context: &mut Context<'_>, args: &[Value]) -> Result<Value, RuntimeError>;
}

/// A runtime value. Operations always build new values.
#[derive(Clone)]
pub enum Value {
    Number(f64),
    String(String),
    Boolean(bool),
    Invokable(Rc<dyn Invokable>),
    /// Produced by constructs that yield nothing: statements, declarations,
    /// assignments, calls without a result and untaken `if` branches.
    Void,
}

impl Value {
    pub fn ty(&self) -> Type {
        match self {
            Value::Number(_) => Type::Number,
            Value::String(_) => Type::String,
            Value::Boolean(_) => Type::Boolean,
            Value::Invokable(_) => Type::Invokable,
            Value::Void => Type::Void,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Invokable(a), Value::Invokable(b)) => Rc::ptr_eq(a, b),
            (Value::Void, Value::Void) => true,
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(value) => f.debug_tuple("Number").field(value).finish(),
            Value::String(value) => f.debug_tuple("String").field(value).finish(),
            Value::Boolean(value) => f.debug_tuple("Boolean").field(value).finish(),
            Value::Invokable(invokable) => f.debug_tuple("Invokable").field(&invokable.name()).finish(),
            Value::Void => f.write_str("Void"),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(value) => write!(f, "{value}"),
            Value::String(value) => f.write_str(value),
            Value::Boolean(value) => write!(f, "{value}"),
            Value::Invokable(invokable) => write!(f, "{} <native>", invokable.name()),
            Value::Void => f.write_str("void"),
        }
    }
}
