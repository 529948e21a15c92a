//! Built-in functions and operators.
//!
//! Each native checks its own arguments even though the table only hands it
//! operands of the registered types; a mismatch is reported as
//! [`RuntimeError::InvalidOperands`] instead of panicking.

use std::io::Write;

use crate::error::RuntimeError;
use crate::table::Table;
use crate::value::{Context, Invokable, Type, Value};

pub type NativeFn = fn(&mut Context<'_>, &[Value]) -> Result<Value, RuntimeError>;

/// A fixed-arity function implemented in Rust.
#[derive(Debug, Clone, Copy)]
pub struct Native {
    name: &'static str,
    arity: usize,
    function: NativeFn,
}

impl Native {
    pub const fn new(name: &'static str, arity: usize, function: NativeFn) -> Self {
        Native {
            name,
            arity,
            function,
        }
    }
}

impl Invokable for Native {
    fn name(&self) -> &str {
        self.name
    }

    fn invoke(&self, context: &mut Context<'_>, args: &[Value]) -> Result<Value, RuntimeError> {
        if args.len() != self.arity {
            return Err(RuntimeError::InvalidOperands {
                operation: self.name.to_string(),
                expected: format!("{} argument(s), got {}", self.arity, args.len()),
            });
        }
        (self.function)(context, args)
    }
}

const NUMBERS: &[Type] = &[Type::Number, Type::Number];
const STRINGS: &[Type] = &[Type::String, Type::String];
const BOOLEANS: &[Type] = &[Type::Boolean, Type::Boolean];

/// Registers the built-in types, functions and operators.
pub fn install(table: &mut Table) {
    table.add_type("string", Type::String);
    table.add_type("boolean", Type::Boolean);
    table.add_type("number", Type::Number);

    table.add_function("println", Native::new("println", 1, println));

    table.add_operator("+", NUMBERS, Native::new("addition", 2, add_numbers));
    table.add_operator("-", NUMBERS, Native::new("subtraction", 2, subtract_numbers));
    table.add_operator("*", NUMBERS, Native::new("multiplication", 2, multiply_numbers));
    table.add_operator("/", NUMBERS, Native::new("division", 2, divide_numbers));
    table.add_operator("+", STRINGS, Native::new("concatenation", 2, concatenate_strings));
    table.add_operator("&&", BOOLEANS, Native::new("logical and", 2, logic_and));
    table.add_operator("||", BOOLEANS, Native::new("logical or", 2, logic_or));
    table.add_operator("==", NUMBERS, Native::new("equality", 2, equality));
    table.add_operator("<", NUMBERS, Native::new("less than", 2, less_than));
    table.add_operator(">", NUMBERS, Native::new("greater than", 2, greater_than));
}

fn invalid(operation: &str, expected: &str) -> RuntimeError {
    RuntimeError::InvalidOperands {
        operation: operation.to_string(),
        expected: expected.to_string(),
    }
}

fn numbers(args: &[Value], operation: &str) -> Result<(f64, f64), RuntimeError> {
    match args {
        [Value::Number(left), Value::Number(right)] => Ok((*left, *right)),
        _ => Err(invalid(operation, "two numbers")),
    }
}

fn booleans(args: &[Value], operation: &str) -> Result<(bool, bool), RuntimeError> {
    match args {
        [Value::Boolean(left), Value::Boolean(right)] => Ok((*left, *right)),
        _ => Err(invalid(operation, "two booleans")),
    }
}

fn println(context: &mut Context<'_>, args: &[Value]) -> Result<Value, RuntimeError> {
    for arg in args {
        writeln!(context.output, "{arg}")?;
    }
    Ok(Value::Void)
}

fn add_numbers(_: &mut Context<'_>, args: &[Value]) -> Result<Value, RuntimeError> {
    let (left, right) = numbers(args, "number addition")?;
    Ok(Value::Number(left + right))
}

fn subtract_numbers(_: &mut Context<'_>, args: &[Value]) -> Result<Value, RuntimeError> {
    let (left, right) = numbers(args, "subtraction")?;
    Ok(Value::Number(left - right))
}

fn multiply_numbers(_: &mut Context<'_>, args: &[Value]) -> Result<Value, RuntimeError> {
    let (left, right) = numbers(args, "multiplication")?;
    Ok(Value::Number(left * right))
}

// IEEE semantics: dividing by zero yields an infinity or NaN.
fn divide_numbers(_: &mut Context<'_>, args: &[Value]) -> Result<Value, RuntimeError> {
    let (left, right) = numbers(args, "division")?;
    Ok(Value::Number(left / right))
}

fn concatenate_strings(_: &mut Context<'_>, args: &[Value]) -> Result<Value, RuntimeError> {
    match args {
        [Value::String(left), Value::String(right)] => Ok(Value::String(format!("{left}{right}"))),
        _ => Err(invalid("string concatenation", "two strings")),
    }
}

fn logic_and(_: &mut Context<'_>, args: &[Value]) -> Result<Value, RuntimeError> {
    let (left, right) = booleans(args, "logical and")?;
    Ok(Value::Boolean(left && right))
}

fn logic_or(_: &mut Context<'_>, args: &[Value]) -> Result<Value, RuntimeError> {
    let (left, right) = booleans(args, "logical or")?;
    Ok(Value::Boolean(left || right))
}

fn equality(_: &mut Context<'_>, args: &[Value]) -> Result<Value, RuntimeError> {
    let (left, right) = numbers(args, "equality")?;
    Ok(Value::Boolean(left == right))
}

fn less_than(_: &mut Context<'_>, args: &[Value]) -> Result<Value, RuntimeError> {
    let (left, right) = numbers(args, "less than")?;
    Ok(Value::Boolean(left < right))
}

fn greater_than(_: &mut Context<'_>, args: &[Value]) -> Result<Value, RuntimeError> {
    let (left, right) = numbers(args, "greater than")?;
    Ok(Value::Boolean(left > right))
}
