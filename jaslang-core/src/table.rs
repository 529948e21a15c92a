//! Symbol and type table consulted by the evaluator.
//!
//! Operators are keyed by symbol plus the exact ordered operand types. There
//! is no promotion or coercion: `number + number` and `string + string` are
//! two separate entries under `+`.

use std::collections::HashMap;
use std::rc::Rc;

use crate::error::RuntimeError;
use crate::natives;
use crate::value::{Invokable, Type, Value};

/// A declared variable. `value` is `Void` until first assigned.
#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    pub ty: Type,
    pub value: Value,
}

#[derive(Default)]
pub struct Table {
    types: HashMap<String, Type>,
    functions: HashMap<String, Rc<dyn Invokable>>,
    operators: HashMap<String, HashMap<Vec<Type>, Rc<dyn Invokable>>>,
    variables: HashMap<String, Binding>,
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    /// A table with the built-in types, `println` and the native operators.
    pub fn with_builtins() -> Self {
        let mut table = Table::new();
        natives::install(&mut table);
        table
    }

    pub fn add_type(&mut self, name: impl Into<String>, ty: Type) {
        self.types.insert(name.into(), ty);
    }

    pub fn add_function(&mut self, name: impl Into<String>, invokable: impl Invokable + 'static) {
        self.functions.insert(name.into(), Rc::new(invokable));
    }

    pub fn add_operator(
        &mut self,
        symbol: impl Into<String>,
        operands: &[Type],
        invokable: impl Invokable + 'static,
    ) {
        self.operators
            .entry(symbol.into())
            .or_default()
            .insert(operands.to_vec(), Rc::new(invokable));
    }

    pub fn ty(&self, name: &str) -> Result<Type, RuntimeError> {
        self.types
            .get(name)
            .copied()
            .ok_or_else(|| RuntimeError::UnknownType {
                name: name.to_string(),
            })
    }

    pub fn invokable(&self, name: &str) -> Result<Rc<dyn Invokable>, RuntimeError> {
        self.functions
            .get(name)
            .cloned()
            .ok_or_else(|| unknown_identifier(name))
    }

    /// Exact-match operator lookup.
    pub fn operator(&self, symbol: &str, operands: &[Type]) -> Result<Rc<dyn Invokable>, RuntimeError> {
        self.operators
            .get(symbol)
            .and_then(|overloads| overloads.get(operands))
            .cloned()
            .ok_or_else(|| RuntimeError::UnknownOperator {
                symbol: symbol.to_string(),
                operands: operands.to_vec(),
                node: None,
            })
    }

    pub fn define(&mut self, name: &str, ty: Type) -> Result<(), RuntimeError> {
        if self.variables.contains_key(name) {
            return Err(RuntimeError::AlreadyDefined {
                name: name.to_string(),
            });
        }
        self.variables.insert(
            name.to_string(),
            Binding {
                ty,
                value: Value::Void,
            },
        );
        Ok(())
    }

    pub fn set(&mut self, name: &str, value: Value) -> Result<(), RuntimeError> {
        let binding = self
            .variables
            .get_mut(name)
            .ok_or_else(|| unknown_identifier(name))?;

        if value.ty() != binding.ty {
            return Err(RuntimeError::InvalidType {
                name: name.to_string(),
                expected: binding.ty,
                actual: value.ty(),
                node: None,
            });
        }

        binding.value = value;
        Ok(())
    }

    pub fn get(&self, name: &str) -> Result<Value, RuntimeError> {
        self.variables
            .get(name)
            .map(|binding| binding.value.clone())
            .ok_or_else(|| unknown_identifier(name))
    }

    pub fn binding(&self, name: &str) -> Option<&Binding> {
        self.variables.get(name)
    }
}

fn unknown_identifier(name: &str) -> RuntimeError {
    RuntimeError::UnknownIdentifier {
        name: name.to_string(),
        node: None,
    }
}
