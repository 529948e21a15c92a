use std::io;

use thiserror::Error;

use crate::ast::{Identifier, Node};
use crate::lexer::LexError;
use crate::parser::ParseError;
use crate::value::Type;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("failed to read source: {0}")]
    SourceIo(#[from] io::Error),
    #[error("lex error: {0}")]
    Lex(#[from] LexError),
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),
    #[error("runtime error: {0}")]
    Runtime(#[from] RuntimeError),
}

/// Evaluation failures. Variants that stem from a particular place in the
/// program carry the node the evaluator was looking at.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("unknown type \"{name}\"")]
    UnknownType { name: String },
    #[error("unknown identifier \"{name}\"")]
    UnknownIdentifier {
        name: String,
        node: Option<Identifier>,
    },
    #[error("unknown operator {symbol} for operands ({}){}", type_list(.operands), location(.node))]
    UnknownOperator {
        symbol: String,
        operands: Vec<Type>,
        node: Option<Box<Node>>,
    },
    #[error("cannot assign {actual} to \"{name}\" declared as {expected}")]
    InvalidType {
        name: String,
        expected: Type,
        actual: Type,
        node: Option<Identifier>,
    },
    #[error("\"{name}\" is already defined")]
    AlreadyDefined { name: String },
    #[error("declaration must have at most one value, got {count}")]
    TooManyInitializers { count: usize },
    #[error("assignment must have exactly one value, got {count}")]
    AssignmentArity { count: usize },
    #[error("group must have exactly one child, got {count}")]
    GroupArity { count: usize },
    #[error("if condition must evaluate to boolean, got {actual}")]
    NonBooleanCondition { actual: Type },
    #[error("invalid operands: {operation} requires {expected}")]
    InvalidOperands {
        operation: String,
        expected: String,
    },
    #[error("failed to write output: {0}")]
    Output(#[from] io::Error),
    /// Broken evaluator invariant. Never caused by a well-formed tree.
    #[error("internal evaluator error: {0}")]
    Internal(String),
}

impl RuntimeError {
    /// Attaches the referencing identifier to lookup and assignment errors.
    pub fn with_identifier(self, identifier: &Identifier) -> Self {
        match self {
            RuntimeError::UnknownIdentifier { name, .. } => RuntimeError::UnknownIdentifier {
                name,
                node: Some(identifier.clone()),
            },
            RuntimeError::InvalidType {
                name,
                expected,
                actual,
                ..
            } => RuntimeError::InvalidType {
                name,
                expected,
                actual,
                node: Some(identifier.clone()),
            },
            other => other,
        }
    }

    /// Attaches the operator expression to an unknown operator error.
    pub fn with_node(self, node: &Node) -> Self {
        match self {
            RuntimeError::UnknownOperator {
                symbol, operands, ..
            } => RuntimeError::UnknownOperator {
                symbol,
                operands,
                node: Some(Box::new(node.clone())),
            },
            other => other,
        }
    }
}

fn type_list(types: &[Type]) -> String {
    types
        .iter()
        .map(Type::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

fn location(node: &Option<Box<Node>>) -> String {
    match node {
        Some(node) => format!(" in `{node}`"),
        None => String::new(),
    }
}
