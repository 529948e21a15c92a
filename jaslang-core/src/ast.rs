//! Syntax tree for jaslang programs.
//!
//! Every container owns its children outright. [`Root`] is the parse result
//! and owns one [`Statement`] per terminated statement.

use std::fmt;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Root {
    pub statements: Vec<Statement>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Statement {
    pub children: Vec<Node>,
}

/// A named reference: a variable, a callee or a type name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identifier {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionCall {
    pub identifier: String,
    pub arguments: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Operator {
    pub symbol: String,
    pub operands: Vec<Node>,
}

/// `let target: ty = initializer;`
#[derive(Debug, Clone, PartialEq)]
pub struct Let {
    pub ty: Identifier,
    pub target: Identifier,
    pub initializer: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub target: Identifier,
    pub value: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    pub children: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct If {
    pub condition: Box<Node>,
    pub body: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Statement(Statement),
    FunctionCall(FunctionCall),
    StringLiteral(String),
    NumberLiteral(f64),
    BooleanLiteral(bool),
    Operator(Operator),
    Let(Let),
    Identifier(Identifier),
    Assignment(Assignment),
    Group(Group),
    If(If),
}

impl Identifier {
    pub fn new(name: impl Into<String>) -> Self {
        Identifier { name: name.into() }
    }
}

impl Node {
    pub fn string(value: impl Into<String>) -> Node {
        Node::StringLiteral(value.into())
    }

    pub fn number(value: f64) -> Node {
        Node::NumberLiteral(value)
    }

    pub fn boolean(value: bool) -> Node {
        Node::BooleanLiteral(value)
    }

    pub fn identifier(name: impl Into<String>) -> Node {
        Node::Identifier(Identifier::new(name))
    }

    pub fn call(identifier: impl Into<String>, arguments: Vec<Node>) -> Node {
        Node::FunctionCall(FunctionCall {
            identifier: identifier.into(),
            arguments,
        })
    }

    pub fn operator(symbol: impl Into<String>, operands: Vec<Node>) -> Node {
        Node::Operator(Operator {
            symbol: symbol.into(),
            operands,
        })
    }

    pub fn binary(left: Node, symbol: impl Into<String>, right: Node) -> Node {
        Node::operator(symbol, vec![left, right])
    }

    pub fn declare(target: impl Into<String>, ty: impl Into<String>, initializer: Option<Node>) -> Node {
        Node::Let(Let {
            ty: Identifier::new(ty),
            target: Identifier::new(target),
            initializer: initializer.into_iter().collect(),
        })
    }

    pub fn assign(target: impl Into<String>, value: Node) -> Node {
        Node::Assignment(Assignment {
            target: Identifier::new(target),
            value: vec![value],
        })
    }

    pub fn group(inner: Node) -> Node {
        Node::Group(Group {
            children: vec![inner],
        })
    }

    pub fn when(condition: Node, body: Vec<Node>) -> Node {
        Node::If(If {
            condition: Box::new(condition),
            body,
        })
    }

    /// Whether this node takes children, i.e. opens a parser scope.
    pub fn is_container(&self) -> bool {
        !matches!(
            self,
            Node::StringLiteral(_)
                | Node::NumberLiteral(_)
                | Node::BooleanLiteral(_)
                | Node::Identifier(_)
        )
    }

    /// Children evaluated as arguments, in order. For `If` this is the body.
    pub fn children(&self) -> &[Node] {
        match self {
            Node::Statement(statement) => &statement.children,
            Node::FunctionCall(call) => &call.arguments,
            Node::Operator(operator) => &operator.operands,
            Node::Let(declaration) => &declaration.initializer,
            Node::Assignment(assignment) => &assignment.value,
            Node::Group(group) => &group.children,
            Node::If(branch) => &branch.body,
            Node::StringLiteral(_)
            | Node::NumberLiteral(_)
            | Node::BooleanLiteral(_)
            | Node::Identifier(_) => &[],
        }
    }

    /// Appends `child`, returning it back if this node is a leaf.
    pub fn push_child(&mut self, child: Node) -> Result<(), Node> {
        match self {
            Node::Statement(statement) => statement.children.push(child),
            Node::FunctionCall(call) => call.arguments.push(child),
            Node::Operator(operator) => operator.operands.push(child),
            Node::Let(declaration) => declaration.initializer.push(child),
            Node::Assignment(assignment) => assignment.value.push(child),
            Node::Group(group) => group.children.push(child),
            Node::If(branch) => branch.body.push(child),
            Node::StringLiteral(_)
            | Node::NumberLiteral(_)
            | Node::BooleanLiteral(_)
            | Node::Identifier(_) => return Err(child),
        }
        Ok(())
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Renders nodes back in source-like form for diagnostics.
impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Statement(statement) => write_joined(f, &statement.children, " "),
            Node::FunctionCall(call) => {
                write!(f, "{}(", call.identifier)?;
                write_joined(f, &call.arguments, ", ")?;
                f.write_str(")")
            }
            Node::StringLiteral(value) => write!(f, "{value:?}"),
            Node::NumberLiteral(value) => write!(f, "{value}"),
            Node::BooleanLiteral(value) => write!(f, "{value}"),
            Node::Operator(operator) => match operator.operands.as_slice() {
                [left, right] => write!(f, "{left} {} {right}", operator.symbol),
                operands => {
                    write!(f, "{}(", operator.symbol)?;
                    write_joined(f, operands, ", ")?;
                    f.write_str(")")
                }
            },
            Node::Let(declaration) => {
                write!(f, "let {}: {}", declaration.target, declaration.ty)?;
                if !declaration.initializer.is_empty() {
                    f.write_str(" = ")?;
                    write_joined(f, &declaration.initializer, ", ")?;
                }
                Ok(())
            }
            Node::Identifier(identifier) => write!(f, "{identifier}"),
            Node::Assignment(assignment) => {
                write!(f, "{} = ", assignment.target)?;
                write_joined(f, &assignment.value, ", ")
            }
            Node::Group(group) => {
                f.write_str("(")?;
                write_joined(f, &group.children, ", ")?;
                f.write_str(")")
            }
            Node::If(branch) => {
                write!(f, "if ({}) {{ ", branch.condition)?;
                for child in &branch.body {
                    write!(f, "{child}; ")?;
                }
                f.write_str("}")
            }
        }
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, nodes: &[Node], separator: &str) -> fmt::Result {
    for (index, node) in nodes.iter().enumerate() {
        if index > 0 {
            f.write_str(separator)?;
        }
        write!(f, "{node}")?;
    }
    Ok(())
}
