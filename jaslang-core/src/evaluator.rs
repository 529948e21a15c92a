//! Tree-walking evaluator.
//!
//! The walk is iterative: a task stack replaces the call stack and a value
//! stack collects child results, so nesting depth never grows the native
//! stack. Containers evaluate their children left to right and then reduce
//! them into one value; `if` evaluates only its condition until it knows
//! whether the body runs.

use std::io::{Read, Write};

use crate::ast::{Assignment, FunctionCall, Identifier, If, Let, Node, Operator, Root, Statement};
use crate::error::RuntimeError;
use crate::table::Table;
use crate::value::{Context, Type, Value};

#[derive(Clone, Copy)]
enum Tree<'a> {
    Root(&'a Root),
    Statement(&'a Statement),
    Node(&'a Node),
}

enum Task<'a> {
    Visit(Tree<'a>),
    /// Pops `usize` child results and reduces them for this tree.
    Reduce(Tree<'a>, usize),
    /// Condition result is on top of the value stack.
    Branch(&'a If),
    /// Drops body results above the mark and leaves `Void`.
    Settle(usize),
}

pub struct Evaluator<R, W, E> {
    table: Table,
    input: R,
    output: W,
    error: E,
}

impl<R: Read, W: Write, E: Write> Evaluator<R, W, E> {
    /// An evaluator with the built-in table.
    pub fn new(input: R, output: W, error: E) -> Self {
        Self::with_table(Table::with_builtins(), input, output, error)
    }

    pub fn with_table(table: Table, input: R, output: W, error: E) -> Self {
        Evaluator {
            table,
            input,
            output,
            error,
        }
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn into_streams(self) -> (R, W, E) {
        (self.input, self.output, self.error)
    }

    /// Runs a whole program, stopping at the first error.
    pub fn evaluate(&mut self, root: &Root) -> Result<(), RuntimeError> {
        self.walk(Tree::Root(root)).map(|_| ())
    }

    /// Evaluates a single node and returns its value.
    pub fn evaluate_node(&mut self, node: &Node) -> Result<Value, RuntimeError> {
        self.walk(Tree::Node(node))
    }

    fn walk(&mut self, tree: Tree<'_>) -> Result<Value, RuntimeError> {
        let mut tasks = vec![Task::Visit(tree)];
        let mut values: Vec<Value> = Vec::new();

        while let Some(task) = tasks.pop() {
            match task {
                Task::Visit(Tree::Node(Node::If(branch))) => {
                    tasks.push(Task::Branch(branch));
                    tasks.push(Task::Visit(Tree::Node(&branch.condition)));
                }
                Task::Visit(tree) => {
                    // Reduction sits below the children so it runs once they finish.
                    let reduce_at = tasks.len();
                    tasks.push(Task::Reduce(tree, 0));
                    let count = push_children(&mut tasks, tree);
                    tasks[reduce_at] = Task::Reduce(tree, count);
                }
                Task::Reduce(tree, count) => {
                    let split = values.len().checked_sub(count).ok_or_else(|| {
                        RuntimeError::Internal(format!(
                            "expected {count} child values, found {}",
                            values.len()
                        ))
                    })?;
                    let args = values.split_off(split);
                    let value = self.reduce(tree, args)?;
                    values.push(value);
                }
                Task::Branch(branch) => match values.pop() {
                    Some(Value::Boolean(true)) => {
                        tasks.push(Task::Settle(values.len()));
                        for child in branch.body.iter().rev() {
                            tasks.push(Task::Visit(Tree::Node(child)));
                        }
                    }
                    Some(Value::Boolean(false)) => values.push(Value::Void),
                    Some(other) => {
                        return Err(RuntimeError::NonBooleanCondition { actual: other.ty() });
                    }
                    None => {
                        return Err(RuntimeError::Internal("missing if condition value".to_string()));
                    }
                },
                Task::Settle(mark) => {
                    values.truncate(mark);
                    values.push(Value::Void);
                }
            }
        }

        match (values.pop(), values.is_empty()) {
            (Some(value), true) => Ok(value),
            _ => Err(RuntimeError::Internal(
                "evaluation did not settle on a single value".to_string(),
            )),
        }
    }

    fn reduce(&mut self, tree: Tree<'_>, args: Vec<Value>) -> Result<Value, RuntimeError> {
        let node = match tree {
            Tree::Root(_) | Tree::Statement(_) => return Ok(Value::Void),
            Tree::Node(node) => node,
        };

        match node {
            Node::Statement(_) => Ok(Value::Void),
            Node::StringLiteral(value) => Ok(Value::String(value.clone())),
            Node::NumberLiteral(value) => Ok(Value::Number(*value)),
            Node::BooleanLiteral(value) => Ok(Value::Boolean(*value)),
            Node::FunctionCall(call) => self.call_function(call, &args),
            Node::Operator(operator) => self.apply_operator(node, operator, &args),
            Node::Let(declaration) => self.declare(declaration, args),
            Node::Identifier(identifier) => self
                .table
                .get(&identifier.name)
                .map_err(|err| err.with_identifier(identifier)),
            Node::Assignment(assignment) => self.assign(assignment, args),
            Node::Group(_) => single(args).map_err(|count| RuntimeError::GroupArity { count }),
            Node::If(_) => Err(RuntimeError::Internal(
                "if reached reduction instead of branching".to_string(),
            )),
        }
    }

    fn call_function(&mut self, call: &FunctionCall, args: &[Value]) -> Result<Value, RuntimeError> {
        let invokable = self
            .table
            .invokable(&call.identifier)
            .map_err(|err| err.with_identifier(&Identifier::new(call.identifier.as_str())))?;
        invokable.invoke(&mut self.context(), args)
    }

    fn apply_operator(
        &mut self,
        node: &Node,
        operator: &Operator,
        args: &[Value],
    ) -> Result<Value, RuntimeError> {
        let operands: Vec<Type> = args.iter().map(Value::ty).collect();
        let invokable = self
            .table
            .operator(&operator.symbol, &operands)
            .map_err(|err| err.with_node(node))?;
        invokable.invoke(&mut self.context(), args)
    }

    fn declare(&mut self, declaration: &Let, args: Vec<Value>) -> Result<Value, RuntimeError> {
        if args.len() > 1 {
            return Err(RuntimeError::TooManyInitializers { count: args.len() });
        }

        let ty = self.table.ty(&declaration.ty.name)?;
        self.table.define(&declaration.target.name, ty)?;

        if let Some(value) = args.into_iter().next() {
            self.table
                .set(&declaration.target.name, value)
                .map_err(|err| err.with_identifier(&declaration.target))?;
        }

        Ok(Value::Void)
    }

    fn assign(&mut self, assignment: &Assignment, args: Vec<Value>) -> Result<Value, RuntimeError> {
        let value = single(args).map_err(|count| RuntimeError::AssignmentArity { count })?;
        self.table
            .set(&assignment.target.name, value)
            .map_err(|err| err.with_identifier(&assignment.target))?;
        Ok(Value::Void)
    }

    fn context(&mut self) -> Context<'_> {
        Context {
            input: &mut self.input,
            output: &mut self.output,
            error: &mut self.error,
        }
    }
}

/// Pushes visit tasks for `tree`'s children in reverse, returning how many.
fn push_children<'a>(tasks: &mut Vec<Task<'a>>, tree: Tree<'a>) -> usize {
    match tree {
        Tree::Root(root) => {
            for statement in root.statements.iter().rev() {
                tasks.push(Task::Visit(Tree::Statement(statement)));
            }
            root.statements.len()
        }
        Tree::Statement(statement) => push_nodes(tasks, &statement.children),
        Tree::Node(node) => push_nodes(tasks, node.children()),
    }
}

fn push_nodes<'a>(tasks: &mut Vec<Task<'a>>, nodes: &'a [Node]) -> usize {
    for node in nodes.iter().rev() {
        tasks.push(Task::Visit(Tree::Node(node)));
    }
    nodes.len()
}

/// The only value in `args`, or the actual count.
fn single(args: Vec<Value>) -> Result<Value, usize> {
    let count = args.len();
    let mut args = args.into_iter();
    match (args.next(), args.next()) {
        (Some(value), None) => Ok(value),
        _ => Err(count),
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use super::*;
    use crate::ast::Identifier;
    use crate::lexer::Lexer;
    use crate::parser::Parser;

    type TestEvaluator = Evaluator<io::Empty, Vec<u8>, Vec<u8>>;

    fn evaluator() -> TestEvaluator {
        Evaluator::new(io::empty(), Vec::new(), Vec::new())
    }

    fn output(evaluator: TestEvaluator) -> String {
        let (_, output, _) = evaluator.into_streams();
        String::from_utf8(output).expect("utf8")
    }

    fn program(nodes: Vec<Node>) -> Root {
        Root {
            statements: nodes
                .into_iter()
                .map(|node| Statement {
                    children: vec![node],
                })
                .collect(),
        }
    }

    fn println(node: Node) -> Node {
        Node::call("println", vec![node])
    }

    #[test]
    fn runs_parsed_program() {
        let root = Parser::new(Lexer::new("println(\"Hello, world!\"); 1; true;"))
            .parse()
            .expect("parse");
        let mut evaluator = evaluator();

        evaluator.evaluate(&root).expect("evaluate");
        assert_eq!(output(evaluator), "Hello, world!\n");
    }

    #[test]
    fn declaration_with_initializer() {
        let mut evaluator = evaluator();
        let declaration = Node::declare(
            "x",
            "number",
            Some(Node::binary(Node::number(1.0), "+", Node::number(2.0))),
        );

        assert_eq!(evaluator.evaluate_node(&declaration).expect("let"), Value::Void);
        assert_eq!(
            evaluator.evaluate_node(&Node::identifier("x")).expect("x"),
            Value::Number(3.0)
        );
    }

    #[test]
    fn program_statements_share_the_table() {
        let mut evaluator = evaluator();
        let root = program(vec![
            Node::declare("greeting", "string", Some(Node::string("hi"))),
            Node::assign(
                "greeting",
                Node::binary(Node::identifier("greeting"), "+", Node::string(" there")),
            ),
            println(Node::identifier("greeting")),
        ]);

        evaluator.evaluate(&root).expect("evaluate");
        assert_eq!(output(evaluator), "hi there\n");
    }

    #[test]
    fn undeclared_identifier_carries_node() {
        let mut evaluator = evaluator();
        let err = evaluator
            .evaluate_node(&Node::identifier("missing"))
            .unwrap_err();

        assert!(matches!(
            err,
            RuntimeError::UnknownIdentifier { ref name, node: Some(ref id) }
                if name == "missing" && id == &Identifier::new("missing")
        ));
    }

    #[test]
    fn mismatched_operands_are_unknown_operator() {
        let mut evaluator = evaluator();
        let expression = Node::binary(Node::number(1.0), "+", Node::string("a"));
        let err = evaluator.evaluate_node(&expression).unwrap_err();

        match err {
            RuntimeError::UnknownOperator {
                symbol,
                operands,
                node,
            } => {
                assert_eq!(symbol, "+");
                assert_eq!(operands, vec![Type::Number, Type::String]);
                assert_eq!(node.as_deref(), Some(&expression));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn operators_nest() {
        let mut evaluator = evaluator();
        // (2 * 3) - 4 / 8 > 5 && true
        let expression = Node::binary(
            Node::binary(
                Node::binary(
                    Node::group(Node::binary(Node::number(2.0), "*", Node::number(3.0))),
                    "-",
                    Node::binary(Node::number(4.0), "/", Node::number(8.0)),
                ),
                ">",
                Node::number(5.0),
            ),
            "&&",
            Node::boolean(true),
        );

        assert_eq!(
            evaluator.evaluate_node(&expression).expect("evaluate"),
            Value::Boolean(true)
        );
    }

    #[test]
    fn true_condition_runs_body() {
        let mut evaluator = evaluator();
        let root = program(vec![Node::when(
            Node::group(Node::binary(Node::number(1.0), "<", Node::number(2.0))),
            vec![println(Node::string("yes"))],
        )]);

        evaluator.evaluate(&root).expect("evaluate");
        assert_eq!(output(evaluator), "yes\n");
    }

    #[test]
    fn false_condition_skips_body() {
        let mut evaluator = evaluator();
        let root = program(vec![Node::when(
            Node::binary(Node::number(2.0), "<", Node::number(1.0)),
            vec![
                println(Node::string("no")),
                Node::identifier("never_declared"),
            ],
        )]);

        evaluator.evaluate(&root).expect("evaluate");
        assert_eq!(output(evaluator), "");
    }

    #[test]
    fn if_yields_void() {
        let mut evaluator = evaluator();
        let branch = Node::when(Node::boolean(true), vec![Node::number(1.0), Node::number(2.0)]);
        assert_eq!(evaluator.evaluate_node(&branch).expect("if"), Value::Void);
    }

    #[test]
    fn if_body_stops_at_first_error() {
        let mut evaluator = evaluator();
        let root = program(vec![Node::when(
            Node::boolean(true),
            vec![
                println(Node::string("before")),
                Node::identifier("missing"),
                println(Node::string("after")),
            ],
        )]);

        let err = evaluator.evaluate(&root).unwrap_err();
        assert!(matches!(err, RuntimeError::UnknownIdentifier { .. }));
        assert_eq!(output(evaluator), "before\n");
    }

    #[test]
    fn condition_must_be_boolean() {
        let mut evaluator = evaluator();
        let branch = Node::when(Node::number(1.0), vec![println(Node::string("x"))]);
        let err = evaluator.evaluate_node(&branch).unwrap_err();

        assert!(matches!(
            err,
            RuntimeError::NonBooleanCondition {
                actual: Type::Number
            }
        ));
        assert_eq!(output(evaluator), "");
    }

    #[test]
    fn assignment_is_type_checked() {
        let mut evaluator = evaluator();
        evaluator
            .evaluate_node(&Node::declare("flag", "boolean", None))
            .expect("declare");

        let err = evaluator
            .evaluate_node(&Node::assign("flag", Node::number(1.0)))
            .unwrap_err();
        assert!(matches!(
            err,
            RuntimeError::InvalidType { node: Some(ref id), .. } if id.name == "flag"
        ));

        let err = evaluator
            .evaluate_node(&Node::assign("other", Node::boolean(true)))
            .unwrap_err();
        assert!(matches!(
            err,
            RuntimeError::UnknownIdentifier { node: Some(ref id), .. } if id.name == "other"
        ));
    }

    #[test]
    fn declaration_rejects_several_values() {
        let mut evaluator = evaluator();
        let mut declaration = Node::declare("x", "number", Some(Node::number(1.0)));
        declaration.push_child(Node::number(2.0)).expect("push");

        let err = evaluator.evaluate_node(&declaration).unwrap_err();
        assert!(matches!(err, RuntimeError::TooManyInitializers { count: 2 }));
        assert!(evaluator.table().binding("x").is_none());
    }

    #[test]
    fn declaration_needs_known_type_and_fresh_name() {
        let mut evaluator = evaluator();
        let err = evaluator
            .evaluate_node(&Node::declare("x", "integer", None))
            .unwrap_err();
        assert!(matches!(err, RuntimeError::UnknownType { .. }));

        evaluator
            .evaluate_node(&Node::declare("x", "number", None))
            .expect("declare");
        let err = evaluator
            .evaluate_node(&Node::declare("x", "number", None))
            .unwrap_err();
        assert!(matches!(err, RuntimeError::AlreadyDefined { .. }));
    }

    #[test]
    fn group_and_assignment_arity() {
        let mut evaluator = evaluator();

        let mut group = Node::group(Node::number(1.0));
        group.push_child(Node::number(2.0)).expect("push");
        assert!(matches!(
            evaluator.evaluate_node(&group),
            Err(RuntimeError::GroupArity { count: 2 })
        ));

        evaluator
            .evaluate_node(&Node::declare("x", "number", None))
            .expect("declare");
        let mut assignment = Node::assign("x", Node::number(1.0));
        assignment.push_child(Node::number(2.0)).expect("push");
        assert!(matches!(
            evaluator.evaluate_node(&assignment),
            Err(RuntimeError::AssignmentArity { count: 2 })
        ));
    }

    #[test]
    fn unknown_function_fails_before_output() {
        let mut evaluator = evaluator();
        let root = program(vec![
            Node::call("print", vec![Node::string("x")]),
            println(Node::string("unreached")),
        ]);

        let err = evaluator.evaluate(&root).unwrap_err();
        assert!(matches!(
            err,
            RuntimeError::UnknownIdentifier { ref name, node: Some(ref id) }
                if name == "print" && id == &Identifier::new("print")
        ));
        assert_eq!(output(evaluator), "");
    }

    #[test]
    fn deep_nesting_does_not_recurse() {
        let mut evaluator = evaluator();
        let mut expression = Node::number(0.0);
        for _ in 0..100_000 {
            expression = Node::group(expression);
        }

        assert_eq!(
            evaluator.evaluate_node(&expression).expect("evaluate"),
            Value::Number(0.0)
        );
        // Dropping a deeply nested tree recurses, so unwind it by hand.
        while let Node::Group(mut group) = expression {
            expression = group.children.pop().unwrap_or(Node::number(0.0));
        }
    }
}
