//! Token-driven parser built on [`crate::fsm`].
//!
//! Token kinds double as automaton states, plus a virtual start state:
//!
//! ```text
//! start      -> identifier | literal
//! identifier -> '(' -> string -> ')' -> ';'
//! literal    -> ';'
//! ';'        -> identifier | literal
//! ```
//!
//! Entry hooks build the tree on an explicit frame stack whose bottom frame
//! is always the root. Only `;` is accepting.

use std::fmt;

use thiserror::Error;

use crate::ast::{Node, Root, Statement};
use crate::fsm::{Machine, MachineBuilder, MachineError};
use crate::lexer::{Lexeme, LexemeSource, TokenKind};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("unexpected token \"{}\" at position {}", .0.text, .0.start)]
    UnexpectedToken(Lexeme),
    #[error("invalid number token \"{}\" at position {}", .0.text, .0.start)]
    InvalidNumber(Lexeme),
    #[error("unterminated statement")]
    UnterminatedStatement,
    /// The parser's own automaton could not be built. Never caused by input.
    #[error("malformed grammar: {0}")]
    Grammar(String),
}

impl ParseError {
    /// The offending lexeme. Invalid numbers are a kind of unexpected token,
    /// so both carry one.
    pub fn lexeme(&self) -> Option<&Lexeme> {
        match self {
            ParseError::UnexpectedToken(lexeme) | ParseError::InvalidNumber(lexeme) => Some(lexeme),
            ParseError::UnterminatedStatement | ParseError::Grammar(_) => None,
        }
    }
}

/// Automaton state: either the virtual start or a lexeme kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum State {
    Start,
    Token(TokenKind),
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            State::Start => f.write_str("start"),
            State::Token(kind) => write!(f, "{kind}"),
        }
    }
}

enum Frame {
    Root(Root),
    Node(Node),
}

impl Frame {
    /// Appends `node` to this frame, handing it back if the frame cannot
    /// hold children.
    fn adopt(&mut self, node: Node) -> Result<(), Node> {
        match self {
            Frame::Root(root) => {
                match node {
                    Node::Statement(statement) => root.statements.push(statement),
                    other => root.statements.push(Statement {
                        children: vec![other],
                    }),
                }
                Ok(())
            }
            Frame::Node(parent) => parent.push_child(node),
        }
    }
}

/// Mutable state handed to every entry hook.
struct BuildContext {
    current: Option<Lexeme>,
    stack: Vec<Frame>,
}

impl BuildContext {
    fn new() -> Self {
        BuildContext {
            current: None,
            stack: vec![Frame::Root(Root::default())],
        }
    }

    fn current(&self) -> Lexeme {
        self.current
            .clone()
            .unwrap_or_else(|| Lexeme::new(TokenKind::Unknown, "", 0))
    }

    fn push(&mut self, node: Node) -> Result<(), ParseError> {
        if matches!(self.stack.last(), Some(Frame::Root(_))) {
            self.stack
                .push(Frame::Node(Node::Statement(Statement::default())));
        }

        if node.is_container() {
            self.stack.push(Frame::Node(node));
            return Ok(());
        }
        self.adopt_into_top(node)
    }

    /// Pops the innermost open container into its parent.
    fn close(&mut self) -> Result<(), ParseError> {
        if self.stack.len() < 2 {
            return Err(ParseError::UnexpectedToken(self.current()));
        }
        match self.stack.pop() {
            Some(Frame::Node(node)) => self.adopt_into_top(node),
            _ => Err(ParseError::UnexpectedToken(self.current())),
        }
    }

    fn adopt_into_top(&mut self, node: Node) -> Result<(), ParseError> {
        let adopted = match self.stack.last_mut() {
            Some(frame) => frame.adopt(node).is_ok(),
            None => false,
        };
        if adopted {
            Ok(())
        } else {
            Err(ParseError::UnexpectedToken(self.current()))
        }
    }

    /// Folds every open frame back into the root and returns it.
    fn into_root(mut self) -> Root {
        while self.stack.len() > 1 {
            let _ = self.close();
        }
        match self.stack.pop() {
            Some(Frame::Root(root)) => root,
            _ => Root::default(),
        }
    }
}

fn create_function_call(context: &mut BuildContext) -> Result<(), ParseError> {
    let name = context.current().text;
    context.push(Node::call(name, Vec::new()))
}

fn create_string_literal(context: &mut BuildContext) -> Result<(), ParseError> {
    let text = context.current().text;
    context.push(Node::string(text))
}

fn create_number_literal(context: &mut BuildContext) -> Result<(), ParseError> {
    let lexeme = context.current();
    let value = lexeme
        .text
        .parse::<f64>()
        .map_err(|_| ParseError::InvalidNumber(lexeme.clone()))?;
    context.push(Node::number(value))
}

fn create_boolean_literal(context: &mut BuildContext) -> Result<(), ParseError> {
    let value = context.current().kind == TokenKind::BoolTrue;
    context.push(Node::boolean(value))
}

fn close_node(context: &mut BuildContext) -> Result<(), ParseError> {
    context.close()
}

fn grammar() -> Result<Machine<State, BuildContext, ParseError>, MachineError<State, ParseError>> {
    use TokenKind::*;

    let identifier = State::Token(Identifier);
    let paren_open = State::Token(ParenOpen);
    let paren_close = State::Token(ParenClose);
    let quoted = State::Token(Quoted);
    let term = State::Token(Semicolon);
    let number = State::Token(Number);
    let bool_true = State::Token(BoolTrue);
    let bool_false = State::Token(BoolFalse);

    let literals = [number, quoted, bool_true, bool_false];
    let openers = [number, quoted, bool_true, bool_false, identifier];

    let mut builder: MachineBuilder<State, BuildContext, ParseError> = MachineBuilder::new();
    builder
        .paths(&[State::Start], &openers)
        .path(identifier, paren_open)
        .path(paren_open, quoted)
        .path(quoted, paren_close)
        .path(paren_close, term)
        .paths(&literals, &[term])
        .paths(&[term], &openers)
        .when_entering(identifier, create_function_call)
        .when_entering(quoted, create_string_literal)
        .when_entering(paren_close, close_node)
        .when_entering(term, close_node)
        .when_entering(number, create_number_literal)
        .when_entering(bool_true, create_boolean_literal)
        .when_entering(bool_false, create_boolean_literal)
        .accept(term);

    builder.start(State::Start)
}

/// Single-use parser over a lexeme source.
pub struct Parser<L> {
    source: L,
}

impl<L: LexemeSource> Parser<L> {
    pub fn new(source: L) -> Self {
        Parser { source }
    }

    /// Gives the lexeme source back, e.g. to inspect a lexer error.
    pub fn into_source(self) -> L {
        self.source
    }

    pub fn parse(&mut self) -> Result<Root, ParseError> {
        match self.parse_partial() {
            (root, None) => Ok(root),
            (_, Some(err)) => Err(err),
        }
    }

    /// Parses until the source is exhausted or the first failure, returning
    /// whatever tree was built so far alongside the failure.
    pub fn parse_partial(&mut self) -> (Root, Option<ParseError>) {
        let mut context = BuildContext::new();
        let mut machine = match grammar() {
            Ok(machine) => machine,
            Err(err) => return (context.into_root(), Some(ParseError::Grammar(err.to_string()))),
        };

        while let Some(lexeme) = self.source.next_lexeme() {
            if lexeme.kind == TokenKind::Whitespace {
                continue;
            }

            let input = State::Token(lexeme.kind);
            context.current = Some(lexeme);

            if let Err(err) = machine.transition(input, &mut context) {
                let err = match err {
                    MachineError::Hook(err) => err,
                    _ => ParseError::UnexpectedToken(context.current()),
                };
                return (context.into_root(), Some(err));
            }
        }

        if machine.finish().is_err() {
            return (context.into_root(), Some(ParseError::UnterminatedStatement));
        }

        (context.into_root(), None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;

    fn lexeme(text: &str, kind: TokenKind, start: usize) -> Lexeme {
        Lexeme::new(kind, text, start)
    }

    fn parse(lexemes: Vec<Lexeme>) -> Result<Root, ParseError> {
        Parser::new(lexemes.into_iter()).parse()
    }

    fn statements(nodes: Vec<Node>) -> Root {
        Root {
            statements: nodes
                .into_iter()
                .map(|node| Statement {
                    children: vec![node],
                })
                .collect(),
        }
    }

    #[test]
    fn parses_simple_function_call() {
        let root = parse(vec![
            lexeme("print", TokenKind::Identifier, 1),
            lexeme("(", TokenKind::ParenOpen, 2),
            lexeme("Hello, world!", TokenKind::Quoted, 3),
            lexeme(")", TokenKind::ParenClose, 4),
            lexeme(";", TokenKind::Semicolon, 5),
        ])
        .expect("parse");

        assert_eq!(
            root,
            statements(vec![Node::call("print", vec![Node::string("Hello, world!")])])
        );
    }

    #[test]
    fn parses_two_number_literals() {
        let root = parse(vec![
            lexeme("1.34", TokenKind::Number, 1),
            lexeme(";", TokenKind::Semicolon, 2),
            lexeme(" ", TokenKind::Whitespace, 3),
            lexeme("3.42", TokenKind::Number, 4),
            lexeme(";", TokenKind::Semicolon, 5),
        ])
        .expect("parse");

        assert_eq!(root, statements(vec![Node::number(1.34), Node::number(3.42)]));
    }

    #[test]
    fn parses_true_false() {
        let root = parse(vec![
            lexeme("true", TokenKind::BoolTrue, 1),
            lexeme(";", TokenKind::Semicolon, 2),
            lexeme(" ", TokenKind::Whitespace, 3),
            lexeme("false", TokenKind::BoolFalse, 4),
            lexeme(";", TokenKind::Semicolon, 5),
        ])
        .expect("parse");

        assert_eq!(root, statements(vec![Node::boolean(true), Node::boolean(false)]));
    }

    #[test]
    fn one_statement_per_literal() {
        let root = Parser::new(Lexer::new("1; \"two\"; true; 4.5; false;"))
            .parse()
            .expect("parse");

        assert_eq!(
            root,
            statements(vec![
                Node::number(1.0),
                Node::string("two"),
                Node::boolean(true),
                Node::number(4.5),
                Node::boolean(false),
            ])
        );
    }

    #[test]
    fn call_may_follow_a_statement() {
        let root = Parser::new(Lexer::new("1; println(\"x\");"))
            .parse()
            .expect("parse");

        assert_eq!(
            root,
            statements(vec![
                Node::number(1.0),
                Node::call("println", vec![Node::string("x")]),
            ])
        );
    }

    #[test]
    fn rejects_invalid_number_syntax() {
        let err = parse(vec![lexeme("1.3.2.2.422", TokenKind::Number, 1)]).unwrap_err();

        assert_eq!(
            err,
            ParseError::InvalidNumber(lexeme("1.3.2.2.422", TokenKind::Number, 1))
        );
        assert_eq!(err.lexeme().map(|l| l.start), Some(1));
    }

    #[test]
    fn reports_incomplete_input() {
        let err = parse(vec![lexeme("true", TokenKind::BoolTrue, 1)]).unwrap_err();
        assert_eq!(err, ParseError::UnterminatedStatement);
    }

    #[test]
    fn reports_unterminated_call() {
        let err = Parser::new(Lexer::new("println(\"x\")")).parse().unwrap_err();
        assert_eq!(err, ParseError::UnterminatedStatement);
    }

    #[test]
    fn reports_unexpected_token_with_position() {
        let err = Parser::new(Lexer::new("1; 2 3;")).parse().unwrap_err();
        assert_eq!(
            err,
            ParseError::UnexpectedToken(lexeme("3", TokenKind::Number, 5))
        );
        assert_eq!(err.to_string(), "unexpected token \"3\" at position 5");
    }

    #[test]
    fn unknown_bytes_are_unexpected() {
        let err = Parser::new(Lexer::new("1 + 2;")).parse().unwrap_err();
        assert!(matches!(
            err,
            ParseError::UnexpectedToken(Lexeme { kind: TokenKind::Unknown, start: 2, .. })
        ));
    }

    #[test]
    fn partial_root_keeps_completed_statements() {
        let (root, err) = Parser::new(Lexer::new("true; println(\"a\" false")).parse_partial();

        assert!(matches!(err, Some(ParseError::UnexpectedToken(_))));
        assert_eq!(root.statements.len(), 2);
        assert_eq!(root.statements[0].children, vec![Node::boolean(true)]);
        assert_eq!(
            root.statements[1].children,
            vec![Node::call("println", vec![Node::string("a")])]
        );
    }

    #[test]
    fn parsing_is_repeatable() {
        let source = "println(\"hi\"); 2; false;";
        let first = Parser::new(Lexer::new(source)).parse().expect("first");
        let second = Parser::new(Lexer::new(source)).parse().expect("second");
        assert_eq!(first, second);
    }

    #[test]
    fn leaf_frame_rejects_children() {
        let mut context = BuildContext::new();
        context.current = Some(lexeme("7", TokenKind::Number, 9));
        context.stack.push(Frame::Node(Node::string("leaf")));

        let err = context.push(Node::number(7.0)).unwrap_err();
        assert_eq!(err, ParseError::UnexpectedToken(lexeme("7", TokenKind::Number, 9)));

        context.stack.push(Frame::Node(Node::Statement(Statement::default())));
        let err = context.close().unwrap_err();
        assert_eq!(err, ParseError::UnexpectedToken(lexeme("7", TokenKind::Number, 9)));
    }

    #[test]
    fn empty_input_is_unterminated() {
        let err = parse(Vec::new()).unwrap_err();
        assert_eq!(err, ParseError::UnterminatedStatement);
    }
}
