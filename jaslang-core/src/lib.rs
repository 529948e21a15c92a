//! Core of the jaslang scripting language.
//!
//! The pipeline is:
//!
//!   source .jas
//!     -> lexer      (lexemes, lazily)
//!     -> parser     (automaton-driven, builds the AST)
//!     -> evaluator  (walks the AST against the symbol table)
//!
//! Front ends (the CLI, tests) should go through [`run_source`] or
//! [`parse_source`] rather than wiring the stages by hand.

use std::io::{Read, Write};

// ---------------------------------------------------------------------
// Error handling
// ---------------------------------------------------------------------

pub mod error;

// ---------------------------------------------------------------------
// Front-end: lexing, the automaton engine and parsing
// ---------------------------------------------------------------------

pub mod lexer;
pub mod fsm;
pub mod ast;
pub mod parser;

// ---------------------------------------------------------------------
// Runtime: values, symbol table, natives, evaluation
// ---------------------------------------------------------------------

pub mod value;
pub mod table;
pub mod natives;
pub mod evaluator;

// ---------------------------------------------------------------------
// Script discovery
// ---------------------------------------------------------------------

pub mod scripts;

// ---------------------------------------------------------------------
// Public API re-exports
// ---------------------------------------------------------------------

pub use ast::{Node, Root};
pub use error::{CoreError, RuntimeError};
pub use evaluator::Evaluator;
pub use lexer::{Lexeme, LexemeSource, Lexer, TokenKind};
pub use parser::{ParseError, Parser};
pub use value::{Type, Value};

/// Lexes and parses `source`. A lexing failure wins over the parse error it
/// usually causes.
pub fn parse_source(source: &str) -> Result<Root, CoreError> {
    let mut parser = Parser::new(Lexer::new(source));
    let parsed = parser.parse();
    if let Some(err) = parser.into_source().take_error() {
        return Err(CoreError::Lex(err));
    }
    Ok(parsed?)
}

/// Parses `source` and runs it with a fresh evaluator.
pub fn run_source<R, W, E>(source: &str, input: R, output: W, error: E) -> Result<(), CoreError>
where
    R: Read,
    W: Write,
    E: Write,
{
    let root = parse_source(source)?;
    let mut evaluator = Evaluator::new(input, output, error);
    evaluator.evaluate(&root)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io;

    use super::*;

    fn run(source: &str) -> (Result<(), CoreError>, String) {
        let mut output = Vec::new();
        let result = run_source(source, io::empty(), &mut output, io::sink());
        (result, String::from_utf8(output).expect("utf8"))
    }

    #[test]
    fn prints_hello_world() {
        let (result, output) = run("println(\"Hello, world!\");");
        result.expect("run");
        assert_eq!(output, "Hello, world!\n");
    }

    #[test]
    fn runs_statements_in_order() {
        let (result, output) = run("println(\"a\");\n2;\nprintln(\"b\");\n");
        result.expect("run");
        assert_eq!(output, "a\nb\n");
    }

    #[test]
    fn unknown_function_is_a_runtime_error() {
        let (result, output) = run("print(\"a\");");
        assert!(matches!(
            result,
            Err(CoreError::Runtime(RuntimeError::UnknownIdentifier { .. }))
        ));
        assert!(output.is_empty());
    }

    #[test]
    fn parse_errors_stop_before_evaluation() {
        let (result, output) = run("println(\"a\"); 1.2.3;");
        assert!(matches!(
            result,
            Err(CoreError::Parse(ParseError::InvalidNumber(_)))
        ));
        assert!(output.is_empty());
    }

    #[test]
    fn lex_errors_win_over_parse_errors() {
        let err = parse_source("println(\"open").unwrap_err();
        assert!(matches!(err, CoreError::Lex(_)));
    }
}
