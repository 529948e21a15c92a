//! Lexer for jaslang source text.
//!
//! The parser only ever sees the [`LexemeSource`] trait, so anything that
//! yields positioned lexemes one at a time can drive it. [`Lexer`] is the
//! bundled implementation: it walks the source byte by byte and hands out
//! lexemes lazily.

use std::fmt;

use thiserror::Error;

/// Kind of a lexeme.
///
/// The parser uses these kinds directly as automaton states, so the set is
/// kept as small as the grammar allows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Identifier,
    ParenOpen,  // (
    ParenClose, // )
    Quoted,
    Semicolon, // ;
    Number,
    BoolTrue,
    BoolFalse,
    Whitespace,
    /// A byte the lexer does not recognise. No grammar state accepts it.
    Unknown,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TokenKind::Identifier => "identifier",
            TokenKind::ParenOpen => "'('",
            TokenKind::ParenClose => "')'",
            TokenKind::Quoted => "string",
            TokenKind::Semicolon => "';'",
            TokenKind::Number => "number",
            TokenKind::BoolTrue => "true",
            TokenKind::BoolFalse => "false",
            TokenKind::Whitespace => "whitespace",
            TokenKind::Unknown => "unknown",
        };
        f.pad(name)
    }
}

/// A classified token with its text and byte offset into the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lexeme {
    pub kind: TokenKind,
    pub text: String,
    pub start: usize,
}

impl Lexeme {
    pub fn new(kind: TokenKind, text: impl Into<String>, start: usize) -> Self {
        Lexeme {
            kind,
            text: text.into(),
            start,
        }
    }
}

/// Producer of lexemes consumed by the parser.
///
/// `None` signals exhaustion; it ends the parse loop and is not itself a
/// failure.
pub trait LexemeSource {
    fn next_lexeme(&mut self) -> Option<Lexeme>;
}

impl<I> LexemeSource for I
where
    I: Iterator<Item = Lexeme>,
{
    fn next_lexeme(&mut self) -> Option<Lexeme> {
        self.next()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LexError {
    #[error("unterminated string literal starting at byte {position}")]
    UnterminatedString { position: usize },
}

/// Lazy byte lexer over a source string.
///
/// A lexing failure ends the stream early; callers that care should check
/// [`Lexer::error`] once the stream is exhausted.
pub struct Lexer<'src> {
    source: &'src str,
    chars: &'src [u8],
    index: usize,
    error: Option<LexError>,
}

impl<'src> Lexer<'src> {
    pub fn new(source: &'src str) -> Self {
        Lexer {
            source,
            chars: source.as_bytes(),
            index: 0,
            error: None,
        }
    }

    /// The failure that stopped lexing, if any.
    pub fn error(&self) -> Option<&LexError> {
        self.error.as_ref()
    }

    pub fn take_error(&mut self) -> Option<LexError> {
        self.error.take()
    }

    fn lex_next(&mut self) -> Option<Lexeme> {
        if self.error.is_some() {
            return None;
        }

        let ch = self.peek_char()?;
        let start = self.index;

        let lexeme = match ch {
            b'(' => {
                self.consume_char();
                self.simple_lexeme(TokenKind::ParenOpen, start)
            }
            b')' => {
                self.consume_char();
                self.simple_lexeme(TokenKind::ParenClose, start)
            }
            b';' => {
                self.consume_char();
                self.simple_lexeme(TokenKind::Semicolon, start)
            }
            b'"' => return self.lex_string(start),
            _ if is_whitespace(ch) => {
                self.consume_while(is_whitespace);
                self.simple_lexeme(TokenKind::Whitespace, start)
            }
            _ if is_number_part(ch) => {
                // Dots are taken greedily; the parser decides whether the text
                // is a valid number.
                self.consume_while(is_number_part);
                self.simple_lexeme(TokenKind::Number, start)
            }
            _ if is_ident_start(ch) => self.lex_ident_or_keyword(start),
            _ => {
                // Step over the whole UTF-8 sequence so the text stays valid.
                let width = self.source[start..]
                    .chars()
                    .next()
                    .map_or(1, char::len_utf8);
                self.index += width;
                self.simple_lexeme(TokenKind::Unknown, start)
            }
        };

        Some(lexeme)
    }

    fn simple_lexeme(&self, kind: TokenKind, start: usize) -> Lexeme {
        Lexeme::new(kind, &self.source[start..self.index], start)
    }

    fn lex_string(&mut self, start: usize) -> Option<Lexeme> {
        // Consume the opening quote
        self.consume_char();

        let mut text = String::new();
        let mut segment = self.index;
        while let Some(ch) = self.peek_char() {
            match ch {
                b'"' => {
                    text.push_str(&self.source[segment..self.index]);
                    self.consume_char();
                    return Some(Lexeme::new(TokenKind::Quoted, text, start));
                }
                b'\\' => {
                    text.push_str(&self.source[segment..self.index]);
                    self.consume_char();
                    match self.peek_char() {
                        Some(b'n') => text.push('\n'),
                        Some(b't') => text.push('\t'),
                        Some(b'r') => text.push('\r'),
                        Some(b'"') => text.push('"'),
                        Some(b'\\') => text.push('\\'),
                        // Unknown escapes are kept as written.
                        Some(_) => {
                            text.push('\\');
                            segment = self.index;
                            continue;
                        }
                        None => break,
                    }
                    self.consume_char();
                    segment = self.index;
                }
                _ => self.consume_char(),
            }
        }

        self.error = Some(LexError::UnterminatedString { position: start });
        None
    }

    fn lex_ident_or_keyword(&mut self, start: usize) -> Lexeme {
        self.consume_while(is_ident_continue);

        let kind = match &self.source[start..self.index] {
            "true" => TokenKind::BoolTrue,
            "false" => TokenKind::BoolFalse,
            _ => TokenKind::Identifier,
        };

        self.simple_lexeme(kind, start)
    }

    fn consume_while(&mut self, predicate: fn(u8) -> bool) {
        while self.peek_char().is_some_and(predicate) {
            self.consume_char();
        }
    }

    fn peek_char(&self) -> Option<u8> {
        self.chars.get(self.index).copied()
    }

    fn consume_char(&mut self) {
        if self.index < self.chars.len() {
            self.index += 1;
        }
    }
}

impl Iterator for Lexer<'_> {
    type Item = Lexeme;

    fn next(&mut self) -> Option<Lexeme> {
        self.lex_next()
    }
}

fn is_whitespace(ch: u8) -> bool {
    matches!(ch, b' ' | b'\t' | b'\n' | b'\r')
}

fn is_number_part(ch: u8) -> bool {
    ch.is_ascii_digit() || ch == b'.'
}

fn is_ident_start(ch: u8) -> bool {
    ch.is_ascii_alphabetic() || ch == b'_'
}

fn is_ident_continue(ch: u8) -> bool {
    is_ident_start(ch) || ch.is_ascii_digit()
}
