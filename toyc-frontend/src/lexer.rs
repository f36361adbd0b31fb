//! ToyC Lexer
//!
//! Tokenizes ToyC source code into a stream of spanned tokens. Handles
//! keywords, operators, decimal integer literals, identifiers, and comments.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use toyc_common::{CompilerError, SourceLocation, SourceSpan};

/// ToyC token kinds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TokenKind {
    // Literals
    IntLiteral(i32),

    // Identifiers and keywords
    Identifier(String),
    Int,
    Void,
    If,
    Else,
    While,
    Break,
    Continue,
    Return,

    // Operators
    Plus,         // +
    Minus,        // -
    Star,         // *
    Slash,        // /
    Percent,      // %
    Bang,         // !
    Equal,        // =
    Less,         // <
    Greater,      // >
    LessEqual,    // <=
    GreaterEqual, // >=
    EqualEqual,   // ==
    BangEqual,    // !=
    AmpAmp,       // &&
    PipePipe,     // ||

    // Delimiters
    LeftParen,  // (
    RightParen, // )
    LeftBrace,  // {
    RightBrace, // }
    Semicolon,  // ;
    Comma,      // ,

    EndOfFile,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::IntLiteral(n) => write!(f, "{}", n),
            TokenKind::Identifier(s) => write!(f, "{}", s),
            TokenKind::Int => write!(f, "int"),
            TokenKind::Void => write!(f, "void"),
            TokenKind::If => write!(f, "if"),
            TokenKind::Else => write!(f, "else"),
            TokenKind::While => write!(f, "while"),
            TokenKind::Break => write!(f, "break"),
            TokenKind::Continue => write!(f, "continue"),
            TokenKind::Return => write!(f, "return"),
            TokenKind::Plus => write!(f, "+"),
            TokenKind::Minus => write!(f, "-"),
            TokenKind::Star => write!(f, "*"),
            TokenKind::Slash => write!(f, "/"),
            TokenKind::Percent => write!(f, "%"),
            TokenKind::Bang => write!(f, "!"),
            TokenKind::Equal => write!(f, "="),
            TokenKind::Less => write!(f, "<"),
            TokenKind::Greater => write!(f, ">"),
            TokenKind::LessEqual => write!(f, "<="),
            TokenKind::GreaterEqual => write!(f, ">="),
            TokenKind::EqualEqual => write!(f, "=="),
            TokenKind::BangEqual => write!(f, "!="),
            TokenKind::AmpAmp => write!(f, "&&"),
            TokenKind::PipePipe => write!(f, "||"),
            TokenKind::LeftParen => write!(f, "("),
            TokenKind::RightParen => write!(f, ")"),
            TokenKind::LeftBrace => write!(f, "{{"),
            TokenKind::RightBrace => write!(f, "}}"),
            TokenKind::Semicolon => write!(f, ";"),
            TokenKind::Comma => write!(f, ","),
            TokenKind::EndOfFile => write!(f, "EOF"),
        }
    }
}

/// A token with location information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub kind: TokenKind,
    pub span: SourceSpan,
}

impl Token {
    pub fn new(kind: TokenKind, span: SourceSpan) -> Self {
        Self { kind, span }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}", self.kind, self.span.start)
    }
}

/// ToyC lexer
pub struct Lexer {
    input: Vec<char>,
    position: usize,
    line: u32,
    column: u32,
    keywords: HashMap<String, TokenKind>,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        let keywords = [
            ("int", TokenKind::Int),
            ("void", TokenKind::Void),
            ("if", TokenKind::If),
            ("else", TokenKind::Else),
            ("while", TokenKind::While),
            ("break", TokenKind::Break),
            ("continue", TokenKind::Continue),
            ("return", TokenKind::Return),
        ]
        .into_iter()
        .map(|(kw, kind)| (kw.to_string(), kind))
        .collect();

        Self {
            input: input.chars().collect(),
            position: 0,
            line: 1,
            column: 1,
            keywords,
        }
    }

    fn current_char(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn peek_char(&self, offset: usize) -> Option<char> {
        self.input.get(self.position + offset).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.current_char()?;
        self.position += 1;
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(ch)
    }

    fn current_location(&self) -> SourceLocation {
        SourceLocation::new(self.line, self.column)
    }

    /// Skip whitespace and comments; errors on an unterminated block comment
    fn skip_trivia(&mut self) -> Result<(), CompilerError> {
        loop {
            match self.current_char() {
                Some(ch) if ch.is_whitespace() => {
                    self.advance();
                }
                Some('/') if self.peek_char(1) == Some('/') => {
                    while let Some(ch) = self.current_char() {
                        if ch == '\n' {
                            break;
                        }
                        self.advance();
                    }
                }
                Some('/') if self.peek_char(1) == Some('*') => {
                    let start = self.current_location();
                    self.advance();
                    self.advance();
                    let mut closed = false;
                    while let Some(ch) = self.current_char() {
                        if ch == '*' && self.peek_char(1) == Some('/') {
                            self.advance();
                            self.advance();
                            closed = true;
                            break;
                        }
                        self.advance();
                    }
                    if !closed {
                        return Err(CompilerError::lexer_error(
                            "Unterminated block comment".to_string(),
                            start,
                        ));
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    fn lex_identifier(&mut self) -> TokenKind {
        let mut identifier = String::new();
        while let Some(ch) = self.current_char() {
            if ch.is_ascii_alphanumeric() || ch == '_' {
                identifier.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        match self.keywords.get(&identifier) {
            Some(keyword) => keyword.clone(),
            None => TokenKind::Identifier(identifier),
        }
    }

    fn lex_integer(&mut self) -> Result<TokenKind, CompilerError> {
        let start = self.current_location();
        let mut number = String::new();
        while let Some(ch) = self.current_char() {
            if ch.is_ascii_digit() {
                number.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        let value = number.parse::<i32>().map_err(|_| {
            CompilerError::lexer_error(format!("Integer literal out of range: {}", number), start)
        })?;

        Ok(TokenKind::IntLiteral(value))
    }

    /// Lex the next token
    pub fn next_token(&mut self) -> Result<Token, CompilerError> {
        self.skip_trivia()?;

        let start = self.current_location();

        let kind = match self.current_char() {
            None => TokenKind::EndOfFile,

            Some(ch) if ch.is_ascii_alphabetic() || ch == '_' => self.lex_identifier(),

            Some(ch) if ch.is_ascii_digit() => self.lex_integer()?,

            Some('+') => {
                self.advance();
                TokenKind::Plus
            }
            Some('-') => {
                self.advance();
                TokenKind::Minus
            }
            Some('*') => {
                self.advance();
                TokenKind::Star
            }
            Some('/') => {
                self.advance();
                TokenKind::Slash
            }
            Some('%') => {
                self.advance();
                TokenKind::Percent
            }
            Some('!') => {
                self.advance();
                if self.current_char() == Some('=') {
                    self.advance();
                    TokenKind::BangEqual
                } else {
                    TokenKind::Bang
                }
            }
            Some('=') => {
                self.advance();
                if self.current_char() == Some('=') {
                    self.advance();
                    TokenKind::EqualEqual
                } else {
                    TokenKind::Equal
                }
            }
            Some('<') => {
                self.advance();
                if self.current_char() == Some('=') {
                    self.advance();
                    TokenKind::LessEqual
                } else {
                    TokenKind::Less
                }
            }
            Some('>') => {
                self.advance();
                if self.current_char() == Some('=') {
                    self.advance();
                    TokenKind::GreaterEqual
                } else {
                    TokenKind::Greater
                }
            }
            Some('&') => {
                self.advance();
                if self.current_char() == Some('&') {
                    self.advance();
                    TokenKind::AmpAmp
                } else {
                    return Err(CompilerError::lexer_error(
                        "Expected '&&'".to_string(),
                        start,
                    ));
                }
            }
            Some('|') => {
                self.advance();
                if self.current_char() == Some('|') {
                    self.advance();
                    TokenKind::PipePipe
                } else {
                    return Err(CompilerError::lexer_error(
                        "Expected '||'".to_string(),
                        start,
                    ));
                }
            }
            Some('(') => {
                self.advance();
                TokenKind::LeftParen
            }
            Some(')') => {
                self.advance();
                TokenKind::RightParen
            }
            Some('{') => {
                self.advance();
                TokenKind::LeftBrace
            }
            Some('}') => {
                self.advance();
                TokenKind::RightBrace
            }
            Some(';') => {
                self.advance();
                TokenKind::Semicolon
            }
            Some(',') => {
                self.advance();
                TokenKind::Comma
            }
            Some(ch) => {
                return Err(CompilerError::lexer_error(
                    format!("Unexpected character '{}'", ch),
                    start,
                ));
            }
        };

        let span = SourceSpan::new(start, self.current_location());
        Ok(Token::new(kind, span))
    }

    /// Tokenize the whole input, ending with an EOF token
    pub fn tokenize(&mut self) -> Result<Vec<Token>, CompilerError> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let done = token.kind == TokenKind::EndOfFile;
            tokens.push(token);
            if done {
                return Ok(tokens);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind> {
        Lexer::new(input)
            .tokenize()
            .expect("tokenize failed")
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_simple_declaration() {
        assert_eq!(
            kinds("int x = 42;"),
            vec![
                TokenKind::Int,
                TokenKind::Identifier("x".to_string()),
                TokenKind::Equal,
                TokenKind::IntLiteral(42),
                TokenKind::Semicolon,
                TokenKind::EndOfFile,
            ]
        );
    }

    #[test]
    fn test_keywords() {
        assert_eq!(
            kinds("if else while break continue return void"),
            vec![
                TokenKind::If,
                TokenKind::Else,
                TokenKind::While,
                TokenKind::Break,
                TokenKind::Continue,
                TokenKind::Return,
                TokenKind::Void,
                TokenKind::EndOfFile,
            ]
        );
    }

    #[test]
    fn test_compound_operators() {
        assert_eq!(
            kinds("<= >= == != && || < > ! ="),
            vec![
                TokenKind::LessEqual,
                TokenKind::GreaterEqual,
                TokenKind::EqualEqual,
                TokenKind::BangEqual,
                TokenKind::AmpAmp,
                TokenKind::PipePipe,
                TokenKind::Less,
                TokenKind::Greater,
                TokenKind::Bang,
                TokenKind::Equal,
                TokenKind::EndOfFile,
            ]
        );
    }

    #[test]
    fn test_comments_are_skipped() {
        assert_eq!(
            kinds("1 // line comment\n /* block\ncomment */ 2"),
            vec![
                TokenKind::IntLiteral(1),
                TokenKind::IntLiteral(2),
                TokenKind::EndOfFile,
            ]
        );
    }

    #[test]
    fn test_identifier_with_underscore_and_digits() {
        assert_eq!(
            kinds("_foo2 bar_baz"),
            vec![
                TokenKind::Identifier("_foo2".to_string()),
                TokenKind::Identifier("bar_baz".to_string()),
                TokenKind::EndOfFile,
            ]
        );
    }

    #[test]
    fn test_token_locations() {
        let tokens = Lexer::new("int\n  x;").tokenize().expect("tokenize failed");
        assert_eq!(tokens[0].span.start, SourceLocation::new(1, 1));
        assert_eq!(tokens[1].span.start, SourceLocation::new(2, 3));
    }

    #[test]
    fn test_unterminated_block_comment() {
        let result = Lexer::new("/* never closed").tokenize();
        assert!(matches!(result, Err(CompilerError::Lex { .. })));
    }

    #[test]
    fn test_single_ampersand_is_an_error() {
        let result = Lexer::new("a & b").tokenize();
        assert!(matches!(result, Err(CompilerError::Lex { .. })));
    }

    #[test]
    fn test_out_of_range_literal() {
        let result = Lexer::new("2147483648").tokenize();
        assert!(matches!(result, Err(CompilerError::Lex { .. })));

        assert_eq!(
            kinds("2147483647"),
            vec![TokenKind::IntLiteral(i32::MAX), TokenKind::EndOfFile]
        );
    }

    #[test]
    fn test_unexpected_character() {
        let result = Lexer::new("int x @").tokenize();
        match result {
            Err(CompilerError::Lex { message, location }) => {
                assert_eq!(message, "Unexpected character '@'");
                assert_eq!(location, SourceLocation::new(1, 7));
            }
            other => panic!("Expected lex error, got {:?}", other),
        }
    }
}
