//! ToyC Compiler - Frontend
//!
//! This crate provides the frontend components for the ToyC compiler:
//! - Lexer: tokenizes ToyC source code
//! - Parser: builds the AST from tokens
//! - AST: abstract syntax tree definitions and the `--ast` tree dump
//! - Semantic analysis: scope and signature validation

pub mod ast;
pub mod lexer;
pub mod parser;
pub mod semantic;

pub use ast::{
    BinaryOp, Block, CompilationUnit, Expr, FunctionDefinition, Parameter, Stmt, UnaryOp,
};
pub use lexer::{Lexer, Token, TokenKind};
pub use parser::{ParseError, Parser};
pub use semantic::SemanticAnalyzer;

use toyc_common::CompilerError;

/// High-level frontend interface
pub struct Frontend;

impl Frontend {
    /// Tokenize ToyC source code
    pub fn tokenize_source(source: &str) -> Result<Vec<Token>, CompilerError> {
        let mut lexer = Lexer::new(source);
        lexer.tokenize()
    }

    /// Parse ToyC source code into an AST
    pub fn parse_source(source: &str) -> Result<CompilationUnit, CompilerError> {
        let tokens = Self::tokenize_source(source)?;
        let mut parser = Parser::new(tokens);
        parser.parse_compilation_unit()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use toyc_common::ValueType;

    #[test]
    fn test_frontend_parse_simple_function() {
        let unit = Frontend::parse_source("int main() { return 42; }").unwrap();
        assert_eq!(unit.functions.len(), 1);
        assert_eq!(unit.functions[0].name, "main");
        assert_eq!(unit.functions[0].return_type, ValueType::Int);
    }

    #[test]
    fn test_frontend_tokenize() {
        let tokens = Frontend::tokenize_source("int x = 42;").unwrap();

        // int, x, =, 42, ;, EOF
        assert_eq!(tokens.len(), 6);
        assert!(matches!(tokens[0].kind, TokenKind::Int));
        assert!(matches!(tokens[3].kind, TokenKind::IntLiteral(42)));
        assert!(matches!(tokens[5].kind, TokenKind::EndOfFile));
    }

    #[test]
    fn test_frontend_parse_error_propagates() {
        let result = Frontend::parse_source("int main( { return 0; }");
        assert!(result.is_err());
    }
}
