//! Error handling for the ToyC compiler
//!
//! Lexing, parsing, and I/O failures abort compilation and are modeled as
//! `CompilerError`. Semantic analysis instead accumulates every problem it
//! finds into an `ErrorReporter` and reports them all at once.

use crate::source_loc::SourceLocation;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Fatal compiler error covering the abort-on-first-error phases
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompilerError {
    #[error("Lexical error at {location}: {message}")]
    Lex {
        location: SourceLocation,
        message: String,
    },

    #[error("Parse error at {location}: {message}")]
    Parse {
        location: SourceLocation,
        message: String,
    },

    #[error("Code generation error: {message}")]
    Codegen { message: String },

    #[error("IO error: {message}")]
    Io { message: String },
}

impl CompilerError {
    pub fn lexer_error(message: String, location: SourceLocation) -> Self {
        CompilerError::Lex { location, message }
    }

    pub fn parse_error(message: String, location: SourceLocation) -> Self {
        CompilerError::Parse { location, message }
    }

    pub fn codegen_error(message: String) -> Self {
        CompilerError::Codegen { message }
    }
}

impl From<std::io::Error> for CompilerError {
    fn from(err: std::io::Error) -> Self {
        CompilerError::Io {
            message: err.to_string(),
        }
    }
}

/// A single semantic error message
///
/// ToyC's semantic errors are positionless because the AST contract carries
/// no spans; the ordered message text is the whole diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    message: String,
}

impl Diagnostic {
    pub fn error(message: String) -> Self {
        Self { message }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "error: {}", self.message)
    }
}

/// Collects semantic diagnostics without aborting analysis
#[derive(Debug, Clone, Default)]
pub struct ErrorReporter {
    diagnostics: Vec<Diagnostic>,
}

impl ErrorReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an error diagnostic
    pub fn error(&mut self, message: String) {
        self.diagnostics.push(Diagnostic::error(message));
    }

    pub fn has_errors(&self) -> bool {
        !self.diagnostics.is_empty()
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics.len()
    }

    /// All diagnostics, in the order they were reported
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn clear(&mut self) {
        self.diagnostics.clear();
    }

    /// One-line summary suitable for a final status message
    pub fn summary(&self) -> String {
        match self.error_count() {
            0 => "no errors".to_string(),
            1 => "1 error".to_string(),
            n => format!("{} errors", n),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reporter_accumulates_in_order() {
        let mut reporter = ErrorReporter::new();
        assert!(!reporter.has_errors());

        reporter.error("first".to_string());
        reporter.error("second".to_string());

        assert!(reporter.has_errors());
        assert_eq!(reporter.error_count(), 2);
        assert_eq!(reporter.diagnostics()[0].message(), "first");
        assert_eq!(reporter.diagnostics()[1].message(), "second");
    }

    #[test]
    fn test_summary() {
        let mut reporter = ErrorReporter::new();
        assert_eq!(reporter.summary(), "no errors");

        reporter.error("e1".to_string());
        assert_eq!(reporter.summary(), "1 error");

        reporter.error("e2".to_string());
        assert_eq!(reporter.summary(), "2 errors");
    }

    #[test]
    fn test_clear() {
        let mut reporter = ErrorReporter::new();
        reporter.error("stale".to_string());
        reporter.clear();
        assert!(!reporter.has_errors());
    }

    #[test]
    fn test_diagnostic_display() {
        let diag = Diagnostic::error("Undefined variable 'x'".to_string());
        assert_eq!(format!("{}", diag), "error: Undefined variable 'x'");
    }

    #[test]
    fn test_compiler_error_display() {
        let err = CompilerError::lexer_error(
            "Unexpected character '@'".to_string(),
            SourceLocation::new(3, 7),
        );
        assert_eq!(
            format!("{}", err),
            "Lexical error at 3:7: Unexpected character '@'"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        let err = CompilerError::from(io_err);
        assert!(matches!(err, CompilerError::Io { .. }));
        assert_eq!(format!("{}", err), "IO error: no such file");
    }
}
