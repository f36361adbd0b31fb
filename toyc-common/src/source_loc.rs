//! Source location tracking for error reporting
//!
//! Locations are 1-based line/column positions in the single input file
//! the compiler works on at a time.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A location in the source file (line and column are 1-based)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceLocation {
    pub line: u32,
    pub column: u32,
}

impl SourceLocation {
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }

    /// A placeholder location for constructs with no source position
    pub fn dummy() -> Self {
        Self::new(0, 0)
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A span in the source file (from start to end location)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSpan {
    pub start: SourceLocation,
    pub end: SourceLocation,
}

impl SourceSpan {
    pub fn new(start: SourceLocation, end: SourceLocation) -> Self {
        Self { start, end }
    }

    /// Create a span covering a single location
    pub fn from_location(location: SourceLocation) -> Self {
        Self {
            end: location.clone(),
            start: location,
        }
    }

    pub fn dummy() -> Self {
        Self::from_location(SourceLocation::dummy())
    }
}

impl fmt::Display for SourceSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start.line == self.end.line {
            if self.start.column == self.end.column {
                write!(f, "{}", self.start)
            } else {
                write!(f, "{}:{}-{}", self.start.line, self.start.column, self.end.column)
            }
        } else {
            write!(f, "{}-{}", self.start, self.end)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_display() {
        let loc = SourceLocation::new(42, 10);
        assert_eq!(format!("{}", loc), "42:10");
    }

    #[test]
    fn test_span_same_line() {
        let span = SourceSpan::new(SourceLocation::new(1, 5), SourceLocation::new(1, 10));
        assert_eq!(format!("{}", span), "1:5-10");
    }

    #[test]
    fn test_span_multi_line() {
        let span = SourceSpan::new(SourceLocation::new(1, 5), SourceLocation::new(3, 2));
        assert_eq!(format!("{}", span), "1:5-3:2");
    }

    #[test]
    fn test_span_single_point() {
        let span = SourceSpan::from_location(SourceLocation::new(7, 3));
        assert_eq!(format!("{}", span), "7:3");
    }
}
