//! Source location tracking for diagnostics
//!
//! Expression nodes carry the span they were parsed from so that internal
//! errors and user-facing diagnostics can point back at the Go source.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A location in a source file (line and column are 1-based)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceLocation {
    pub filename: String,
    pub line: u32,
    pub column: u32,
}

impl SourceLocation {
    pub fn new(filename: &str, line: u32, column: u32) -> Self {
        Self {
            filename: filename.to_string(),
            line,
            column,
        }
    }

    /// Location used for synthesized nodes and tests
    pub fn dummy() -> Self {
        Self::new("<unknown>", 0, 0)
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.filename, self.line, self.column)
    }
}

/// A span in a source file (from start to end location)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSpan {
    pub start: SourceLocation,
    pub end: SourceLocation,
}

impl SourceSpan {
    pub fn new(start: SourceLocation, end: SourceLocation) -> Self {
        Self { start, end }
    }

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
        if self.start.filename != self.end.filename {
            write!(f, "{} to {}", self.start, self.end)
        } else if self.start.line == self.end.line {
            if self.start.column == self.end.column {
                write!(f, "{}:{}", self.start.filename, self.start.line)
            } else {
                write!(
                    f,
                    "{}:{}:{}-{}",
                    self.start.filename, self.start.line, self.start.column, self.end.column
                )
            }
        } else {
            write!(
                f,
                "{}:{}:{}-{}:{}",
                self.start.filename, self.start.line, self.start.column, self.end.line, self.end.column
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_location() {
        let loc = SourceLocation::new("main.go", 42, 10);
        assert_eq!(format!("{}", loc), "main.go:42:10");
    }

    #[test]
    fn test_source_span_same_line() {
        let span = SourceSpan::new(
            SourceLocation::new("main.go", 1, 5),
            SourceLocation::new("main.go", 1, 10),
        );
        assert_eq!(format!("{}", span), "main.go:1:5-10");
    }

    #[test]
    fn test_source_span_different_lines() {
        let span = SourceSpan::new(
            SourceLocation::new("main.go", 1, 5),
            SourceLocation::new("main.go", 3, 10),
        );
        assert_eq!(format!("{}", span), "main.go:1:5-3:10");
    }

    #[test]
    fn test_point_span() {
        let span = SourceSpan::from_location(SourceLocation::new("main.go", 7, 2));
        assert_eq!(format!("{}", span), "main.go:7");
    }
}
