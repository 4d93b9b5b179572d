//! Error handling for the Go-to-Lua compiler
//!
//! Two classes of failure exist. Internal errors signal a gap between the
//! oracle and the lowering core and abort the current compilation.
//! User-facing semantic errors are collected as diagnostics so that one pass
//! can surface several of them.

use crate::source_loc::{SourceLocation, SourceSpan};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Main compiler error type
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompilerError {
    #[error("Internal compiler error at {location}: {message}")]
    InternalError {
        message: String,
        location: SourceLocation,
    },

    #[error("Semantic error at {span}: {message}")]
    SemanticError {
        message: String,
        span: SourceSpan,
    },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },
}

impl CompilerError {
    pub fn internal(message: impl Into<String>, location: SourceLocation) -> Self {
        CompilerError::InternalError {
            message: message.into(),
            location,
        }
    }

    pub fn semantic(message: impl Into<String>, span: SourceSpan) -> Self {
        CompilerError::SemanticError {
            message: message.into(),
            span,
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        CompilerError::ConfigError {
            message: message.into(),
        }
    }

    /// Internal errors are never recoverable within one compilation
    pub fn is_internal(&self) -> bool {
        matches!(self, CompilerError::InternalError { .. })
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// A diagnostic message with location and severity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    pub span: SourceSpan,
    pub notes: Vec<String>,
}

impl Diagnostic {
    pub fn error(message: String, span: SourceSpan) -> Self {
        Self {
            severity: Severity::Error,
            message,
            span,
            notes: Vec::new(),
        }
    }

    pub fn warning(message: String, span: SourceSpan) -> Self {
        Self {
            severity: Severity::Warning,
            message,
            span,
            notes: Vec::new(),
        }
    }

    pub fn with_note(mut self, note: String) -> Self {
        self.notes.push(note);
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}: {}", self.span, self.severity, self.message)?;
        for note in &self.notes {
            write!(f, "\n  note: {}", note)?;
        }
        Ok(())
    }
}

/// Collects user-facing diagnostics for one compilation unit
#[derive(Debug, Clone, Default)]
pub struct ErrorReporter {
    diagnostics: Vec<Diagnostic>,
    error_count: usize,
    warning_count: usize,
}

impl ErrorReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn report(&mut self, diagnostic: Diagnostic) {
        match diagnostic.severity {
            Severity::Error => self.error_count += 1,
            Severity::Warning => self.warning_count += 1,
        }
        self.diagnostics.push(diagnostic);
    }

    pub fn error(&mut self, message: String, span: SourceSpan) {
        self.report(Diagnostic::error(message, span));
    }

    pub fn warning(&mut self, message: String, span: SourceSpan) {
        self.report(Diagnostic::warning(message, span));
    }

    pub fn has_errors(&self) -> bool {
        self.error_count > 0
    }

    pub fn error_count(&self) -> usize {
        self.error_count
    }

    pub fn warning_count(&self) -> usize {
        self.warning_count
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Move every diagnostic out of the reporter
    pub fn take(&mut self) -> Vec<Diagnostic> {
        self.error_count = 0;
        self.warning_count = 0;
        std::mem::take(&mut self.diagnostics)
    }

    /// Convert collected errors into a single failure, if any were reported
    pub fn into_result(self) -> Result<(), CompilerError> {
        match self.diagnostics.iter().find(|d| d.severity == Severity::Error) {
            Some(first) => Err(CompilerError::semantic(
                format!("{} ({})", first.message, self.summary()),
                first.span.clone(),
            )),
            None => Ok(()),
        }
    }

    pub fn summary(&self) -> String {
        match (self.error_count, self.warning_count) {
            (0, 0) => "No errors or warnings".to_string(),
            (0, w) => format!("{} warning{}", w, if w == 1 { "" } else { "s" }),
            (e, 0) => format!("{} error{}", e, if e == 1 { "" } else { "s" }),
            (e, w) => format!(
                "{} error{} and {} warning{}",
                e,
                if e == 1 { "" } else { "s" },
                w,
                if w == 1 { "" } else { "s" }
            ),
        }
    }
}
