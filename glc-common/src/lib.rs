//! Go-to-Lua Compiler - Common Types and Utilities
//!
//! Shared error definitions, diagnostics and source positions used by every
//! stage of the compiler.

pub mod error;
pub mod ids;
pub mod source_loc;

pub use error::{CompilerError, Diagnostic, ErrorReporter, Severity};
pub use ids::*;
pub use source_loc::{SourceLocation, SourceSpan};
