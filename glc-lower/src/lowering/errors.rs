//! Lowering error types
//!
//! Every variant is an oracle/core contract gap: the input was type-checked,
//! so a combination lowering cannot handle is a bug, not a user error.

use glc_common::{CompilerError, SourceLocation};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LowerError {
    #[error("Unsupported construct '{construct}' at {location}")]
    UnsupportedConstruct {
        construct: String,
        location: SourceLocation,
    },

    #[error("Unresolved identifier '{name}' at {location}")]
    UnresolvedIdentifier {
        name: String,
        location: SourceLocation,
    },

    #[error("No type recorded for node {node} at {location}")]
    MissingType { node: u32, location: SourceLocation },

    #[error("Malformed template '{pattern}': {reason}")]
    MalformedTemplate { pattern: String, reason: String },

    #[error("Conversion from {from} to {to} not supported at {location}")]
    ConversionNotSupported {
        from: String,
        to: String,
        location: SourceLocation,
    },

    #[error("Unknown builtin '{name}' at {location}")]
    UnknownBuiltin {
        name: String,
        location: SourceLocation,
    },

    #[error("Struct {type_name} has {expected} fields but literal has {found} at {location}")]
    FieldCountMismatch {
        type_name: String,
        expected: usize,
        found: usize,
        location: SourceLocation,
    },

    #[error("Struct {type_name} has no field '{field}' at {location}")]
    UnknownField {
        type_name: String,
        field: String,
        location: SourceLocation,
    },
}

impl LowerError {
    pub fn unsupported(construct: impl Into<String>, location: &SourceLocation) -> Self {
        LowerError::UnsupportedConstruct {
            construct: construct.into(),
            location: location.clone(),
        }
    }

    pub fn location(&self) -> SourceLocation {
        match self {
            LowerError::UnsupportedConstruct { location, .. }
            | LowerError::UnresolvedIdentifier { location, .. }
            | LowerError::MissingType { location, .. }
            | LowerError::ConversionNotSupported { location, .. }
            | LowerError::UnknownBuiltin { location, .. }
            | LowerError::FieldCountMismatch { location, .. }
            | LowerError::UnknownField { location, .. } => location.clone(),
            LowerError::MalformedTemplate { .. } => SourceLocation::dummy(),
        }
    }
}

impl From<LowerError> for CompilerError {
    fn from(err: LowerError) -> Self {
        let location = err.location();
        CompilerError::internal(err.to_string(), location)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_converts_to_internal_error() {
        let err: CompilerError = LowerError::UnknownBuiltin {
            name: "frobnicate".to_string(),
            location: SourceLocation::new("main.go", 4, 2),
        }
        .into();
        assert!(err.is_internal());
        assert!(err.to_string().contains("Unknown builtin 'frobnicate'"));
    }
}
