//! Function literals
//!
//! Bodies are statements, which this crate does not lower; they come back
//! from the driver through `FunctionBodyLowering`.

use super::lowered::Lowered;
use super::ExpressionLowerer;
use crate::ast::Expression;
use crate::types::Signature;
use glc_common::CompilerError;

/// Emitted function expression plus the escaping variables it captures
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionText {
    /// `function(params) ... end`
    pub code: String,
    pub captured: Vec<String>,
}

impl FunctionText {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            captured: Vec::new(),
        }
    }

    pub fn capturing(mut self, names: &[&str]) -> Self {
        self.captured.extend(names.iter().map(|n| n.to_string()));
        self
    }
}

/// Statement-level driver hook for function literal bodies
pub trait FunctionBodyLowering {
    fn lower_function(&mut self, body: u32, signature: &Signature) -> Result<FunctionText, CompilerError>;
}

/// Closures capturing escaping variables bind the current boxes through an
/// immediately-applied wrapper so each evaluation sees its own boxes.
pub fn lower_func_literal(
    lw: &mut ExpressionLowerer<'_>,
    expr: &Expression,
    body: u32,
) -> Result<Lowered, CompilerError> {
    let ty = lw.type_of(expr)?;
    let Some(signature) = ty.signature().cloned() else {
        return Err(lw.unsupported(expr, format!("function literal of type {}", ty)));
    };
    let Some(bodies) = lw.bodies.as_deref_mut() else {
        return Err(lw.unsupported(expr, "function literal without a body driver"));
    };
    let function = bodies.lower_function(body, &signature)?;

    if function.captured.is_empty() {
        return Ok(Lowered::new(format!("({})", function.code)));
    }
    let mut names = function.captured;
    names.sort();
    names.dedup();
    let list = names.join(", ");
    Ok(Lowered::new(format!(
        "(function({l}) return {c} end)({l})",
        l = list,
        c = function.code
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_function_text_builder() {
        let text = FunctionText::new("function() end").capturing(&["b", "a"]);
        assert_eq!(text.captured, vec!["b", "a"]);
    }
}
