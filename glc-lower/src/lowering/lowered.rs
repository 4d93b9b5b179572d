//! Lowered expression text

use std::fmt;

/// Output text of one expression plus whether it needs parentheses when
/// embedded as an operand
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lowered {
    pub text: String,
    pub parens: bool,
}

impl Lowered {
    /// Atomic text: a name, literal, call or index
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            parens: false,
        }
    }

    /// Operator-form text that must be parenthesized inside another operator
    pub fn paren(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            parens: true,
        }
    }

    pub fn with_parens(&self) -> String {
        if self.parens {
            format!("({})", self.text)
        } else {
            self.text.clone()
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl fmt::Display for Lowered {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parens() {
        assert_eq!(Lowered::new("x").with_parens(), "x");
        assert_eq!(Lowered::paren("a + b").with_parens(), "(a + b)");
        assert_eq!(Lowered::paren("a + b").to_string(), "a + b");
    }
}
