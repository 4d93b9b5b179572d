//! Operator definitions for Go expressions
//!
//! `Display` spells an operator the way Go source does; `lua_token` spells
//! it the way the emitted Lua does.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOp {
    // Arithmetic
    Add, Sub, Mul, Quo, Rem,

    // Bitwise
    And, Or, Xor, AndNot, Shl, Shr,

    // Logical
    LogicalAnd, LogicalOr,

    // Comparison
    Eql, Neq, Lss, Leq, Gtr, Geq,
}

impl BinaryOp {
    /// Operator spelling in emitted Lua
    pub fn lua_token(&self) -> &'static str {
        match self {
            BinaryOp::Neq => "~=",
            BinaryOp::Xor => "~",
            BinaryOp::LogicalAnd => "and",
            BinaryOp::LogicalOr => "or",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Quo => "/",
            BinaryOp::Rem => "%",
            BinaryOp::And => "&",
            BinaryOp::Or => "|",
            BinaryOp::AndNot => "& ~",
            BinaryOp::Shl => "<<",
            BinaryOp::Shr => ">>",
            BinaryOp::Eql => "==",
            BinaryOp::Lss => "<",
            BinaryOp::Leq => "<=",
            BinaryOp::Gtr => ">",
            BinaryOp::Geq => ">=",
        }
    }

    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            BinaryOp::Eql | BinaryOp::Neq | BinaryOp::Lss | BinaryOp::Leq | BinaryOp::Gtr | BinaryOp::Geq
        )
    }

    pub fn is_logical(&self) -> bool {
        matches!(self, BinaryOp::LogicalAnd | BinaryOp::LogicalOr)
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op_str = match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Quo => "/",
            BinaryOp::Rem => "%",
            BinaryOp::And => "&",
            BinaryOp::Or => "|",
            BinaryOp::Xor => "^",
            BinaryOp::AndNot => "&^",
            BinaryOp::Shl => "<<",
            BinaryOp::Shr => ">>",
            BinaryOp::LogicalAnd => "&&",
            BinaryOp::LogicalOr => "||",
            BinaryOp::Eql => "==",
            BinaryOp::Neq => "!=",
            BinaryOp::Lss => "<",
            BinaryOp::Leq => "<=",
            BinaryOp::Gtr => ">",
            BinaryOp::Geq => ">=",
        };
        write!(f, "{}", op_str)
    }
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnaryOp {
    Plus,
    Neg,
    Not,
    BitNot,
    AddrOf,
    /// Channel receive `<-ch`
    Recv,
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op_str = match self {
            UnaryOp::Plus => "+",
            UnaryOp::Neg => "-",
            UnaryOp::Not => "!",
            UnaryOp::BitNot => "^",
            UnaryOp::AddrOf => "&",
            UnaryOp::Recv => "<-",
        };
        write!(f, "{}", op_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lua_spelling() {
        assert_eq!(BinaryOp::Neq.lua_token(), "~=");
        assert_eq!(BinaryOp::Xor.lua_token(), "~");
        assert_eq!(BinaryOp::LogicalAnd.lua_token(), "and");
        assert_eq!(BinaryOp::Add.lua_token(), "+");
        assert_eq!(BinaryOp::AndNot.to_string(), "&^");
    }
}
