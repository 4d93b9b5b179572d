//! Expression tree nodes for Go
//!
//! Nodes are produced by an external parser and never mutated by lowering.
//! Static information (types, constants, bindings, selections) lives in the
//! oracle, keyed by `node_id`.

use super::ops::{BinaryOp, UnaryOp};
use glc_common::{NodeId, SourceSpan};
use serde::{Deserialize, Serialize};

/// Expression node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expression {
    pub node_id: NodeId,
    pub kind: ExpressionKind,
    pub span: SourceSpan,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExpressionKind {
    /// Literal token; its value is always reported by the oracle
    BasicLit { value: String },

    /// Identifier reference or definition
    Ident { name: String },

    Unary {
        op: UnaryOp,
        operand: Box<Expression>,
    },

    Binary {
        op: BinaryOp,
        left: Box<Expression>,
        right: Box<Expression>,
    },

    /// `base[index]`
    Index {
        base: Box<Expression>,
        index: Box<Expression>,
    },

    /// `base[low:high:max]`
    Slice {
        base: Box<Expression>,
        low: Option<Box<Expression>>,
        high: Option<Box<Expression>>,
        max: Option<Box<Expression>>,
    },

    /// `base.sel`; `sel` is always an `Ident`
    Selector {
        base: Box<Expression>,
        sel: Box<Expression>,
    },

    Call {
        func: Box<Expression>,
        args: Vec<Expression>,
        /// Trailing `...` on the last argument
        ellipsis: bool,
    },

    /// `T{elements}`; the literal's type comes from the oracle
    CompositeLit { elements: Vec<Element> },

    /// `base.(T)`; `asserted` is `None` in a type-switch guard
    TypeAssert {
        base: Box<Expression>,
        asserted: Option<Box<Expression>>,
    },

    Paren(Box<Expression>),

    /// `*x`
    Star(Box<Expression>),

    /// Function literal; `body` is a handle understood by the statement driver
    FuncLit { body: u32 },

    /// An expression denoting a type, e.g. the callee of a conversion
    TypeExpr,
}

/// Composite literal element, optionally keyed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    pub key: Option<Expression>,
    pub value: Expression,
}

impl Expression {
    pub fn new(node_id: NodeId, kind: ExpressionKind, span: SourceSpan) -> Self {
        Self { node_id, kind, span }
    }

    /// Name of an identifier node
    pub fn ident_name(&self) -> Option<&str> {
        match &self.kind {
            ExpressionKind::Ident { name } => Some(name),
            _ => None,
        }
    }

    pub fn is_ident(&self) -> bool {
        matches!(self.kind, ExpressionKind::Ident { .. })
    }

    /// Strip any number of enclosing parentheses
    pub fn unparen(&self) -> &Expression {
        match &self.kind {
            ExpressionKind::Paren(inner) => inner.unparen(),
            _ => self,
        }
    }

    /// Short node-kind name for diagnostics
    pub fn kind_name(&self) -> &'static str {
        match &self.kind {
            ExpressionKind::BasicLit { .. } => "basic literal",
            ExpressionKind::Ident { .. } => "identifier",
            ExpressionKind::Unary { .. } => "unary expression",
            ExpressionKind::Binary { .. } => "binary expression",
            ExpressionKind::Index { .. } => "index expression",
            ExpressionKind::Slice { .. } => "slice expression",
            ExpressionKind::Selector { .. } => "selector",
            ExpressionKind::Call { .. } => "call",
            ExpressionKind::CompositeLit { .. } => "composite literal",
            ExpressionKind::TypeAssert { .. } => "type assertion",
            ExpressionKind::Paren(_) => "parenthesized expression",
            ExpressionKind::Star(_) => "star expression",
            ExpressionKind::FuncLit { .. } => "function literal",
            ExpressionKind::TypeExpr => "type expression",
        }
    }
}
