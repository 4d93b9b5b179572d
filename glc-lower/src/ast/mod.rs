//! Expression tree definitions for Go
//!
//! Only the expression subset of the syntax tree is modelled here; statements
//! belong to the external statement driver.

pub mod expressions;
pub mod ops;

pub use expressions::{Element, Expression, ExpressionKind};
pub use glc_common::NodeId;
pub use ops::{BinaryOp, UnaryOp};

/// Node ID generator for expression nodes
#[derive(Debug, Clone, Default)]
pub struct NodeIdGenerator {
    next_id: NodeId,
}

impl NodeIdGenerator {
    pub fn new() -> Self {
        Self { next_id: 0 }
    }

    /// Start numbering at `first`, e.g. after ids an external parser used
    pub fn starting_at(first: NodeId) -> Self {
        Self { next_id: first }
    }

    pub fn next(&mut self) -> NodeId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}
