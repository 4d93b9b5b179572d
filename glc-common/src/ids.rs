//! Identifier aliases shared between the oracle, the expression tree and
//! the lowering state.

/// Identity of an expression node within one compilation unit
pub type NodeId = u32;

/// Resumption step number handed to the statement driver for a
/// suspension point
pub type ResumeStep = u32;

/// Node ids at or above this value are minted by the lowering engine for
/// synthesized helper nodes and never collide with oracle-owned ids.
pub const SYNTHETIC_NODE_BASE: NodeId = 1 << 31;

/// Check whether a node id was minted by the lowering engine
pub fn is_synthetic(id: NodeId) -> bool {
    id >= SYNTHETIC_NODE_BASE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_synthetic_range() {
        assert!(!is_synthetic(0));
        assert!(!is_synthetic(SYNTHETIC_NODE_BASE - 1));
        assert!(is_synthetic(SYNTHETIC_NODE_BASE));
    }
}
