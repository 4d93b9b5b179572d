//! Per-function lowering context
//!
//! Everything that must not leak between functions lives here: the fresh
//! name counter, the resumption-step counter, statements that must run
//! before the expression currently being lowered, collected diagnostics, and
//! type annotations for nodes synthesized during desugaring.

use crate::oracle::{ConstValue, Object, Selection};
use crate::types::Type;
use glc_common::{ErrorReporter, NodeId, ResumeStep, SYNTHETIC_NODE_BASE};
use std::collections::{HashMap, HashSet};
use std::fmt;

/// A statement the external driver must emit before the enclosing statement
#[derive(Debug, Clone, PartialEq)]
pub enum PendingStatement {
    /// `target = value`
    Assign { target: String, value: String },
    /// Call that may suspend; the driver places the resume label after it
    CallAssign {
        /// `None` when the call has no results
        target: Option<String>,
        call: String,
        step: ResumeStep,
    },
    /// Short-circuit evaluation of a suspending right operand
    Guard {
        result: String,
        condition: String,
        /// `true` for `&&`, `false` for `||`
        is_and: bool,
        /// Statements produced while lowering the right operand
        body: Vec<PendingStatement>,
        value: String,
    },
}

impl fmt::Display for PendingStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PendingStatement::Assign { target, value } => write!(f, "{} = {}", target, value),
            PendingStatement::CallAssign { target, call, step } => match target {
                Some(target) => write!(f, "{} = {} --[[resume:{}]]", target, call, step),
                None => write!(f, "{} --[[resume:{}]]", call, step),
            },
            PendingStatement::Guard {
                result,
                condition,
                is_and,
                body,
                value,
            } => {
                if *is_and {
                    write!(f, "if not ({}) then {} = false else ", condition, result)?;
                } else {
                    write!(f, "if {} then {} = true else ", condition, result)?;
                }
                for stmt in body {
                    write!(f, "{}; ", stmt)?;
                }
                write!(f, "{} = {} end", result, value)
            }
        }
    }
}

/// State for lowering the expressions of one function
#[derive(Debug)]
pub struct FunctionState {
    next_name: u32,
    next_step: ResumeStep,
    next_synthetic: NodeId,
    temporaries: Vec<String>,
    pending: Vec<PendingStatement>,
    reporter: ErrorReporter,
    synthetic_types: HashMap<NodeId, Type>,
    synthetic_constants: HashMap<NodeId, ConstValue>,
    synthetic_uses: HashMap<NodeId, Object>,
    synthetic_selections: HashMap<NodeId, Selection>,
    synthetic_suspending: HashSet<NodeId>,
    accessor_boxes: HashMap<String, String>,
}

impl Default for FunctionState {
    fn default() -> Self {
        Self {
            next_name: 0,
            next_step: 0,
            next_synthetic: SYNTHETIC_NODE_BASE,
            temporaries: Vec::new(),
            pending: Vec::new(),
            reporter: ErrorReporter::new(),
            synthetic_types: HashMap::new(),
            synthetic_constants: HashMap::new(),
            synthetic_uses: HashMap::new(),
            synthetic_selections: HashMap::new(),
            synthetic_suspending: HashSet::new(),
            accessor_boxes: HashMap::new(),
        }
    }
}

impl FunctionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mint a fresh name that is never reused within this function.
    /// Names that outlive a single expression are recorded so the driver
    /// can declare them as locals.
    pub fn new_temporary(&mut self, hint: &str) -> String {
        let name = self.new_local(hint);
        self.temporaries.push(name.clone());
        name
    }

    /// Fresh name scoped to generated code that declares it itself
    pub fn new_local(&mut self, hint: &str) -> String {
        let name = format!("{}{}", hint, self.next_name);
        self.next_name += 1;
        name
    }

    pub fn temporaries(&self) -> &[String] {
        &self.temporaries
    }

    pub fn next_resume_step(&mut self) -> ResumeStep {
        let step = self.next_step;
        self.next_step += 1;
        step
    }

    pub fn push_pending(&mut self, stmt: PendingStatement) {
        self.pending.push(stmt);
    }

    pub fn pending(&self) -> &[PendingStatement] {
        &self.pending
    }

    /// Hand pending statements to the driver
    pub fn drain_pending(&mut self) -> Vec<PendingStatement> {
        std::mem::take(&mut self.pending)
    }

    /// Number of pending statements; a later `split_pending_at` with this
    /// mark yields everything pushed in between.
    pub fn pending_mark(&self) -> usize {
        self.pending.len()
    }

    pub fn split_pending_at(&mut self, mark: usize) -> Vec<PendingStatement> {
        self.pending.split_off(mark.min(self.pending.len()))
    }

    pub fn reporter(&self) -> &ErrorReporter {
        &self.reporter
    }

    pub fn reporter_mut(&mut self) -> &mut ErrorReporter {
        &mut self.reporter
    }

    pub fn next_synthetic_id(&mut self) -> NodeId {
        let id = self.next_synthetic;
        self.next_synthetic += 1;
        id
    }

    pub fn set_synthetic_type(&mut self, node: NodeId, ty: Type) {
        self.synthetic_types.insert(node, ty);
    }

    pub fn set_synthetic_constant(&mut self, node: NodeId, value: ConstValue) {
        self.synthetic_constants.insert(node, value);
    }

    pub fn set_synthetic_use(&mut self, node: NodeId, obj: Object) {
        self.synthetic_uses.insert(node, obj);
    }

    pub fn set_synthetic_selection(&mut self, node: NodeId, selection: Selection) {
        self.synthetic_selections.insert(node, selection);
    }

    pub fn mark_synthetic_suspending(&mut self, node: NodeId) {
        self.synthetic_suspending.insert(node);
    }

    pub fn synthetic_type(&self, node: NodeId) -> Option<&Type> {
        self.synthetic_types.get(&node)
    }

    pub fn synthetic_constant(&self, node: NodeId) -> Option<&ConstValue> {
        self.synthetic_constants.get(&node)
    }

    pub fn synthetic_use(&self, node: NodeId) -> Option<&Object> {
        self.synthetic_uses.get(&node)
    }

    pub fn synthetic_selection(&self, node: NodeId) -> Option<&Selection> {
        self.synthetic_selections.get(&node)
    }

    pub fn is_synthetic_suspending(&self, node: NodeId) -> bool {
        self.synthetic_suspending.contains(&node)
    }

    /// Name of the cached accessor box for variable `key`, minted on first use
    pub fn accessor_box(&mut self, key: &str) -> String {
        if let Some(name) = self.accessor_boxes.get(key) {
            return name.clone();
        }
        let name = self.new_temporary(&format!("{}_ptr", key));
        self.accessor_boxes.insert(key.to_string(), name.clone());
        name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glc_common::is_synthetic;

    #[test]
    fn test_names_are_monotonic_across_hints() {
        let mut state = FunctionState::new();
        assert_eq!(state.new_temporary("_r"), "_r0");
        assert_eq!(state.new_local("_t"), "_t1");
        assert_eq!(state.new_temporary("_r"), "_r2");
        assert_eq!(state.temporaries(), &["_r0".to_string(), "_r2".to_string()]);
    }

    #[test]
    fn test_accessor_box_is_cached() {
        let mut state = FunctionState::new();
        let first = state.accessor_box("x");
        assert_eq!(state.accessor_box("x"), first);
        assert_ne!(state.accessor_box("y"), first);
    }

    #[test]
    fn test_synthetic_ids() {
        let mut state = FunctionState::new();
        let id = state.next_synthetic_id();
        assert!(is_synthetic(id));
        assert_eq!(state.next_synthetic_id(), id + 1);
    }

    #[test]
    fn test_pending_rendering() {
        let call = PendingStatement::CallAssign {
            target: Some("_r0".to_string()),
            call: "f(a)".to_string(),
            step: 3,
        };
        assert_eq!(call.to_string(), "_r0 = f(a) --[[resume:3]]");

        let guard = PendingStatement::Guard {
            result: "_v1".to_string(),
            condition: "x".to_string(),
            is_and: true,
            body: vec![call],
            value: "_r0".to_string(),
        };
        assert_eq!(
            guard.to_string(),
            "if not (x) then _v1 = false else _r0 = f(a) --[[resume:3]]; _v1 = _r0 end"
        );
    }

    #[test]
    fn test_split_pending() {
        let mut state = FunctionState::new();
        state.push_pending(PendingStatement::Assign {
            target: "a".to_string(),
            value: "1".to_string(),
        });
        let mark = state.pending_mark();
        state.push_pending(PendingStatement::Assign {
            target: "b".to_string(),
            value: "2".to_string(),
        });
        let tail = state.split_pending_at(mark);
        assert_eq!(tail.len(), 1);
        assert_eq!(state.pending().len(), 1);
        assert_eq!(state.drain_pending().len(), 1);
        assert!(state.pending().is_empty());
    }
}
