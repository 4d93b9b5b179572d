//! Go-to-Lua Compiler - Expression Lowering
//!
//! This crate turns typed Go expression trees into Lua source text that keeps
//! Go's value semantics on a Lua 5.3 runtime. It includes:
//!
//! - Static types, the expression tree and the oracle interface
//! - Template substitution with single-evaluation hoisting
//! - Numeric normalization for fixed-width integers
//! - Conversions, composite literals, builtins, selectors and calls
//! - Suspension-point handling for cooperative tasks
//!
//! Statements are lowered elsewhere; the driver collects the pending
//! statements each expression leaves in its `FunctionState`.

pub mod ast;
pub mod config;
/// Expression builders for tests; not used by lowering itself
pub mod fixture;
pub mod lowering;
pub mod lua;
pub mod oracle;
pub mod runtime;
pub mod state;
pub mod types;

pub use ast::{BinaryOp, Element, Expression, ExpressionKind, UnaryOp};
pub use config::{HostInteropConfig, LowerConfig};
pub use lowering::{ExpressionLowerer, FunctionBodyLowering, FunctionText, LowerError, Lowered};
pub use oracle::{Binding, ConstValue, Object, ObjectKind, Selection, SelectionKind, SuspensionMarkers, TableOracle, TypeOracle};
pub use state::{FunctionState, PendingStatement};
pub use types::{BasicKind, Signature, StructField, Type};

use glc_common::CompilerError;

/// Lower a single expression in the context of `state`
pub fn lower_expression(
    oracle: &dyn TypeOracle,
    markers: &SuspensionMarkers,
    config: &LowerConfig,
    state: &mut FunctionState,
    expr: &Expression,
) -> Result<Lowered, CompilerError> {
    ExpressionLowerer::new(oracle, markers, config, state).lower(expr, None)
}
