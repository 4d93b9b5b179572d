//! Expression lowering
//!
//! `ExpressionLowerer` turns one typed Go expression into Lua text. It
//! dispatches on node kind; each component lives in its own module:
//!
//! - `template`: placeholder substitution with single-evaluation hoisting
//! - `numeric`: width/sign normalization of integer results
//! - `literals`, `zero`: constants and type-directed zero values
//! - `conversion`: explicit and implicit conversions, type assertions
//! - `composite`: array/slice/map/struct literals
//! - `builtins`: `len`, `append`, `make` and friends
//! - `selectors`, `calls`: field/method resolution and calls, including
//!   suspension-marked calls
//! - `host`: optional host-object bridging

mod binary_ops;
mod builtins;
mod calls;
mod composite;
mod conversion;
mod errors;
mod functions;
mod host;
mod identifiers;
mod index_ops;
mod literals;
mod lowered;
mod numeric;
mod selectors;
mod template;
mod unary_ops;
mod zero;

pub use errors::LowerError;
pub use functions::{FunctionBodyLowering, FunctionText};
pub use lowered::Lowered;
pub use numeric::{fix_number, wrap_integer};
pub use template::Operand;
pub use zero::zero_value;

use crate::ast::{Expression, ExpressionKind};
use crate::config::LowerConfig;
use crate::oracle::{Binding, ConstValue, Object, Selection, SuspensionMarkers, TypeOracle};
use crate::state::FunctionState;
use crate::types::Type;
use glc_common::{CompilerError, SourceSpan};
use log::{debug, trace};

/// Lowers the expressions of one function
pub struct ExpressionLowerer<'a> {
    oracle: &'a dyn TypeOracle,
    markers: &'a SuspensionMarkers,
    config: &'a LowerConfig,
    pub(crate) state: &'a mut FunctionState,
    bodies: Option<&'a mut dyn FunctionBodyLowering>,
}

impl<'a> ExpressionLowerer<'a> {
    pub fn new(
        oracle: &'a dyn TypeOracle,
        markers: &'a SuspensionMarkers,
        config: &'a LowerConfig,
        state: &'a mut FunctionState,
    ) -> Self {
        Self {
            oracle,
            markers,
            config,
            state,
            bodies: None,
        }
    }

    /// Attach the statement driver used for function literal bodies
    pub fn with_bodies(mut self, bodies: &'a mut dyn FunctionBodyLowering) -> Self {
        self.bodies = Some(bodies);
        self
    }

    pub fn config(&self) -> &LowerConfig {
        self.config
    }

    pub fn state(&self) -> &FunctionState {
        &*self.state
    }

    pub fn state_mut(&mut self) -> &mut FunctionState {
        &mut *self.state
    }

    /// Lower `expr`. `desired` only adjusts the rendered width of an integer
    /// constant; conversions are requested through `lower_implicit`.
    pub fn lower(&mut self, expr: &Expression, desired: Option<&Type>) -> Result<Lowered, CompilerError> {
        debug!("lowering {} (node {}) at {}", expr.kind_name(), expr.node_id, expr.span.start);
        let ty = self.type_of(expr)?;

        if let Some(value) = self.constant_of(expr) {
            trace!("node {} folds to constant {:?}", expr.node_id, value);
            return literals::lower_constant(self, expr, &value, &ty, desired);
        }

        match &expr.kind {
            ExpressionKind::BasicLit { value } => Err(LowerError::unsupported(
                format!("literal '{}' without a constant value", value),
                &expr.span.start,
            )
            .into()),
            ExpressionKind::Ident { name } => identifiers::lower_identifier(self, expr, name),
            ExpressionKind::Unary { op, operand } => unary_ops::lower_unary(self, expr, *op, operand),
            ExpressionKind::Binary { op, left, right } => {
                binary_ops::lower_binary(self, expr, *op, left, right)
            }
            ExpressionKind::Index { base, index } => index_ops::lower_index(self, expr, base, index),
            ExpressionKind::Slice { base, low, high, max } => index_ops::lower_slice(
                self,
                expr,
                base,
                low.as_deref(),
                high.as_deref(),
                max.as_deref(),
            ),
            ExpressionKind::Selector { base, sel } => selectors::lower_selector(self, expr, base, sel),
            ExpressionKind::Call { func, args, ellipsis } => {
                calls::lower_call(self, expr, func, args, *ellipsis)
            }
            ExpressionKind::CompositeLit { elements } => {
                composite::lower_composite_literal(self, expr, elements)
            }
            ExpressionKind::TypeAssert { base, asserted } => {
                conversion::lower_type_assertion(self, expr, base, asserted.as_deref())
            }
            ExpressionKind::Paren(inner) => self.lower(inner, desired),
            ExpressionKind::Star(inner) => unary_ops::lower_deref(self, expr, inner),
            ExpressionKind::FuncLit { body } => functions::lower_func_literal(self, expr, *body),
            ExpressionKind::TypeExpr => Err(LowerError::unsupported(
                "type expression used as a value",
                &expr.span.start,
            )
            .into()),
        }
    }

    pub fn lower_expr(&mut self, expr: &Expression) -> Result<Lowered, CompilerError> {
        self.lower(expr, None)
    }

    /// Lower `expr` for an explicit conversion `T(expr)`
    pub fn lower_conversion(&mut self, expr: &Expression, desired: &Type) -> Result<Lowered, CompilerError> {
        conversion::lower_conversion(self, expr, desired)
    }

    /// Lower `expr` for assignment, argument passing or return to `desired`
    pub fn lower_implicit(&mut self, expr: &Expression, desired: &Type) -> Result<Lowered, CompilerError> {
        conversion::lower_implicit(self, expr, desired)
    }

    /// As `lower_implicit`, copying struct and array values
    pub fn lower_implicit_with_cloning(
        &mut self,
        expr: &Expression,
        desired: &Type,
    ) -> Result<Lowered, CompilerError> {
        conversion::lower_implicit_with_cloning(self, expr, desired)
    }

    /// Render a template; see the `template` module for the syntax
    pub fn render(&mut self, pattern: &str, operands: &[Operand<'_>]) -> Result<Lowered, CompilerError> {
        template::render(self, pattern, operands)
    }

    pub fn render_paren(&mut self, pattern: &str, operands: &[Operand<'_>]) -> Result<Lowered, CompilerError> {
        template::render_paren(self, pattern, operands)
    }

    pub fn zero_value(&self, ty: &Type, span: &SourceSpan) -> Result<String, CompilerError> {
        zero::zero_value(ty, &span.start).map_err(CompilerError::from)
    }

    // Oracle access, with synthesized nodes layered on top

    pub fn type_of(&self, expr: &Expression) -> Result<Type, CompilerError> {
        self.state
            .synthetic_type(expr.node_id)
            .or_else(|| self.oracle.type_of(expr.node_id))
            .cloned()
            .ok_or_else(|| {
                LowerError::MissingType {
                    node: expr.node_id,
                    location: expr.span.start.clone(),
                }
                .into()
            })
    }

    pub fn constant_of(&self, expr: &Expression) -> Option<ConstValue> {
        self.state
            .synthetic_constant(expr.node_id)
            .or_else(|| self.oracle.constant_of(expr.node_id))
            .cloned()
    }

    pub fn binding_of(&self, expr: &Expression) -> Binding<'_> {
        match self.state.synthetic_use(expr.node_id) {
            Some(obj) => Binding::Use(obj),
            None => self.oracle.binding_of(expr.node_id),
        }
    }

    /// Object an identifier binds to; an unresolved identifier is an error
    pub fn object_of(&self, expr: &Expression) -> Result<Object, CompilerError> {
        match self.binding_of(expr) {
            Binding::Definition(obj) | Binding::Use(obj) => Ok(obj.clone()),
            Binding::Unresolved => Err(LowerError::UnresolvedIdentifier {
                name: expr.ident_name().unwrap_or("<non-identifier>").to_string(),
                location: expr.span.start.clone(),
            }
            .into()),
        }
    }

    pub fn selection_of(&self, expr: &Expression) -> Option<Selection> {
        self.state
            .synthetic_selection(expr.node_id)
            .or_else(|| self.oracle.selection_of(expr.node_id))
            .cloned()
    }

    pub fn is_suspending(&self, expr: &Expression) -> bool {
        self.markers.is_suspending(expr.node_id) || self.state.is_synthetic_suspending(expr.node_id)
    }

    // Synthesized helper nodes

    /// Create a helper node with a fresh id and the given type
    pub(crate) fn synthesize(&mut self, kind: ExpressionKind, ty: Type, span: &SourceSpan) -> Expression {
        let id = self.state.next_synthetic_id();
        self.state.set_synthetic_type(id, ty);
        Expression::new(id, kind, span.clone())
    }

    /// Identifier node bound to a generated local variable
    pub(crate) fn synthesize_var(&mut self, name: &str, ty: Type, span: &SourceSpan) -> Expression {
        let expr = self.synthesize(
            ExpressionKind::Ident {
                name: name.to_string(),
            },
            ty.clone(),
            span,
        );
        self.state.set_synthetic_use(expr.node_id, Object::var(name, ty));
        expr
    }

    pub(crate) fn unsupported(&self, expr: &Expression, what: impl Into<String>) -> CompilerError {
        LowerError::unsupported(what, &expr.span.start).into()
    }

    pub(crate) fn report_error(&mut self, message: impl Into<String>, span: &SourceSpan) {
        self.state.reporter_mut().error(message.into(), span.clone());
    }
}

/// Text usable as the prefix of a call, index or method call
pub(crate) fn prefix_text(lowered: &Lowered) -> String {
    let text = lowered.with_parens();
    let starts_like_prefix = text
        .chars()
        .next()
        .map_or(false, |c| c.is_ascii_alphabetic() || c == '_' || c == '(');
    if starts_like_prefix && !text.starts_with("function") {
        text
    } else {
        format!("({})", text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_text() {
        assert_eq!(prefix_text(&Lowered::new("x")), "x");
        assert_eq!(prefix_text(&Lowered::new("\"abc\"")), "(\"abc\")");
        assert_eq!(prefix_text(&Lowered::paren("a .. b")), "(a .. b)");
        assert_eq!(prefix_text(&Lowered::new("function() end")), "(function() end)");
    }
}
