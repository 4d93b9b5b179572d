//! Constant folding into Lua literals

use super::errors::LowerError;
use super::lowered::Lowered;
use super::numeric::wrap_integer;
use super::ExpressionLowerer;
use crate::ast::Expression;
use crate::lua;
use crate::oracle::ConstValue;
use crate::runtime;
use crate::types::Type;
use glc_common::CompilerError;

/// Render a constant-valued node. The basic kind of `ty` picks the branch;
/// an integer `desired` type only changes the width the value is wrapped to.
pub fn lower_constant(
    lw: &mut ExpressionLowerer<'_>,
    expr: &Expression,
    value: &ConstValue,
    ty: &Type,
    desired: Option<&Type>,
) -> Result<Lowered, CompilerError> {
    let Some(kind) = ty.basic_kind() else {
        return Err(lw.unsupported(expr, format!("constant of non-basic type {}", ty)));
    };
    let mismatch = || -> CompilerError {
        LowerError::unsupported(
            format!("constant {:?} does not fit type {}", value, ty),
            &expr.span.start,
        )
        .into()
    };

    if kind.is_boolean() {
        let b = value.as_bool().ok_or_else(mismatch)?;
        return Ok(Lowered::new(b.to_string()));
    }

    if kind.is_integer() {
        let n = value.as_int().ok_or_else(mismatch)?;
        let target = desired
            .and_then(|t| t.basic_kind())
            .filter(|k| k.is_integer())
            .unwrap_or(kind);
        let wrapped = wrap_integer(n, target);
        let text = lua::int_literal(wrapped);
        return Ok(if wrapped < 0 {
            Lowered::paren(text)
        } else {
            Lowered::new(text)
        });
    }

    if kind.is_float() {
        let f = value.as_float().ok_or_else(mismatch)?;
        let text = lua::float_literal(f);
        return Ok(if f < 0.0 {
            Lowered::paren(text)
        } else {
            Lowered::new(text)
        });
    }

    if kind.is_complex() {
        let (Some(re), Some(im)) = (value.real(), value.imag()) else {
            return Err(mismatch());
        };
        return Ok(Lowered::new(format!(
            "{}({}, {})",
            runtime::COMPLEX,
            lua::float_literal(re),
            lua::float_literal(im)
        )));
    }

    if kind.is_string() {
        let s = value.as_str().ok_or_else(mismatch)?;
        return Ok(Lowered::new(lua::quote(s)));
    }

    Err(lw.unsupported(expr, format!("constant of kind {}", kind)))
}
