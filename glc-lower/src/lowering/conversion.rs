//! Conversion engine
//!
//! Explicit conversions (`T(x)`) and implicit ones (assignment, argument
//! passing, return) share one rule table. The oracle only presents valid
//! conversions, so a pair the table does not cover is an internal error.

use super::errors::LowerError;
use super::lowered::Lowered;
use super::numeric::{fix_number, needs_normalization};
use super::template::Operand;
use super::{host, ExpressionLowerer};
use crate::ast::{Expression, ExpressionKind};
use crate::lua;
use crate::runtime;
use crate::types::{BasicKind, Type};
use glc_common::CompilerError;
use log::trace;

fn not_supported(expr: &Expression, from: &Type, to: &Type) -> CompilerError {
    LowerError::ConversionNotSupported {
        from: from.to_string(),
        to: to.to_string(),
        location: expr.span.start.clone(),
    }
    .into()
}

/// Whether every value of `from` is representable in `to` unchanged
fn int_range_contains(to: BasicKind, from: BasicKind) -> bool {
    let (Some(to_width), Some(from_width)) = (to.bit_width(), from.bit_width()) else {
        return false;
    };
    match (to.is_unsigned(), from.is_unsigned()) {
        (true, true) | (false, false) => from_width <= to_width,
        (false, true) => from_width < to_width,
        (true, false) => false,
    }
}

pub fn lower_conversion(
    lw: &mut ExpressionLowerer<'_>,
    expr: &Expression,
    desired: &Type,
) -> Result<Lowered, CompilerError> {
    let expr_type = lw.type_of(expr)?;
    trace!("conversion {} -> {}", expr_type, desired);
    if expr_type.identical(desired) {
        return lw.lower(expr, None);
    }
    if expr_type.is_untyped_nil() {
        return Ok(Lowered::new(lw.zero_value(desired, &expr.span)?));
    }

    match desired.underlying() {
        Type::Basic(to) => lower_basic_conversion(lw, expr, &expr_type, desired, *to),
        Type::Slice { .. } => {
            if expr_type.is_string() {
                let helper = if desired.is_rune_slice() {
                    runtime::STRING_TO_RUNES
                } else {
                    runtime::STRING_TO_BYTES
                };
                return lw.render(&format!("{}(%e)", helper), &[Operand::Expr(expr)]);
            }
            match expr_type.underlying() {
                Type::Slice { .. } => lw.lower(expr, None),
                _ => Err(not_supported(expr, &expr_type, desired)),
            }
        }
        Type::Pointer { elem } => {
            if elem.is_aggregate() || expr_type.basic_kind() == Some(BasicKind::UnsafePointer) {
                return lw.lower(expr, None);
            }
            let elem = elem.as_ref().clone();
            lower_pointer_retype(lw, expr, &expr_type, desired, &elem)
        }
        Type::Interface { .. } => {
            if expr_type.basic_kind() == Some(BasicKind::UnsafePointer) {
                return lw.lower(expr, None);
            }
            lower_implicit_with_cloning(lw, expr, desired)
        }
        _ => lower_implicit_with_cloning(lw, expr, desired),
    }
}

fn lower_basic_conversion(
    lw: &mut ExpressionLowerer<'_>,
    expr: &Expression,
    expr_type: &Type,
    desired: &Type,
    to: BasicKind,
) -> Result<Lowered, CompilerError> {
    let from = expr_type.basic_kind();

    if to.is_integer() {
        return match from {
            Some(from) if from.is_integer() => {
                let value = lw.lower(expr, None)?;
                if int_range_contains(to, from) || !needs_normalization(to) {
                    Ok(value)
                } else {
                    Ok(fix_number(value, to))
                }
            }
            Some(from) if from.is_float() => {
                let truncated = lw.render_paren(
                    "%1e >= 0 and math.floor(%1e) or math.ceil(%1e)",
                    &[Operand::Expr(expr)],
                )?;
                Ok(fix_number(truncated, to))
            }
            Some(BasicKind::UnsafePointer) => lw.lower(expr, None),
            _ => Err(not_supported(expr, expr_type, desired)),
        };
    }

    if to.is_float() {
        return match from {
            Some(from) if from.is_integer() => lw.render_paren("%e + 0.0", &[Operand::Expr(expr)]),
            Some(from) if from.is_float() => lw.lower(expr, None),
            _ => Err(not_supported(expr, expr_type, desired)),
        };
    }

    if to.is_complex() {
        return match from {
            Some(from) if from.is_complex() => lw.lower(expr, None),
            _ => Err(not_supported(expr, expr_type, desired)),
        };
    }

    if to.is_string() {
        if let Some(from) = from {
            if from.is_integer() {
                return lw.render(&format!("{}(%e)", runtime::ENCODE_RUNE), &[Operand::Expr(expr)]);
            }
            if from.is_string() {
                return lw.lower(expr, None);
            }
        }
        if let Type::Slice { .. } = expr_type.underlying() {
            let helper = if expr_type.is_rune_slice() {
                runtime::RUNES_TO_STRING
            } else {
                runtime::BYTES_TO_STRING
            };
            return lw.render(&format!("{}(%e)", helper), &[Operand::Expr(expr)]);
        }
        return Err(not_supported(expr, expr_type, desired));
    }

    if to == BasicKind::UnsafePointer && (expr_type.is_pointer() || from == Some(BasicKind::Uintptr)) {
        return lw.lower(expr, None);
    }

    if to.is_boolean() && from.map_or(false, |k| k.is_boolean()) {
        return lw.lower(expr, None);
    }

    Err(not_supported(expr, expr_type, desired))
}

/// `*T` to `*U` for non-aggregate elements: wrap the source accessor in a new
/// accessor whose getter and setter convert between the element types.
fn lower_pointer_retype(
    lw: &mut ExpressionLowerer<'_>,
    expr: &Expression,
    expr_type: &Type,
    desired: &Type,
    desired_elem: &Type,
) -> Result<Lowered, CompilerError> {
    let Some(source_elem) = expr_type.pointer_elem().cloned() else {
        return Err(not_supported(expr, expr_type, desired));
    };
    let source = lw.lower(expr, None)?;
    let ptr_var = lw.state.new_local("_ptr");
    let value_var = lw.state.new_local("_v");

    let ptr_ident = lw.synthesize_var(&ptr_var, expr_type.clone(), &expr.span);
    let deref = lw.synthesize(ExpressionKind::Star(Box::new(ptr_ident)), source_elem.clone(), &expr.span);
    let getter = lower_conversion(lw, &deref, desired_elem)?;

    let value_ident = lw.synthesize_var(&value_var, desired_elem.clone(), &expr.span);
    let setter = lower_conversion(lw, &value_ident, &source_elem)?;

    Ok(Lowered::new(format!(
        "(function() local {p} = {src}; return {acc}(function() return {get} end, function({v}) {p}.set({set}) end) end)()",
        p = ptr_var,
        src = source.text,
        acc = runtime::NEW_ACCESSOR,
        get = getter.text,
        v = value_var,
        set = setter.text,
    )))
}

/// Implicit conversion, copying struct and array values that are not
/// freshly constructed
pub fn lower_implicit_with_cloning(
    lw: &mut ExpressionLowerer<'_>,
    expr: &Expression,
    desired: &Type,
) -> Result<Lowered, CompilerError> {
    if desired.is_aggregate() {
        let fresh = matches!(expr.unparen().kind, ExpressionKind::CompositeLit { .. });
        if !fresh {
            return lw.render(
                &format!("{}(%e, {})", runtime::CLONE, lua::quote(&desired.type_name())),
                &[Operand::Expr(expr)],
            );
        }
    }
    lower_implicit(lw, expr, desired)
}

pub fn lower_implicit(
    lw: &mut ExpressionLowerer<'_>,
    expr: &Expression,
    desired: &Type,
) -> Result<Lowered, CompilerError> {
    let expr_type = lw.type_of(expr)?;
    if expr_type.identical(desired) {
        return lw.lower(expr, None);
    }
    if expr_type.is_untyped_nil() {
        return Ok(Lowered::new(lw.zero_value(desired, &expr.span)?));
    }

    if desired.is_interface() && !expr_type.is_interface() {
        if lw.config().is_host_object(&expr_type) {
            return host::wrap_host_object(lw, expr);
        }
        if lw.config().is_boxed(&expr_type) {
            return lw.render(
                &format!("{}({}, %e)", runtime::BOX, lua::quote(&expr_type.type_name())),
                &[Operand::Expr(expr)],
            );
        }
        if matches!(expr_type.underlying(), Type::Struct { .. }) {
            return lw.render("%1e.__constructor.elem(%1e)", &[Operand::Expr(expr)]);
        }
    }

    lw.lower(expr, Some(desired))
}

pub fn lower_type_assertion(
    lw: &mut ExpressionLowerer<'_>,
    expr: &Expression,
    base: &Expression,
    asserted: Option<&Expression>,
) -> Result<Lowered, CompilerError> {
    let Some(asserted) = asserted else {
        return lw.lower(base, None);
    };
    let target = lw.type_of(asserted)?;
    let name = lua::quote(&target.type_name());
    let comma_ok = matches!(lw.type_of(expr)?, Type::Tuple(_));
    let pattern = if comma_ok {
        format!("{}(%e, {}, true)", runtime::ASSERT_TYPE, name)
    } else {
        format!("{}(%e, {})", runtime::ASSERT_TYPE, name)
    };
    lw.render(&pattern, &[Operand::Expr(base)])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_containment() {
        assert!(int_range_contains(BasicKind::Int16, BasicKind::Int8));
        assert!(int_range_contains(BasicKind::Int16, BasicKind::Uint8));
        assert!(!int_range_contains(BasicKind::Int8, BasicKind::Uint8));
        assert!(!int_range_contains(BasicKind::Uint32, BasicKind::Int8));
        assert!(int_range_contains(BasicKind::Uint, BasicKind::Uint32));
        assert!(int_range_contains(BasicKind::Int64, BasicKind::Uint32));
    }
}
