//! Binary operators
//!
//! Integer arithmetic is normalized to the result width; division and
//! remainder go through the runtime's zero-divisor guards. `uint64` ordering
//! flips the sign bit of both sides before a signed compare. `&&`/`||` with a
//! suspending right operand become a `Guard` pending statement.

use super::identifiers::is_nil;
use super::lowered::Lowered;
use super::numeric::fix_number;
use super::template::Operand;
use super::ExpressionLowerer;
use crate::ast::{BinaryOp, Expression};
use crate::lua;
use crate::runtime;
use crate::state::PendingStatement;
use crate::types::{BasicKind, Type};
use glc_common::CompilerError;
use log::debug;

pub fn lower_binary(
    lw: &mut ExpressionLowerer<'_>,
    expr: &Expression,
    op: BinaryOp,
    left: &Expression,
    right: &Expression,
) -> Result<Lowered, CompilerError> {
    match op {
        BinaryOp::LogicalAnd | BinaryOp::LogicalOr => lower_logical(lw, op, left, right),
        BinaryOp::Eql | BinaryOp::Neq => {
            // nil goes on the right
            if is_nil(lw, left) && !is_nil(lw, right) {
                lower_equality(lw, expr, op == BinaryOp::Neq, right, left)
            } else {
                lower_equality(lw, expr, op == BinaryOp::Neq, left, right)
            }
        }
        BinaryOp::Lss | BinaryOp::Leq | BinaryOp::Gtr | BinaryOp::Geq => {
            if lw.type_of(left)?.basic_kind() == Some(BasicKind::Uint64) {
                let pattern = format!("(%e ~ {0}) %t (%e ~ {0})", lua::MIN_INTEGER);
                return lw.render_paren(&pattern, &[left.into(), Operand::Token(op), right.into()]);
            }
            lw.render_paren("%e %t %e", &[left.into(), Operand::Token(op), right.into()])
        }
        _ => lower_arithmetic(lw, expr, op, left, right),
    }
}

fn lower_logical(
    lw: &mut ExpressionLowerer<'_>,
    op: BinaryOp,
    left: &Expression,
    right: &Expression,
) -> Result<Lowered, CompilerError> {
    let condition = lw.lower(left, None)?;
    let mark = lw.state.pending_mark();
    let value = lw.lower(right, None)?;
    let body = lw.state.split_pending_at(mark);

    if body.is_empty() && !lw.is_suspending(right) {
        return Ok(Lowered::paren(format!(
            "{} {} {}",
            condition.with_parens(),
            op.lua_token(),
            value.with_parens()
        )));
    }

    let result = lw.state.new_temporary("_v");
    debug!("guarding suspending right operand of {} into {}", op, result);
    lw.state.push_pending(PendingStatement::Guard {
        result: result.clone(),
        condition: condition.text,
        is_and: op == BinaryOp::LogicalAnd,
        body,
        value: value.text,
    });
    Ok(Lowered::new(result))
}

fn negate(lowered: Lowered, negated: bool) -> Lowered {
    if negated {
        Lowered::paren(format!("not {}", lowered.with_parens()))
    } else {
        lowered
    }
}

fn lower_equality(
    lw: &mut ExpressionLowerer<'_>,
    expr: &Expression,
    negated: bool,
    left: &Expression,
    right: &Expression,
) -> Result<Lowered, CompilerError> {
    let left_type = lw.type_of(left)?;
    let right_type = lw.type_of(right)?;
    let eq = if negated { "~=" } else { "==" };

    if is_nil(lw, right) {
        if lw.config().is_host_object(&left_type) {
            return lw.render_paren(&format!("%e {} nil", eq), &[left.into()]);
        }
        return match left_type.underlying() {
            Type::Pointer { .. } | Type::Interface { .. } | Type::Basic(BasicKind::UntypedNil) => {
                lw.render_paren(&format!("%e {} nil", eq), &[left.into()])
            }
            Type::Slice { .. } | Type::Map { .. } | Type::Signature(_) | Type::Chan { .. } => {
                let test = lw.render(&format!("{}(%e)", runtime::IS_NIL), &[left.into()])?;
                Ok(negate(test, negated))
            }
            other => Err(lw.unsupported(expr, format!("comparison of {} with nil", other))),
        };
    }

    if left_type.is_interface() || right_type.is_interface() {
        let pattern = format!("{}(%e, %e)", runtime::INTERFACE_IS_EQUAL);
        let test = if !right_type.is_interface() {
            let boxed = lw.lower_implicit(right, &left_type)?;
            lw.render(&pattern, &[left.into(), boxed.into()])?
        } else if !left_type.is_interface() {
            let boxed = lw.lower_implicit(left, &right_type)?;
            lw.render(&pattern, &[boxed.into(), right.into()])?
        } else {
            lw.render(&pattern, &[left.into(), right.into()])?
        };
        return Ok(negate(test, negated));
    }

    let structural = match left_type.underlying() {
        Type::Array { .. } | Type::Struct { .. } => true,
        Type::Pointer { elem } => matches!(elem.underlying(), Type::Array { .. }),
        _ => false,
    };
    if structural {
        let test = lw.render(
            &format!(
                "{}(%e, %e, {})",
                runtime::EQUAL,
                lua::quote(&left_type.type_name())
            ),
            &[left.into(), right.into()],
        )?;
        return Ok(negate(test, negated));
    }

    if let Some(kind) = left_type.basic_kind() {
        if kind.is_boolean() {
            if let Some(b) = lw.constant_of(right).and_then(|v| v.as_bool()) {
                let value = lw.lower(left, None)?;
                return Ok(negate(value, b == negated));
            }
        }
        if kind.is_complex() {
            let pattern = if negated {
                "%1r ~= %2r or %1i ~= %2i"
            } else {
                "%1r == %2r and %1i == %2i"
            };
            return lw.render_paren(pattern, &[left.into(), right.into()]);
        }
    }

    lw.render_paren(&format!("%e {} %e", eq), &[left.into(), right.into()])
}

fn lower_arithmetic(
    lw: &mut ExpressionLowerer<'_>,
    expr: &Expression,
    op: BinaryOp,
    left: &Expression,
    right: &Expression,
) -> Result<Lowered, CompilerError> {
    let ty = lw.type_of(expr)?;
    let Some(kind) = ty.basic_kind() else {
        return Err(lw.unsupported(expr, format!("operator {} on {}", op, ty)));
    };

    if kind.is_string() {
        return match op {
            BinaryOp::Add => lw.render_paren("%e .. %e", &[left.into(), right.into()]),
            _ => Err(lw.unsupported(expr, format!("operator {} on strings", op))),
        };
    }

    if kind.is_complex() {
        return match op {
            BinaryOp::Add | BinaryOp::Sub => lw.render(
                &format!("{}(%1r %3t %2r, %1i %3t %2i)", runtime::COMPLEX),
                &[left.into(), right.into(), Operand::Token(op)],
            ),
            BinaryOp::Mul => lw.render(
                &format!(
                    "{}(%1r * %2r - %1i * %2i, %1r * %2i + %1i * %2r)",
                    runtime::COMPLEX
                ),
                &[left.into(), right.into()],
            ),
            BinaryOp::Quo => lw.render(
                &format!("{}(%e, %e)", runtime::DIV_COMPLEX),
                &[left.into(), right.into()],
            ),
            _ => Err(lw.unsupported(expr, format!("operator {} on complex values", op))),
        };
    }

    if kind.is_float() {
        return match op {
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Quo => {
                lw.render_paren("%e %t %e", &[left.into(), Operand::Token(op), right.into()])
            }
            _ => Err(lw.unsupported(expr, format!("operator {} on floats", op))),
        };
    }

    if !kind.is_integer() {
        return Err(lw.unsupported(expr, format!("operator {} on {}", op, ty)));
    }

    match op {
        BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul => {
            let value = lw.render_paren("%e %t %e", &[left.into(), Operand::Token(op), right.into()])?;
            Ok(fix_number(value, kind))
        }
        BinaryOp::Quo => {
            let div = if kind == BasicKind::Uint64 {
                runtime::UINT_DIV
            } else {
                runtime::INT_DIV
            };
            let value = lw.render(&format!("{}(%e, %e)", div), &[left.into(), right.into()])?;
            Ok(fix_number(value, kind))
        }
        BinaryOp::Rem => {
            let rem = if kind == BasicKind::Uint64 {
                runtime::UINT_MOD
            } else {
                runtime::INT_MOD
            };
            lw.render(&format!("{}(%e, %e)", rem), &[left.into(), right.into()])
        }
        BinaryOp::Shl => {
            let width = kind.bit_width().unwrap_or(64) as i128;
            if lw.constant_of(right).and_then(|v| v.as_int()).map_or(false, |n| n >= width) {
                // the left operand still runs when it may have effects
                if left.unparen().is_ident() || lw.constant_of(left).is_some() {
                    return Ok(Lowered::new("0"));
                }
                return lw.render_paren("%e & 0", &[left.into()]);
            }
            let value = lw.render_paren("%e << %f", &[left.into(), right.into()])?;
            Ok(fix_number(value, kind))
        }
        BinaryOp::Shr => {
            if kind.is_unsigned() {
                lw.render_paren("%e >> %f", &[left.into(), right.into()])
            } else {
                lw.render(
                    &format!("{}(%e, %f)", runtime::ARSHIFT),
                    &[left.into(), right.into()],
                )
            }
        }
        BinaryOp::And | BinaryOp::Or | BinaryOp::Xor => {
            lw.render_paren("%e %t %e", &[left.into(), Operand::Token(op), right.into()])
        }
        BinaryOp::AndNot => lw.render_paren("%e & ~%e", &[left.into(), right.into()]),
        _ => Err(lw.unsupported(expr, format!("operator {} on integers", op))),
    }
}
