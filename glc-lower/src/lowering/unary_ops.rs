//! Unary operations, address-of, dereference and channel receive

use super::identifiers::{accessor_key, box_name, object_name};
use super::lowered::Lowered;
use super::numeric::fix_number;
use super::selectors::field_path;
use super::template::Operand;
use super::{host, ExpressionLowerer};
use crate::ast::{Expression, ExpressionKind, UnaryOp};
use crate::lua;
use crate::oracle::{Object, SelectionKind};
use crate::runtime;
use crate::types::{BasicKind, Signature, Type};
use glc_common::CompilerError;

pub fn lower_unary(
    lw: &mut ExpressionLowerer<'_>,
    expr: &Expression,
    op: UnaryOp,
    operand: &Expression,
) -> Result<Lowered, CompilerError> {
    if op == UnaryOp::AddrOf {
        return lower_address_of(lw, expr, operand);
    }
    if op == UnaryOp::Recv {
        return lower_receive(lw, expr, operand);
    }

    let operand_type = lw.type_of(operand)?;
    let Some(kind) = operand_type.basic_kind() else {
        return Err(lw.unsupported(expr, format!("unary {} on {}", op, operand_type)));
    };

    match op {
        UnaryOp::Plus => lw.lower(operand, None),
        UnaryOp::Neg => {
            if kind.is_complex() {
                lw.render(
                    &format!("{}(-%1r, -%1i)", runtime::COMPLEX),
                    &[Operand::Expr(operand)],
                )
            } else {
                let negated = lw.render_paren("-%e", &[Operand::Expr(operand)])?;
                Ok(fix_number(negated, kind))
            }
        }
        UnaryOp::BitNot => {
            let inverted = lw.render_paren("~%e", &[Operand::Expr(operand)])?;
            Ok(fix_number(inverted, kind))
        }
        UnaryOp::Not => lw.render_paren("not %e", &[Operand::Expr(operand)]),
        UnaryOp::AddrOf | UnaryOp::Recv => Err(lw.unsupported(expr, format!("unary {}", op))),
    }
}

/// `&x`: aggregates are their own reference; everything else gets an
/// accessor box, cached so that taking the address twice yields one box.
fn lower_address_of(
    lw: &mut ExpressionLowerer<'_>,
    expr: &Expression,
    operand: &Expression,
) -> Result<Lowered, CompilerError> {
    let expr_type = lw.type_of(expr)?;
    if lw.config().is_host_object(&expr_type) {
        return lw.render("%e.object", &[Operand::Expr(operand)]);
    }
    let operand_type = lw.type_of(operand)?;
    if operand_type.is_aggregate() {
        return lw.lower(operand, None);
    }

    let target = operand.unparen();
    match &target.kind {
        ExpressionKind::CompositeLit { .. } => lw.render(
            &format!(
                "{}(%e, {})",
                runtime::NEW_DATA_POINTER,
                lua::quote(&expr_type.type_name())
            ),
            &[Operand::Expr(target)],
        ),
        ExpressionKind::Ident { .. } => {
            let obj = lw.object_of(target)?;
            Ok(variable_accessor(lw, &obj))
        }
        ExpressionKind::Selector { base, sel } => match lw.selection_of(target) {
            None => {
                let obj = lw.object_of(sel)?;
                Ok(variable_accessor(lw, &obj))
            }
            Some(selection) if selection.kind == SelectionKind::FieldVal => {
                let path = field_path(lw, &selection, &target.span)?;
                let cache = format!("__ptr_{}", accessor_key(&path.names.join("_")));
                let pattern = format!(
                    "(%1e.{c} or (function() %1e.{c} = {acc}(function() return %1e{p} end, function(_v) %1e{p} = _v end); return %1e.{c} end)())",
                    c = cache,
                    acc = runtime::NEW_ACCESSOR,
                    p = path.chain(),
                );
                lw.render(&pattern, &[Operand::Expr(base)])
            }
            Some(_) => Err(lw.unsupported(expr, "address of a method value")),
        },
        ExpressionKind::Index { base, index } => lw.render(
            &format!(
                "{}(%e, %e, {})",
                runtime::INDEX_PTR,
                lua::quote(&expr_type.type_name())
            ),
            &[Operand::Expr(base), Operand::Expr(index)],
        ),
        ExpressionKind::Star(inner) => lw.lower(inner, None),
        _ => Err(lw.unsupported(expr, format!("address of {}", target.kind_name()))),
    }
}

/// Cached accessor box for a variable
fn variable_accessor(lw: &mut ExpressionLowerer<'_>, obj: &Object) -> Lowered {
    if obj.escaping {
        let boxed = box_name(lw, obj);
        return Lowered::new(format!(
            "({b}.__ptr or (function() {b}.__ptr = {acc}(function() return {b}[0] end, function(_v) {b}[0] = _v end); return {b}.__ptr end)())",
            b = boxed,
            acc = runtime::NEW_ACCESSOR,
        ));
    }
    let name = object_name(lw, obj);
    let cache = lw.state.accessor_box(&accessor_key(&name));
    Lowered::new(format!(
        "({c} or (function() {c} = {acc}(function() return {n} end, function(_v) {n} = _v end); return {c} end)())",
        c = cache,
        acc = runtime::NEW_ACCESSOR,
        n = name,
    ))
}

/// `*p`
pub fn lower_deref(
    lw: &mut ExpressionLowerer<'_>,
    expr: &Expression,
    operand: &Expression,
) -> Result<Lowered, CompilerError> {
    let operand_type = lw.type_of(operand)?;
    if lw.config().is_host_object(&operand_type) {
        return host::wrap_host_object(lw, operand);
    }
    let expr_type = lw.type_of(expr)?;
    if expr_type.is_aggregate() {
        return lw.lower(operand, None);
    }
    lw.render("%e.get()", &[Operand::Expr(operand)])
}

/// `<-ch`, lowered as a suspension-marked call to the runtime receive
fn lower_receive(
    lw: &mut ExpressionLowerer<'_>,
    expr: &Expression,
    operand: &Expression,
) -> Result<Lowered, CompilerError> {
    let chan_type = lw.type_of(operand)?;
    let expr_type = lw.type_of(expr)?;
    let comma_ok = matches!(expr_type, Type::Tuple(_));
    let elem = match chan_type.underlying() {
        Type::Chan { elem } => elem.as_ref().clone(),
        other => return Err(lw.unsupported(expr, format!("receive from {}", other))),
    };
    let result = Type::Tuple(vec![elem, Type::basic(BasicKind::Bool)]);
    let signature = Type::Signature(Signature::new(vec![chan_type], vec![result.clone()]));

    let callee = lw.synthesize(
        ExpressionKind::Ident {
            name: runtime::RECV.to_string(),
        },
        signature.clone(),
        &expr.span,
    );
    lw.state
        .set_synthetic_use(callee.node_id, Object::func(runtime::RECV, signature));
    let call = lw.synthesize(
        ExpressionKind::Call {
            func: Box::new(callee),
            args: vec![operand.clone()],
            ellipsis: false,
        },
        result,
        &expr.span,
    );
    lw.state.mark_synthetic_suspending(call.node_id);

    let received = lw.lower(&call, None)?;
    if comma_ok {
        Ok(received)
    } else {
        Ok(Lowered::new(format!("{}[0]", received.text)))
    }
}
