//! Call lowering
//!
//! A call is either a conversion, a builtin, a host intrinsic, a method call
//! or a plain call. Calls flagged as suspending are not emitted inline: they
//! become a `CallAssign` pending statement and lower to their result
//! temporary.

use super::builtins;
use super::lowered::Lowered;
use super::selectors::{field_path, make_receiver};
use super::{host, prefix_text, ExpressionLowerer};
use crate::ast::{Expression, ExpressionKind};
use crate::lua;
use crate::oracle::{ObjectKind, SelectionKind};
use crate::runtime;
use crate::state::PendingStatement;
use crate::types::{Signature, Type};
use glc_common::CompilerError;
use log::debug;

/// Whether `expr` names a type rather than a value
pub(crate) fn is_type_expr(lw: &ExpressionLowerer<'_>, expr: &Expression) -> bool {
    let expr = expr.unparen();
    match &expr.kind {
        ExpressionKind::TypeExpr => true,
        ExpressionKind::Ident { .. } => lw
            .binding_of(expr)
            .object()
            .map_or(false, |obj| obj.kind == ObjectKind::TypeName),
        ExpressionKind::Selector { sel, .. } => {
            lw.selection_of(expr).is_none()
                && lw
                    .binding_of(sel)
                    .object()
                    .map_or(false, |obj| obj.kind == ObjectKind::TypeName)
        }
        _ => false,
    }
}

pub fn lower_call(
    lw: &mut ExpressionLowerer<'_>,
    expr: &Expression,
    func: &Expression,
    args: &[Expression],
    ellipsis: bool,
) -> Result<Lowered, CompilerError> {
    if is_type_expr(lw, func) {
        let Some(value) = args.first() else {
            return Err(lw.unsupported(expr, "conversion without an operand"));
        };
        let target = lw.type_of(expr)?;
        return lw.lower_conversion(value, &target);
    }

    let plain = func.unparen();
    match &plain.kind {
        ExpressionKind::Ident { name } => {
            let obj = lw.object_of(plain)?;
            if obj.kind == ObjectKind::Builtin {
                return builtins::lower_builtin(lw, expr, name, args, ellipsis);
            }
            if lw.config().is_host_package(obj.package.as_deref()) && obj.name == "InternalObject" {
                return lower_first_arg(lw, expr, args);
            }
        }
        ExpressionKind::Selector { base, sel } => match lw.selection_of(plain) {
            None => {
                let obj = lw.object_of(sel)?;
                if lw.config().is_host_package(obj.package.as_deref()) {
                    match obj.name.as_str() {
                        "Debugger" => return Ok(Lowered::new(format!("{}()", runtime::DEBUGGER))),
                        "InternalObject" => return lower_first_arg(lw, expr, args),
                        _ => {}
                    }
                }
            }
            Some(selection) if selection.kind == SelectionKind::MethodVal => {
                let sig = signature_of(lw, func)?;
                let recv = make_receiver(lw, base, &selection, &plain.span)?;
                let declared_recv = selection.obj.ty.signature().and_then(|s| s.recv.as_deref());
                if declared_recv.map_or(false, |recv| lw.config().is_host_object(recv)) {
                    return host::lower_host_method(lw, expr, recv, &selection.obj.name, args, ellipsis);
                }
                let callee = format!("{}:{}", prefix_text(&recv), lua::safe_name(&selection.obj.name));
                return translate_call(lw, expr, &sig, callee, args, ellipsis);
            }
            Some(selection) if selection.kind == SelectionKind::FieldVal => {
                let path = field_path(lw, &selection, &plain.span)?;
                if path.host.is_some() {
                    return lower_host_field_call(lw, plain, args);
                }
            }
            Some(_) => {}
        },
        _ => {}
    }

    let sig = signature_of(lw, func)?;
    let callee = lw.lower(func, None)?;
    translate_call(lw, expr, &sig, prefix_text(&callee), args, ellipsis)
}

fn signature_of(lw: &ExpressionLowerer<'_>, func: &Expression) -> Result<Signature, CompilerError> {
    let ty = lw.type_of(func)?;
    ty.signature()
        .cloned()
        .ok_or_else(|| lw.unsupported(func, format!("call of non-function type {}", ty)))
}

fn lower_first_arg(
    lw: &mut ExpressionLowerer<'_>,
    expr: &Expression,
    args: &[Expression],
) -> Result<Lowered, CompilerError> {
    match args.first() {
        Some(arg) => lw.lower(arg, None),
        None => Err(lw.unsupported(expr, "intrinsic call without an operand")),
    }
}

/// Call of a host-tagged function-valued field: arguments are externalized
/// and a single result is internalized.
fn lower_host_field_call(
    lw: &mut ExpressionLowerer<'_>,
    field: &Expression,
    args: &[Expression],
) -> Result<Lowered, CompilerError> {
    let sig = signature_of(lw, field)?;
    let callee = lw.lower(field, None)?;
    let mut texts = Vec::with_capacity(args.len());
    for arg in args {
        texts.push(host::externalize(lw, arg)?.text);
    }
    let call = Lowered::new(format!("{}({})", prefix_text(&callee), texts.join(", ")));
    match sig.results.as_slice() {
        [] => Ok(call),
        [result] => Ok(host::internalize(lw, &call, result)),
        _ => {
            lw.report_error(
                "field with js tag can not have func type with multiple results",
                &field.span,
            );
            Ok(call)
        }
    }
}

/// Emit `callee(args)`, or the suspending `CallAssign` form
pub(crate) fn translate_call(
    lw: &mut ExpressionLowerer<'_>,
    expr: &Expression,
    sig: &Signature,
    callee: String,
    args: &[Expression],
    ellipsis: bool,
) -> Result<Lowered, CompilerError> {
    let args = lower_args(lw, expr, sig, args, ellipsis)?;
    let call = format!("{}({})", callee, args.join(", "));
    if !lw.is_suspending(expr) {
        return Ok(Lowered::new(call));
    }

    let step = lw.state.next_resume_step();
    let target = if sig.results.is_empty() {
        None
    } else {
        Some(lw.state.new_temporary("_r"))
    };
    debug!("suspending call at {} resumes at step {}", expr.span.start, step);
    lw.state.push_pending(PendingStatement::CallAssign {
        target: target.clone(),
        call,
        step,
    });
    Ok(Lowered::new(target.unwrap_or_default()))
}

pub(crate) fn is_simple(text: &str) -> bool {
    lua::is_identifier(text)
        || text.parse::<f64>().is_ok()
        || matches!(text, "nil" | "true" | "false")
        || (text.starts_with('"') && text.ends_with('"') && text.len() >= 2)
}

/// Lower call arguments converted to the parameter types
///
/// `f(g())` with a multi-value `g` spreads the tuple through a temporary.
/// Variadic parameters are packed into a slice unless the call passes
/// `xs...`. When a later argument pushes pending statements, earlier
/// arguments are first assigned to temporaries so evaluation stays
/// left-to-right.
pub(crate) fn lower_args(
    lw: &mut ExpressionLowerer<'_>,
    expr: &Expression,
    sig: &Signature,
    args: &[Expression],
    ellipsis: bool,
) -> Result<Vec<String>, CompilerError> {
    let tuple_elems = match args {
        [single] => match lw.type_of(single)? {
            Type::Tuple(elems) if elems.len() > 1 => Some(elems),
            _ => None,
        },
        _ => None,
    };
    let spread;
    let args = match tuple_elems {
        Some(elems) => {
            let single = &args[0];
            let value = lw.lower(single, None)?;
            let tuple = lw.state.new_temporary("_tuple");
            lw.state.push_pending(PendingStatement::Assign {
                target: tuple.clone(),
                value: value.text,
            });
            let mut parts = Vec::with_capacity(elems.len());
            for (i, ty) in elems.into_iter().enumerate() {
                parts.push(lw.synthesize_var(&format!("{}[{}]", tuple, i), ty, &single.span));
            }
            spread = parts;
            spread.as_slice()
        }
        None => args,
    };

    let packed = sig.variadic && !ellipsis;
    let fixed = if packed {
        sig.params.len().saturating_sub(1)
    } else {
        args.len()
    };
    let elem = if packed {
        match sig.params.last().map(|t| t.underlying()) {
            Some(Type::Slice { elem }) => Some(elem.as_ref().clone()),
            other => {
                return Err(lw.unsupported(expr, format!("variadic parameter {:?}", other)));
            }
        }
    } else {
        None
    };

    let mut texts: Vec<String> = Vec::with_capacity(args.len());
    let mut materialized = 0usize;
    for (i, arg) in args.iter().enumerate() {
        let target = match (&elem, sig.params.get(i)) {
            (Some(elem), _) if i >= fixed => elem.clone(),
            (_, Some(param)) => param.clone(),
            (_, None) => lw.type_of(arg)?,
        };
        let mark = lw.state.pending_mark();
        let text = lw.lower_implicit_with_cloning(arg, &target)?.text;
        materialize_before(lw, &mut texts, &mut materialized, mark, "_arg");
        texts.push(text);
    }

    if let Some(elem) = elem {
        let extra = texts.split_off(fixed.min(texts.len()));
        if extra.is_empty() {
            let slice_type = Type::slice(elem);
            texts.push(lw.zero_value(&slice_type, &expr.span)?);
        } else {
            texts.push(format!(
                "{}({}, {{[0]={}}})",
                runtime::NEW_SLICE,
                lua::quote(&elem.type_name()),
                extra.join(", ")
            ));
        }
    }
    Ok(texts)
}

/// If statements were pushed since `mark`, move every earlier value that
/// is not trivially repeatable into a temporary assigned before them.
pub(crate) fn materialize_before(
    lw: &mut ExpressionLowerer<'_>,
    texts: &mut [String],
    materialized: &mut usize,
    mark: usize,
    hint: &str,
) {
    if lw.state.pending_mark() == mark {
        return;
    }
    let later = lw.state.split_pending_at(mark);
    assign_to_temporaries(lw, &mut texts[*materialized..], hint);
    *materialized = texts.len();
    for stmt in later {
        lw.state.push_pending(stmt);
    }
}

/// Replace each value that is not trivially repeatable with a temporary,
/// assigned in slice order.
pub(crate) fn assign_to_temporaries(lw: &mut ExpressionLowerer<'_>, texts: &mut [String], hint: &str) {
    for text in texts.iter_mut() {
        if is_simple(text) {
            continue;
        }
        let temp = lw.state.new_temporary(hint);
        lw.state.push_pending(PendingStatement::Assign {
            target: temp.clone(),
            value: std::mem::take(text),
        });
        *text = temp;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_arguments() {
        assert!(is_simple("x"));
        assert!(is_simple("42"));
        assert!(is_simple("\"hi\""));
        assert!(is_simple("nil"));
        assert!(!is_simple("f(x)"));
        assert!(!is_simple("a.b"));
    }
}
