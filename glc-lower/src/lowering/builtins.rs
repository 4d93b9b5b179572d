//! Builtin functions

use super::errors::LowerError;
use super::index_ops::map_key;
use super::lowered::Lowered;
use super::template::Operand;
use super::ExpressionLowerer;
use crate::ast::Expression;
use crate::lua;
use crate::runtime;
use crate::types::{BasicKind, Type};
use glc_common::CompilerError;
use log::trace;

fn arg<'e>(lw: &ExpressionLowerer<'_>, expr: &Expression, name: &str, args: &'e [Expression], i: usize) -> Result<&'e Expression, CompilerError> {
    args.get(i)
        .ok_or_else(|| lw.unsupported(expr, format!("{} with {} arguments", name, args.len())))
}

/// `len`/`cap` of a fixed-size array: the operand is still evaluated
fn fixed_length(lw: &mut ExpressionLowerer<'_>, operand: &Expression, len: u64) -> Result<Lowered, CompilerError> {
    lw.render(&format!("(select(2, %e, {}))", len), &[operand.into()])
}

fn array_len(ty: &Type) -> Option<u64> {
    let ty = ty.pointer_elem().unwrap_or(ty);
    match ty.underlying() {
        Type::Array { len, .. } => Some(*len),
        _ => None,
    }
}

pub fn lower_builtin(
    lw: &mut ExpressionLowerer<'_>,
    expr: &Expression,
    name: &str,
    args: &[Expression],
    ellipsis: bool,
) -> Result<Lowered, CompilerError> {
    trace!("builtin {} with {} arguments", name, args.len());
    match name {
        "new" => {
            let ty = lw.type_of(expr)?;
            let Some(elem) = ty.pointer_elem().cloned() else {
                return Err(lw.unsupported(expr, format!("new returning {}", ty)));
            };
            let zero = lw.zero_value(&elem, &expr.span)?;
            if elem.is_aggregate() {
                return Ok(Lowered::new(zero));
            }
            Ok(Lowered::new(format!(
                "{}({}, {})",
                runtime::NEW_DATA_POINTER,
                zero,
                lua::quote(&ty.type_name())
            )))
        }
        "make" => lower_make(lw, expr, args),
        "len" => {
            let operand = arg(lw, expr, name, args, 0)?;
            let ty = lw.type_of(operand)?;
            if let Some(len) = array_len(&ty) {
                return fixed_length(lw, operand, len);
            }
            match ty.underlying() {
                Type::Basic(kind) if kind.is_string() => lw.render_paren("#%e", &[operand.into()]),
                Type::Slice { .. } | Type::Map { .. } => lw.render_paren("#%e", &[operand.into()]),
                Type::Chan { .. } => lw.render_paren("#%e.buffer", &[operand.into()]),
                other => Err(lw.unsupported(expr, format!("len of {}", other))),
            }
        }
        "cap" => {
            let operand = arg(lw, expr, name, args, 0)?;
            let ty = lw.type_of(operand)?;
            if let Some(len) = array_len(&ty) {
                return fixed_length(lw, operand, len);
            }
            match ty.underlying() {
                Type::Slice { .. } | Type::Chan { .. } => lw.render("%e.__capacity", &[operand.into()]),
                other => Err(lw.unsupported(expr, format!("cap of {}", other))),
            }
        }
        "panic" => {
            let value = arg(lw, expr, name, args, 0)?;
            let boxed = lw.lower_implicit(value, &Type::empty_interface())?;
            Ok(Lowered::new(format!("{}({})", runtime::PANIC, boxed.text)))
        }
        "append" => lower_append(lw, expr, args, ellipsis),
        "delete" => {
            let (map, key) = (arg(lw, expr, name, args, 0)?, arg(lw, expr, name, args, 1)?);
            let key_type = match lw.type_of(map)?.underlying() {
                Type::Map { key, .. } => key.as_ref().clone(),
                other => return Err(lw.unsupported(expr, format!("delete from {}", other))),
            };
            let map_text = lw.lower(map, None)?;
            let key_text = map_key(lw, key, &key_type)?;
            lw.render("%e('delete', %e)", &[map_text.into(), key_text.into()])
        }
        "copy" => {
            let (dst, src) = (arg(lw, expr, name, args, 0)?, arg(lw, expr, name, args, 1)?);
            let helper = if lw.type_of(src)?.is_string() {
                runtime::COPY_STRING
            } else {
                runtime::COPY_SLICE
            };
            lw.render(&format!("{}(%e, %e)", helper), &[dst.into(), src.into()])
        }
        "print" | "println" => {
            let mut texts = Vec::with_capacity(args.len());
            for value in args {
                texts.push(lw.lower(value, None)?.text);
            }
            let helper = if name == "println" {
                runtime::PRINTLN
            } else {
                runtime::PRINT
            };
            Ok(Lowered::new(format!("{}({})", helper, texts.join(", "))))
        }
        "complex" => {
            let (re, im) = (arg(lw, expr, name, args, 0)?, arg(lw, expr, name, args, 1)?);
            let float = Type::basic(BasicKind::Float64);
            let re = lw.lower_implicit(re, &float)?;
            let im = lw.lower_implicit(im, &float)?;
            Ok(Lowered::new(format!("{}({}, {})", runtime::COMPLEX, re.text, im.text)))
        }
        "real" => {
            let value = arg(lw, expr, name, args, 0)?;
            lw.render("%r", &[value.into()])
        }
        "imag" => {
            let value = arg(lw, expr, name, args, 0)?;
            lw.render("%i", &[value.into()])
        }
        "recover" => Ok(Lowered::new(format!("{}()", runtime::RECOVER))),
        "close" => {
            let chan = arg(lw, expr, name, args, 0)?;
            lw.render(&format!("{}(%e)", runtime::CLOSE), &[chan.into()])
        }
        other => Err(LowerError::UnknownBuiltin {
            name: other.to_string(),
            location: expr.span.start.clone(),
        }
        .into()),
    }
}

fn lower_make(lw: &mut ExpressionLowerer<'_>, expr: &Expression, args: &[Expression]) -> Result<Lowered, CompilerError> {
    let type_arg = arg(lw, expr, "make", args, 0)?;
    let ty = lw.type_of(type_arg)?;
    match ty.underlying() {
        Type::Slice { elem } => {
            let elem = elem.as_ref().clone();
            let zero = lw.zero_value(&elem, &expr.span)?;
            let len = arg(lw, expr, "make", args, 1)?;
            let prefix = format!(
                "{}({}, {}, ",
                runtime::MAKE_SLICE,
                lua::quote(&elem.type_name()),
                zero
            );
            match args.get(2) {
                Some(cap) => lw.render(&format!("{}%f, %f)", prefix), &[len.into(), cap.into()]),
                None => lw.render(&format!("{}%f)", prefix), &[len.into()]),
            }
        }
        Type::Map { key, elem } => {
            let empty = format!(
                "{}({}, {}, {{}})",
                runtime::NEW_MAP,
                lua::quote(&key.type_name()),
                lua::quote(&elem.type_name())
            );
            match args.get(1) {
                Some(size) if lw.constant_of(size).is_none() => lw.render_paren(
                    &format!(
                        "(%1f < 0 or %1f > 2147483647) and {}(\"makemap: size out of range\") or {}",
                        runtime::RUNTIME_ERROR,
                        empty
                    ),
                    &[size.into()],
                ),
                _ => Ok(Lowered::new(empty)),
            }
        }
        Type::Chan { elem } => {
            let elem_name = lua::quote(&elem.type_name());
            match args.get(1) {
                Some(size) => lw.render(
                    &format!("{}({}, %f)", runtime::NEW_CHAN, elem_name),
                    &[size.into()],
                ),
                None => Ok(Lowered::new(format!("{}({}, 0)", runtime::NEW_CHAN, elem_name))),
            }
        }
        other => Err(lw.unsupported(expr, format!("make of {}", other))),
    }
}

fn lower_append(
    lw: &mut ExpressionLowerer<'_>,
    expr: &Expression,
    args: &[Expression],
    ellipsis: bool,
) -> Result<Lowered, CompilerError> {
    let slice = arg(lw, expr, "append", args, 0)?;
    if args.len() == 1 {
        return lw.lower(slice, None);
    }
    let slice_type = lw.type_of(expr)?;
    let Type::Slice { elem } = slice_type.underlying() else {
        return Err(lw.unsupported(expr, format!("append to {}", slice_type)));
    };
    let elem = elem.as_ref().clone();

    if ellipsis {
        let extra = arg(lw, expr, "append", args, 1)?;
        let pattern = if lw.type_of(extra)?.is_string() {
            format!("{}(%e, {}(%e))", runtime::APPEND_SLICE, runtime::STRING_TO_BYTES)
        } else {
            format!("{}(%e, %e)", runtime::APPEND_SLICE)
        };
        return lw.render(&pattern, &[slice.into(), extra.into()]);
    }

    let mut operands: Vec<Operand<'_>> = vec![lw.lower(slice, None)?.into()];
    for value in &args[1..] {
        operands.push(lw.lower_implicit_with_cloning(value, &elem)?.into());
    }
    let placeholders = vec!["%e"; operands.len()].join(", ");
    lw.render(&format!("{}({})", runtime::APPEND, placeholders), &operands)
}
