//! Optional host-object bridging
//!
//! Active only when `LowerConfig::host` is set. Values crossing into the
//! host are externalized; values read back are internalized to their static
//! type.

use super::lowered::Lowered;
use super::numeric::fix_number;
use super::template::Operand;
use super::{prefix_text, ExpressionLowerer};
use crate::ast::Expression;
use crate::lua;
use crate::oracle::Object;
use crate::runtime;
use crate::state::PendingStatement;
use crate::types::{BasicKind, Type};
use glc_common::CompilerError;

/// `Global`, `Module` and `Undefined` of the host package
pub fn lower_host_identifier(lw: &ExpressionLowerer<'_>, obj: &Object) -> Option<Lowered> {
    if !lw.config().is_host_package(obj.package.as_deref()) {
        return None;
    }
    match obj.name.as_str() {
        "Global" => Some(Lowered::new(runtime::GLOBAL)),
        "Module" => Some(Lowered::new(runtime::MODULE)),
        "Undefined" => Some(Lowered::new("nil")),
        _ => None,
    }
}

/// Host object stored in an interface slot or dereferenced
pub fn wrap_host_object(lw: &mut ExpressionLowerer<'_>, expr: &Expression) -> Result<Lowered, CompilerError> {
    lw.render(&format!("{}(%e)", runtime::HOST_OBJECT_PTR), &[expr.into()])
}

/// Convert a raw host value to the static type `ty`
pub fn internalize(lw: &ExpressionLowerer<'_>, raw: &Lowered, ty: &Type) -> Lowered {
    if lw.config().is_host_object(ty) {
        return raw.clone();
    }
    let text = raw.with_parens();
    if let Type::Basic(kind) = ty.underlying() {
        if kind.is_boolean() {
            return Lowered::paren(format!("not not {}", text));
        }
        if kind.is_integer() && kind.bit_width() != Some(64) {
            return fix_number(Lowered::new(format!("{}({})", runtime::PARSE_INT, raw.text)), *kind);
        }
        if kind.is_float() {
            return Lowered::new(format!("{}({})", runtime::PARSE_FLOAT, raw.text));
        }
    }
    Lowered::new(format!(
        "{}({}, {})",
        runtime::INTERNALIZE,
        raw.text,
        lua::quote(&ty.type_name())
    ))
}

/// Lower `expr` into a value the host understands
pub fn externalize(lw: &mut ExpressionLowerer<'_>, expr: &Expression) -> Result<Lowered, CompilerError> {
    let ty = lw.type_of(expr)?;
    if ty.is_untyped_nil() || lw.config().is_host_object(&ty) {
        return lw.lower(expr, None);
    }
    if let Type::Basic(kind) = ty.underlying() {
        if kind.is_boolean() || kind.is_string() || kind.is_float() || (kind.is_integer() && kind.bit_width() != Some(64)) {
            return lw.lower(expr, None);
        }
    }
    lw.render(
        &format!("{}(%e, {})", runtime::EXTERNALIZE, lua::quote(&ty.type_name())),
        &[expr.into()],
    )
}

fn externalize_args(lw: &mut ExpressionLowerer<'_>, args: &[Expression]) -> Result<String, CompilerError> {
    let mut out = Vec::with_capacity(args.len());
    for arg in args {
        out.push(externalize(lw, arg)?.text);
    }
    Ok(out.join(", "))
}

/// Spread form for `args...`
fn spread(lw: &mut ExpressionLowerer<'_>, arg: &Expression) -> Result<String, CompilerError> {
    Ok(format!("table.unpack({})", externalize(lw, arg)?.text))
}

/// Constant string usable as a plain field name
pub fn identifier_constant(lw: &ExpressionLowerer<'_>, expr: &Expression) -> Option<String> {
    let value = lw.constant_of(expr)?;
    let s = value.as_str()?;
    if lua::is_identifier(s) {
        Some(s.to_string())
    } else {
        None
    }
}

fn key_access(lw: &mut ExpressionLowerer<'_>, recv: &str, key: &Expression) -> Result<String, CompilerError> {
    if let Some(id) = identifier_constant(lw, key) {
        return Ok(format!("{}.{}", recv, id));
    }
    let key = lw.lower(key, None)?;
    Ok(format!(
        "{}[{}({}, \"string\")]",
        recv,
        runtime::EXTERNALIZE,
        key.text
    ))
}

fn arg<'e>(lw: &ExpressionLowerer<'_>, call: &Expression, args: &'e [Expression], i: usize) -> Result<&'e Expression, CompilerError> {
    args.get(i)
        .ok_or_else(|| lw.unsupported(call, format!("host method call with {} arguments", args.len())))
}

/// Methods of the host object type. Statement-only methods (`Set`,
/// `SetIndex`, `Delete`) push their assignment and lower to empty text.
pub fn lower_host_method(
    lw: &mut ExpressionLowerer<'_>,
    call: &Expression,
    recv: Lowered,
    method: &str,
    args: &[Expression],
    ellipsis: bool,
) -> Result<Lowered, CompilerError> {
    let recv_text = prefix_text(&recv);
    match method {
        "Get" => {
            let key = arg(lw, call, args, 0)?;
            Ok(Lowered::new(key_access(lw, &recv_text, key)?))
        }
        "Set" => {
            let (key, value) = (arg(lw, call, args, 0)?, arg(lw, call, args, 1)?);
            let target = key_access(lw, &recv_text, key)?;
            let value = externalize(lw, value)?;
            lw.state.push_pending(PendingStatement::Assign {
                target,
                value: value.text,
            });
            Ok(Lowered::new(""))
        }
        "Delete" => {
            let key = arg(lw, call, args, 0)?;
            let target = key_access(lw, &recv_text, key)?;
            lw.state.push_pending(PendingStatement::Assign {
                target,
                value: "nil".to_string(),
            });
            Ok(Lowered::new(""))
        }
        "Length" => Ok(Lowered::new(format!("{}(#{})", runtime::PARSE_INT, recv_text))),
        "Index" => {
            let index = arg(lw, call, args, 0)?;
            lw.render("%s[%e]", &[Operand::Text(recv_text), index.into()])
        }
        "SetIndex" => {
            let (index, value) = (arg(lw, call, args, 0)?, arg(lw, call, args, 1)?);
            let index = lw.lower(index, None)?;
            let value = externalize(lw, value)?;
            lw.state.push_pending(PendingStatement::Assign {
                target: format!("{}[{}]", recv_text, index.text),
                value: value.text,
            });
            Ok(Lowered::new(""))
        }
        "Call" => {
            let name = arg(lw, call, args, 0)?;
            let id = identifier_constant(lw, name);
            let key = match &id {
                Some(_) => None,
                None => Some(lw.lower(name, None)?),
            };
            let rest = if ellipsis {
                let packed = arg(lw, call, args, 1)?;
                spread(lw, packed)?
            } else {
                externalize_args(lw, &args[1..])?
            };
            let Some(key) = key else {
                return Ok(Lowered::new(format!("{}:{}({})", recv_text, id.unwrap_or_default(), rest)));
            };
            let pattern = format!(
                "%1e[{}(%2e, \"string\")](%1e{}%3s)",
                runtime::EXTERNALIZE,
                if rest.is_empty() { "" } else { ", " }
            );
            lw.render(&pattern, &[recv.into(), key.into(), Operand::Text(rest)])
        }
        "Invoke" => {
            let rest = if ellipsis {
                let packed = arg(lw, call, args, 0)?;
                spread(lw, packed)?
            } else {
                externalize_args(lw, args)?
            };
            Ok(Lowered::new(format!("{}({})", recv_text, rest)))
        }
        "New" => {
            let rest = if ellipsis {
                let packed = arg(lw, call, args, 0)?;
                spread(lw, packed)?
            } else {
                externalize_args(lw, args)?
            };
            let sep = if rest.is_empty() { "" } else { ", " };
            Ok(Lowered::new(format!(
                "{}({}{}{})",
                runtime::NEW_HOST_OBJECT,
                recv.text,
                sep,
                rest
            )))
        }
        "Bool" => Ok(internalize(lw, &recv, &Type::basic(BasicKind::Bool))),
        "String" => Ok(internalize(lw, &recv, &Type::basic(BasicKind::String))),
        "Int" => Ok(internalize(lw, &recv, &Type::basic(BasicKind::Int))),
        "Int64" => Ok(internalize(lw, &recv, &Type::basic(BasicKind::Int64))),
        "Uint64" => Ok(internalize(lw, &recv, &Type::basic(BasicKind::Uint64))),
        "Float" => Ok(internalize(lw, &recv, &Type::basic(BasicKind::Float64))),
        "Interface" => Ok(internalize(lw, &recv, &Type::empty_interface())),
        "Unsafe" => Ok(recv),
        other => Err(lw.unsupported(call, format!("host object method '{}'", other))),
    }
}
