//! Identifier lowering and object naming

use super::lowered::Lowered;
use super::{host, ExpressionLowerer};
use crate::ast::Expression;
use crate::lua;
use crate::oracle::{Object, ObjectKind};
use crate::types::{BasicKind, Type};
use glc_common::CompilerError;

pub fn lower_identifier(
    lw: &mut ExpressionLowerer<'_>,
    expr: &Expression,
    name: &str,
) -> Result<Lowered, CompilerError> {
    if name == "_" {
        return Err(lw.unsupported(expr, "blank identifier used as a value"));
    }
    let obj = lw.object_of(expr)?;
    if let Some(lowered) = host::lower_host_identifier(lw, &obj) {
        return Ok(lowered);
    }

    match obj.kind {
        ObjectKind::Var | ObjectKind::Const | ObjectKind::Func => Ok(Lowered::new(object_name(lw, &obj))),
        ObjectKind::Nil => {
            let ty = lw.type_of(expr)?;
            nil_value(lw, expr, &ty)
        }
        ObjectKind::TypeName | ObjectKind::Builtin | ObjectKind::PkgName => Err(lw.unsupported(
            expr,
            format!("{:?} '{}' used as a value", obj.kind, obj.name),
        )),
    }
}

/// Emitted name of a declared object
///
/// Objects of other packages are qualified by the package's last path
/// segment; escaping variables are read through their one-element box.
pub fn object_name(lw: &ExpressionLowerer<'_>, obj: &Object) -> String {
    let mut name = lua::safe_name(&obj.name);
    if let Some(package) = &obj.package {
        if *package != lw.config().current_package {
            let alias = package.rsplit('/').next().unwrap_or(package);
            name = format!("{}.{}", alias, name);
        }
    }
    if obj.escaping && obj.kind == ObjectKind::Var {
        name.push_str("[0]");
    }
    name
}

/// Name of the box holding an escaping variable
pub fn box_name(lw: &ExpressionLowerer<'_>, obj: &Object) -> String {
    let name = object_name(lw, obj);
    name.strip_suffix("[0]").map(str::to_string).unwrap_or(name)
}

fn nil_value(lw: &mut ExpressionLowerer<'_>, expr: &Expression, ty: &Type) -> Result<Lowered, CompilerError> {
    if lw.config().is_host_object(ty) {
        return Ok(Lowered::new("nil"));
    }
    match ty.underlying() {
        Type::Basic(BasicKind::UnsafePointer) => Ok(Lowered::new("0")),
        Type::Basic(BasicKind::UntypedNil) => Ok(Lowered::new("nil")),
        Type::Slice { .. }
        | Type::Pointer { .. }
        | Type::Map { .. }
        | Type::Interface { .. }
        | Type::Signature(_)
        | Type::Chan { .. } => Ok(Lowered::new(lw.zero_value(ty, &expr.span)?)),
        other => Err(lw.unsupported(expr, format!("nil of type {}", other))),
    }
}

/// Whether `expr` is the predeclared `nil`
pub fn is_nil(lw: &ExpressionLowerer<'_>, expr: &Expression) -> bool {
    let expr = expr.unparen();
    expr.is_ident()
        && lw
            .binding_of(expr)
            .object()
            .map_or(false, |obj| obj.kind == ObjectKind::Nil)
}

/// Sanitized key under which an accessor box is cached
pub fn accessor_key(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}
