//! Field and method selectors, and receiver materialization

use super::errors::LowerError;
use super::identifiers::lower_identifier;
use super::lowered::Lowered;
use super::template::Operand;
use super::ExpressionLowerer;
use crate::ast::{Expression, ExpressionKind, UnaryOp};
use crate::lua;
use crate::oracle::{Selection, SelectionKind};
use crate::runtime;
use crate::types::Type;
use glc_common::{CompilerError, SourceSpan};

/// Resolved embedding path of a field selection
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct FieldPath {
    pub names: Vec<String>,
    pub field_type: Type,
    /// Holder field and key when the last field is reached through a host object
    pub host: Option<(String, String)>,
}

impl FieldPath {
    /// `.a.b` access suffix; names Lua cannot spell after a dot are bracketed
    pub fn chain(&self) -> String {
        access_chain(&self.names)
    }
}

pub(crate) fn access_chain(names: &[String]) -> String {
    names
        .iter()
        .map(|name| {
            if lua::is_identifier(name) {
                format!(".{}", name)
            } else {
                format!("[{}]", lua::quote(name))
            }
        })
        .collect()
}

/// Walk `index` from the receiver type down to the selected field
pub(crate) fn resolve_path(
    lw: &ExpressionLowerer<'_>,
    recv: &Type,
    index: &[usize],
    span: &SourceSpan,
) -> Result<FieldPath, CompilerError> {
    let mut current = recv.clone();
    let mut names = Vec::with_capacity(index.len());
    let mut host = None;
    for (step, &i) in index.iter().enumerate() {
        let target = current.pointer_elem().cloned().unwrap_or(current);
        let Some(fields) = target.struct_fields() else {
            return Err(LowerError::unsupported(format!("field selection on {}", target), &span.start).into());
        };
        let Some(field) = fields.get(i) else {
            return Err(LowerError::unsupported(
                format!("field index {} out of range for {}", i, target),
                &span.start,
            )
            .into());
        };
        let last = step + 1 == index.len();
        if last && lw.config().host.is_some() {
            if let (Some(tag), Some(holder)) = (&field.host_tag, fields.first()) {
                if lw.config().is_host_object(&holder.field_type) {
                    host = Some((holder.name.clone(), tag.clone()));
                }
            }
        }
        names.push(field.name.clone());
        current = field.field_type.clone();
    }
    Ok(FieldPath {
        names,
        field_type: current,
        host,
    })
}

pub(crate) fn field_path(
    lw: &ExpressionLowerer<'_>,
    selection: &Selection,
    span: &SourceSpan,
) -> Result<FieldPath, CompilerError> {
    resolve_path(lw, &selection.recv, &selection.index, span)
}

pub fn lower_selector(
    lw: &mut ExpressionLowerer<'_>,
    expr: &Expression,
    base: &Expression,
    sel: &Expression,
) -> Result<Lowered, CompilerError> {
    let Some(selection) = lw.selection_of(expr) else {
        // package-qualified identifier
        let name = sel.ident_name().unwrap_or_default().to_string();
        return lower_identifier(lw, sel, &name);
    };

    match selection.kind {
        SelectionKind::FieldVal => lower_field(lw, base, &selection, &expr.span),
        SelectionKind::MethodVal => {
            let recv = make_receiver(lw, base, &selection, &expr.span)?;
            lw.render(
                &format!(
                    "{}(%e, {})",
                    runtime::METHOD_VAL,
                    lua::quote(&selection.obj.name)
                ),
                &[recv.into()],
            )
        }
        SelectionKind::MethodExpr => {
            let name = lua::quote(&selection.obj.name);
            if selection.recv.is_interface() {
                Ok(Lowered::new(format!("{}({})", runtime::IFACE_METHOD_EXPR, name)))
            } else {
                Ok(Lowered::new(format!(
                    "{}({}, {})",
                    runtime::METHOD_EXPR,
                    lua::quote(&selection.recv.type_name()),
                    name
                )))
            }
        }
    }
}

fn lower_field(
    lw: &mut ExpressionLowerer<'_>,
    base: &Expression,
    selection: &Selection,
    span: &SourceSpan,
) -> Result<Lowered, CompilerError> {
    let path = field_path(lw, selection, span)?;
    match &path.host {
        Some((holder, tag)) => {
            let mut outer = path.names.clone();
            outer.pop();
            outer.push(holder.clone());
            let access = format!("%e{}[{}]", access_chain(&outer), lua::quote(tag));
            let raw = lw.render(&access, &[base.into()])?;
            Ok(super::host::internalize(lw, &raw, &path.field_type))
        }
        None => lw.render(&format!("%e{}", path.chain()), &[base.into()]),
    }
}

/// Receiver of a method value or call: follows embedded fields, takes the
/// address for pointer-receiver methods, and copies for value receivers.
pub(crate) fn make_receiver(
    lw: &mut ExpressionLowerer<'_>,
    base: &Expression,
    selection: &Selection,
    span: &SourceSpan,
) -> Result<Lowered, CompilerError> {
    let mut recv = base.clone();
    if selection.index.len() > 1 {
        let embedded = &selection.index[..selection.index.len() - 1];
        let path = resolve_path(lw, &selection.recv, embedded, span)?;
        let field_name = path.names.last().cloned().unwrap_or_default();
        let sel = lw.synthesize(
            ExpressionKind::Ident { name: field_name },
            path.field_type.clone(),
            span,
        );
        let fake = lw.synthesize(
            ExpressionKind::Selector {
                base: Box::new(recv),
                sel: Box::new(sel),
            },
            path.field_type.clone(),
            span,
        );
        lw.state.set_synthetic_selection(
            fake.node_id,
            Selection {
                kind: SelectionKind::FieldVal,
                recv: selection.recv.clone(),
                index: embedded.to_vec(),
                obj: selection.obj.clone(),
                ty: path.field_type,
            },
        );
        recv = fake;
    }

    let recv_type = lw.type_of(&recv)?;
    if recv_type.is_interface() {
        return lw.lower(&recv, None);
    }

    if selection.obj.has_pointer_receiver() {
        if recv_type.is_pointer() {
            return lw.lower(&recv, None);
        }
        let addr = lw.synthesize(
            ExpressionKind::Unary {
                op: UnaryOp::AddrOf,
                operand: Box::new(recv),
            },
            Type::pointer(recv_type),
            span,
        );
        return lw.lower(&addr, None);
    }

    let value = match recv_type.pointer_elem().cloned() {
        Some(elem) => {
            let deref = lw.synthesize(ExpressionKind::Star(Box::new(recv)), elem.clone(), span);
            lw.lower_implicit_with_cloning(&deref, &elem)?
        }
        None => lw.lower_implicit_with_cloning(&recv, &recv_type)?,
    };
    let value_type = recv_type.pointer_elem().cloned().unwrap_or(recv_type);
    if lw.config().is_boxed(&value_type) {
        return lw.render(
            &format!("{}({}, %e)", runtime::BOX, lua::quote(&value_type.type_name())),
            &[Operand::Lowered(value)],
        );
    }
    Ok(value)
}
