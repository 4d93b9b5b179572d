//! Composite literals
//!
//! Arrays and slices accept positional, index-keyed and mixed elements;
//! gaps take the element zero value. Keyed struct literals start from the
//! zero value of every field; positional ones must name every field.
//! Element values are evaluated in source order whatever slot they fill.

use super::calls::{assign_to_temporaries, is_simple, materialize_before};
use super::errors::LowerError;
use super::index_ops::map_key;
use super::lowered::Lowered;
use super::zero::{array_literal, struct_literal};
use super::ExpressionLowerer;
use crate::ast::{Element, Expression};
use crate::lua;
use crate::runtime;
use crate::types::Type;
use glc_common::CompilerError;

pub fn lower_composite_literal(
    lw: &mut ExpressionLowerer<'_>,
    expr: &Expression,
    elements: &[Element],
) -> Result<Lowered, CompilerError> {
    let mut ty = lw.type_of(expr)?;
    if let Some(elem) = ty.pointer_elem().cloned() {
        ty = elem;
    }

    match ty.underlying() {
        Type::Array { elem, len } => {
            let values = collect_indexed(lw, expr, elements, elem, Some(*len))?;
            Ok(Lowered::new(array_literal(&values, elem, *len)))
        }
        Type::Slice { elem } => {
            let values = collect_indexed(lw, expr, elements, elem, None)?;
            let body = if values.is_empty() {
                String::new()
            } else {
                format!("[0]={}", values.join(", "))
            };
            Ok(Lowered::new(format!(
                "{}({}, {{{}}})",
                runtime::NEW_SLICE,
                lua::quote(&elem.type_name()),
                body
            )))
        }
        Type::Map { key, elem } => {
            let mut entries = Vec::with_capacity(elements.len());
            for element in elements {
                let Some(k) = &element.key else {
                    return Err(lw.unsupported(expr, "map literal element without a key"));
                };
                let key_text = map_key(lw, k, key)?;
                let value = lw.lower_implicit_with_cloning(&element.value, elem)?;
                entries.push(format!("[{}]={}", key_text.text, value.text));
            }
            Ok(Lowered::new(format!(
                "{}({}, {}, {{{}}})",
                runtime::NEW_MAP,
                lua::quote(&key.type_name()),
                lua::quote(&elem.type_name()),
                entries.join(", ")
            )))
        }
        Type::Struct { fields } => {
            let names: Vec<&str> = fields.iter().map(|f| f.name.as_str()).collect();
            let keyed = elements.is_empty() || elements.iter().any(|e| e.key.is_some());
            let mut values = Vec::with_capacity(fields.len());

            if keyed {
                for field in fields {
                    values.push(lw.zero_value(&field.field_type, &expr.span)?);
                }
                let mut slots = Vec::with_capacity(elements.len());
                for element in elements {
                    let name = element
                        .key
                        .as_ref()
                        .and_then(|k| k.ident_name())
                        .unwrap_or_default();
                    let Some(i) = names.iter().position(|n| *n == name) else {
                        return Err(LowerError::UnknownField {
                            type_name: ty.type_name(),
                            field: name.to_string(),
                            location: element.value.span.start.clone(),
                        }
                        .into());
                    };
                    slots.push((i, &element.value, &fields[i].field_type));
                }
                for (i, text) in lower_in_source_order(lw, &slots)? {
                    values[i] = text;
                }
            } else {
                if elements.len() != fields.len() {
                    return Err(LowerError::FieldCountMismatch {
                        type_name: ty.type_name(),
                        expected: fields.len(),
                        found: elements.len(),
                        location: expr.span.start.clone(),
                    }
                    .into());
                }
                for (element, field) in elements.iter().zip(fields) {
                    values.push(lw.lower_implicit_with_cloning(&element.value, &field.field_type)?.text);
                }
            }
            Ok(Lowered::new(struct_literal(&ty, &names, &values)))
        }
        other => Err(lw.unsupported(expr, format!("composite literal of {}", other))),
    }
}

/// Place elements by explicit index or by continuing from the previous
/// position; unfilled slots hold the zero value of `elem`.
fn collect_indexed(
    lw: &mut ExpressionLowerer<'_>,
    expr: &Expression,
    elements: &[Element],
    elem: &Type,
    fixed_len: Option<u64>,
) -> Result<Vec<String>, CompilerError> {
    let zero = lw.zero_value(elem, &expr.span)?;
    let mut slots = Vec::with_capacity(elements.len());
    let mut position = 0usize;
    for element in elements {
        if let Some(key) = &element.key {
            let Some(index) = lw.constant_of(key).and_then(|v| v.as_int()) else {
                return Err(lw.unsupported(key, "non-constant index in composite literal"));
            };
            position = usize::try_from(index)
                .map_err(|_| lw.unsupported(key, format!("negative index {} in composite literal", index)))?;
        }
        slots.push((position, &element.value, elem));
        position += 1;
    }

    let mut values: Vec<String> = Vec::new();
    for (i, text) in lower_in_source_order(lw, &slots)? {
        if values.len() <= i {
            values.resize(i + 1, zero.clone());
        }
        values[i] = text;
    }
    if let Some(len) = fixed_len {
        let len = len as usize;
        if values.len() > len {
            return Err(lw.unsupported(expr, format!("array literal with {} elements for length {}", values.len(), len)));
        }
        values.resize(len, zero);
    }
    Ok(values)
}

/// Lower `(slot, value, type)` triples in source order. When the impure
/// values would be emitted out of source order, they are assigned to
/// temporaries first.
fn lower_in_source_order(
    lw: &mut ExpressionLowerer<'_>,
    slots: &[(usize, &Expression, &Type)],
) -> Result<Vec<(usize, String)>, CompilerError> {
    let mut texts: Vec<String> = Vec::with_capacity(slots.len());
    let mut materialized = 0usize;
    for (_, value, ty) in slots {
        let mark = lw.state.pending_mark();
        let text = lw.lower_implicit_with_cloning(value, ty)?.text;
        materialize_before(lw, &mut texts, &mut materialized, mark, "_k");
        texts.push(text);
    }

    let impure: Vec<usize> = slots
        .iter()
        .zip(&texts)
        .filter(|(_, text)| !is_simple(text))
        .map(|((slot, _, _), _)| *slot)
        .collect();
    if impure.windows(2).any(|w| w[0] >= w[1]) {
        assign_to_temporaries(lw, &mut texts[materialized..], "_k");
    }
    Ok(slots.iter().map(|(slot, _, _)| *slot).zip(texts).collect())
}
