//! Index and slice expressions

use super::lowered::Lowered;
use super::template::Operand;
use super::ExpressionLowerer;
use crate::ast::Expression;
use crate::runtime;
use crate::types::Type;
use glc_common::CompilerError;

/// `value` guarded by `0 <= %2f < len`; `%1e` is the base, `%2f` the index
fn range_checked(len: &str, value: &str) -> String {
    format!(
        "((%2f < 0 or %2f >= {}) and {}(\"index out of range\") or {})",
        len,
        runtime::RUNTIME_ERROR,
        value
    )
}

const ELEMENT: &str = "%1e[%2f]";

pub fn lower_index(
    lw: &mut ExpressionLowerer<'_>,
    expr: &Expression,
    base: &Expression,
    index: &Expression,
) -> Result<Lowered, CompilerError> {
    let base_type = lw.type_of(base)?;
    let constant_index = lw.constant_of(index).is_some();

    let array_len = match base_type.underlying() {
        Type::Array { len, .. } => Some(*len),
        Type::Pointer { elem } => match elem.underlying() {
            Type::Array { len, .. } => Some(*len),
            _ => None,
        },
        _ => None,
    };
    if let Some(len) = array_len {
        // constant indices into arrays were bounds-checked statically
        if constant_index && matches!(base_type.underlying(), Type::Array { .. }) {
            return lw.render("%1e[%2f]", &[base.into(), index.into()]);
        }
        return lw.render(&range_checked(&len.to_string(), ELEMENT), &[base.into(), index.into()]);
    }

    match base_type.underlying() {
        Type::Slice { .. } => lw.render(&range_checked("#%1e", ELEMENT), &[base.into(), index.into()]),
        Type::Map { key, elem } => {
            let (key, elem) = (key.as_ref().clone(), elem.as_ref().clone());
            let key_text = map_key(lw, index, &key)?;
            let zero = lw.zero_value(&elem, &expr.span)?;
            let method = if matches!(lw.type_of(expr)?, Type::Tuple(_)) {
                "getok"
            } else {
                "get"
            };
            lw.render(
                &format!("%1e('{}', %2e, %3s)", method),
                &[base.into(), key_text.into(), Operand::Text(zero)],
            )
        }
        Type::Basic(kind) if kind.is_string() => lw.render(
            &range_checked("#%1e", "string.byte(%1e, %2f + 1)"),
            &[base.into(), index.into()],
        ),
        other => Err(lw.unsupported(expr, format!("index into {}", other))),
    }
}

/// Key text for the emitted map container: converted to the key type, and
/// stringified for non-string basic keys
pub(crate) fn map_key(
    lw: &mut ExpressionLowerer<'_>,
    key: &Expression,
    key_type: &Type,
) -> Result<Lowered, CompilerError> {
    let actual = lw.type_of(key)?;
    if lw.config().is_host_object(&actual) {
        lw.report_error("cannot use js.Object as map key", &key.span);
    }
    let converted = lw.lower_implicit(key, key_type)?;
    match key_type.underlying() {
        Type::Basic(kind) if !kind.is_string() => {
            Ok(Lowered::new(format!("tostring({})", converted.text)))
        }
        _ => Ok(converted),
    }
}

pub fn lower_slice(
    lw: &mut ExpressionLowerer<'_>,
    expr: &Expression,
    base: &Expression,
    low: Option<&Expression>,
    high: Option<&Expression>,
    max: Option<&Expression>,
) -> Result<Lowered, CompilerError> {
    let base_type = lw.type_of(base)?;
    let (helper, source) = match base_type.underlying() {
        Type::Basic(kind) if kind.is_string() => (runtime::SUBSTRING, "%e".to_string()),
        Type::Slice { .. } => (runtime::SUBSLICE, "%e".to_string()),
        Type::Array { .. } => (runtime::SUBSLICE, format!("{}(%e)", runtime::SLICE_OF_ARRAY)),
        Type::Pointer { elem } if matches!(elem.underlying(), Type::Array { .. }) => {
            (runtime::SUBSLICE, format!("{}(%e)", runtime::SLICE_OF_ARRAY))
        }
        other => return Err(lw.unsupported(expr, format!("slice of {}", other))),
    };

    let mut pattern = format!("{}({}", helper, source);
    let mut operands: Vec<Operand<'_>> = vec![base.into()];
    match low {
        Some(low) => {
            pattern.push_str(", %f");
            operands.push(low.into());
        }
        None => pattern.push_str(", 0"),
    }
    for bound in [high, max].into_iter().flatten() {
        pattern.push_str(", %f");
        operands.push(bound.into());
    }
    pattern.push(')');
    lw.render(&pattern, &operands)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_check_pattern() {
        assert_eq!(
            range_checked("4", ELEMENT),
            "((%2f < 0 or %2f >= 4) and __throwRuntimeError(\"index out of range\") or %1e[%2f])"
        );
        assert_eq!(
            range_checked("#%1e", "string.byte(%1e, %2f + 1)"),
            "((%2f < 0 or %2f >= #%1e) and __throwRuntimeError(\"index out of range\") or string.byte(%1e, %2f + 1))"
        );
    }
}
