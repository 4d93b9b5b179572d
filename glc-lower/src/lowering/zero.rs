//! Type-directed zero values
//!
//! Pure and deterministic: the same type always yields the same text, so a
//! composite literal may ask for it once per unfilled slot.

use super::errors::LowerError;
use crate::lua;
use crate::runtime;
use crate::types::{BasicKind, Type};
use glc_common::SourceLocation;

pub fn zero_value(ty: &Type, location: &SourceLocation) -> Result<String, LowerError> {
    match ty.underlying() {
        Type::Basic(kind) => Ok(basic_zero(*kind)),
        Type::Array { elem, len } => {
            let zero = zero_value(elem, location)?;
            Ok(array_literal(&vec![zero; *len as usize], elem, *len))
        }
        Type::Slice { elem } => Ok(format!(
            "{}({}, nil)",
            runtime::NEW_SLICE,
            lua::quote(&elem.type_name())
        )),
        Type::Map { key, elem } => Ok(format!(
            "{}({}, {}, nil)",
            runtime::NEW_MAP,
            lua::quote(&key.type_name()),
            lua::quote(&elem.type_name())
        )),
        Type::Struct { fields } => {
            let mut values = Vec::with_capacity(fields.len());
            for field in fields {
                values.push(zero_value(&field.field_type, location)?);
            }
            let names: Vec<&str> = fields.iter().map(|f| f.name.as_str()).collect();
            Ok(struct_literal(ty, &names, &values))
        }
        Type::Pointer { .. } | Type::Interface { .. } => Ok("nil".to_string()),
        Type::Signature(_) => Ok(runtime::NIL_POINTER_ERROR.to_string()),
        Type::Chan { .. } => Ok(runtime::CHAN_NIL.to_string()),
        Type::Tuple(_) | Type::Named { .. } => Err(LowerError::unsupported(
            format!("zero value of {}", ty),
            location,
        )),
    }
}

fn basic_zero(kind: BasicKind) -> String {
    if kind.is_complex() {
        return format!("{}(0.0, 0.0)", runtime::COMPLEX);
    }
    let text = if kind.is_boolean() {
        "false"
    } else if kind.is_integer() || kind == BasicKind::UnsafePointer {
        "0"
    } else if kind.is_float() {
        "0.0"
    } else if kind.is_string() {
        "\"\""
    } else {
        "nil"
    };
    text.to_string()
}

/// `_gi_NewArray({[0]=a, b, ...}, "Kind", len)`; elements are 0-based
pub(crate) fn array_literal(elements: &[String], elem: &Type, len: u64) -> String {
    let body = if elements.is_empty() {
        String::new()
    } else {
        format!("[0]={}", elements.join(", "))
    };
    format!(
        "{}({{{}}}, {}, {})",
        runtime::NEW_ARRAY,
        body,
        lua::quote(elem.kind_name()),
        len
    )
}

/// `__reg:NewInstance("T", {["f"]=v, ...})`
pub(crate) fn struct_literal(ty: &Type, names: &[&str], values: &[String]) -> String {
    let fields: Vec<String> = names
        .iter()
        .zip(values)
        .map(|(name, value)| format!("[{}]={}", lua::quote(name), value))
        .collect();
    format!(
        "{}({}, {{{}}})",
        runtime::NEW_INSTANCE,
        lua::quote(&ty.type_name()),
        fields.join(", ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::StructField;
    use pretty_assertions::assert_eq;

    fn zero(ty: &Type) -> String {
        zero_value(ty, &SourceLocation::dummy()).unwrap()
    }

    #[test]
    fn test_basic_zeros() {
        assert_eq!(zero(&Type::basic(BasicKind::Bool)), "false");
        assert_eq!(zero(&Type::basic(BasicKind::Uint8)), "0");
        assert_eq!(zero(&Type::basic(BasicKind::Float32)), "0.0");
        assert_eq!(zero(&Type::basic(BasicKind::String)), "\"\"");
        assert_eq!(zero(&Type::basic(BasicKind::Complex128)), "__complex(0.0, 0.0)");
    }

    #[test]
    fn test_reference_zeros() {
        assert_eq!(zero(&Type::pointer(Type::basic(BasicKind::Int))), "nil");
        assert_eq!(zero(&Type::empty_interface()), "nil");
        assert_eq!(zero(&Type::chan(Type::basic(BasicKind::Int))), "__chanNil");
        assert_eq!(
            zero(&Type::slice(Type::basic(BasicKind::Int))),
            "_gi_NewSlice(\"int\", nil)"
        );
    }

    #[test]
    fn test_aggregate_zeros() {
        assert_eq!(
            zero(&Type::array(Type::basic(BasicKind::Int), 3)),
            "_gi_NewArray({[0]=0, 0, 0}, \"Int\", 3)"
        );
        let point = Type::named(
            "main.Point",
            Type::Struct {
                fields: vec![
                    StructField::new("X", Type::basic(BasicKind::Int)),
                    StructField::new("Name", Type::basic(BasicKind::String)),
                ],
            },
        );
        assert_eq!(
            zero(&point),
            "__reg:NewInstance(\"main.Point\", {[\"X\"]=0, [\"Name\"]=\"\"})"
        );
    }

    #[test]
    fn test_zero_is_deterministic() {
        let ty = Type::array(Type::map(Type::basic(BasicKind::String), Type::basic(BasicKind::Int)), 2);
        assert_eq!(zero(&ty), zero(&ty));
    }

    #[test]
    fn test_tuple_has_no_zero() {
        let ty = Type::Tuple(vec![Type::basic(BasicKind::Int)]);
        assert!(zero_value(&ty, &SourceLocation::dummy()).is_err());
    }
}
