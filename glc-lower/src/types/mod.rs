//! Static types of the Go source language
//!
//! Every expression node has exactly one resolved type, supplied by the
//! oracle before lowering starts. Types here are plain data: the lowering
//! engine inspects them but never infers or unifies anything.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Basic (predeclared) type kinds, including the untyped constant kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BasicKind {
    Bool,
    Int,
    Int8,
    Int16,
    Int32,
    Int64,
    Uint,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Uintptr,
    Float32,
    Float64,
    Complex64,
    Complex128,
    String,
    UnsafePointer,
    UntypedBool,
    UntypedInt,
    UntypedRune,
    UntypedFloat,
    UntypedComplex,
    UntypedString,
    UntypedNil,
}

impl BasicKind {
    pub fn is_boolean(&self) -> bool {
        matches!(self, BasicKind::Bool | BasicKind::UntypedBool)
    }

    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            BasicKind::Int
                | BasicKind::Int8
                | BasicKind::Int16
                | BasicKind::Int32
                | BasicKind::Int64
                | BasicKind::Uint
                | BasicKind::Uint8
                | BasicKind::Uint16
                | BasicKind::Uint32
                | BasicKind::Uint64
                | BasicKind::Uintptr
                | BasicKind::UntypedInt
                | BasicKind::UntypedRune
        )
    }

    pub fn is_unsigned(&self) -> bool {
        matches!(
            self,
            BasicKind::Uint
                | BasicKind::Uint8
                | BasicKind::Uint16
                | BasicKind::Uint32
                | BasicKind::Uint64
                | BasicKind::Uintptr
        )
    }

    pub fn is_float(&self) -> bool {
        matches!(
            self,
            BasicKind::Float32 | BasicKind::Float64 | BasicKind::UntypedFloat
        )
    }

    pub fn is_complex(&self) -> bool {
        matches!(
            self,
            BasicKind::Complex64 | BasicKind::Complex128 | BasicKind::UntypedComplex
        )
    }

    pub fn is_string(&self) -> bool {
        matches!(self, BasicKind::String | BasicKind::UntypedString)
    }

    pub fn is_numeric(&self) -> bool {
        self.is_integer() || self.is_float() || self.is_complex()
    }

    pub fn is_untyped(&self) -> bool {
        matches!(
            self,
            BasicKind::UntypedBool
                | BasicKind::UntypedInt
                | BasicKind::UntypedRune
                | BasicKind::UntypedFloat
                | BasicKind::UntypedComplex
                | BasicKind::UntypedString
                | BasicKind::UntypedNil
        )
    }

    /// Width in bits of a sized integer kind. `uint` and `uintptr` are
    /// word-sized (32 bits) in emitted code.
    pub fn bit_width(&self) -> Option<u32> {
        match self {
            BasicKind::Int8 | BasicKind::Uint8 => Some(8),
            BasicKind::Int16 | BasicKind::Uint16 => Some(16),
            BasicKind::Int32
            | BasicKind::Uint32
            | BasicKind::Uint
            | BasicKind::Uintptr
            | BasicKind::UntypedRune => Some(32),
            BasicKind::Int | BasicKind::Int64 | BasicKind::Uint64 => Some(64),
            _ => None,
        }
    }

    /// Name used by the runtime's kind tags, e.g. for array element kinds
    pub fn kind_name(&self) -> &'static str {
        match self {
            BasicKind::Bool | BasicKind::UntypedBool => "Bool",
            BasicKind::Int | BasicKind::UntypedInt => "Int",
            BasicKind::Int8 => "Int8",
            BasicKind::Int16 => "Int16",
            BasicKind::Int32 | BasicKind::UntypedRune => "Int32",
            BasicKind::Int64 => "Int64",
            BasicKind::Uint => "Uint",
            BasicKind::Uint8 => "Uint8",
            BasicKind::Uint16 => "Uint16",
            BasicKind::Uint32 => "Uint32",
            BasicKind::Uint64 => "Uint64",
            BasicKind::Uintptr => "Uintptr",
            BasicKind::Float32 => "Float32",
            BasicKind::Float64 | BasicKind::UntypedFloat => "Float64",
            BasicKind::Complex64 => "Complex64",
            BasicKind::Complex128 | BasicKind::UntypedComplex => "Complex128",
            BasicKind::String | BasicKind::UntypedString => "String",
            BasicKind::UnsafePointer => "UnsafePointer",
            BasicKind::UntypedNil => "Nil",
        }
    }
}

impl fmt::Display for BasicKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BasicKind::Bool => "bool",
            BasicKind::Int => "int",
            BasicKind::Int8 => "int8",
            BasicKind::Int16 => "int16",
            BasicKind::Int32 => "int32",
            BasicKind::Int64 => "int64",
            BasicKind::Uint => "uint",
            BasicKind::Uint8 => "uint8",
            BasicKind::Uint16 => "uint16",
            BasicKind::Uint32 => "uint32",
            BasicKind::Uint64 => "uint64",
            BasicKind::Uintptr => "uintptr",
            BasicKind::Float32 => "float32",
            BasicKind::Float64 => "float64",
            BasicKind::Complex64 => "complex64",
            BasicKind::Complex128 => "complex128",
            BasicKind::String => "string",
            BasicKind::UnsafePointer => "unsafe.Pointer",
            BasicKind::UntypedBool => "untyped bool",
            BasicKind::UntypedInt => "untyped int",
            BasicKind::UntypedRune => "untyped rune",
            BasicKind::UntypedFloat => "untyped float",
            BasicKind::UntypedComplex => "untyped complex",
            BasicKind::UntypedString => "untyped string",
            BasicKind::UntypedNil => "untyped nil",
        };
        write!(f, "{}", name)
    }
}

/// A struct field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructField {
    pub name: String,
    pub field_type: Type,
    #[serde(default)]
    pub embedded: bool,
    /// Host-interop tag naming the property on the bridged host object
    #[serde(default)]
    pub host_tag: Option<String>,
}

impl StructField {
    pub fn new(name: &str, field_type: Type) -> Self {
        Self {
            name: name.to_string(),
            field_type,
            embedded: false,
            host_tag: None,
        }
    }

    pub fn with_host_tag(mut self, tag: &str) -> Self {
        self.host_tag = Some(tag.to_string());
        self
    }
}

/// Function signature
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signature {
    #[serde(default)]
    pub recv: Option<Box<Type>>,
    pub params: Vec<Type>,
    pub results: Vec<Type>,
    #[serde(default)]
    pub variadic: bool,
}

impl Signature {
    pub fn new(params: Vec<Type>, results: Vec<Type>) -> Self {
        Self {
            recv: None,
            params,
            results,
            variadic: false,
        }
    }

    pub fn variadic(mut self) -> Self {
        self.variadic = true;
        self
    }

    pub fn with_recv(mut self, recv: Type) -> Self {
        self.recv = Some(Box::new(recv));
        self
    }
}

/// Go static types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Type {
    Basic(BasicKind),
    Array { elem: Box<Type>, len: u64 },
    Slice { elem: Box<Type> },
    Map { key: Box<Type>, elem: Box<Type> },
    Struct { fields: Vec<StructField> },
    Pointer { elem: Box<Type> },
    Interface { methods: Vec<String> },
    Signature(Signature),
    Chan { elem: Box<Type> },
    /// Declared type; `name` is package-qualified (`main.Point`)
    Named { name: String, underlying: Box<Type> },
    /// Multiple results of a call or a comma-ok form
    Tuple(Vec<Type>),
}

impl Type {
    pub fn basic(kind: BasicKind) -> Self {
        Type::Basic(kind)
    }

    pub fn array(elem: Type, len: u64) -> Self {
        Type::Array {
            elem: Box::new(elem),
            len,
        }
    }

    pub fn slice(elem: Type) -> Self {
        Type::Slice {
            elem: Box::new(elem),
        }
    }

    pub fn map(key: Type, elem: Type) -> Self {
        Type::Map {
            key: Box::new(key),
            elem: Box::new(elem),
        }
    }

    pub fn pointer(elem: Type) -> Self {
        Type::Pointer {
            elem: Box::new(elem),
        }
    }

    pub fn chan(elem: Type) -> Self {
        Type::Chan {
            elem: Box::new(elem),
        }
    }

    pub fn named(name: &str, underlying: Type) -> Self {
        Type::Named {
            name: name.to_string(),
            underlying: Box::new(underlying),
        }
    }

    pub fn empty_interface() -> Self {
        Type::Interface {
            methods: Vec::new(),
        }
    }

    /// Strip any number of named layers
    pub fn underlying(&self) -> &Type {
        match self {
            Type::Named { underlying, .. } => underlying.underlying(),
            other => other,
        }
    }

    /// Basic kind of the underlying type, if it is basic
    pub fn basic_kind(&self) -> Option<BasicKind> {
        match self.underlying() {
            Type::Basic(kind) => Some(*kind),
            _ => None,
        }
    }

    pub fn is_integer(&self) -> bool {
        self.basic_kind().map_or(false, |k| k.is_integer())
    }

    pub fn is_string(&self) -> bool {
        self.basic_kind().map_or(false, |k| k.is_string())
    }

    pub fn is_untyped_nil(&self) -> bool {
        matches!(self, Type::Basic(BasicKind::UntypedNil))
    }

    pub fn is_interface(&self) -> bool {
        matches!(self.underlying(), Type::Interface { .. })
    }

    pub fn is_pointer(&self) -> bool {
        matches!(self.underlying(), Type::Pointer { .. })
    }

    /// Structs and arrays have value semantics and are addressable
    /// natively in emitted form.
    pub fn is_aggregate(&self) -> bool {
        matches!(self.underlying(), Type::Struct { .. } | Type::Array { .. })
    }

    pub fn is_named(&self) -> bool {
        matches!(self, Type::Named { .. })
    }

    /// Element type of a pointer
    pub fn pointer_elem(&self) -> Option<&Type> {
        match self.underlying() {
            Type::Pointer { elem } => Some(elem),
            _ => None,
        }
    }

    /// Signature of a function-typed value
    pub fn signature(&self) -> Option<&Signature> {
        match self.underlying() {
            Type::Signature(sig) => Some(sig),
            _ => None,
        }
    }

    /// Struct fields, looking through named layers
    pub fn struct_fields(&self) -> Option<&[StructField]> {
        match self.underlying() {
            Type::Struct { fields } => Some(fields),
            _ => None,
        }
    }

    /// Slice whose elements are runes (`[]rune` and named variants)
    pub fn is_rune_slice(&self) -> bool {
        match self.underlying() {
            Type::Slice { elem } => elem.basic_kind() == Some(BasicKind::Int32),
            _ => false,
        }
    }

    /// Go type identity: named types are identical only to themselves,
    /// everything else compares structurally.
    pub fn identical(&self, other: &Type) -> bool {
        match (self, other) {
            (Type::Named { name: a, .. }, Type::Named { name: b, .. }) => a == b,
            (Type::Named { .. }, _) | (_, Type::Named { .. }) => false,
            (Type::Basic(a), Type::Basic(b)) => a == b,
            (Type::Array { elem: a, len: n }, Type::Array { elem: b, len: m }) => {
                n == m && a.identical(b)
            }
            (Type::Slice { elem: a }, Type::Slice { elem: b })
            | (Type::Pointer { elem: a }, Type::Pointer { elem: b })
            | (Type::Chan { elem: a }, Type::Chan { elem: b }) => a.identical(b),
            (Type::Map { key: ka, elem: ea }, Type::Map { key: kb, elem: eb }) => {
                ka.identical(kb) && ea.identical(eb)
            }
            (Type::Struct { fields: a }, Type::Struct { fields: b }) => {
                a.len() == b.len()
                    && a.iter().zip(b.iter()).all(|(fa, fb)| {
                        fa.name == fb.name
                            && fa.embedded == fb.embedded
                            && fa.field_type.identical(&fb.field_type)
                    })
            }
            (Type::Interface { methods: a }, Type::Interface { methods: b }) => a == b,
            (Type::Signature(a), Type::Signature(b)) => {
                a.variadic == b.variadic
                    && types_identical(&a.params, &b.params)
                    && types_identical(&a.results, &b.results)
            }
            (Type::Tuple(a), Type::Tuple(b)) => types_identical(a, b),
            _ => false,
        }
    }

    /// Runtime kind tag of a type
    pub fn kind_name(&self) -> &'static str {
        match self.underlying() {
            Type::Basic(kind) => kind.kind_name(),
            Type::Array { .. } => "Array",
            Type::Slice { .. } => "Slice",
            Type::Map { .. } => "Map",
            Type::Struct { .. } => "Struct",
            Type::Pointer { .. } => "Ptr",
            Type::Interface { .. } => "Interface",
            Type::Signature(_) => "Func",
            Type::Chan { .. } => "Chan",
            Type::Tuple(_) => "Tuple",
            Type::Named { .. } => "Named",
        }
    }

    /// Type name as the runtime registry knows it
    pub fn type_name(&self) -> String {
        self.to_string()
    }
}

fn types_identical(a: &[Type], b: &[Type]) -> bool {
    a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x.identical(y))
}

fn write_list(f: &mut fmt::Formatter<'_>, types: &[Type]) -> fmt::Result {
    for (i, ty) in types.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", ty)?;
    }
    Ok(())
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Basic(kind) => write!(f, "{}", kind),
            Type::Array { elem, len } => write!(f, "[{}]{}", len, elem),
            Type::Slice { elem } => write!(f, "[]{}", elem),
            Type::Map { key, elem } => write!(f, "map[{}]{}", key, elem),
            Type::Struct { fields } => {
                write!(f, "struct {{ ")?;
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, "; ")?;
                    }
                    if field.embedded {
                        write!(f, "{}", field.field_type)?;
                    } else {
                        write!(f, "{} {}", field.name, field.field_type)?;
                    }
                }
                write!(f, " }}")
            }
            Type::Pointer { elem } => write!(f, "*{}", elem),
            Type::Interface { methods } => {
                if methods.is_empty() {
                    write!(f, "interface {{}}")
                } else {
                    write!(f, "interface {{ {} }}", methods.join("; "))
                }
            }
            Type::Signature(sig) => {
                write!(f, "func(")?;
                write_list(f, &sig.params)?;
                write!(f, ")")?;
                match sig.results.len() {
                    0 => Ok(()),
                    1 => write!(f, " {}", sig.results[0]),
                    _ => {
                        write!(f, " (")?;
                        write_list(f, &sig.results)?;
                        write!(f, ")")
                    }
                }
            }
            Type::Chan { elem } => write!(f, "chan {}", elem),
            Type::Named { name, .. } => write!(f, "{}", name),
            Type::Tuple(types) => {
                write!(f, "(")?;
                write_list(f, types)?;
                write!(f, ")")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point() -> Type {
        Type::named(
            "main.Point",
            Type::Struct {
                fields: vec![
                    StructField::new("X", Type::basic(BasicKind::Int)),
                    StructField::new("Y", Type::basic(BasicKind::Int)),
                ],
            },
        )
    }

    #[test]
    fn test_underlying_strips_names() {
        let celsius = Type::named("main.Celsius", Type::basic(BasicKind::Float64));
        assert_eq!(celsius.basic_kind(), Some(BasicKind::Float64));
        assert!(point().is_aggregate());
        assert!(!celsius.is_aggregate());
    }

    #[test]
    fn test_identity_of_named_types() {
        let other = Type::named("main.Other", point().underlying().clone());
        assert!(point().identical(&point()));
        assert!(!point().identical(&other));
        assert!(!point().identical(point().underlying()));
        assert!(Type::slice(Type::basic(BasicKind::Uint8))
            .identical(&Type::slice(Type::basic(BasicKind::Uint8))));
    }

    #[test]
    fn test_type_names() {
        assert_eq!(Type::slice(Type::basic(BasicKind::Int)).type_name(), "[]int");
        assert_eq!(
            Type::map(Type::basic(BasicKind::String), point()).type_name(),
            "map[string]main.Point"
        );
        assert_eq!(Type::pointer(point()).type_name(), "*main.Point");
        assert_eq!(Type::empty_interface().type_name(), "interface {}");
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(point().kind_name(), "Struct");
        assert_eq!(Type::basic(BasicKind::UntypedRune).kind_name(), "Int32");
        assert_eq!(Type::array(Type::basic(BasicKind::Bool), 2).kind_name(), "Array");
    }

    #[test]
    fn test_rune_slice_detection() {
        assert!(Type::slice(Type::basic(BasicKind::Int32)).is_rune_slice());
        assert!(!Type::slice(Type::basic(BasicKind::Uint8)).is_rune_slice());
    }
}
