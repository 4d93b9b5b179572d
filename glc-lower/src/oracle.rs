//! Precomputed static-analysis results consumed by lowering
//!
//! The oracle answers, per node: its static type, its constant value when
//! statically known, what an identifier binds to, and how a selector resolves.
//! Lowering only reads from it. `TableOracle` is a plain in-memory
//! implementation that can be populated programmatically or from JSON.

use crate::types::Type;
use glc_common::{CompilerError, NodeId};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Constant value of a node, when statically known
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ConstValue {
    Bool(bool),
    Int(i128),
    Float(f64),
    Complex(f64, f64),
    String(String),
}

impl ConstValue {
    /// Integer view, truncating an integral float
    pub fn as_int(&self) -> Option<i128> {
        match self {
            ConstValue::Int(v) => Some(*v),
            ConstValue::Float(f) if f.fract() == 0.0 && f.is_finite() => Some(*f as i128),
            ConstValue::Complex(r, i) if *i == 0.0 && r.fract() == 0.0 && r.is_finite() => {
                Some(*r as i128)
            }
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            ConstValue::Int(v) => Some(*v as f64),
            ConstValue::Float(f) => Some(*f),
            ConstValue::Complex(r, _) => Some(*r),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ConstValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ConstValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn real(&self) -> Option<f64> {
        self.as_float()
    }

    pub fn imag(&self) -> Option<f64> {
        match self {
            ConstValue::Complex(_, i) => Some(*i),
            ConstValue::Int(_) | ConstValue::Float(_) => Some(0.0),
            _ => None,
        }
    }
}

/// What kind of entity an identifier denotes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObjectKind {
    Var,
    Const,
    Func,
    TypeName,
    Builtin,
    Nil,
    PkgName,
}

/// A declared entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Object {
    pub name: String,
    pub kind: ObjectKind,
    #[serde(rename = "type")]
    pub ty: Type,
    /// Declaring package; `None` for universe-scope and local objects
    #[serde(default)]
    pub package: Option<String>,
    /// Variable captured by reference and therefore held in a one-element box
    #[serde(default)]
    pub escaping: bool,
}

impl Object {
    pub fn new(name: &str, kind: ObjectKind, ty: Type) -> Self {
        Self {
            name: name.to_string(),
            kind,
            ty,
            package: None,
            escaping: false,
        }
    }

    pub fn var(name: &str, ty: Type) -> Self {
        Self::new(name, ObjectKind::Var, ty)
    }

    pub fn func(name: &str, ty: Type) -> Self {
        Self::new(name, ObjectKind::Func, ty)
    }

    pub fn builtin(name: &str) -> Self {
        Self::new(name, ObjectKind::Builtin, Type::Tuple(Vec::new()))
    }

    pub fn nil() -> Self {
        Self::new("nil", ObjectKind::Nil, Type::basic(crate::types::BasicKind::UntypedNil))
    }

    pub fn in_package(mut self, package: &str) -> Self {
        self.package = Some(package.to_string());
        self
    }

    pub fn escaping(mut self) -> Self {
        self.escaping = true;
        self
    }

    pub fn exported(&self) -> bool {
        self.name.chars().next().map_or(false, |c| c.is_uppercase())
    }

    /// Method whose declared receiver is a pointer
    pub fn has_pointer_receiver(&self) -> bool {
        self.ty
            .signature()
            .and_then(|sig| sig.recv.as_ref())
            .map_or(false, |recv| recv.is_pointer())
    }
}

/// Three-state result of an identifier binding lookup
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Binding<'a> {
    Definition(&'a Object),
    Use(&'a Object),
    Unresolved,
}

impl<'a> Binding<'a> {
    pub fn object(&self) -> Option<&'a Object> {
        match self {
            Binding::Definition(obj) | Binding::Use(obj) => Some(obj),
            Binding::Unresolved => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SelectionKind {
    FieldVal,
    MethodVal,
    MethodExpr,
}

/// Resolution of a selector expression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Selection {
    pub kind: SelectionKind,
    /// Static type of the selector's base
    pub recv: Type,
    /// Embedding path: field indices from `recv` down to the selected entity
    pub index: Vec<usize>,
    /// Selected field (`Var`) or method (`Func`)
    pub obj: Object,
    /// Type of the whole selector expression
    #[serde(rename = "type")]
    pub ty: Type,
}

/// Static-analysis results for one compilation unit
pub trait TypeOracle {
    fn type_of(&self, node: NodeId) -> Option<&Type>;
    fn constant_of(&self, node: NodeId) -> Option<&ConstValue>;
    fn definition_of(&self, node: NodeId) -> Option<&Object>;
    fn use_of(&self, node: NodeId) -> Option<&Object>;
    fn selection_of(&self, node: NodeId) -> Option<&Selection>;

    /// Definition first, then use
    fn binding_of(&self, node: NodeId) -> Binding<'_> {
        if let Some(obj) = self.definition_of(node) {
            return Binding::Definition(obj);
        }
        match self.use_of(node) {
            Some(obj) => Binding::Use(obj),
            None => Binding::Unresolved,
        }
    }
}

/// Nodes that may block and yield to the cooperative scheduler
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SuspensionMarkers {
    nodes: HashSet<NodeId>,
}

impl SuspensionMarkers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark(&mut self, node: NodeId) {
        self.nodes.insert(node);
    }

    pub fn is_suspending(&self, node: NodeId) -> bool {
        self.nodes.contains(&node)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl FromIterator<NodeId> for SuspensionMarkers {
    fn from_iter<I: IntoIterator<Item = NodeId>>(iter: I) -> Self {
        Self {
            nodes: iter.into_iter().collect(),
        }
    }
}

/// In-memory oracle
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableOracle {
    #[serde(default)]
    pub types: HashMap<NodeId, Type>,
    #[serde(default)]
    pub constants: HashMap<NodeId, ConstValue>,
    #[serde(default)]
    pub definitions: HashMap<NodeId, Object>,
    #[serde(default)]
    pub uses: HashMap<NodeId, Object>,
    #[serde(default)]
    pub selections: HashMap<NodeId, Selection>,
}

impl TableOracle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(json: &str) -> Result<Self, CompilerError> {
        serde_json::from_str(json)
            .map_err(|e| CompilerError::config(format!("invalid oracle table: {}", e)))
    }

    pub fn to_json(&self) -> Result<String, CompilerError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| CompilerError::config(format!("cannot serialize oracle table: {}", e)))
    }

    pub fn set_type(&mut self, node: NodeId, ty: Type) {
        self.types.insert(node, ty);
    }

    pub fn set_constant(&mut self, node: NodeId, value: ConstValue) {
        self.constants.insert(node, value);
    }

    pub fn set_definition(&mut self, node: NodeId, obj: Object) {
        self.definitions.insert(node, obj);
    }

    pub fn set_use(&mut self, node: NodeId, obj: Object) {
        self.uses.insert(node, obj);
    }

    pub fn set_selection(&mut self, node: NodeId, selection: Selection) {
        self.selections.insert(node, selection);
    }
}

impl TypeOracle for TableOracle {
    fn type_of(&self, node: NodeId) -> Option<&Type> {
        self.types.get(&node)
    }

    fn constant_of(&self, node: NodeId) -> Option<&ConstValue> {
        self.constants.get(&node)
    }

    fn definition_of(&self, node: NodeId) -> Option<&Object> {
        self.definitions.get(&node)
    }

    fn use_of(&self, node: NodeId) -> Option<&Object> {
        self.uses.get(&node)
    }

    fn selection_of(&self, node: NodeId) -> Option<&Selection> {
        self.selections.get(&node)
    }
}
