//! Test fixtures
//!
//! `ExprBuilder` builds expression trees and records their static
//! information in a `TableOracle` as it goes, standing in for a parser and
//! type checker.
//!
//! This module is public test tooling: it is exported so integration tests
//! and downstream statement lowerers can build inputs without a front end.
//! Nothing else in the crate depends on it.

use crate::ast::{BinaryOp, Element, Expression, ExpressionKind, NodeIdGenerator, UnaryOp};
use crate::config::LowerConfig;
use crate::lowering::{ExpressionLowerer, Lowered};
use crate::oracle::{ConstValue, Object, Selection, SelectionKind, SuspensionMarkers, TableOracle};
use crate::state::FunctionState;
use crate::types::{BasicKind, Signature, StructField, Type};
use glc_common::{CompilerError, SourceLocation, SourceSpan};

#[derive(Debug, Clone, Default)]
pub struct ExprBuilder {
    ids: NodeIdGenerator,
    oracle: TableOracle,
    markers: SuspensionMarkers,
}

impl ExprBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn oracle(&self) -> &TableOracle {
        &self.oracle
    }

    pub fn markers(&self) -> &SuspensionMarkers {
        &self.markers
    }

    /// Lower `expr` with the recorded oracle
    pub fn lower(
        &self,
        config: &LowerConfig,
        state: &mut FunctionState,
        expr: &Expression,
    ) -> Result<Lowered, CompilerError> {
        ExpressionLowerer::new(&self.oracle, &self.markers, config, state).lower(expr, None)
    }

    /// Node typed `ty`; the span's line is the node id so errors are traceable
    pub fn node(&mut self, kind: ExpressionKind, ty: Type) -> Expression {
        let id = self.ids.next();
        self.oracle.set_type(id, ty);
        let start = SourceLocation::new("main.go", id + 1, 1);
        Expression::new(id, kind, SourceSpan::from_location(start))
    }

    pub fn ident(&mut self, obj: Object) -> Expression {
        let expr = self.node(
            ExpressionKind::Ident {
                name: obj.name.clone(),
            },
            obj.ty.clone(),
        );
        self.oracle.set_use(expr.node_id, obj);
        expr
    }

    pub fn var(&mut self, name: &str, ty: Type) -> Expression {
        self.ident(Object::var(name, ty))
    }

    pub fn func(&mut self, name: &str, signature: Signature) -> Expression {
        self.ident(Object::func(name, Type::Signature(signature)))
    }

    pub fn builtin(&mut self, name: &str, signature: Signature) -> Expression {
        let mut obj = Object::builtin(name);
        obj.ty = Type::Signature(signature);
        self.ident(obj)
    }

    pub fn nil(&mut self, ty: Type) -> Expression {
        let expr = self.node(ExpressionKind::Ident { name: "nil".to_string() }, ty);
        self.oracle.set_use(expr.node_id, Object::nil());
        expr
    }

    /// Literal with its constant value
    pub fn constant(&mut self, value: ConstValue, ty: Type) -> Expression {
        let expr = self.node(
            ExpressionKind::BasicLit {
                value: format!("{:?}", value),
            },
            ty,
        );
        self.oracle.set_constant(expr.node_id, value);
        expr
    }

    pub fn int(&mut self, value: i128, kind: BasicKind) -> Expression {
        self.constant(ConstValue::Int(value), Type::basic(kind))
    }

    pub fn string(&mut self, value: &str) -> Expression {
        self.constant(ConstValue::String(value.to_string()), Type::basic(BasicKind::String))
    }

    pub fn boolean(&mut self, value: bool) -> Expression {
        self.constant(ConstValue::Bool(value), Type::basic(BasicKind::Bool))
    }

    pub fn unary(&mut self, op: UnaryOp, operand: Expression, ty: Type) -> Expression {
        self.node(
            ExpressionKind::Unary {
                op,
                operand: Box::new(operand),
            },
            ty,
        )
    }

    pub fn binary(&mut self, op: BinaryOp, left: Expression, right: Expression, ty: Type) -> Expression {
        self.node(
            ExpressionKind::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            },
            ty,
        )
    }

    pub fn paren(&mut self, inner: Expression) -> Expression {
        let ty = self.type_of(&inner);
        self.node(ExpressionKind::Paren(Box::new(inner)), ty)
    }

    pub fn star(&mut self, inner: Expression, ty: Type) -> Expression {
        self.node(ExpressionKind::Star(Box::new(inner)), ty)
    }

    pub fn index(&mut self, base: Expression, index: Expression, ty: Type) -> Expression {
        self.node(
            ExpressionKind::Index {
                base: Box::new(base),
                index: Box::new(index),
            },
            ty,
        )
    }

    pub fn slice(
        &mut self,
        base: Expression,
        low: Option<Expression>,
        high: Option<Expression>,
        ty: Type,
    ) -> Expression {
        self.node(
            ExpressionKind::Slice {
                base: Box::new(base),
                low: low.map(Box::new),
                high: high.map(Box::new),
                max: None,
            },
            ty,
        )
    }

    pub fn call(&mut self, func: Expression, args: Vec<Expression>, ty: Type) -> Expression {
        self.node(
            ExpressionKind::Call {
                func: Box::new(func),
                args,
                ellipsis: false,
            },
            ty,
        )
    }

    pub fn call_spread(&mut self, func: Expression, args: Vec<Expression>, ty: Type) -> Expression {
        self.node(
            ExpressionKind::Call {
                func: Box::new(func),
                args,
                ellipsis: true,
            },
            ty,
        )
    }

    /// Type name used as a conversion callee
    pub fn type_expr(&mut self, ty: Type) -> Expression {
        self.node(ExpressionKind::TypeExpr, ty)
    }

    /// `base.name` selecting field `index` of the struct behind `base`;
    /// a missing field yields an untyped placeholder that fails to lower
    pub fn field(&mut self, base: Expression, index: usize) -> Expression {
        let recv = self.type_of(&base);
        let target = recv.pointer_elem().cloned().unwrap_or_else(|| recv.clone());
        let field = target
            .struct_fields()
            .and_then(|fields| fields.get(index))
            .cloned()
            .unwrap_or_else(|| StructField::new(&format!("field{}", index), Type::Tuple(Vec::new())));
        let sel = self.node(
            ExpressionKind::Ident {
                name: field.name.clone(),
            },
            field.field_type.clone(),
        );
        let expr = self.node(
            ExpressionKind::Selector {
                base: Box::new(base),
                sel: Box::new(sel),
            },
            field.field_type.clone(),
        );
        self.oracle.set_selection(
            expr.node_id,
            Selection {
                kind: SelectionKind::FieldVal,
                recv,
                index: vec![index],
                obj: Object::var(&field.name, field.field_type.clone()),
                ty: field.field_type,
            },
        );
        expr
    }

    /// `base.name` selecting a method; `path` lists embedded fields first
    pub fn method(&mut self, base: Expression, method: Object, path: Vec<usize>, kind: SelectionKind) -> Expression {
        let recv = self.type_of(&base);
        let ty = match method.ty.signature() {
            Some(sig) => Type::Signature(Signature {
                recv: None,
                ..sig.clone()
            }),
            None => method.ty.clone(),
        };
        let sel = self.node(
            ExpressionKind::Ident {
                name: method.name.clone(),
            },
            ty.clone(),
        );
        let expr = self.node(
            ExpressionKind::Selector {
                base: Box::new(base),
                sel: Box::new(sel),
            },
            ty.clone(),
        );
        self.oracle.set_selection(
            expr.node_id,
            Selection {
                kind,
                recv,
                index: path,
                obj: method,
                ty,
            },
        );
        expr
    }

    /// `pkg.Name` bound to `obj`
    pub fn qualified(&mut self, package: &str, obj: Object) -> Expression {
        let pkg = self.node(
            ExpressionKind::Ident {
                name: package.rsplit('/').next().unwrap_or(package).to_string(),
            },
            Type::Tuple(Vec::new()),
        );
        let ty = obj.ty.clone();
        let sel = self.ident(obj);
        self.node(
            ExpressionKind::Selector {
                base: Box::new(pkg),
                sel: Box::new(sel),
            },
            ty,
        )
    }

    pub fn composite(&mut self, ty: Type, elements: Vec<Element>) -> Expression {
        self.node(ExpressionKind::CompositeLit { elements }, ty)
    }

    pub fn element(value: Expression) -> Element {
        Element { key: None, value }
    }

    pub fn keyed(key: Expression, value: Expression) -> Element {
        Element { key: Some(key), value }
    }

    /// Struct literal key; field names carry no binding
    pub fn field_key(&mut self, name: &str) -> Expression {
        self.node(ExpressionKind::Ident { name: name.to_string() }, Type::Tuple(Vec::new()))
    }

    pub fn func_lit(&mut self, body: u32, signature: Signature) -> Expression {
        self.node(ExpressionKind::FuncLit { body }, Type::Signature(signature))
    }

    pub fn type_assert(&mut self, base: Expression, asserted: Option<Expression>, ty: Type) -> Expression {
        self.node(
            ExpressionKind::TypeAssert {
                base: Box::new(base),
                asserted: asserted.map(Box::new),
            },
            ty,
        )
    }

    /// Flag `expr` as a call that may suspend
    pub fn suspending(&mut self, expr: Expression) -> Expression {
        self.markers.mark(expr.node_id);
        expr
    }

    pub fn type_of(&self, expr: &Expression) -> Type {
        self.oracle
            .types
            .get(&expr.node_id)
            .cloned()
            .unwrap_or(Type::Tuple(Vec::new()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_records_types_and_constants() {
        let mut b = ExprBuilder::new();
        let x = b.var("x", Type::basic(BasicKind::Int));
        let one = b.int(1, BasicKind::Int);
        assert_eq!(b.type_of(&x), Type::basic(BasicKind::Int));
        assert_eq!(b.oracle().constants.get(&one.node_id), Some(&ConstValue::Int(1)));
        assert_ne!(x.node_id, one.node_id);
    }
}
