//! End-to-end lowering of single expressions built with `ExprBuilder`

use glc_lower::fixture::ExprBuilder;
use glc_lower::lowering::Operand;
use glc_lower::{
    BasicKind, BinaryOp, Expression, ExpressionLowerer, FunctionState, LowerConfig, Lowered,
    PendingStatement, Signature, StructField, Type, UnaryOp,
};
use pretty_assertions::assert_eq;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn int() -> Type {
    Type::basic(BasicKind::Int)
}

fn point() -> Type {
    Type::named(
        "main.Point",
        Type::Struct {
            fields: vec![
                StructField::new("X", int()),
                StructField::new("Y", int()),
                StructField::new("Label", Type::basic(BasicKind::String)),
            ],
        },
    )
}

fn lower(b: &ExprBuilder, expr: &Expression) -> (Lowered, FunctionState) {
    init_logging();
    let config = LowerConfig::default();
    let mut state = FunctionState::new();
    let out = b.lower(&config, &mut state, expr).expect("lowering failed");
    (out, state)
}

fn text(b: &ExprBuilder, expr: &Expression) -> String {
    lower(b, expr).0.text
}

#[test]
fn test_int8_constant_wraps_to_destination() {
    let mut b = ExprBuilder::new();
    let c = b.int(200, BasicKind::UntypedInt);
    let config = LowerConfig::default();
    let mut state = FunctionState::new();
    let mut lw = ExpressionLowerer::new(b.oracle(), b.markers(), &config, &mut state);

    let out = lw.lower_implicit(&c, &Type::basic(BasicKind::Int8)).unwrap();
    assert_eq!(out.text, "-56");
    assert_eq!(out.with_parens(), "(-56)");
}

#[test]
fn test_int64_minimum_constant() {
    let mut b = ExprBuilder::new();
    let min = b.int(i64::MIN as i128, BasicKind::Int64);
    let (out, _) = lower(&b, &min);
    assert_eq!(out.text, "math.mininteger");
    assert_eq!(out.with_parens(), "(math.mininteger)");
}

#[test]
fn test_array_literal_with_index_keys_fills_gaps() {
    let mut b = ExprBuilder::new();
    let two = b.int(2, BasicKind::UntypedInt);
    let x = b.string("x");
    let y = b.string("y");
    let lit = b.composite(
        Type::array(Type::basic(BasicKind::String), 4),
        vec![ExprBuilder::keyed(two, x), ExprBuilder::element(y)],
    );

    assert_eq!(
        text(&b, &lit),
        "_gi_NewArray({[0]=\"\", \"\", \"x\", \"y\"}, \"String\", 4)"
    );
}

#[test]
fn test_suspending_right_operand_of_and_is_guarded() {
    let mut b = ExprBuilder::new();
    let bool_type = Type::basic(BasicKind::Bool);
    let a = b.var("a", bool_type.clone());
    let f = b.func("f", Signature::new(vec![], vec![bool_type.clone()]));
    let call = b.call(f, vec![], bool_type.clone());
    let call = b.suspending(call);
    let both = b.binary(BinaryOp::LogicalAnd, a, call, bool_type);

    let (out, state) = lower(&b, &both);
    assert_eq!(out.text, "_v1");
    assert_eq!(
        state.pending(),
        &[PendingStatement::Guard {
            result: "_v1".to_string(),
            condition: "a".to_string(),
            is_and: true,
            body: vec![PendingStatement::CallAssign {
                target: Some("_r0".to_string()),
                call: "f()".to_string(),
                step: 0,
            }],
            value: "_r0".to_string(),
        }]
    );
    assert_eq!(
        state.pending()[0].to_string(),
        "if not (a) then _v1 = false else _r0 = f() --[[resume:0]]; _v1 = _r0 end"
    );
    assert_eq!(state.temporaries(), &["_r0".to_string(), "_v1".to_string()]);
}

#[test]
fn test_plain_and_stays_native() {
    let mut b = ExprBuilder::new();
    let bool_type = Type::basic(BasicKind::Bool);
    let a = b.var("a", bool_type.clone());
    let c = b.var("c", bool_type.clone());
    let either = b.binary(BinaryOp::LogicalOr, a, c, bool_type);

    let (out, state) = lower(&b, &either);
    assert_eq!(out.with_parens(), "(a or c)");
    assert!(state.pending().is_empty());
}

#[test]
fn test_keyed_struct_literal_zero_fills_missing_fields() {
    let mut b = ExprBuilder::new();
    let x_key = b.field_key("X");
    let one = b.int(1, BasicKind::Int);
    let label_key = b.field_key("Label");
    let label = b.string("p");
    let lit = b.composite(
        point(),
        vec![
            ExprBuilder::keyed(label_key, label),
            ExprBuilder::keyed(x_key, one),
        ],
    );

    assert_eq!(
        text(&b, &lit),
        "__reg:NewInstance(\"main.Point\", {[\"X\"]=1, [\"Y\"]=0, [\"Label\"]=\"p\"})"
    );
}

#[test]
fn test_empty_struct_literal_is_all_zero() {
    let mut b = ExprBuilder::new();
    let lit = b.composite(point(), vec![]);

    assert_eq!(
        text(&b, &lit),
        "__reg:NewInstance(\"main.Point\", {[\"X\"]=0, [\"Y\"]=0, [\"Label\"]=\"\"})"
    );
}

fn pair() -> Type {
    Type::named(
        "main.P",
        Type::Struct {
            fields: vec![StructField::new("A", int()), StructField::new("B", int())],
        },
    )
}

#[test]
fn test_out_of_order_keyed_calls_run_in_source_order() {
    let mut b = ExprBuilder::new();
    let b_key = b.field_key("B");
    let f = b.func("f", Signature::new(vec![], vec![int()]));
    let first = b.call(f, vec![], int());
    let a_key = b.field_key("A");
    let g = b.func("g", Signature::new(vec![], vec![int()]));
    let second = b.call(g, vec![], int());
    let lit = b.composite(
        pair(),
        vec![ExprBuilder::keyed(b_key, first), ExprBuilder::keyed(a_key, second)],
    );

    let (out, state) = lower(&b, &lit);
    assert_eq!(
        out.text,
        "__reg:NewInstance(\"main.P\", {[\"A\"]=_k1, [\"B\"]=_k0})"
    );
    assert_eq!(
        state.pending(),
        &[
            PendingStatement::Assign {
                target: "_k0".to_string(),
                value: "f()".to_string(),
            },
            PendingStatement::Assign {
                target: "_k1".to_string(),
                value: "g()".to_string(),
            },
        ]
    );
}

#[test]
fn test_in_order_keyed_calls_stay_inline() {
    let mut b = ExprBuilder::new();
    let a_key = b.field_key("A");
    let f = b.func("f", Signature::new(vec![], vec![int()]));
    let first = b.call(f, vec![], int());
    let b_key = b.field_key("B");
    let g = b.func("g", Signature::new(vec![], vec![int()]));
    let second = b.call(g, vec![], int());
    let lit = b.composite(
        pair(),
        vec![ExprBuilder::keyed(a_key, first), ExprBuilder::keyed(b_key, second)],
    );

    let (out, state) = lower(&b, &lit);
    assert_eq!(
        out.text,
        "__reg:NewInstance(\"main.P\", {[\"A\"]=f(), [\"B\"]=g()})"
    );
    assert!(state.pending().is_empty());
}

#[test]
fn test_index_keyed_array_calls_run_in_source_order() {
    let mut b = ExprBuilder::new();
    let one = b.int(1, BasicKind::UntypedInt);
    let f = b.func("f", Signature::new(vec![], vec![int()]));
    let first = b.call(f, vec![], int());
    let zero = b.int(0, BasicKind::UntypedInt);
    let g = b.func("g", Signature::new(vec![], vec![int()]));
    let second = b.call(g, vec![], int());
    let lit = b.composite(
        Type::array(int(), 2),
        vec![ExprBuilder::keyed(one, first), ExprBuilder::keyed(zero, second)],
    );

    let (out, state) = lower(&b, &lit);
    assert_eq!(out.text, "_gi_NewArray({[0]=_k1, _k0}, \"Int\", 2)");
    let order: Vec<String> = state.pending().iter().map(|p| p.to_string()).collect();
    assert_eq!(order, vec!["_k0 = f()".to_string(), "_k1 = g()".to_string()]);
}

#[test]
fn test_positional_struct_literal_needs_every_field() {
    let mut b = ExprBuilder::new();
    let one = b.int(1, BasicKind::Int);
    let two = b.int(2, BasicKind::Int);
    let lit = b.composite(
        point(),
        vec![ExprBuilder::element(one), ExprBuilder::element(two)],
    );

    let mut state = FunctionState::new();
    let err = b.lower(&LowerConfig::default(), &mut state, &lit).unwrap_err();
    assert!(err.is_internal());
    assert!(err.to_string().contains("has 3 fields but literal has 2"));
}

#[test]
fn test_repeated_call_operand_is_hoisted_once() {
    let mut b = ExprBuilder::new();
    let g = b.func("g", Signature::new(vec![], vec![int()]));
    let call = b.call(g, vec![], int());
    let config = LowerConfig::default();
    let mut state = FunctionState::new();
    let mut lw = ExpressionLowerer::new(b.oracle(), b.markers(), &config, &mut state);

    let out = lw.render("%1e + %1e", &[Operand::Expr(&call)]).unwrap();
    assert_eq!(out.text, "(function() local _t0 = g(); return _t0 + _t0 end)()");
}

#[test]
fn test_hoisting_keeps_earlier_operands_in_order() {
    let mut b = ExprBuilder::new();
    let f = b.func("f", Signature::new(vec![], vec![int()]));
    let first = b.call(f, vec![], int());
    let g = b.func("g", Signature::new(vec![], vec![int()]));
    let second = b.call(g, vec![], int());
    let config = LowerConfig::default();
    let mut state = FunctionState::new();
    let mut lw = ExpressionLowerer::new(b.oracle(), b.markers(), &config, &mut state);

    let out = lw
        .render("%e + %2e * %2e", &[Operand::Expr(&first), Operand::Expr(&second)])
        .unwrap();
    assert_eq!(
        out.text,
        "(function() local _t0 = f(); local _t1 = g(); return _t0 + _t1 * _t1 end)()"
    );
}

#[test]
fn test_identifier_operands_are_repeated_verbatim() {
    let mut b = ExprBuilder::new();
    let x = b.var("x", int());
    let config = LowerConfig::default();
    let mut state = FunctionState::new();
    let mut lw = ExpressionLowerer::new(b.oracle(), b.markers(), &config, &mut state);

    let out = lw.render_paren("%1e * %1e %% 7", &[Operand::Expr(&x)]).unwrap();
    assert_eq!(out.text, "x * x % 7");
    assert!(out.parens);
}

#[test]
fn test_narrow_arithmetic_is_truncated() {
    let mut b = ExprBuilder::new();
    let int8 = Type::basic(BasicKind::Int8);
    let x = b.var("x", int8.clone());
    let y = b.var("y", int8.clone());
    let sum = b.binary(BinaryOp::Add, x, y, int8);
    assert_eq!(text(&b, &sum), "(((x + y) + 128) & 255) - 128");

    let uint32 = Type::basic(BasicKind::Uint32);
    let a = b.var("a", uint32.clone());
    let c = b.var("c", uint32.clone());
    let product = b.binary(BinaryOp::Mul, a, c, uint32);
    assert_eq!(text(&b, &product), "(a * c) & 0xFFFFFFFF");
}

#[test]
fn test_narrow_negation_is_truncated() {
    let mut b = ExprBuilder::new();
    let int8 = Type::basic(BasicKind::Int8);
    let x = b.var("x", int8.clone());
    let neg = b.unary(UnaryOp::Neg, x, int8);
    assert_eq!(text(&b, &neg), "(((-x) + 128) & 255) - 128");

    let y = b.var("y", int());
    let neg = b.unary(UnaryOp::Neg, y, int());
    assert_eq!(text(&b, &neg), "-y");
}

#[test]
fn test_wide_arithmetic_is_not_truncated() {
    let mut b = ExprBuilder::new();
    let x = b.var("x", int());
    let y = b.var("y", int());
    let sum = b.binary(BinaryOp::Sub, x, y, int());
    assert_eq!(text(&b, &sum), "x - y");
}

#[test]
fn test_integer_division_goes_through_guard() {
    let mut b = ExprBuilder::new();
    let x = b.var("x", int());
    let y = b.var("y", int());
    let quo = b.binary(BinaryOp::Quo, x, y, int());
    assert_eq!(text(&b, &quo), "__intDiv(x, y)");

    let uint8 = Type::basic(BasicKind::Uint8);
    let p = b.var("p", uint8.clone());
    let q = b.var("q", uint8.clone());
    let quo = b.binary(BinaryOp::Quo, p, q, uint8.clone());
    assert_eq!(text(&b, &quo), "__intDiv(p, q) & 255");

    let p = b.var("p", uint8.clone());
    let q = b.var("q", uint8.clone());
    let rem = b.binary(BinaryOp::Rem, p, q, uint8);
    assert_eq!(text(&b, &rem), "__intMod(p, q)");
}

#[test]
fn test_uint64_uses_unsigned_order_and_division() {
    let mut b = ExprBuilder::new();
    let uint64 = Type::basic(BasicKind::Uint64);
    let bool_type = Type::basic(BasicKind::Bool);

    let x = b.var("x", uint64.clone());
    let y = b.var("y", uint64.clone());
    let less = b.binary(BinaryOp::Lss, x, y, bool_type.clone());
    assert_eq!(
        text(&b, &less),
        "(x ~ math.mininteger) < (y ~ math.mininteger)"
    );

    let x = b.var("x", uint64.clone());
    let y = b.var("y", uint64.clone());
    let at_least = b.binary(BinaryOp::Geq, x, y, bool_type);
    assert_eq!(
        text(&b, &at_least),
        "(x ~ math.mininteger) >= (y ~ math.mininteger)"
    );

    let x = b.var("x", uint64.clone());
    let y = b.var("y", uint64.clone());
    let quo = b.binary(BinaryOp::Quo, x, y, uint64.clone());
    assert_eq!(text(&b, &quo), "__uintDiv(x, y)");

    let x = b.var("x", uint64.clone());
    let y = b.var("y", uint64.clone());
    let rem = b.binary(BinaryOp::Rem, x, y, uint64);
    assert_eq!(text(&b, &rem), "__uintMod(x, y)");
}

#[test]
fn test_signed_order_is_native() {
    let mut b = ExprBuilder::new();
    let x = b.var("x", int());
    let y = b.var("y", int());
    let less = b.binary(BinaryOp::Lss, x, y, Type::basic(BasicKind::Bool));
    assert_eq!(text(&b, &less), "x < y");
}

#[test]
fn test_shifts() {
    let mut b = ExprBuilder::new();
    let int32 = Type::basic(BasicKind::Int32);
    let x = b.var("x", int32.clone());
    let forty = b.int(40, BasicKind::UntypedInt);
    let shl = b.binary(BinaryOp::Shl, x, forty, int32.clone());
    assert_eq!(text(&b, &shl), "0");

    let x = b.var("x", int32.clone());
    let n = b.var("n", Type::basic(BasicKind::Uint));
    let shr = b.binary(BinaryOp::Shr, x, n, int32);
    assert_eq!(text(&b, &shr), "__arshift(x, n)");
}

#[test]
fn test_overlong_shift_still_evaluates_call() {
    let mut b = ExprBuilder::new();
    let int32 = Type::basic(BasicKind::Int32);
    let f = b.func("f", Signature::new(vec![], vec![int32.clone()]));
    let call = b.call(f, vec![], int32.clone());
    let forty = b.int(40, BasicKind::UntypedInt);
    let shl = b.binary(BinaryOp::Shl, call, forty, int32);

    let (out, _) = lower(&b, &shl);
    assert_eq!(out.text, "f() & 0");
    assert_eq!(out.with_parens(), "(f() & 0)");
}

#[test]
fn test_string_concatenation() {
    let mut b = ExprBuilder::new();
    let string = Type::basic(BasicKind::String);
    let s = b.var("s", string.clone());
    let bang = b.string("!");
    let joined = b.binary(BinaryOp::Add, s, bang, string);
    assert_eq!(text(&b, &joined), "s .. \"!\"");
}

#[test]
fn test_nil_comparisons() {
    let mut b = ExprBuilder::new();
    let bool_type = Type::basic(BasicKind::Bool);
    let slice = Type::slice(int());

    let nil = b.nil(slice.clone());
    let xs = b.var("xs", slice);
    let eq = b.binary(BinaryOp::Eql, nil, xs, bool_type.clone());
    assert_eq!(text(&b, &eq), "__isNil(xs)");

    let ptr = Type::pointer(int());
    let p = b.var("p", ptr.clone());
    let nil = b.nil(ptr);
    let neq = b.binary(BinaryOp::Neq, p, nil, bool_type);
    assert_eq!(text(&b, &neq), "p ~= nil");
}

#[test]
fn test_struct_equality_is_structural() {
    let mut b = ExprBuilder::new();
    let p = b.var("p", point());
    let q = b.var("q", point());
    let eq = b.binary(BinaryOp::Eql, p, q, Type::basic(BasicKind::Bool));
    assert_eq!(text(&b, &eq), "__equal(p, q, \"main.Point\")");
}

#[test]
fn test_interface_equality_boxes_the_concrete_side() {
    let mut b = ExprBuilder::new();
    let v = b.var("v", Type::empty_interface());
    let three = b.int(3, BasicKind::UntypedInt);
    let neq = b.binary(BinaryOp::Neq, v, three, Type::basic(BasicKind::Bool));
    assert_eq!(text(&b, &neq), "not __interfaceIsEqual(v, 3)");
}

#[test]
fn test_slice_index_is_range_checked() {
    let mut b = ExprBuilder::new();
    let xs = b.var("xs", Type::slice(int()));
    let i = b.var("i", int());
    let at = b.index(xs, i, int());
    assert_eq!(
        text(&b, &at),
        "((i < 0 or i >= #xs) and __throwRuntimeError(\"index out of range\") or xs[i])"
    );
}

#[test]
fn test_string_index_is_range_checked() {
    let mut b = ExprBuilder::new();
    let s = b.var("s", Type::basic(BasicKind::String));
    let i = b.var("i", int());
    let at = b.index(s, i, Type::basic(BasicKind::Uint8));
    assert_eq!(
        text(&b, &at),
        "((i < 0 or i >= #s) and __throwRuntimeError(\"index out of range\") or string.byte(s, i + 1))"
    );
}

#[test]
fn test_constant_array_index_skips_check() {
    let mut b = ExprBuilder::new();
    let arr = b.var("arr", Type::array(int(), 4));
    let two = b.int(2, BasicKind::Int);
    let at = b.index(arr, two, int());
    assert_eq!(text(&b, &at), "arr[2]");
}

#[test]
fn test_map_index_uses_callable_api() {
    let mut b = ExprBuilder::new();
    let string = Type::basic(BasicKind::String);
    let m = b.var("m", Type::map(string.clone(), int()));
    let k = b.var("k", string.clone());
    let get = b.index(m, k, int());
    assert_eq!(text(&b, &get), "m('get', k, 0)");

    let m = b.var("m", Type::map(int(), string.clone()));
    let one = b.int(1, BasicKind::UntypedInt);
    let lookup = b.index(
        m,
        one,
        Type::Tuple(vec![string, Type::basic(BasicKind::Bool)]),
    );
    assert_eq!(text(&b, &lookup), "m('getok', tostring(1), \"\")");
}

#[test]
fn test_string_slicing() {
    let mut b = ExprBuilder::new();
    let string = Type::basic(BasicKind::String);
    let s = b.var("s", string.clone());
    let one = b.int(1, BasicKind::Int);
    let sub = b.slice(s, Some(one), None, string);
    assert_eq!(text(&b, &sub), "__substring(s, 1)");
}

#[test]
fn test_slice_and_map_literals() {
    let mut b = ExprBuilder::new();
    let elements: Vec<_> = (1..=3)
        .map(|n| ExprBuilder::element(b.int(n, BasicKind::UntypedInt)))
        .collect();
    let xs = b.composite(Type::slice(int()), elements);
    assert_eq!(text(&b, &xs), "_gi_NewSlice(\"int\", {[0]=1, 2, 3})");

    let key = b.string("a");
    let one = b.int(1, BasicKind::UntypedInt);
    let m = b.composite(
        Type::map(Type::basic(BasicKind::String), int()),
        vec![ExprBuilder::keyed(key, one)],
    );
    assert_eq!(text(&b, &m), "_gi_NewMap(\"string\", \"int\", {[\"a\"]=1})");
}

#[test]
fn test_conversions() {
    let mut b = ExprBuilder::new();
    let int8 = Type::basic(BasicKind::Int8);
    let x = b.var("x", int());
    let to_int8 = b.type_expr(int8.clone());
    let narrowed = b.call(to_int8, vec![x], int8);
    assert_eq!(text(&b, &narrowed), "((x + 128) & 255) - 128");

    let f = b.var("f", Type::basic(BasicKind::Float64));
    let to_int = b.type_expr(int());
    let truncated = b.call(to_int, vec![f], int());
    assert_eq!(
        text(&b, &truncated),
        "f >= 0 and math.floor(f) or math.ceil(f)"
    );

    let string = Type::basic(BasicKind::String);
    let s = b.var("s", string);
    let bytes = Type::slice(Type::basic(BasicKind::Uint8));
    let to_bytes = b.type_expr(bytes.clone());
    let converted = b.call(to_bytes, vec![s], bytes);
    assert_eq!(text(&b, &converted), "__stringToBytes(s)");
}

#[test]
fn test_receive_suspends() {
    let mut b = ExprBuilder::new();
    let ch = b.var("ch", Type::chan(int()));
    let recv = b.unary(UnaryOp::Recv, ch, int());

    let (out, state) = lower(&b, &recv);
    assert_eq!(out.text, "_r0[0]");
    assert_eq!(
        state.pending(),
        &[PendingStatement::CallAssign {
            target: Some("_r0".to_string()),
            call: "__recv(ch)".to_string(),
            step: 0,
        }]
    );
}

#[test]
fn test_receive_comma_ok_keeps_tuple() {
    let mut b = ExprBuilder::new();
    let ch = b.var("ch", Type::chan(int()));
    let recv = b.unary(
        UnaryOp::Recv,
        ch,
        Type::Tuple(vec![int(), Type::basic(BasicKind::Bool)]),
    );
    assert_eq!(text(&b, &recv), "_r0");
}

#[test]
fn test_address_of_variable_reuses_accessor() {
    let mut b = ExprBuilder::new();
    let config = LowerConfig::default();
    let mut state = FunctionState::new();

    let x = b.var("x", int());
    let first = b.unary(UnaryOp::AddrOf, x, Type::pointer(int()));
    let x = b.var("x", int());
    let second = b.unary(UnaryOp::AddrOf, x, Type::pointer(int()));

    let a = b.lower(&config, &mut state, &first).unwrap();
    let c = b.lower(&config, &mut state, &second).unwrap();
    assert_eq!(a, c);
    assert!(a.text.contains("__newAccessor"));
    assert_eq!(state.temporaries().len(), 1);
}

#[test]
fn test_lowering_is_deterministic() {
    let mut b = ExprBuilder::new();
    let int8 = Type::basic(BasicKind::Int8);
    let x = b.var("x", int8.clone());
    let g = b.func("g", Signature::new(vec![], vec![int8.clone()]));
    let call = b.call(g, vec![], int8.clone());
    let call = b.suspending(call);
    let sum = b.binary(BinaryOp::Mul, x, call, int8);

    let (first, first_state) = lower(&b, &sum);
    let (second, second_state) = lower(&b, &sum);
    assert_eq!(first, second);
    assert_eq!(first_state.pending(), second_state.pending());
}

#[test]
fn test_unresolved_identifier_is_an_error() {
    let mut b = ExprBuilder::new();
    let ghost = b.node(
        glc_lower::ExpressionKind::Ident {
            name: "ghost".to_string(),
        },
        int(),
    );
    let mut state = FunctionState::new();
    let err = b
        .lower(&LowerConfig::default(), &mut state, &ghost)
        .unwrap_err();
    assert!(err.to_string().contains("Unresolved identifier 'ghost'"));
}
