//! Names of the runtime support library called by emitted code
//!
//! The library itself is maintained separately; these names are the fixed
//! call surface lowering emits against.

// Containers
pub const NEW_ARRAY: &str = "_gi_NewArray";
pub const NEW_SLICE: &str = "_gi_NewSlice";
pub const NEW_MAP: &str = "_gi_NewMap";
pub const MAKE_SLICE: &str = "__makeSlice";
pub const SLICE_OF_ARRAY: &str = "__sliceOfArray";
pub const APPEND: &str = "append";
pub const APPEND_SLICE: &str = "appendSlice";
pub const COPY_SLICE: &str = "copySlice";
pub const COPY_STRING: &str = "__copyString";
pub const SUBSLICE: &str = "__subslice";
pub const SUBSTRING: &str = "__substring";

// Values
pub const NEW_INSTANCE: &str = "__reg:NewInstance";
pub const CLONE: &str = "_gi_clone";
pub const COMPLEX: &str = "__complex";
pub const DIV_COMPLEX: &str = "__divComplex";
pub const BOX: &str = "__box";

// Strings
pub const BYTES_TO_STRING: &str = "__bytesToString";
pub const RUNES_TO_STRING: &str = "__runesToString";
pub const STRING_TO_BYTES: &str = "__stringToBytes";
pub const STRING_TO_RUNES: &str = "__stringToRunes";
pub const ENCODE_RUNE: &str = "__encodeRune";

// Pointers and methods
pub const NEW_DATA_POINTER: &str = "__newDataPointer";
pub const NEW_ACCESSOR: &str = "__newAccessor";
pub const INDEX_PTR: &str = "__indexPtr";
pub const METHOD_VAL: &str = "__methodVal";
pub const METHOD_EXPR: &str = "__methodExpr";
pub const IFACE_METHOD_EXPR: &str = "__ifaceMethodExpr";
pub const NIL_POINTER_ERROR: &str = "__throwNilPointerError";

// Arithmetic and comparison
pub const INT_DIV: &str = "__intDiv";
pub const INT_MOD: &str = "__intMod";
pub const UINT_DIV: &str = "__uintDiv";
pub const UINT_MOD: &str = "__uintMod";
pub const ARSHIFT: &str = "__arshift";
pub const EQUAL: &str = "__equal";
pub const INTERFACE_IS_EQUAL: &str = "__interfaceIsEqual";
pub const ASSERT_TYPE: &str = "__assertType";
pub const RUNTIME_ERROR: &str = "__throwRuntimeError";
pub const IS_NIL: &str = "__isNil";
pub const PANIC: &str = "__panic";
pub const RECOVER: &str = "__recover";
pub const PRINT: &str = "__print";
pub const PRINTLN: &str = "__println";

// Channels
pub const NEW_CHAN: &str = "__newChan";
pub const CHAN_NIL: &str = "__chanNil";
pub const RECV: &str = "__recv";
pub const CLOSE: &str = "__close";

// Host interop
pub const GLOBAL: &str = "__global";
pub const MODULE: &str = "__module";
pub const INTERNALIZE: &str = "__internalize";
pub const EXTERNALIZE: &str = "__externalize";
pub const HOST_OBJECT_PTR: &str = "__jsObjectPtr";
pub const NEW_HOST_OBJECT: &str = "__newHostObject";
pub const PARSE_INT: &str = "__parseInt";
pub const PARSE_FLOAT: &str = "__parseFloat";
pub const DEBUGGER: &str = "__debugger";
