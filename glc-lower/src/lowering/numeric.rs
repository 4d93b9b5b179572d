//! Numeric normalization
//!
//! Lua integers are 64-bit and wrap, so `int`, `int32` and `int64` results
//! are already correct. Narrower kinds are truncated after every arithmetic
//! step that can leave their range.

use super::lowered::Lowered;
use crate::types::BasicKind;
use log::trace;

/// Whether arithmetic results of `kind` need truncation in emitted code
pub fn needs_normalization(kind: BasicKind) -> bool {
    matches!(
        kind,
        BasicKind::Int8
            | BasicKind::Int16
            | BasicKind::Uint8
            | BasicKind::Uint16
            | BasicKind::Uint32
            | BasicKind::Uint
            | BasicKind::Uintptr
    )
}

/// Truncate an arithmetic result to the width and signedness of `kind`
pub fn fix_number(value: Lowered, kind: BasicKind) -> Lowered {
    if !needs_normalization(kind) {
        return value;
    }
    let width = kind.bit_width().unwrap_or(64);
    let operand = value.with_parens();
    trace!("normalizing '{}' to {}", operand, kind);
    match kind {
        BasicKind::Int8 | BasicKind::Int16 => {
            let half = 1u64 << (width - 1);
            let mask = (1u64 << width) - 1;
            Lowered::paren(format!("(({} + {}) & {}) - {}", operand, half, mask, half))
        }
        BasicKind::Uint8 | BasicKind::Uint16 => {
            let mask = (1u64 << width) - 1;
            Lowered::paren(format!("{} & {}", operand, mask))
        }
        _ => Lowered::paren(format!("{} & 0xFFFFFFFF", operand)),
    }
}

/// Wrap a constant into the range of `kind`; untyped kinds are unbounded
pub fn wrap_integer(value: i128, kind: BasicKind) -> i128 {
    if kind.is_untyped() || !kind.is_integer() {
        return value;
    }
    let Some(width) = kind.bit_width() else {
        return value;
    };
    let modulus = 1i128 << width;
    if kind.is_unsigned() {
        value.rem_euclid(modulus)
    } else {
        let half = modulus >> 1;
        (value + half).rem_euclid(modulus) - half
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_signed() {
        assert_eq!(wrap_integer(200, BasicKind::Int8), -56);
        assert_eq!(wrap_integer(128, BasicKind::Int8), -128);
        assert_eq!(wrap_integer(-129, BasicKind::Int8), 127);
        assert_eq!(wrap_integer(32768, BasicKind::Int16), -32768);
        assert_eq!(wrap_integer(1 << 31, BasicKind::Int32), -(1 << 31));
        assert_eq!(wrap_integer(1 << 63, BasicKind::Int64), -(1 << 63));
    }

    #[test]
    fn test_wrap_unsigned() {
        assert_eq!(wrap_integer(256, BasicKind::Uint8), 0);
        assert_eq!(wrap_integer(-1, BasicKind::Uint8), 255);
        assert_eq!(wrap_integer(65536, BasicKind::Uint16), 0);
        assert_eq!(wrap_integer(1 << 32, BasicKind::Uint32), 0);
        assert_eq!(wrap_integer(-1, BasicKind::Uint), 0xFFFF_FFFF);
        assert_eq!(wrap_integer(-1, BasicKind::Uint64), u64::MAX as i128);
    }

    #[test]
    fn test_untyped_is_unbounded() {
        assert_eq!(wrap_integer(1 << 70, BasicKind::UntypedInt), 1 << 70);
    }

    #[test]
    fn test_fix_number_forms() {
        let x = || Lowered::paren("a + b");
        assert_eq!(
            fix_number(x(), BasicKind::Int8).text,
            "(((a + b) + 128) & 255) - 128"
        );
        assert_eq!(fix_number(x(), BasicKind::Uint16).text, "(a + b) & 65535");
        assert_eq!(fix_number(x(), BasicKind::Uint32).text, "(a + b) & 0xFFFFFFFF");
        assert_eq!(fix_number(x(), BasicKind::Int64), x());
        assert_eq!(fix_number(x(), BasicKind::Float32), x());
    }
}
