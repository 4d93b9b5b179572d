//! Lua lexical helpers: string literals, reserved words, number spelling

/// Lua 5.3 reserved words
pub const KEYWORDS: &[&str] = &[
    "and", "break", "do", "else", "elseif", "end", "false", "for", "function", "goto", "if",
    "in", "local", "nil", "not", "or", "repeat", "return", "then", "true", "until", "while",
];

pub fn is_keyword(name: &str) -> bool {
    KEYWORDS.contains(&name)
}

/// Append `_` to names that collide with a reserved word
pub fn safe_name(name: &str) -> String {
    if is_keyword(name) {
        format!("{}_", name)
    } else {
        name.to_string()
    }
}

/// Whether `text` is a plain Lua name (and therefore safe to repeat)
pub fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_') && !is_keyword(text)
}

/// Quote a byte string as a Lua string literal
///
/// Printable ASCII passes through; everything else uses a three-digit
/// decimal escape so the literal is byte-exact.
pub fn quote_bytes(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() + 2);
    out.push('"');
    for &b in bytes {
        match b {
            b'"' => out.push_str("\\\""),
            b'\\' => out.push_str("\\\\"),
            b'\n' => out.push_str("\\n"),
            b'\r' => out.push_str("\\r"),
            b'\t' => out.push_str("\\t"),
            0x20..=0x7e => out.push(b as char),
            _ => out.push_str(&format!("\\{:03}", b)),
        }
    }
    out.push('"');
    out
}

pub fn quote(s: &str) -> String {
    quote_bytes(s.as_bytes())
}

/// Spell a float so Lua reads it back as a float
pub fn float_literal(value: f64) -> String {
    if value.is_nan() {
        "(0/0)".to_string()
    } else if value.is_infinite() {
        if value > 0.0 {
            "math.huge".to_string()
        } else {
            "(-math.huge)".to_string()
        }
    } else {
        format!("{:?}", value)
    }
}

/// Smallest Lua integer; xor with it maps unsigned order onto signed order
pub const MIN_INTEGER: &str = "math.mininteger";

/// Spell an integer; values beyond the signed 64-bit range use hex, which
/// Lua wraps into the integer cell. The signed minimum has no decimal
/// integer spelling in Lua.
pub fn int_literal(value: i128) -> String {
    if value == i64::MIN as i128 {
        MIN_INTEGER.to_string()
    } else if value > i64::MAX as i128 {
        format!("0x{:X}", value as u64)
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote() {
        assert_eq!(quote("hi"), "\"hi\"");
        assert_eq!(quote("a\"b\\c\n"), "\"a\\\"b\\\\c\\n\"");
        assert_eq!(quote("é"), "\"\\195\\169\"");
        assert_eq!(quote_bytes(&[0, 255]), "\"\\000\\255\"");
    }

    #[test]
    fn test_identifiers() {
        assert!(is_identifier("_t0"));
        assert!(is_identifier("x"));
        assert!(!is_identifier("end"));
        assert!(!is_identifier("a.b"));
        assert!(!is_identifier("0a"));
        assert_eq!(safe_name("end"), "end_");
        assert_eq!(safe_name("Print"), "Print");
    }

    #[test]
    fn test_numbers() {
        assert_eq!(float_literal(1.0), "1.0");
        assert_eq!(float_literal(0.5), "0.5");
        assert_eq!(float_literal(f64::INFINITY), "math.huge");
        assert_eq!(int_literal(-56), "-56");
        assert_eq!(int_literal(u64::MAX as i128), "0xFFFFFFFFFFFFFFFF");
        assert_eq!(int_literal(i64::MIN as i128), "math.mininteger");
        assert_eq!(int_literal(i64::MIN as i128 + 1), "-9223372036854775807");
    }
}
