//! Template substitution with single-evaluation hoisting
//!
//! A pattern mixes literal text with placeholders `%[n]tag`, where `n` is an
//! optional 1-based operand index. Without an index the running index is
//! used; it advances past whichever operand a placeholder addressed.
//!
//! | tag | operand        | output                                   |
//! |-----|----------------|------------------------------------------|
//! | `e` | expression     | lowered operand, parenthesized if needed |
//! | `f` | expression     | as `e`; integer constants as decimal     |
//! | `h` | expression     | high 32 bits                             |
//! | `l` | expression     | low 32 bits                              |
//! | `r` | expression     | real part                                |
//! | `i` | expression     | imaginary part                           |
//! | `s` | text           | verbatim                                 |
//! | `d` | integer        | decimal                                  |
//! | `t` | operator       | Lua spelling                             |
//!
//! `%%` is a literal percent sign and does not consume an operand.

use super::errors::LowerError;
use super::lowered::Lowered;
use super::ExpressionLowerer;
use crate::ast::{BinaryOp, Expression};
use crate::lua;
use glc_common::CompilerError;
use log::{debug, trace};

/// One template operand
#[derive(Debug, Clone)]
pub enum Operand<'e> {
    Expr(&'e Expression),
    /// Already-lowered text, treated like an expression operand
    Lowered(Lowered),
    Text(String),
    Int(i64),
    Token(BinaryOp),
}

impl<'e> From<&'e Expression> for Operand<'e> {
    fn from(expr: &'e Expression) -> Self {
        Operand::Expr(expr)
    }
}

impl From<Lowered> for Operand<'_> {
    fn from(lowered: Lowered) -> Self {
        Operand::Lowered(lowered)
    }
}

impl From<&str> for Operand<'_> {
    fn from(text: &str) -> Self {
        Operand::Text(text.to_string())
    }
}

impl From<String> for Operand<'_> {
    fn from(text: String) -> Self {
        Operand::Text(text)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Piece<'p> {
    Literal(&'p str),
    Percent,
    Placeholder { index: usize, tag: char },
}

fn malformed(pattern: &str, reason: impl Into<String>) -> LowerError {
    LowerError::MalformedTemplate {
        pattern: pattern.to_string(),
        reason: reason.into(),
    }
}

fn parse(pattern: &str, operand_count: usize) -> Result<Vec<Piece<'_>>, LowerError> {
    let mut pieces = Vec::new();
    let bytes = pattern.as_bytes();
    let mut running = 0usize;
    let mut literal_start = 0usize;
    let mut i = 0usize;

    while i < bytes.len() {
        if bytes[i] != b'%' {
            i += 1;
            continue;
        }
        if literal_start < i {
            pieces.push(Piece::Literal(&pattern[literal_start..i]));
        }
        i += 1;

        let digits_start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        let explicit = if i > digits_start {
            let n: usize = pattern[digits_start..i]
                .parse()
                .map_err(|_| malformed(pattern, "bad operand index"))?;
            if n == 0 {
                return Err(malformed(pattern, "operand indices are 1-based"));
            }
            Some(n - 1)
        } else {
            None
        };

        let Some(&tag) = bytes.get(i) else {
            return Err(malformed(pattern, "placeholder without a tag"));
        };
        i += 1;
        literal_start = i;

        if tag == b'%' && explicit.is_none() {
            pieces.push(Piece::Percent);
            continue;
        }
        let tag = tag as char;
        if !matches!(tag, 'e' | 'f' | 'h' | 'l' | 'r' | 'i' | 's' | 'd' | 't') {
            return Err(malformed(pattern, format!("unknown tag '{}'", tag)));
        }
        let index = explicit.unwrap_or(running);
        if index >= operand_count {
            return Err(malformed(
                pattern,
                format!("operand {} out of range ({} given)", index + 1, operand_count),
            ));
        }
        pieces.push(Piece::Placeholder { index, tag });
        running = index + 1;
    }
    if literal_start < bytes.len() {
        pieces.push(Piece::Literal(&pattern[literal_start..]));
    }
    Ok(pieces)
}

/// Render `pattern`; the result is atomic unless parenthesized by the caller
pub fn render(
    lw: &mut ExpressionLowerer<'_>,
    pattern: &str,
    operands: &[Operand<'_>],
) -> Result<Lowered, CompilerError> {
    render_internal(lw, pattern, operands, false)
}

/// Render `pattern` as operator-form text
pub fn render_paren(
    lw: &mut ExpressionLowerer<'_>,
    pattern: &str,
    operands: &[Operand<'_>],
) -> Result<Lowered, CompilerError> {
    render_internal(lw, pattern, operands, true)
}

fn is_repeatable(lw: &ExpressionLowerer<'_>, operand: &Operand<'_>) -> bool {
    match operand {
        Operand::Expr(expr) => expr.unparen().is_ident() || lw.constant_of(expr).is_some(),
        Operand::Lowered(lowered) => {
            lua::is_identifier(&lowered.text) || lowered.text.parse::<f64>().is_ok()
        }
        Operand::Text(_) | Operand::Int(_) | Operand::Token(_) => true,
    }
}

fn render_internal(
    lw: &mut ExpressionLowerer<'_>,
    pattern: &str,
    operands: &[Operand<'_>],
    parens: bool,
) -> Result<Lowered, CompilerError> {
    let pieces = parse(pattern, operands.len())?;

    let mut counts = vec![0usize; operands.len()];
    for piece in &pieces {
        if let Piece::Placeholder { index, tag } = piece {
            if matches!(tag, 'e' | 'f' | 'h' | 'l' | 'r' | 'i') {
                counts[*index] += 1;
            }
        }
    }

    // Any multiply-referenced operand is hoisted. Earlier impure operands
    // are hoisted along with it so hoisting never reorders evaluation.
    let last_hoisted = (0..operands.len())
        .rev()
        .find(|&i| counts[i] > 1 && !is_repeatable(lw, &operands[i]));

    let mut vars: Vec<Option<String>> = vec![None; operands.len()];
    let mut prelude = Vec::new();
    if let Some(last) = last_hoisted {
        for i in 0..=last {
            if counts[i] == 0 || is_repeatable(lw, &operands[i]) {
                continue;
            }
            let value = match &operands[i] {
                Operand::Expr(expr) => lw.lower(expr, None)?,
                Operand::Lowered(lowered) => lowered.clone(),
                _ => continue,
            };
            let var = lw.state.new_local("_t");
            debug!("hoisting operand {} of '{}' into {}", i + 1, pattern, var);
            prelude.push(format!("local {} = {}", var, value.text));
            vars[i] = Some(var);
        }
    }

    let mut out = String::new();
    for piece in &pieces {
        match *piece {
            Piece::Literal(text) => out.push_str(text),
            Piece::Percent => out.push('%'),
            Piece::Placeholder { index, tag } => {
                let text = render_placeholder(lw, pattern, &operands[index], vars[index].as_deref(), tag)?;
                trace!("'{}' %{}{} -> {}", pattern, index + 1, tag, text);
                out.push_str(&text);
            }
        }
    }

    if prelude.is_empty() {
        return Ok(Lowered { text: out, parens });
    }
    Ok(Lowered::new(format!(
        "(function() {}; return {} end)()",
        prelude.join("; "),
        out
    )))
}

fn render_placeholder(
    lw: &mut ExpressionLowerer<'_>,
    pattern: &str,
    operand: &Operand<'_>,
    var: Option<&str>,
    tag: char,
) -> Result<String, CompilerError> {
    match tag {
        's' => match operand {
            Operand::Text(text) => Ok(text.clone()),
            Operand::Lowered(lowered) => Ok(lowered.with_parens()),
            Operand::Int(n) => Ok(n.to_string()),
            _ => Err(malformed(pattern, "%s needs a text operand").into()),
        },
        'd' => match operand {
            Operand::Int(n) => Ok(n.to_string()),
            _ => Err(malformed(pattern, "%d needs an integer operand").into()),
        },
        't' => match operand {
            Operand::Token(op) => Ok(op.lua_token().to_string()),
            _ => Err(malformed(pattern, "%t needs an operator operand").into()),
        },
        'e' | 'f' => {
            if let Some(var) = var {
                return Ok(var.to_string());
            }
            match operand {
                Operand::Expr(expr) => {
                    if let Some(value) = lw.constant_of(expr) {
                        if tag == 'f' {
                            if let Some(n) = value.as_int() {
                                return Ok(lua::int_literal(n));
                            }
                        }
                        return Ok(lw.lower(expr, None)?.text);
                    }
                    Ok(lw.lower(expr, None)?.with_parens())
                }
                Operand::Lowered(lowered) => Ok(lowered.with_parens()),
                _ => Err(malformed(pattern, format!("%{} needs an expression operand", tag)).into()),
            }
        }
        'h' | 'l' => {
            let signed = match operand {
                Operand::Expr(expr) => {
                    let ty = lw.type_of(expr)?;
                    !ty.basic_kind().map_or(false, |k| k.is_unsigned())
                }
                _ => false,
            };
            if let Operand::Expr(expr) = operand {
                if let Some(n) = lw.constant_of(expr).and_then(|v| v.as_int()) {
                    let folded = if tag == 'h' {
                        if signed {
                            (n as i64 >> 32) as i128
                        } else {
                            (n as u64 >> 32) as i128
                        }
                    } else {
                        (n as u64 & 0xFFFF_FFFF) as i128
                    };
                    return Ok(folded.to_string());
                }
            }
            let base = operand_text(lw, pattern, operand, var, tag)?;
            Ok(match (tag, signed) {
                ('h', true) => format!("{}({}, 32)", crate::runtime::ARSHIFT, base),
                ('h', false) => format!("({} >> 32)", base),
                _ => format!("({} & 0xFFFFFFFF)", base),
            })
        }
        'r' | 'i' => {
            if let Operand::Expr(expr) = operand {
                if let Some(value) = lw.constant_of(expr) {
                    let part = if tag == 'r' { value.real() } else { value.imag() };
                    if let Some(part) = part {
                        return Ok(lua::float_literal(part));
                    }
                }
            }
            let base = operand_text(lw, pattern, operand, var, tag)?;
            let suffix = if tag == 'r' { "real" } else { "imag" };
            Ok(format!("{}.{}", base, suffix))
        }
        other => Err(malformed(pattern, format!("unknown tag '{}'", other)).into()),
    }
}

fn operand_text(
    lw: &mut ExpressionLowerer<'_>,
    pattern: &str,
    operand: &Operand<'_>,
    var: Option<&str>,
    tag: char,
) -> Result<String, CompilerError> {
    if let Some(var) = var {
        return Ok(var.to_string());
    }
    match operand {
        Operand::Expr(expr) => Ok(lw.lower(expr, None)?.with_parens()),
        Operand::Lowered(lowered) => Ok(lowered.with_parens()),
        _ => Err(malformed(pattern, format!("%{} needs an expression operand", tag)).into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_running_index() {
        let pieces = parse("%e + %e", 2).unwrap();
        assert_eq!(
            pieces,
            vec![
                Piece::Placeholder { index: 0, tag: 'e' },
                Piece::Literal(" + "),
                Piece::Placeholder { index: 1, tag: 'e' },
            ]
        );
    }

    #[test]
    fn test_parse_explicit_index_resets_running() {
        let pieces = parse("%2e %1e %e", 2).unwrap();
        assert_eq!(pieces[0], Piece::Placeholder { index: 1, tag: 'e' });
        assert_eq!(pieces[2], Piece::Placeholder { index: 0, tag: 'e' });
        assert_eq!(pieces[4], Piece::Placeholder { index: 1, tag: 'e' });
    }

    #[test]
    fn test_parse_percent_does_not_consume() {
        let pieces = parse("%e %% %e", 2).unwrap();
        assert_eq!(pieces[2], Piece::Percent);
        assert_eq!(pieces[4], Piece::Placeholder { index: 1, tag: 'e' });
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(parse("%e %e", 1), Err(LowerError::MalformedTemplate { .. })));
        assert!(matches!(parse("%q", 1), Err(LowerError::MalformedTemplate { .. })));
        assert!(matches!(parse("50%", 0), Err(LowerError::MalformedTemplate { .. })));
        assert!(matches!(parse("%0e", 1), Err(LowerError::MalformedTemplate { .. })));
    }
}
