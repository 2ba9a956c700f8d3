//! Lexical casting of annotation default text.
//!
//! Literals follow the JVM's own readers: a `char` is one UTF-16 code unit,
//! integers take their radix prefix before the sign (`0x-10`, not `-0x10`),
//! and floats use `Float.parseFloat` syntax.

use stackval_types::{ClassName, Constant};

use super::SourceType;

/// Result of reading annotation text as a literal.
#[derive(Clone, Debug, PartialEq)]
pub enum LexicalValue {
    EnumEntry { class: ClassName, entry: String },
    Constant(Constant),
}

/// Read `text` as a literal of type `ty`.
///
/// Returns `None` when the text is not a valid literal of that type, or when
/// the type has no literal form.
pub fn lexical_cast(ty: &SourceType, text: &str) -> Option<LexicalValue> {
    let constant = match ty {
        SourceType::Enum { class, entries } => {
            return entries
                .iter()
                .any(|e| e == text)
                .then(|| LexicalValue::EnumEntry {
                    class: class.clone(),
                    entry: text.to_owned(),
                });
        }
        SourceType::Bool => Constant::Bool(text.eq_ignore_ascii_case("true")),
        SourceType::Char => {
            let mut chars = text.chars();
            match (chars.next(), chars.next()) {
                // Supplementary-plane characters need a surrogate pair.
                (Some(c), None) if c.len_utf16() == 1 => Constant::Char(c),
                _ => return None,
            }
        }
        SourceType::Byte => Constant::I8(i8::try_from(parse_integer(text)?).ok()?),
        SourceType::Short => Constant::I16(i16::try_from(parse_integer(text)?).ok()?),
        SourceType::Int => Constant::I32(i32::try_from(parse_integer(text)?).ok()?),
        SourceType::Long => Constant::I64(i64::try_from(parse_integer(text)?).ok()?),
        SourceType::Float => Constant::F32(parse_f32(text)?),
        SourceType::Double => Constant::F64(parse_f64(text)?),
        SourceType::String => Constant::String(text.to_owned()),
        SourceType::Other(_) => return None,
    };
    Some(LexicalValue::Constant(constant))
}

// ── Integers ────────────────────────────────────────────────────

/// Integer with an optional `0x` or `0b` radix prefix, then an optional sign.
fn parse_integer(text: &str) -> Option<i128> {
    let (radix, signed) = if let Some(hex) = strip_radix(text, 'x') {
        (16, hex)
    } else if let Some(bin) = strip_radix(text, 'b') {
        (2, bin)
    } else {
        (10, text)
    };
    let (negative, digits) = match signed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, signed.strip_prefix('+').unwrap_or(signed)),
    };
    // `from_str_radix` would accept a second sign.
    if digits.starts_with(['+', '-']) {
        return None;
    }
    let magnitude = i128::from_str_radix(digits, radix).ok()?;
    Some(if negative { -magnitude } else { magnitude })
}

fn strip_radix(text: &str, marker: char) -> Option<&str> {
    let rest = text.strip_prefix('0')?;
    rest.strip_prefix(marker)
        .or_else(|| rest.strip_prefix(marker.to_ascii_uppercase()))
}

// ── Floats ──────────────────────────────────────────────────────

/// A float literal split into sign and body.
enum FloatText<'a> {
    /// Validated decimal digits, fraction and exponent, suffix removed.
    Decimal(&'a str),
    /// Value of a hexadecimal literal such as `0x1.8p1`.
    Hex(f64),
    NaN,
    Infinity,
}

fn parse_f64(text: &str) -> Option<f64> {
    let (negative, body) = float_text(text)?;
    let value = match body {
        FloatText::Decimal(digits) => digits.parse().ok()?,
        FloatText::Hex(value) => value,
        FloatText::NaN => f64::NAN,
        FloatText::Infinity => f64::INFINITY,
    };
    Some(if negative { -value } else { value })
}

fn parse_f32(text: &str) -> Option<f32> {
    let (negative, body) = float_text(text)?;
    let value = match body {
        FloatText::Decimal(digits) => digits.parse().ok()?,
        FloatText::Hex(value) => round_to_f32(value),
        FloatText::NaN => f32::NAN,
        FloatText::Infinity => f32::INFINITY,
    };
    Some(if negative { -value } else { value })
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "float literals round to the nearest f32"
)]
fn round_to_f32(value: f64) -> f32 {
    value as f32
}

/// Split `text` per `Float.parseFloat`: surrounding control characters and
/// spaces, an optional sign, then `NaN`, `Infinity`, or a decimal or hex
/// number with an optional `f`/`F`/`d`/`D` suffix.
fn float_text(text: &str) -> Option<(bool, FloatText<'_>)> {
    let trimmed = text.trim_matches(|c: char| c <= ' ');
    let (negative, unsigned) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    match unsigned {
        "NaN" => return Some((negative, FloatText::NaN)),
        "Infinity" => return Some((negative, FloatText::Infinity)),
        _ => {}
    }
    let number = unsigned
        .strip_suffix(['f', 'F', 'd', 'D'])
        .unwrap_or(unsigned);
    let body = match strip_radix(number, 'x') {
        Some(hex) => FloatText::Hex(hex_float(hex)?),
        None => FloatText::Decimal(decimal_float(number)?),
    };
    Some((negative, body))
}

/// `digits [. digits] [(e|E) [sign] digits]` with at least one mantissa digit.
fn decimal_float(text: &str) -> Option<&str> {
    let (mantissa, exponent) = match text.find(['e', 'E']) {
        Some(at) => (&text[..at], Some(&text[at + 1..])),
        None => (text, None),
    };
    let (int, frac) = mantissa.split_once('.').unwrap_or((mantissa, ""));
    let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if int.len() + frac.len() == 0 || !all_digits(int) || !all_digits(frac) {
        return None;
    }
    if let Some(exponent) = exponent {
        let digits = exponent
            .strip_prefix(['+', '-'])
            .unwrap_or(exponent);
        if digits.is_empty() || !all_digits(digits) {
            return None;
        }
    }
    Some(text)
}

/// Value of `hexdigits [. hexdigits] (p|P) [sign] digits`, after `0x`.
fn hex_float(text: &str) -> Option<f64> {
    let (mantissa, exponent) = text.split_once(['p', 'P'])?;
    let (int, frac) = mantissa.split_once('.').unwrap_or((mantissa, ""));
    if int.len() + frac.len() == 0 {
        return None;
    }
    let exp_digits = exponent
        .strip_prefix(['+', '-'])
        .unwrap_or(exponent);
    if exp_digits.is_empty() || !exp_digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    // Saturate: anything this large already over- or underflows.
    let exponent: i32 = exponent.parse().unwrap_or(if exponent.starts_with('-') {
        i32::MIN / 2
    } else {
        i32::MAX / 2
    });

    let mut value = 0.0_f64;
    for c in int.chars().chain(frac.chars()) {
        value = value * 16.0 + f64::from(c.to_digit(16)?);
    }
    // A zero mantissa stays zero whatever the exponent.
    if int.chars().chain(frac.chars()).all(|c| c == '0') {
        return Some(0.0);
    }
    let frac_bits = i32::try_from(frac.len()).ok()?.checked_mul(4)?;
    let scale = exponent.saturating_sub(frac_bits);
    // Two steps so a long mantissa with a small exponent does not underflow
    // in the power alone.
    let half = scale / 2;
    Some(value * 2.0_f64.powi(half) * 2.0_f64.powi(scale - half))
}
