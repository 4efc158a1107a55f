//! Pure scalar decoders.
//!
//! Each decoder takes anything convertible into a [`Scalar`] and returns
//! `Ok(None)` for null, `Ok(Some(v))` for a value, or a [`DecodeError`].
//! None of them keep state between calls.

use bigdecimal::{BigDecimal, ToPrimitive};
use serde_json::Value;
use std::num::IntErrorKind;
use std::str::FromStr;

use crate::attribute::TAG_NULL;
use crate::error::DecodeError;
use crate::types::Scalar;

/// 2^63, the first float above the i64 range.
const I64_LIMIT: f64 = 9_223_372_036_854_775_808.0;

/// Return the raw payload of a typed wire map.
///
/// `None` is the null sentinel: the input is not a map, is empty, or carries
/// a `NULL` tag. Otherwise the first entry's payload is returned, in wire
/// order, without looking at its tag.
pub fn extract_scalar(attr: &Value) -> Option<&Value> {
    let map = attr.as_object()?;
    if map.is_empty() || map.contains_key(TAG_NULL) {
        return None;
    }
    map.values().next()
}

/// Decode to a 64-bit signed integer.
///
/// Floats are truncated toward zero after a range check. Text must be a
/// complete base-10 integer; whitespace and decimal points are rejected.
pub fn decode_integer<'a>(value: impl Into<Scalar<'a>>) -> Result<Option<i64>, DecodeError> {
    const TARGET: &str = "integer";

    match value.into() {
        Scalar::Null => Ok(None),
        Scalar::Int(v) => Ok(Some(v)),
        Scalar::UInt(v) => i64::try_from(v)
            .map(Some)
            .map_err(|_| DecodeError::overflow(TARGET, v.to_string())),
        Scalar::Bool(b) => Ok(Some(i64::from(b))),
        Scalar::Float(f) => truncate_float(f).map(Some),
        Scalar::Text(text) => parse_integer(text).map(Some),
        other => Err(DecodeError::unsupported(TARGET, other.type_name())),
    }
}

fn truncate_float(f: f64) -> Result<i64, DecodeError> {
    if f.is_nan() {
        return Err(DecodeError::invalid_format("integer", "NaN"));
    }
    let truncated = f.trunc();
    if !(-I64_LIMIT..I64_LIMIT).contains(&truncated) {
        return Err(DecodeError::overflow("integer", format!("{f:?}")));
    }
    Ok(truncated as i64)
}

fn parse_integer(text: &str) -> Result<i64, DecodeError> {
    text.parse::<i64>().map_err(|e| match e.kind() {
        IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => {
            DecodeError::overflow("integer", text)
        }
        _ => DecodeError::invalid_format("integer", text),
    })
}

/// Decode to an arbitrary-precision decimal.
///
/// Decimals pass through untouched. Floats are rendered with 17 significant
/// digits and then parsed, so the result is the shortest decimal that
/// identifies the double exactly rather than its full binary expansion.
pub fn decode_decimal<'a>(
    value: impl Into<Scalar<'a>>,
) -> Result<Option<BigDecimal>, DecodeError> {
    const TARGET: &str = "decimal";

    match value.into() {
        Scalar::Null => Ok(None),
        Scalar::Decimal(d) => Ok(Some(d.clone())),
        Scalar::Text(text) => BigDecimal::from_str(text)
            .map(Some)
            .map_err(|_| DecodeError::invalid_format(TARGET, text)),
        Scalar::Float(f) => {
            if !f.is_finite() {
                return Err(DecodeError::invalid_format(TARGET, format!("{f:?}")));
            }
            let text = format_significant_17(f);
            BigDecimal::from_str(&text)
                .map(Some)
                .map_err(|_| DecodeError::invalid_format(TARGET, text))
        }
        Scalar::Int(v) => Ok(Some(BigDecimal::from(v))),
        Scalar::UInt(v) => Ok(Some(BigDecimal::from(v))),
        other => Err(DecodeError::unsupported(TARGET, other.type_name())),
    }
}

/// `%.17g`-style rendering: 17 significant digits, trailing zeros trimmed.
fn format_significant_17(f: f64) -> String {
    let sci = format!("{f:.16e}");
    match sci.split_once('e') {
        Some((mantissa, exponent)) => {
            let mantissa = if mantissa.contains('.') {
                mantissa.trim_end_matches('0').trim_end_matches('.')
            } else {
                mantissa
            };
            format!("{mantissa}e{exponent}")
        }
        None => sci,
    }
}

/// Decode to a double.
pub fn decode_float<'a>(value: impl Into<Scalar<'a>>) -> Result<Option<f64>, DecodeError> {
    const TARGET: &str = "float";

    match value.into() {
        Scalar::Null => Ok(None),
        Scalar::Float(f) => Ok(Some(f)),
        Scalar::Int(v) => Ok(Some(v as f64)),
        Scalar::UInt(v) => Ok(Some(v as f64)),
        Scalar::Bool(b) => Ok(Some(if b { 1.0 } else { 0.0 })),
        Scalar::Decimal(d) => d
            .to_f64()
            .map(Some)
            .ok_or_else(|| DecodeError::overflow(TARGET, d.to_string())),
        Scalar::Text(text) => text
            .parse::<f64>()
            .map(Some)
            .map_err(|_| DecodeError::invalid_format(TARGET, text)),
        other => Err(DecodeError::unsupported(TARGET, other.type_name())),
    }
}

/// Decode to a boolean.
///
/// Accepts booleans, the integers 0 and 1, and the text `true`/`false`
/// (any ASCII case).
pub fn decode_boolean<'a>(value: impl Into<Scalar<'a>>) -> Result<Option<bool>, DecodeError> {
    const TARGET: &str = "boolean";

    match value.into() {
        Scalar::Null => Ok(None),
        Scalar::Bool(b) => Ok(Some(b)),
        Scalar::Int(0) => Ok(Some(false)),
        Scalar::Int(1) => Ok(Some(true)),
        Scalar::Int(v) => Err(DecodeError::invalid_format(TARGET, v.to_string())),
        Scalar::Text(text) if text.eq_ignore_ascii_case("true") => Ok(Some(true)),
        Scalar::Text(text) if text.eq_ignore_ascii_case("false") => Ok(Some(false)),
        Scalar::Text(text) => Err(DecodeError::invalid_format(TARGET, text)),
        other => Err(DecodeError::unsupported(TARGET, other.type_name())),
    }
}

/// Decode to text. Booleans render as `True`/`False`.
pub fn decode_text<'a>(value: impl Into<Scalar<'a>>) -> Result<Option<String>, DecodeError> {
    match value.into() {
        Scalar::Null => Ok(None),
        Scalar::Text(text) => Ok(Some(text.to_string())),
        Scalar::Bool(true) => Ok(Some("True".to_string())),
        Scalar::Bool(false) => Ok(Some("False".to_string())),
        Scalar::Int(v) => Ok(Some(v.to_string())),
        Scalar::UInt(v) => Ok(Some(v.to_string())),
        Scalar::Float(f) => Ok(Some(format!("{f:?}"))),
        Scalar::Decimal(d) => Ok(Some(d.to_string())),
        other => Err(DecodeError::unsupported("text", other.type_name())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::AttributeValue;
    use crate::error::ErrorKind;
    use crate::types::NativeValue;
    use serde_json::json;

    fn kind_of<T: std::fmt::Debug>(r: Result<T, DecodeError>) -> ErrorKind {
        r.expect_err("expected a decode error").kind()
    }

    // ─── extract_scalar ──────────────────────────────────────────────────────

    #[test]
    fn extract_null_sentinels() {
        assert_eq!(extract_scalar(&json!({"NULL": true})), None);
        assert_eq!(extract_scalar(&json!({})), None);
        assert_eq!(extract_scalar(&json!("S")), None);
        assert_eq!(extract_scalar(&json!({"S": "x", "NULL": false})), None);
    }

    #[test]
    fn extract_returns_first_payload() {
        assert_eq!(extract_scalar(&json!({"S": "abc"})), Some(&json!("abc")));
        // Tag name is not validated; first key in wire order wins
        assert_eq!(
            extract_scalar(&json!({"ZZ": 1, "S": "abc"})),
            Some(&json!(1))
        );
    }

    // ─── decode_integer ──────────────────────────────────────────────────────

    #[test]
    fn integer_text_roundtrips() {
        for n in [0i64, 7, -7, 123_456_789, i64::MAX, i64::MIN] {
            let attr = AttributeValue::String(n.to_string());
            assert_eq!(decode_integer(&attr).unwrap(), Some(n));
        }
        assert_eq!(decode_integer("+42").unwrap(), Some(42));
    }

    #[test]
    fn integer_rejects_partial_text() {
        for bad in ["12a", "3.5", " 12", "12 ", "", "-", "1e3", "0x10"] {
            assert_eq!(
                kind_of(decode_integer(bad)),
                ErrorKind::InvalidFormat,
                "input {bad:?}"
            );
        }
    }

    #[test]
    fn integer_text_overflow() {
        assert_eq!(
            kind_of(decode_integer("9223372036854775808")),
            ErrorKind::Overflow
        );
        assert_eq!(
            kind_of(decode_integer("-9223372036854775809")),
            ErrorKind::Overflow
        );
    }

    #[test]
    fn integer_from_bool_and_null() {
        assert_eq!(decode_integer(&AttributeValue::Bool(true)).unwrap(), Some(1));
        assert_eq!(decode_integer(&AttributeValue::Bool(false)).unwrap(), Some(0));
        assert_eq!(decode_integer(&AttributeValue::Null).unwrap(), None);
    }

    #[test]
    fn integer_truncates_floats_toward_zero() {
        assert_eq!(decode_integer(3.14).unwrap(), Some(3));
        assert_eq!(decode_integer(3.99).unwrap(), Some(3));
        assert_eq!(decode_integer(-3.99).unwrap(), Some(-3));
        assert_eq!(decode_integer(-0.5).unwrap(), Some(0));
        assert_eq!(decode_integer(-9_223_372_036_854_775_808.0).unwrap(), Some(i64::MIN));
    }

    #[test]
    fn integer_float_out_of_range() {
        assert_eq!(kind_of(decode_integer(9.3e18)), ErrorKind::Overflow);
        assert_eq!(kind_of(decode_integer(-1e19)), ErrorKind::Overflow);
        assert_eq!(kind_of(decode_integer(f64::INFINITY)), ErrorKind::Overflow);
        assert_eq!(kind_of(decode_integer(f64::NAN)), ErrorKind::InvalidFormat);
    }

    #[test]
    fn integer_passthrough_and_unsupported() {
        assert_eq!(decode_integer(123i64).unwrap(), Some(123));
        assert_eq!(kind_of(decode_integer(Scalar::UInt(u64::MAX))), ErrorKind::Overflow);
        let ss = AttributeValue::StringSet(vec!["1".into()]);
        assert_eq!(kind_of(decode_integer(&ss)), ErrorKind::UnsupportedType);
        let other = AttributeValue::Unsupported {
            tag: "M".into(),
            payload: json!({}),
        };
        assert_eq!(
            decode_integer(&other).unwrap_err(),
            DecodeError::UnsupportedType {
                target: "integer",
                found: "M".into()
            }
        );
    }

    // ─── decode_decimal ──────────────────────────────────────────────────────

    #[test]
    fn decimal_from_text_keeps_scale() {
        let d = decode_decimal("12.500").unwrap().unwrap();
        assert_eq!(d.to_string(), "12.500");
        let d = decode_decimal("123456789012345678901234567890.000000001")
            .unwrap()
            .unwrap();
        assert_eq!(d.to_string(), "123456789012345678901234567890.000000001");
    }

    #[test]
    fn decimal_rejects_bad_text() {
        assert_eq!(kind_of(decode_decimal("12.5.1")), ErrorKind::InvalidFormat);
        assert_eq!(kind_of(decode_decimal("abc")), ErrorKind::InvalidFormat);
    }

    #[test]
    fn decimal_null() {
        assert_eq!(decode_decimal(&AttributeValue::Null).unwrap(), None);
    }

    #[test]
    fn decimal_passthrough_is_identity() {
        let d = BigDecimal::from_str("1.2300").unwrap();
        let out = decode_decimal(&d).unwrap().unwrap();
        assert_eq!(out, d);
        assert_eq!(out.to_string(), "1.2300");

        let native = NativeValue::Decimal(d.clone());
        assert_eq!(decode_decimal(&native).unwrap().unwrap().to_string(), "1.2300");
    }

    #[test]
    fn decimal_from_float_uses_17_digits() {
        let d = decode_decimal(0.1).unwrap().unwrap();
        assert_eq!(d, BigDecimal::from_str("0.10000000000000001").unwrap());
        let d = decode_decimal(1.5).unwrap().unwrap();
        assert_eq!(d, BigDecimal::from_str("1.5").unwrap());
        let d = decode_decimal(100.0).unwrap().unwrap();
        assert_eq!(d, BigDecimal::from(100));
    }

    #[test]
    fn decimal_from_float_roundtrips_to_same_double() {
        let samples = [
            0.0,
            -0.0,
            0.1,
            1.0 / 3.0,
            2.0f64.sqrt(),
            -123.456,
            1e300,
            -2.5e-300,
            f64::MAX,
            f64::MIN_POSITIVE,
            5e-324,
            9_007_199_254_740_993.0,
        ];
        for f in samples {
            let d = decode_decimal(f).unwrap().unwrap();
            let back: f64 = d.to_string().parse().unwrap();
            // -0.0 comes back as 0.0
            let want = if f == 0.0 { 0.0f64.to_bits() } else { f.to_bits() };
            assert_eq!(back.to_bits(), want, "{f:?} -> {d}");
        }
    }

    #[test]
    fn decimal_from_float_rejects_non_finite() {
        assert_eq!(kind_of(decode_decimal(f64::NAN)), ErrorKind::InvalidFormat);
        assert_eq!(kind_of(decode_decimal(f64::NEG_INFINITY)), ErrorKind::InvalidFormat);
    }

    #[test]
    fn decimal_from_integers_is_exact() {
        assert_eq!(
            decode_decimal(i64::MAX).unwrap().unwrap().to_string(),
            "9223372036854775807"
        );
        assert_eq!(
            decode_decimal(Scalar::UInt(u64::MAX)).unwrap().unwrap().to_string(),
            "18446744073709551615"
        );
    }

    #[test]
    fn decimal_unsupported() {
        let ss = AttributeValue::StringSet(vec![]);
        assert_eq!(kind_of(decode_decimal(&ss)), ErrorKind::UnsupportedType);
        assert_eq!(kind_of(decode_decimal(true)), ErrorKind::UnsupportedType);
    }

    // ─── supplementary decoders ──────────────────────────────────────────────

    #[test]
    fn float_decoding() {
        assert_eq!(decode_float(123i64).unwrap(), Some(123.0));
        assert_eq!(decode_float("123.0").unwrap(), Some(123.0));
        assert_eq!(decode_float(Scalar::Null).unwrap(), None);
        assert_eq!(kind_of(decode_float("1,5")), ErrorKind::InvalidFormat);
    }

    #[test]
    fn boolean_decoding() {
        assert_eq!(decode_boolean("true").unwrap(), Some(true));
        assert_eq!(decode_boolean("FALSE").unwrap(), Some(false));
        assert_eq!(decode_boolean(1i64).unwrap(), Some(true));
        assert_eq!(decode_boolean(0i64).unwrap(), Some(false));
        assert_eq!(decode_boolean(Scalar::Null).unwrap(), None);
        assert_eq!(kind_of(decode_boolean("unknown")), ErrorKind::InvalidFormat);
        assert_eq!(kind_of(decode_boolean(2i64)), ErrorKind::InvalidFormat);
        assert_eq!(kind_of(decode_boolean(0.5)), ErrorKind::UnsupportedType);
    }

    #[test]
    fn text_decoding() {
        assert_eq!(decode_text(123i64).unwrap().as_deref(), Some("123"));
        assert_eq!(decode_text(false).unwrap().as_deref(), Some("False"));
        assert_eq!(decode_text(3.14).unwrap().as_deref(), Some("3.14"));
        assert_eq!(decode_text(Scalar::Null).unwrap(), None);
        let ss = AttributeValue::StringSet(vec![]);
        assert_eq!(kind_of(decode_text(&ss)), ErrorKind::UnsupportedType);
    }
}
