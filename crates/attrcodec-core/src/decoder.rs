//! The `FieldDecoder` trait and the default attribute dispatch.
//!
//! The batch engine decodes every field through a `FieldDecoder`. The trait
//! is object-safe so decoders can be stored as `Arc<dyn FieldDecoder>` and
//! shared across worker threads without additional locking.

use crate::attribute::AttributeValue;
use crate::error::DecodeError;
use crate::result::DecodeOutcome;
use crate::scalar::{decode_boolean, decode_decimal, decode_float, decode_integer, decode_text};
use crate::types::{FieldKind, FieldPlan, NativeValue, Scalar, ScalarKind};

/// Decodes one field of a record.
///
/// # Thread Safety
/// Implementations must be `Send + Sync`; one instance is shared by every
/// worker of a batch.
pub trait FieldDecoder: Send + Sync {
    /// Decode `value`, routing numbers according to `kind`. When a `plan`
    /// is given it takes precedence over `kind`.
    fn decode_field(
        &self,
        name: &str,
        value: &AttributeValue,
        kind: ScalarKind,
        plan: Option<&FieldPlan>,
    ) -> DecodeOutcome;
}

/// The standard tag-to-decoder dispatch.
#[derive(Debug, Clone, Copy, Default)]
pub struct AttributeDecoder;

impl FieldDecoder for AttributeDecoder {
    fn decode_field(
        &self,
        _name: &str,
        value: &AttributeValue,
        kind: ScalarKind,
        plan: Option<&FieldPlan>,
    ) -> DecodeOutcome {
        match plan {
            Some(plan) => decode_with_plan(value, plan),
            None => decode_attribute(value, kind),
        }
    }
}

/// Decode one attribute. Numbers go through the decoder picked by `kind`;
/// strings, booleans and string sets pass through.
pub fn decode_attribute(value: &AttributeValue, kind: ScalarKind) -> DecodeOutcome {
    match value {
        AttributeValue::String(s) => Ok(NativeValue::Text(s.clone())),
        AttributeValue::Bool(b) => Ok(NativeValue::Boolean(*b)),
        AttributeValue::StringSet(items) => Ok(NativeValue::TextSet(items.clone())),
        AttributeValue::Null => Ok(NativeValue::Null),
        AttributeValue::Number(raw) => decode_number(raw, kind),
        AttributeValue::Unsupported { tag, .. } => {
            Err(DecodeError::unsupported(kind.as_str(), tag.as_str()))
        }
    }
}

fn decode_number(raw: &str, kind: ScalarKind) -> DecodeOutcome {
    match kind {
        ScalarKind::Integer => decode_integer(raw).map(or_null(NativeValue::Integer)),
        ScalarKind::Decimal => decode_decimal(raw).map(or_null(NativeValue::Decimal)),
        ScalarKind::Float => decode_float(raw).map(or_null(NativeValue::Float)),
        ScalarKind::Auto => match decode_integer(raw) {
            Ok(v) => Ok(or_null(NativeValue::Integer)(v)),
            // Too wide for i64, or fractional: keep it exact as a decimal
            Err(_) => decode_decimal(raw)
                .map(or_null(NativeValue::Decimal))
                .map_err(|_| DecodeError::invalid_format("number", raw)),
        },
    }
}

/// Decode one attribute through a per-field plan.
pub fn decode_with_plan(value: &AttributeValue, plan: &FieldPlan) -> DecodeOutcome {
    let mut scalar = Scalar::from(value);
    if let (Some(prefix), Scalar::Text(text)) = (plan.strip_prefix.as_deref(), scalar) {
        if let Some(rest) = text.strip_prefix(prefix) {
            scalar = Scalar::Text(rest);
        }
    }

    decode_scalar(scalar, plan.kind)
}

/// Run the typed decoder for `kind` and wrap the result as a native value.
pub fn decode_scalar(scalar: Scalar<'_>, kind: FieldKind) -> DecodeOutcome {
    match kind {
        FieldKind::Integer => decode_integer(scalar).map(or_null(NativeValue::Integer)),
        FieldKind::Decimal => decode_decimal(scalar).map(or_null(NativeValue::Decimal)),
        FieldKind::Float => decode_float(scalar).map(or_null(NativeValue::Float)),
        FieldKind::Boolean => decode_boolean(scalar).map(or_null(NativeValue::Boolean)),
        FieldKind::Text => decode_text(scalar).map(or_null(NativeValue::Text)),
    }
}

fn or_null<T>(wrap: fn(T) -> NativeValue) -> impl Fn(Option<T>) -> NativeValue {
    move |v| v.map_or(NativeValue::Null, wrap)
}
