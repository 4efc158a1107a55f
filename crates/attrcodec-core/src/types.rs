//! Native value types and decoder inputs.
//!
//! [`NativeValue`] is what decoding produces. [`Scalar`] is what the scalar
//! decoders accept: a borrowed view over either a wire attribute, an
//! already-native value, or a raw JSON payload.

use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::attribute::AttributeValue;

/// A decoded native value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum NativeValue {
    Integer(i64),
    /// Arbitrary precision, exact to its textual origin
    Decimal(BigDecimal),
    /// Only produced when a float decode is requested
    Float(f64),
    Boolean(bool),
    Text(String),
    TextSet(Vec<String>),
    Null,
}

impl NativeValue {
    pub fn is_null(&self) -> bool {
        matches!(self, NativeValue::Null)
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            NativeValue::Integer(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_decimal(&self) -> Option<&BigDecimal> {
        match self {
            NativeValue::Decimal(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            NativeValue::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }
}

impl fmt::Display for NativeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NativeValue::Integer(v) => write!(f, "{v}"),
            NativeValue::Decimal(d) => write!(f, "{d}"),
            NativeValue::Float(v) => write!(f, "{v:?}"),
            NativeValue::Boolean(b) => write!(f, "{b}"),
            NativeValue::Text(s) => write!(f, "{s}"),
            NativeValue::TextSet(items) => write!(f, "[{}]", items.join(", ")),
            NativeValue::Null => write!(f, "null"),
        }
    }
}

/// Borrowed input to the scalar decoders.
///
/// Wire numbers arrive as [`Scalar::Text`]; the decoders parse them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scalar<'a> {
    Null,
    Bool(bool),
    Int(i64),
    /// Integers above `i64::MAX` from JSON payloads
    UInt(u64),
    Float(f64),
    Decimal(&'a BigDecimal),
    Text(&'a str),
    /// Anything without a scalar conversion; carries a type label
    Other(&'a str),
}

impl<'a> Scalar<'a> {
    /// Short type label used in `UnsupportedType` errors.
    pub fn type_name(&self) -> &'a str {
        match *self {
            Scalar::Null => "null",
            Scalar::Bool(_) => "bool",
            Scalar::Int(_) | Scalar::UInt(_) => "integer",
            Scalar::Float(_) => "float",
            Scalar::Decimal(_) => "decimal",
            Scalar::Text(_) => "text",
            Scalar::Other(label) => label,
        }
    }
}

impl<'a> From<&'a AttributeValue> for Scalar<'a> {
    fn from(attr: &'a AttributeValue) -> Self {
        match attr {
            AttributeValue::String(s) | AttributeValue::Number(s) => Scalar::Text(s),
            AttributeValue::Bool(b) => Scalar::Bool(*b),
            AttributeValue::StringSet(_) => Scalar::Other("SS"),
            AttributeValue::Null => Scalar::Null,
            AttributeValue::Unsupported { tag, .. } => Scalar::Other(tag),
        }
    }
}

impl<'a> From<&'a NativeValue> for Scalar<'a> {
    fn from(value: &'a NativeValue) -> Self {
        match value {
            NativeValue::Integer(v) => Scalar::Int(*v),
            NativeValue::Decimal(d) => Scalar::Decimal(d),
            NativeValue::Float(v) => Scalar::Float(*v),
            NativeValue::Boolean(b) => Scalar::Bool(*b),
            NativeValue::Text(s) => Scalar::Text(s),
            NativeValue::TextSet(_) => Scalar::Other("text set"),
            NativeValue::Null => Scalar::Null,
        }
    }
}

/// Raw JSON payloads, as returned by [`extract_scalar`](crate::scalar::extract_scalar).
impl<'a> From<&'a Value> for Scalar<'a> {
    fn from(value: &'a Value) -> Self {
        match value {
            Value::Null => Scalar::Null,
            Value::Bool(b) => Scalar::Bool(*b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Scalar::Int(i)
                } else if let Some(u) = n.as_u64() {
                    Scalar::UInt(u)
                } else {
                    Scalar::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            Value::String(s) => Scalar::Text(s),
            Value::Array(_) => Scalar::Other("array"),
            Value::Object(_) => Scalar::Other("map"),
        }
    }
}

impl<'a> From<&'a str> for Scalar<'a> {
    fn from(s: &'a str) -> Self {
        Scalar::Text(s)
    }
}

impl<'a> From<&'a String> for Scalar<'a> {
    fn from(s: &'a String) -> Self {
        Scalar::Text(s)
    }
}

impl<'a> From<&'a BigDecimal> for Scalar<'a> {
    fn from(d: &'a BigDecimal) -> Self {
        Scalar::Decimal(d)
    }
}

impl From<i64> for Scalar<'_> {
    fn from(v: i64) -> Self {
        Scalar::Int(v)
    }
}

impl From<f64> for Scalar<'_> {
    fn from(v: f64) -> Self {
        Scalar::Float(v)
    }
}

impl From<bool> for Scalar<'_> {
    fn from(b: bool) -> Self {
        Scalar::Bool(b)
    }
}

impl<'a, T: Into<Scalar<'a>>> From<Option<T>> for Scalar<'a> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Scalar::Null, Into::into)
    }
}

/// Which decoder wire numbers (`N`) are routed through in a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalarKind {
    Integer,
    Decimal,
    Float,
    /// Integer when the text parses as one, otherwise decimal
    #[default]
    Auto,
}

impl ScalarKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScalarKind::Integer => "integer",
            ScalarKind::Decimal => "decimal",
            ScalarKind::Float => "float",
            ScalarKind::Auto => "auto",
        }
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ScalarKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "integer" | "int" => Ok(ScalarKind::Integer),
            "decimal" => Ok(ScalarKind::Decimal),
            "float" => Ok(ScalarKind::Float),
            "auto" => Ok(ScalarKind::Auto),
            other => Err(format!("unknown scalar kind '{other}'")),
        }
    }
}

/// Target type for a field decoded through a [`FieldPlan`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Integer,
    Decimal,
    Float,
    Boolean,
    Text,
}

impl FieldKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKind::Integer => "integer",
            FieldKind::Decimal => "decimal",
            FieldKind::Float => "float",
            FieldKind::Boolean => "boolean",
            FieldKind::Text => "text",
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for FieldKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "integer" | "int" => Ok(FieldKind::Integer),
            "decimal" => Ok(FieldKind::Decimal),
            "float" => Ok(FieldKind::Float),
            "boolean" | "bool" => Ok(FieldKind::Boolean),
            "text" | "string" => Ok(FieldKind::Text),
            other => Err(format!("unknown field kind '{other}'")),
        }
    }
}

/// Per-field decode override.
///
/// The field's payload is decoded with the typed decoder for `kind`. Text
/// payloads starting with `strip_prefix` lose that prefix first (key
/// prefixes such as `USER#`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldPlan {
    pub kind: FieldKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strip_prefix: Option<String>,
}

impl FieldPlan {
    pub fn new(kind: FieldKind) -> Self {
        Self {
            kind,
            strip_prefix: None,
        }
    }

    pub fn strip_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.strip_prefix = Some(prefix.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn native_value_serde_roundtrip() {
        let val = NativeValue::Decimal(BigDecimal::from_str("12.500").unwrap());
        let json = serde_json::to_string(&val).unwrap();
        let back: NativeValue = serde_json::from_str(&json).unwrap();
        assert_eq!(val, back);
    }

    #[test]
    fn scalar_from_json_payload() {
        assert_eq!(Scalar::from(&serde_json::json!(7)), Scalar::Int(7));
        assert_eq!(
            Scalar::from(&serde_json::json!(u64::MAX)),
            Scalar::UInt(u64::MAX)
        );
        assert_eq!(Scalar::from(&serde_json::json!(1.5)), Scalar::Float(1.5));
        assert_eq!(Scalar::from(&serde_json::json!("7")), Scalar::Text("7"));
        assert_eq!(Scalar::from(&serde_json::json!(["a"])).type_name(), "array");
    }

    #[test]
    fn scalar_from_attribute() {
        let n = AttributeValue::Number("1e3".into());
        assert_eq!(Scalar::from(&n), Scalar::Text("1e3"));
        let ss = AttributeValue::StringSet(vec![]);
        assert_eq!(Scalar::from(&ss).type_name(), "SS");
    }

    #[test]
    fn kinds_parse_from_str() {
        assert_eq!(ScalarKind::from_str("Decimal").unwrap(), ScalarKind::Decimal);
        assert_eq!(FieldKind::from_str("bool").unwrap(), FieldKind::Boolean);
        assert!(ScalarKind::from_str("money").is_err());
    }
}
