//! The wire-level attribute-value model.
//!
//! Stores encode each field as a map naming its type, e.g. `{"S": "abc"}` or
//! `{"N": "12.5"}`. This module classifies such maps into an
//! [`AttributeValue`] without interpreting numbers, so no precision is lost
//! before a scalar decoder sees the raw text.

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

/// String tag.
pub const TAG_STRING: &str = "S";
/// Number tag, payload is the number as text.
pub const TAG_NUMBER: &str = "N";
/// Boolean tag.
pub const TAG_BOOL: &str = "BOOL";
/// String set tag.
pub const TAG_STRING_SET: &str = "SS";
/// Null tag. Its payload is ignored.
pub const TAG_NULL: &str = "NULL";

/// Tags recognized by [`AttributeValue::classify`], in priority order.
pub const TAG_PRIORITY: [&str; 4] = [TAG_STRING, TAG_NUMBER, TAG_BOOL, TAG_STRING_SET];

/// One item's field-name → attribute-value mapping, in wire order.
pub type Record = IndexMap<String, AttributeValue>;

/// A single typed wire value.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    String(String),
    /// Number kept as unparsed text
    Number(String),
    Bool(bool),
    StringSet(Vec<String>),
    Null,
    /// No recognized tag, a malformed payload, or (under
    /// [`TagPolicy::Strict`]) more than one recognized tag
    Unsupported { tag: String, payload: Value },
}

/// How to classify maps that carry more than one recognized tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TagPolicy {
    /// The first tag in [`TAG_PRIORITY`] order wins.
    #[default]
    FirstMatch,
    /// More than one recognized tag makes the value `Unsupported`.
    Strict,
}

impl AttributeValue {
    /// Classify a raw wire value using [`TagPolicy::FirstMatch`].
    pub fn classify(raw: &Value) -> Self {
        Self::classify_with(raw, TagPolicy::FirstMatch)
    }

    /// Classify a raw wire value into exactly one variant.
    ///
    /// Empty maps, non-maps and maps carrying `NULL` are `Null`.
    pub fn classify_with(raw: &Value, policy: TagPolicy) -> Self {
        let Some(map) = raw.as_object() else {
            return AttributeValue::Null;
        };
        if map.is_empty() || map.contains_key(TAG_NULL) {
            return AttributeValue::Null;
        }

        if policy == TagPolicy::Strict {
            let present: Vec<&str> = TAG_PRIORITY
                .iter()
                .copied()
                .filter(|tag| map.contains_key(*tag))
                .collect();
            if present.len() > 1 {
                return AttributeValue::Unsupported {
                    tag: present.join("+"),
                    payload: raw.clone(),
                };
            }
        }

        for tag in TAG_PRIORITY {
            if let Some(payload) = map.get(tag) {
                return Self::wrap(tag, payload);
            }
        }

        match map.iter().next() {
            Some((tag, payload)) => AttributeValue::Unsupported {
                tag: tag.clone(),
                payload: payload.clone(),
            },
            None => AttributeValue::Null,
        }
    }

    fn wrap(tag: &str, payload: &Value) -> Self {
        let wrapped = match (tag, payload) {
            (TAG_STRING, Value::String(s)) => Some(AttributeValue::String(s.clone())),
            (TAG_NUMBER, Value::String(s)) => Some(AttributeValue::Number(s.clone())),
            // Some producers emit N as a bare JSON number
            (TAG_NUMBER, Value::Number(n)) => Some(AttributeValue::Number(n.to_string())),
            (TAG_BOOL, Value::Bool(b)) => Some(AttributeValue::Bool(*b)),
            (TAG_STRING_SET, Value::Array(items)) => items
                .iter()
                .map(|item| item.as_str().map(str::to_string))
                .collect::<Option<Vec<_>>>()
                .map(AttributeValue::StringSet),
            _ => None,
        };
        wrapped.unwrap_or_else(|| AttributeValue::Unsupported {
            tag: tag.to_string(),
            payload: payload.clone(),
        })
    }

    /// The wire tag this value was classified under.
    pub fn tag(&self) -> &str {
        match self {
            AttributeValue::String(_) => TAG_STRING,
            AttributeValue::Number(_) => TAG_NUMBER,
            AttributeValue::Bool(_) => TAG_BOOL,
            AttributeValue::StringSet(_) => TAG_STRING_SET,
            AttributeValue::Null => TAG_NULL,
            AttributeValue::Unsupported { tag, .. } => tag,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, AttributeValue::Null)
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::String(s) => write!(f, "S:{s:?}"),
            AttributeValue::Number(n) => write!(f, "N:{n}"),
            AttributeValue::Bool(b) => write!(f, "BOOL:{b}"),
            AttributeValue::StringSet(items) => write!(f, "SS:{items:?}"),
            AttributeValue::Null => write!(f, "NULL"),
            AttributeValue::Unsupported { tag, payload } => write!(f, "{tag}?:{payload}"),
        }
    }
}

impl<'de> Deserialize<'de> for AttributeValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Value::deserialize(deserializer)?;
        Ok(AttributeValue::classify(&raw))
    }
}

/// Build a [`Record`] from a raw wire item (a map of field → typed map).
///
/// Returns `None` if `item` is not a map.
pub fn parse_record(item: &Value, policy: TagPolicy) -> Option<Record> {
    let map = item.as_object()?;
    Some(
        map.iter()
            .map(|(name, raw)| (name.clone(), AttributeValue::classify_with(raw, policy)))
            .collect(),
    )
}
