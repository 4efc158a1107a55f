//! Per-field outcomes and the ordered result of decoding a record.

use indexmap::IndexMap;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::error::{DecodeError, ErrorKind};
use crate::types::NativeValue;

/// Result of decoding one field: a native value (possibly `Null`) or an error.
pub type DecodeOutcome = Result<NativeValue, DecodeError>;

/// Decoded record: one outcome per input field, in input order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DecodeResult {
    fields: IndexMap<String, DecodeOutcome>,
}

impl DecodeResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(n: usize) -> Self {
        Self {
            fields: IndexMap::with_capacity(n),
        }
    }

    pub fn insert(&mut self, name: impl Into<String>, outcome: DecodeOutcome) {
        self.fields.insert(name.into(), outcome);
    }

    pub fn get(&self, name: &str) -> Option<&DecodeOutcome> {
        self.fields.get(name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &DecodeOutcome)> {
        self.fields.iter()
    }

    /// Only the fields that failed, in input order.
    pub fn errors(&self) -> impl Iterator<Item = (&String, &DecodeError)> {
        self.fields
            .iter()
            .filter_map(|(name, outcome)| outcome.as_ref().err().map(|e| (name, e)))
    }

    pub fn into_inner(self) -> IndexMap<String, DecodeOutcome> {
        self.fields
    }

    /// Count values, nulls and errors.
    pub fn summary(&self) -> BatchSummary {
        let mut summary = BatchSummary::default();
        summary.absorb(self);
        summary
    }
}

impl FromIterator<(String, DecodeOutcome)> for DecodeResult {
    fn from_iter<I: IntoIterator<Item = (String, DecodeOutcome)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for DecodeResult {
    type Item = (String, DecodeOutcome);
    type IntoIter = indexmap::map::IntoIter<String, DecodeOutcome>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}

/// Outcome counts over one or more decoded records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub values: usize,
    pub nulls: usize,
    pub errors: BTreeMap<ErrorKind, usize>,
}

impl BatchSummary {
    /// Summarize several results at once.
    pub fn of<'a>(results: impl IntoIterator<Item = &'a DecodeResult>) -> Self {
        let mut summary = Self::default();
        for result in results {
            summary.absorb(result);
        }
        summary
    }

    fn absorb(&mut self, result: &DecodeResult) {
        for (_, outcome) in result.iter() {
            self.total += 1;
            match outcome {
                Ok(NativeValue::Null) => self.nulls += 1,
                Ok(_) => self.values += 1,
                Err(e) => *self.errors.entry(e.kind()).or_default() += 1,
            }
        }
    }

    pub fn error_count(&self) -> usize {
        self.errors.values().sum()
    }
}
