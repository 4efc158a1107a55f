//! Batch decode request configuration.

use attrcodec_core::{FieldPlan, Record, ScalarKind};
use indexmap::IndexMap;

/// One batch decode job: one or more records plus per-call overrides.
#[derive(Debug, Clone, Default)]
pub struct BatchRequest {
    /// The records to decode
    pub records: Vec<Record>,
    /// Number decoder (None = engine config)
    pub kind: Option<ScalarKind>,
    /// Shard count for this call (None = engine config)
    pub workers: Option<usize>,
    /// Field name → typed decode plan, applied in every record
    pub plans: IndexMap<String, FieldPlan>,
}

impl BatchRequest {
    pub fn new(records: Vec<Record>) -> Self {
        Self {
            records,
            ..Self::default()
        }
    }

    pub fn single(record: Record) -> Self {
        Self::new(vec![record])
    }

    pub fn kind(mut self, kind: ScalarKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn workers(mut self, n: usize) -> Self {
        self.workers = Some(n);
        self
    }

    pub fn plan(mut self, field: impl Into<String>, plan: FieldPlan) -> Self {
        self.plans.insert(field.into(), plan);
        self
    }

    /// Total number of fields across all records.
    pub fn field_count(&self) -> usize {
        self.records.iter().map(|r| r.len()).sum()
    }
}
