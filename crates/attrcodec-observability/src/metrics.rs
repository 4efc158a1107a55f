//! AttrCodec metrics definitions.
//!
//! All metrics use OpenTelemetry conventions and go to whatever meter
//! provider the host application installed (a no-op one by default).

use attrcodec_core::{BatchSummary, DecodeError, ScalarKind};
use opentelemetry::{
    metrics::{Counter, Histogram, Meter},
    KeyValue,
};

/// Central metrics handle for batch decoding.
#[derive(Clone)]
pub struct DecodeMetrics {
    pub fields_decoded: Counter<u64>,
    pub field_nulls: Counter<u64>,
    pub field_errors: Counter<u64>,
    pub batch_latency_ms: Histogram<f64>,
    pub batch_size: Histogram<u64>,
    pub batch_failures: Counter<u64>,
}

impl DecodeMetrics {
    pub fn new(meter: &Meter) -> Self {
        Self {
            fields_decoded: meter
                .u64_counter("attrcodec.fields_decoded")
                .with_description("Fields decoded to a non-null value")
                .build(),
            field_nulls: meter
                .u64_counter("attrcodec.field_nulls")
                .with_description("Fields decoded to null")
                .build(),
            field_errors: meter
                .u64_counter("attrcodec.field_errors")
                .with_description("Fields that failed to decode")
                .build(),
            batch_latency_ms: meter
                .f64_histogram("attrcodec.batch_latency_ms")
                .with_description("Wall-clock time of one batch decode call in milliseconds")
                .build(),
            batch_size: meter
                .u64_histogram("attrcodec.batch_size")
                .with_description("Number of fields in a batch decode call")
                .build(),
            batch_failures: meter
                .u64_counter("attrcodec.batch_failures")
                .with_description("Batches aborted by a timeout or worker failure")
                .build(),
        }
    }

    /// Metrics bound to the global meter provider.
    pub fn global() -> Self {
        Self::new(&opentelemetry::global::meter("attrcodec"))
    }

    /// Record a completed batch.
    pub fn record_batch(&self, summary: &BatchSummary, kind: ScalarKind, elapsed_ms: f64) {
        let kind_attr = KeyValue::new("kind", kind.as_str());
        self.fields_decoded
            .add(summary.values as u64, &[kind_attr.clone()]);
        self.field_nulls.add(summary.nulls as u64, &[kind_attr.clone()]);
        for (error_kind, count) in &summary.errors {
            self.field_errors.add(
                *count as u64,
                &[
                    kind_attr.clone(),
                    KeyValue::new("error_type", error_kind.as_str()),
                ],
            );
        }
        self.batch_size.record(summary.total as u64, &[]);
        self.batch_latency_ms.record(elapsed_ms, &[kind_attr]);
    }

    /// Record a batch that was aborted as a whole.
    pub fn record_failure(&self, err: &DecodeError) {
        self.batch_failures
            .add(1, &[KeyValue::new("error_type", err.kind().as_str())]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use attrcodec_core::ErrorKind;

    #[test]
    fn recording_on_noop_provider_is_harmless() {
        let metrics = DecodeMetrics::global();
        let mut summary = BatchSummary {
            total: 3,
            values: 1,
            nulls: 1,
            ..Default::default()
        };
        summary.errors.insert(ErrorKind::Overflow, 1);
        metrics.record_batch(&summary, ScalarKind::Integer, 1.5);
        metrics.record_failure(&DecodeError::Timeout { ms: 5 });
    }
}
