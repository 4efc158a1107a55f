//! # attrcodec-observability
//!
//! OpenTelemetry-based observability for AttrCodec.
//!
//! ## Built-in metrics
//! - `attrcodec.fields_decoded`   counter, tagged with scalar kind
//! - `attrcodec.field_nulls`      counter, tagged with scalar kind
//! - `attrcodec.field_errors`     counter, tagged with kind + error_type
//! - `attrcodec.batch_latency_ms` histogram
//! - `attrcodec.batch_size`       histogram
//! - `attrcodec.batch_failures`   counter, tagged with error_type
//!
//! ## Structured logging
//! JSON-structured logs compatible with ELK, Loki, CloudWatch.
//! Log levels configurable per component.

pub mod metrics;
pub mod tracing_setup;

pub use metrics::DecodeMetrics;
pub use tracing_setup::{init_tracing, LogConfig};
