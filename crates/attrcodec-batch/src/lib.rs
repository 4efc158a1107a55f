//! # attrcodec-batch
//!
//! Concurrent batch decoding of attribute-value records.
//!
//! ## Features
//! - Static, contiguous sharding (default 4 workers)
//! - Fixed-size Rayon pool, reused across calls
//! - Per-field error isolation: one bad field never aborts its siblings
//! - Optional overall deadline; a timed-out batch returns no partial output
//!
//! ## Usage
//! ```no_run
//! use attrcodec_batch::{BatchConfig, BatchEngine};
//! use attrcodec_core::{Record, ScalarKind};
//!
//! let engine = BatchEngine::new(BatchConfig::default()).unwrap();
//! let record: Record = serde_json::from_str(r#"{"age": {"N": "42"}}"#).unwrap();
//! let result = engine.decode(&record, ScalarKind::Integer).unwrap();
//! ```

pub mod config;
pub mod engine;
pub mod request;
pub mod shard;

pub use config::BatchConfig;
pub use engine::{decode_batch, BatchEngine, DEFAULT_WORKERS};
pub use request::BatchRequest;
