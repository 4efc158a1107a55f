//! Error types for the AttrCodec decode pipeline.

use serde::Serialize;
use thiserror::Error;

/// Errors that can occur while decoding a single value or a whole batch.
///
/// The first three variants are per-value failures and end up inside a
/// [`DecodeResult`](crate::result::DecodeResult). `Timeout` and
/// `WorkerPanicked` only ever abort a batch as a whole.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DecodeError {
    #[error("Invalid {target} format: {input:?}")]
    InvalidFormat { target: &'static str, input: String },

    #[error("Value {input} is out of range for {target}")]
    Overflow { target: &'static str, input: String },

    #[error("Unsupported type '{found}' for {target} conversion")]
    UnsupportedType { target: &'static str, found: String },

    #[error("Batch decode timed out after {ms}ms")]
    Timeout { ms: u64 },

    #[error("Worker for shard {shard} panicked")]
    WorkerPanicked { shard: usize },
}

impl DecodeError {
    pub(crate) fn invalid_format(target: &'static str, input: impl Into<String>) -> Self {
        DecodeError::InvalidFormat {
            target,
            input: input.into(),
        }
    }

    pub(crate) fn overflow(target: &'static str, input: impl Into<String>) -> Self {
        DecodeError::Overflow {
            target,
            input: input.into(),
        }
    }

    pub(crate) fn unsupported(target: &'static str, found: impl Into<String>) -> Self {
        DecodeError::UnsupportedType {
            target,
            found: found.into(),
        }
    }

    /// The error's kind, without its payload.
    pub fn kind(&self) -> ErrorKind {
        match self {
            DecodeError::InvalidFormat { .. } => ErrorKind::InvalidFormat,
            DecodeError::Overflow { .. } => ErrorKind::Overflow,
            DecodeError::UnsupportedType { .. } => ErrorKind::UnsupportedType,
            DecodeError::Timeout { .. } => ErrorKind::Timeout,
            DecodeError::WorkerPanicked { .. } => ErrorKind::WorkerPanicked,
        }
    }

    /// Whether this error aborts a batch rather than a single field.
    pub fn is_batch_level(&self) -> bool {
        matches!(
            self,
            DecodeError::Timeout { .. } | DecodeError::WorkerPanicked { .. }
        )
    }
}

/// Payload-free discriminant of [`DecodeError`], used for counting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidFormat,
    Overflow,
    UnsupportedType,
    Timeout,
    WorkerPanicked,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidFormat => "invalid_format",
            ErrorKind::Overflow => "overflow",
            ErrorKind::UnsupportedType => "unsupported_type",
            ErrorKind::Timeout => "timeout",
            ErrorKind::WorkerPanicked => "worker_panicked",
        }
    }
}

/// Errors from loading or validating engine configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Worker count must be at least 1")]
    InvalidWorkerCount,

    #[error("Failed to build worker pool: {0}")]
    PoolBuild(String),

    #[error("Unsupported config format: {0}")]
    UnknownFormat(String),

    #[error("Parse error in config: {0}")]
    Parse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
