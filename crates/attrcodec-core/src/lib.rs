//! # attrcodec-core
//!
//! Core types and pure decoders shared across all AttrCodec crates.
//!
//! - [`attribute`]: the type-tagged wire model (`{"S": ..}`, `{"N": ..}`, ...)
//! - [`scalar`]: `decode_integer`, `decode_decimal`, `extract_scalar` and
//!   friends
//! - [`decoder`]: the `FieldDecoder` trait used by the batch engine
//! - [`result`]: per-field outcomes and summaries

pub mod attribute;
pub mod decoder;
pub mod error;
pub mod result;
pub mod scalar;
pub mod types;

pub use attribute::{parse_record, AttributeValue, Record, TagPolicy};
pub use bigdecimal::BigDecimal;
pub use decoder::{
    decode_attribute, decode_scalar, decode_with_plan, AttributeDecoder, FieldDecoder,
};
pub use error::{ConfigError, DecodeError, ErrorKind};
pub use result::{BatchSummary, DecodeOutcome, DecodeResult};
pub use scalar::{
    decode_boolean, decode_decimal, decode_float, decode_integer, decode_text, extract_scalar,
};
pub use types::{FieldKind, FieldPlan, NativeValue, Scalar, ScalarKind};
