//! Batch engine configuration.

use attrcodec_core::{parse_record, ConfigError, Record, ScalarKind, TagPolicy};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use std::time::Duration;

/// Top-level batch decoding configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Worker threads in the pool, and the default shard count per call
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// Overall deadline for one batch call (none = wait for completion)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
    /// How multi-tag wire maps are classified by [`BatchConfig::parse_record`]
    #[serde(default)]
    pub tag_policy: TagPolicy,
    /// Decoder used for wire numbers unless a request overrides it
    #[serde(default)]
    pub scalar_kind: ScalarKind,
    /// Prefix for pool thread names
    #[serde(default = "default_thread_name")]
    pub thread_name: String,
}

fn default_workers() -> usize { 4 }
fn default_thread_name() -> String { "attrcodec-worker".into() }

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            timeout_ms: None,
            tag_policy: TagPolicy::default(),
            scalar_kind: ScalarKind::default(),
            thread_name: default_thread_name(),
        }
    }
}

impl BatchConfig {
    /// Config with `workers` threads and defaults elsewhere.
    pub fn with_workers(workers: usize) -> Self {
        Self {
            workers,
            ..Self::default()
        }
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    /// Classify a raw wire item under this config's `tag_policy`.
    /// `None` if `item` is not a JSON object.
    pub fn parse_record(&self, item: &Value) -> Option<Record> {
        parse_record(item, self.tag_policy)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workers == 0 {
            return Err(ConfigError::InvalidWorkerCount);
        }
        Ok(())
    }

    pub fn from_yaml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_yaml::from_str(s).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(s).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a `.yaml`/`.yml` or `.json` file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => Self::from_yaml_str(&content),
            Some("json") => Self::from_json_str(&content),
            other => Err(ConfigError::UnknownFormat(
                other.unwrap_or("<none>").to_string(),
            )),
        }
    }
}
