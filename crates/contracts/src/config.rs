//! BulkConfig - Config Loader output
//!
//! Describes the batch size and the sinks every session fans out to.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use validator::Validate;

/// Configuration version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete bulk configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct BulkConfig {
    /// Configuration version
    #[serde(default)]
    pub version: ConfigVersion,

    /// Number of commands that closes a batch outside dynamic regions
    #[serde(default = "default_block_size")]
    #[validate(range(min = 1, message = "block_size must be > 0"))]
    pub block_size: usize,

    /// Directory for file sinks
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Output routing
    #[serde(default = "default_sinks")]
    #[validate(nested)]
    pub sinks: Vec<SinkConfig>,
}

fn default_block_size() -> usize {
    3
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

/// Console sink plus two file sinks (`_1`, `_2`)
fn default_sinks() -> Vec<SinkConfig> {
    vec![
        SinkConfig::new("console", SinkType::Console),
        SinkConfig::new("file_1", SinkType::File).with_param("suffix", "_1"),
        SinkConfig::new("file_2", SinkType::File).with_param("suffix", "_2"),
    ]
}

impl Default for BulkConfig {
    fn default() -> Self {
        Self {
            version: ConfigVersion::V1,
            block_size: default_block_size(),
            output_dir: default_output_dir(),
            sinks: default_sinks(),
        }
    }
}

/// Sink output configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SinkConfig {
    /// Sink name
    #[validate(length(min = 1, message = "sink name cannot be empty"))]
    pub name: String,

    /// Sink type
    pub sink_type: SinkType,

    /// Type-specific parameters
    #[serde(default)]
    pub params: HashMap<String, String>,
}

impl SinkConfig {
    pub fn new(name: impl Into<String>, sink_type: SinkType) -> Self {
        Self {
            name: name.into(),
            sink_type,
            params: HashMap::new(),
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }
}

/// Sink type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SinkType {
    /// `bulk: ...` lines on stdout
    Console,
    /// `bulk: ...` lines in a timestamped log file
    File,
    /// Summary through tracing
    Log,
}
