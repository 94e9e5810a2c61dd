//! Engine configuration schema.

use accord_domain::DEFAULT_EXPIRY_DAYS;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level configuration for the negotiation engine
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub reasoning: ReasoningConfig,
    pub options: OptionsConfig,
    pub timeline: TimelineConfig,
}

/// `[reasoning]` section: the external reasoning service
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReasoningConfig {
    /// Endpoint the HTTP adapter posts prompts to
    pub endpoint: String,
    /// Optional bearer token
    pub api_key: Option<String>,
    /// Bound on each external call; there is no retry loop behind it
    pub timeout_secs: u64,
}

impl Default for ReasoningConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:8791/v1/reason".to_string(),
            api_key: None,
            timeout_secs: 30,
        }
    }
}

/// `[options]` section: settlement option sets
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OptionsConfig {
    /// Days until a generated option set expires
    pub expiry_days: i64,
}

impl Default for OptionsConfig {
    fn default() -> Self {
        Self {
            expiry_days: DEFAULT_EXPIRY_DAYS,
        }
    }
}

/// `[timeline]` section: audit export
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TimelineConfig {
    /// When set, timeline events are mirrored to this JSONL file
    pub jsonl_path: Option<PathBuf>,
}
