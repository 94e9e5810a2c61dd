//! Engine configuration: schema and multi-source loading.

pub mod file_config;
pub mod loader;

pub use file_config::{EngineConfig, OptionsConfig, ReasoningConfig, TimelineConfig};
pub use loader::ConfigLoader;
