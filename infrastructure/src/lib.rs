//! Infrastructure layer for accord
//!
//! Adapters behind the application-layer ports: the in-memory datastore,
//! the HTTP reasoning gateway, the configuration loader, and the JSONL
//! timeline sink.

pub mod config;
pub mod datastore;
pub mod logging;
pub mod reasoning;

// Re-export commonly used types
pub use config::{ConfigLoader, EngineConfig, OptionsConfig, ReasoningConfig, TimelineConfig};
pub use datastore::InMemoryStore;
pub use logging::JsonlTimelineSink;
pub use reasoning::HttpReasoningGateway;
