//! Audit-log sinks.

pub mod jsonl_sink;

pub use jsonl_sink::JsonlTimelineSink;
