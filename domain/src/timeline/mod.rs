//! Append-only audit timeline.

pub mod entities;

pub use entities::{TimelineEvent, TimelineEventKind};
