//! Timeline sink port
//!
//! Read-only subscribers (notification and UI collaborators) observe the
//! timeline through this port. Delivery is fire-and-forget: the datastore
//! append is guaranteed, the publish is best-effort, and a slow or broken
//! sink must never fail an engine operation.

use accord_domain::TimelineEvent;

/// Best-effort observer of appended timeline events
pub trait TimelineSink: Send + Sync {
    /// Called after an event has been durably appended. Must not block for
    /// long and must not panic; failures are the sink's own problem.
    fn publish(&self, event: &TimelineEvent);
}

/// Sink that drops everything
pub struct NoSink;

impl TimelineSink for NoSink {
    fn publish(&self, _event: &TimelineEvent) {}
}
