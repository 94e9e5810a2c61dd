//! Append-only timeline events.

use crate::core::ids::{CaseId, EventId, PartyId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Type tag of a timeline event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimelineEventKind {
    CaseFiled,
    StageChanged,
    StatementSubmitted,
    StatementEdited,
    StatementDeleted,
    StatementFinalized,
    OptionSetGenerated,
    OptionSetExpired,
    SelectionRecorded,
    /// A structured combined solution was produced
    SolutionProposed,
    /// Reconciliation degraded to a raw-text fallback
    SolutionFallback,
    /// An operation was attempted and rejected; metadata carries the reason
    OperationFailed,
}

impl TimelineEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimelineEventKind::CaseFiled => "case_filed",
            TimelineEventKind::StageChanged => "stage_changed",
            TimelineEventKind::StatementSubmitted => "statement_submitted",
            TimelineEventKind::StatementEdited => "statement_edited",
            TimelineEventKind::StatementDeleted => "statement_deleted",
            TimelineEventKind::StatementFinalized => "statement_finalized",
            TimelineEventKind::OptionSetGenerated => "option_set_generated",
            TimelineEventKind::OptionSetExpired => "option_set_expired",
            TimelineEventKind::SelectionRecorded => "selection_recorded",
            TimelineEventKind::SolutionProposed => "solution_proposed",
            TimelineEventKind::SolutionFallback => "solution_fallback",
            TimelineEventKind::OperationFailed => "operation_failed",
        }
    }
}

impl std::fmt::Display for TimelineEventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One audit record on a case's timeline.
///
/// Events are append-only: never mutated, never deleted. Ordering across
/// writers is by timestamp only; no event depends on a sequence number.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineEvent {
    pub id: EventId,
    pub case_id: CaseId,
    pub kind: TimelineEventKind,
    /// Party that triggered the event, when one did
    pub actor: Option<PartyId>,
    pub description: String,
    pub metadata: serde_json::Value,
    /// Whether the event is visible to the parties (vs. operators only)
    pub is_public: bool,
    pub recorded_at: DateTime<Utc>,
}

impl TimelineEvent {
    pub fn new(
        case_id: CaseId,
        kind: TimelineEventKind,
        description: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: EventId::generate(),
            case_id,
            kind,
            actor: None,
            description: description.into(),
            metadata: serde_json::Value::Null,
            is_public: true,
            recorded_at: now,
        }
    }

    pub fn with_actor(mut self, actor: PartyId) -> Self {
        self.actor = Some(actor);
        self
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }

    /// Mark the event operator-only
    pub fn internal(mut self) -> Self {
        self.is_public = false;
        self
    }
}
