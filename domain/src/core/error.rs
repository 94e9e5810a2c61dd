//! Domain error types

use crate::case::stage::CaseStage;
use thiserror::Error;

/// Validation errors raised by the negotiation rules.
///
/// Every variant is deterministic: the same inputs at the same instant
/// always produce the same error, and none of them is ever retried
/// internally. External-service failures are not part of this taxonomy;
/// they surface through the gateway port instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NegotiationError {
    #[error("invalid transition from '{from}' to '{to}'")]
    InvalidTransition { from: CaseStage, to: CaseStage },

    #[error("operation is closed in case stage '{0}'")]
    PhaseClosed(CaseStage),

    #[error("edit window has expired")]
    EditWindowExpired,

    #[error("delete window has expired")]
    DeleteWindowExpired,

    #[error("statement is finalized and can no longer change")]
    AlreadyFinalized,

    #[error("caller is not the owning party")]
    NotOwner,

    #[error("an unexpired active option set already exists for this case")]
    DuplicateActiveSet,

    #[error("both parties selected the same option; nothing to reconcile")]
    NoDivergence,
}

impl NegotiationError {
    /// Check if this error is one of the statement mutation-window errors
    pub fn is_window_expired(&self) -> bool {
        matches!(
            self,
            NegotiationError::EditWindowExpired | NegotiationError::DeleteWindowExpired
        )
    }

    /// Short machine-readable tag, used in timeline event metadata
    pub fn tag(&self) -> &'static str {
        match self {
            NegotiationError::InvalidTransition { .. } => "invalid_transition",
            NegotiationError::PhaseClosed(_) => "phase_closed",
            NegotiationError::EditWindowExpired => "edit_window_expired",
            NegotiationError::DeleteWindowExpired => "delete_window_expired",
            NegotiationError::AlreadyFinalized => "already_finalized",
            NegotiationError::NotOwner => "not_owner",
            NegotiationError::DuplicateActiveSet => "duplicate_active_set",
            NegotiationError::NoDivergence => "no_divergence",
        }
    }
}
