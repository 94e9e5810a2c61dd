//! Case lifecycle stages and the transition allow-list.

use crate::core::error::NegotiationError;
use serde::{Deserialize, Serialize};

/// Stage of a case in the negotiation lifecycle.
///
/// The common path runs statement collection through analysis, option
/// presentation, selection, and settlement. Divergent selections detour
/// through `ReconciliationPending`, which can still end in settlement or
/// hand the case to a court.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseStage {
    /// Parties are submitting and finalizing their statements
    StatementPhase,
    /// Both statements are in; settlement options are being generated
    AiAnalyzing,
    /// A fresh option set has been presented to the parties
    OptionsPresented,
    /// Waiting for both parties to pick an option variant
    AwaitingSelection,
    /// Both parties picked the same variant
    ConsensusReached,
    /// Parties picked different variants; a combined proposal is being worked out
    ReconciliationPending,
    /// Terms are settled and ready for signature collection
    SettlementReady,
    /// Signatures requested from both parties
    SignaturePending,
    /// Case closed with a settlement
    ClosedSettled,
    /// Negotiation failed; case referred to court
    CourtForwarded,
}

impl CaseStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            CaseStage::StatementPhase => "statement_phase",
            CaseStage::AiAnalyzing => "ai_analyzing",
            CaseStage::OptionsPresented => "options_presented",
            CaseStage::AwaitingSelection => "awaiting_selection",
            CaseStage::ConsensusReached => "consensus_reached",
            CaseStage::ReconciliationPending => "reconciliation_pending",
            CaseStage::SettlementReady => "settlement_ready",
            CaseStage::SignaturePending => "signature_pending",
            CaseStage::ClosedSettled => "closed_settled",
            CaseStage::CourtForwarded => "court_forwarded",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            CaseStage::StatementPhase => "Statement Phase",
            CaseStage::AiAnalyzing => "AI Analyzing",
            CaseStage::OptionsPresented => "Options Presented",
            CaseStage::AwaitingSelection => "Awaiting Selection",
            CaseStage::ConsensusReached => "Consensus Reached",
            CaseStage::ReconciliationPending => "Reconciliation Pending",
            CaseStage::SettlementReady => "Settlement Ready",
            CaseStage::SignaturePending => "Signature Pending",
            CaseStage::ClosedSettled => "Closed (Settled)",
            CaseStage::CourtForwarded => "Forwarded to Court",
        }
    }

    /// Stages this stage may legally transition to.
    ///
    /// This allow-list is the single authority on lifecycle movement; every
    /// transition is validated against it and anything else fails with
    /// [`NegotiationError::InvalidTransition`].
    pub fn allowed_transitions(&self) -> &'static [CaseStage] {
        match self {
            CaseStage::StatementPhase => &[CaseStage::AiAnalyzing],
            CaseStage::AiAnalyzing => &[CaseStage::OptionsPresented],
            CaseStage::OptionsPresented => &[CaseStage::AwaitingSelection],
            CaseStage::AwaitingSelection => {
                &[CaseStage::ConsensusReached, CaseStage::ReconciliationPending]
            }
            CaseStage::ConsensusReached => &[CaseStage::SettlementReady],
            CaseStage::ReconciliationPending => {
                &[CaseStage::SettlementReady, CaseStage::CourtForwarded]
            }
            CaseStage::SettlementReady => &[CaseStage::SignaturePending],
            CaseStage::SignaturePending => &[CaseStage::ClosedSettled],
            CaseStage::ClosedSettled => &[],
            CaseStage::CourtForwarded => &[],
        }
    }

    pub fn can_transition_to(&self, to: CaseStage) -> bool {
        self.allowed_transitions().contains(&to)
    }

    /// Validate a transition, leaving it to the caller to apply it.
    pub fn check_transition(&self, to: CaseStage) -> Result<(), NegotiationError> {
        if self.can_transition_to(to) {
            Ok(())
        } else {
            Err(NegotiationError::InvalidTransition { from: *self, to })
        }
    }

    /// Check if the case can no longer move
    pub fn is_terminal(&self) -> bool {
        matches!(self, CaseStage::ClosedSettled | CaseStage::CourtForwarded)
    }

    /// Check if parties may still record or revise selections in this stage.
    ///
    /// Selections stay revisable until a transition out of the selection
    /// stages locks consensus in.
    pub fn accepts_selections(&self) -> bool {
        matches!(
            self,
            CaseStage::OptionsPresented
                | CaseStage::AwaitingSelection
                | CaseStage::ReconciliationPending
        )
    }
}

impl std::fmt::Display for CaseStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_common_path_is_allowed() {
        let path = [
            CaseStage::StatementPhase,
            CaseStage::AiAnalyzing,
            CaseStage::OptionsPresented,
            CaseStage::AwaitingSelection,
            CaseStage::ConsensusReached,
            CaseStage::SettlementReady,
            CaseStage::SignaturePending,
            CaseStage::ClosedSettled,
        ];
        for pair in path.windows(2) {
            assert!(
                pair[0].can_transition_to(pair[1]),
                "{} -> {} should be allowed",
                pair[0],
                pair[1]
            );
        }
    }

    #[test]
    fn test_divergent_path_is_allowed() {
        assert!(CaseStage::AwaitingSelection.can_transition_to(CaseStage::ReconciliationPending));
        assert!(CaseStage::ReconciliationPending.can_transition_to(CaseStage::SettlementReady));
        assert!(CaseStage::ReconciliationPending.can_transition_to(CaseStage::CourtForwarded));
    }

    #[test]
    fn test_skipping_stages_is_rejected() {
        let err = CaseStage::StatementPhase
            .check_transition(CaseStage::SettlementReady)
            .unwrap_err();
        assert_eq!(
            err,
            NegotiationError::InvalidTransition {
                from: CaseStage::StatementPhase,
                to: CaseStage::SettlementReady,
            }
        );
    }

    #[test]
    fn test_terminal_stages_allow_nothing() {
        assert!(CaseStage::ClosedSettled.allowed_transitions().is_empty());
        assert!(CaseStage::CourtForwarded.allowed_transitions().is_empty());
        assert!(CaseStage::ClosedSettled.is_terminal());
        assert!(CaseStage::CourtForwarded.is_terminal());
    }

    #[test]
    fn test_backward_movement_is_rejected() {
        assert!(!CaseStage::AiAnalyzing.can_transition_to(CaseStage::StatementPhase));
        assert!(!CaseStage::ConsensusReached.can_transition_to(CaseStage::AwaitingSelection));
    }

    #[test]
    fn test_accepts_selections() {
        assert!(CaseStage::AwaitingSelection.accepts_selections());
        assert!(CaseStage::ReconciliationPending.accepts_selections());
        assert!(!CaseStage::ConsensusReached.accepts_selections());
        assert!(!CaseStage::StatementPhase.accepts_selections());
    }

    #[test]
    fn test_display_matches_as_str() {
        assert_eq!(CaseStage::AiAnalyzing.to_string(), "ai_analyzing");
        assert_eq!(CaseStage::CourtForwarded.display_name(), "Forwarded to Court");
    }
}
