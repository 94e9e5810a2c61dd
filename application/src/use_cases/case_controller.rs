//! Case lifecycle controller
//!
//! The only component callers invoke directly. It orchestrates the
//! statement, option, selection, and reconciliation services against the
//! case's current stage, validates every transition against the stage
//! allow-list, and appends exactly one timeline event per successful
//! transition. Reads never move the stage.

use crate::ports::datastore::{NegotiationStore, StoreError};
use crate::ports::reasoning_gateway::ReasoningGateway;
use crate::use_cases::options::{OptionSetError, OptionSetService};
use crate::use_cases::reconcile::{ReconcileError, ReconcileUseCase};
use crate::use_cases::selections::{SelectionError, SelectionService};
use crate::use_cases::shared::record_failure;
use crate::use_cases::statements::{StatementError, StatementService};
use accord_domain::{
    Case, CaseId, CaseStage, ConsensusReport, NegotiationError, PartyId, ReconcileOutcome,
    SettlementOptionSet, TimelineEvent, TimelineEventKind, VariantId,
};
use chrono::Utc;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

/// Errors from lifecycle orchestration
#[derive(Error, Debug)]
pub enum CaseFlowError {
    #[error(transparent)]
    Rule(#[from] NegotiationError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Statement(#[from] StatementError),

    #[error(transparent)]
    Options(#[from] OptionSetError),

    #[error(transparent)]
    Selection(#[from] SelectionError),

    #[error(transparent)]
    Reconcile(#[from] ReconcileError),

    #[error("case {0} has no active option set")]
    NoActiveOptionSet(CaseId),
}

/// Orchestrates a case through the negotiation lifecycle.
pub struct CaseLifecycleController<D: NegotiationStore, G: ReasoningGateway> {
    store: Arc<D>,
    statements: StatementService<D>,
    options: OptionSetService<D, G>,
    selections: SelectionService<D>,
    reconciler: ReconcileUseCase<D, G>,
}

impl<D: NegotiationStore, G: ReasoningGateway> CaseLifecycleController<D, G> {
    pub fn new(store: Arc<D>, gateway: Arc<G>) -> Self {
        Self {
            statements: StatementService::new(Arc::clone(&store)),
            options: OptionSetService::new(Arc::clone(&store), Arc::clone(&gateway)),
            selections: SelectionService::new(Arc::clone(&store)),
            reconciler: ReconcileUseCase::new(Arc::clone(&store), gateway),
            store,
        }
    }

    /// Override the option-set expiry (default 7 days)
    pub fn with_option_expiry_days(mut self, days: i64) -> Self {
        self.options = self.options.with_expiry_days(days);
        self
    }

    /// Statement operations (submit, edit, delete, finalize)
    pub fn statements(&self) -> &StatementService<D> {
        &self.statements
    }

    /// Option-set operations (get_active, expire_stale)
    pub fn options(&self) -> &OptionSetService<D, G> {
        &self.options
    }

    /// Selection operations (check_consensus)
    pub fn selections(&self) -> &SelectionService<D> {
        &self.selections
    }

    /// File a new case. Starts in the statement phase with the complainant
    /// marked as engaged.
    pub async fn file_case(
        &self,
        title: impl Into<String>,
        complainant_ref: impl Into<String>,
        respondent_ref: impl Into<String>,
    ) -> Result<Case, CaseFlowError> {
        let now = Utc::now();
        let case = Case::file(title, complainant_ref, respondent_ref, now);
        self.store.insert_case(case.clone()).await?;

        self.store
            .append_event(
                TimelineEvent::new(
                    case.id.clone(),
                    TimelineEventKind::CaseFiled,
                    format!("case {} filed", case.reference),
                    now,
                )
                .with_actor(case.complainant.id.clone())
                .with_metadata(serde_json::json!({"reference": case.reference})),
            )
            .await?;

        info!("case {} filed as {}", case.id, case.reference);
        Ok(case)
    }

    /// Validated stage transition; the only way case stage ever changes.
    ///
    /// Appends exactly one `StageChanged` event on success and a failure
    /// event (leaving the stage untouched) on rejection.
    pub async fn transition(
        &self,
        case_id: &CaseId,
        to: CaseStage,
        actor: Option<&PartyId>,
    ) -> Result<Case, CaseFlowError> {
        let now = Utc::now();
        let mut case = self.store.fetch_case(case_id).await?;
        let from = case.stage;

        if let Err(e) = case.transition_to(to, now) {
            record_failure(
                &*self.store,
                case_id,
                actor.cloned(),
                "stage_transition",
                &e.to_string(),
            )
            .await;
            return Err(e.into());
        }

        self.store.update_case(case.clone()).await?;
        let mut event = TimelineEvent::new(
            case_id.clone(),
            TimelineEventKind::StageChanged,
            format!("stage changed: {} -> {}", from, to),
            now,
        )
        .with_metadata(serde_json::json!({"from": from.as_str(), "to": to.as_str()}));
        if let Some(actor) = actor {
            event = event.with_actor(actor.clone());
        }
        self.store.append_event(event).await?;

        info!("case {} moved {} -> {}", case_id, from, to);
        Ok(case)
    }

    /// Poll statement completeness and, once both roles have finalized,
    /// move the case into analysis. Returns whether the case advanced.
    pub async fn begin_analysis(&self, case_id: &CaseId) -> Result<bool, CaseFlowError> {
        if !self.statements.check_complete(case_id).await? {
            debug!("case {} statements not complete yet", case_id);
            return Ok(false);
        }
        self.transition(case_id, CaseStage::AiAnalyzing, None).await?;
        Ok(true)
    }

    /// Generate a settlement option set and present it to the parties.
    ///
    /// Only valid from `ai_analyzing`; the stage is checked before the
    /// external call so a misplaced trigger costs nothing.
    pub async fn present_options(
        &self,
        case_id: &CaseId,
        analysis_context: &str,
    ) -> Result<SettlementOptionSet, CaseFlowError> {
        let case = self.store.fetch_case(case_id).await?;
        if let Err(e) = case.stage.check_transition(CaseStage::OptionsPresented) {
            record_failure(&*self.store, case_id, None, "present_options", &e.to_string()).await;
            return Err(e.into());
        }

        let set = self.options.generate(case_id, analysis_context).await?;
        self.transition(case_id, CaseStage::OptionsPresented, None).await?;
        self.transition(case_id, CaseStage::AwaitingSelection, None).await?;
        Ok(set)
    }

    /// Record a party's selection and, once both sides have chosen, route
    /// the case to consensus or reconciliation.
    pub async fn record_selection(
        &self,
        case_id: &CaseId,
        party_id: &PartyId,
        variant_id: VariantId,
        reasoning: Option<String>,
    ) -> Result<ConsensusReport, CaseFlowError> {
        let Some(set) = self.options.get_active(case_id).await? else {
            record_failure(
                &*self.store,
                case_id,
                Some(party_id.clone()),
                "selection",
                "no active option set",
            )
            .await;
            return Err(CaseFlowError::NoActiveOptionSet(case_id.clone()));
        };

        self.selections
            .select(&set.id, party_id, variant_id, reasoning)
            .await?;
        let report = self.selections.check_consensus(&set.id).await?;

        let case = self.store.fetch_case(case_id).await?;
        if report.both_selected && case.stage == CaseStage::AwaitingSelection {
            let next = if report.same_option {
                CaseStage::ConsensusReached
            } else {
                CaseStage::ReconciliationPending
            };
            self.transition(case_id, next, Some(party_id)).await?;
        }

        Ok(report)
    }

    /// Synthesize a combined proposal for a diverged case.
    ///
    /// The case stays in `reconciliation_pending`; accepting the proposal
    /// (or forwarding to court) is a separate, explicit step.
    pub async fn reconcile(&self, case_id: &CaseId) -> Result<ReconcileOutcome, CaseFlowError> {
        let case = self.store.fetch_case(case_id).await?;
        if case.stage != CaseStage::ReconciliationPending {
            let e = NegotiationError::PhaseClosed(case.stage);
            record_failure(&*self.store, case_id, None, "reconcile", &e.to_string()).await;
            return Err(e.into());
        }

        let Some(set) = self.options.get_active(case_id).await? else {
            record_failure(&*self.store, case_id, None, "reconcile", "no active option set").await;
            return Err(CaseFlowError::NoActiveOptionSet(case_id.clone()));
        };

        Ok(self.reconciler.reconcile(case_id, &set.id).await?)
    }

    /// Accept the agreed (or combined) terms and mark the case ready for
    /// settlement paperwork.
    pub async fn accept_solution(
        &self,
        case_id: &CaseId,
        actor: Option<&PartyId>,
    ) -> Result<Case, CaseFlowError> {
        self.transition(case_id, CaseStage::SettlementReady, actor).await
    }

    pub async fn request_signatures(
        &self,
        case_id: &CaseId,
        actor: Option<&PartyId>,
    ) -> Result<Case, CaseFlowError> {
        self.transition(case_id, CaseStage::SignaturePending, actor).await
    }

    pub async fn close_settled(
        &self,
        case_id: &CaseId,
        actor: Option<&PartyId>,
    ) -> Result<Case, CaseFlowError> {
        self.transition(case_id, CaseStage::ClosedSettled, actor).await
    }

    /// Give up on negotiation and refer the case to court.
    pub async fn forward_to_court(
        &self,
        case_id: &CaseId,
        actor: Option<&PartyId>,
    ) -> Result<Case, CaseFlowError> {
        self.transition(case_id, CaseStage::CourtForwarded, actor).await
    }
}
