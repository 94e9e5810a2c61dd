//! Reconciliation use case
//!
//! Invoked after both parties selected different option variants.
//! Synthesizes a combined proposal through the external reasoning service:
//! one bounded call, no internal retry, and a raw-text fallback when the
//! response does not parse. Formatting failures of the service never block
//! a case.

use crate::ports::datastore::{NegotiationStore, StoreError};
use crate::ports::reasoning_gateway::{ReasoningError, ReasoningGateway, ReasoningRequest};
use crate::use_cases::selections::SelectionService;
use crate::use_cases::shared::record_failure;
use accord_domain::{
    Case, CaseId, CombinedSolution, NegotiationError, OptionSetId, PromptTemplate,
    ReconcileOutcome, SettlementOptionSet, TimelineEvent, TimelineEventKind, parse_solution,
};
use chrono::Utc;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors from reconciliation
#[derive(Error, Debug)]
pub enum ReconcileError {
    #[error(transparent)]
    Rule(#[from] NegotiationError),

    #[error(transparent)]
    Store(#[from] StoreError),

    /// Timeout or transport failure; surfaced synchronously, the caller
    /// decides whether to re-invoke
    #[error(transparent)]
    Reasoning(#[from] ReasoningError),
}

/// Use case for synthesizing a combined solution out of a divergence.
pub struct ReconcileUseCase<D: NegotiationStore, G: ReasoningGateway> {
    store: Arc<D>,
    gateway: Arc<G>,
}

impl<D: NegotiationStore, G: ReasoningGateway> ReconcileUseCase<D, G> {
    pub fn new(store: Arc<D>, gateway: Arc<G>) -> Self {
        Self { store, gateway }
    }

    /// Run one reconciliation attempt for a diverged option set.
    ///
    /// Precondition: both parties selected, different variants; anything
    /// else fails with `NoDivergence`, including the defensive re-check
    /// right before the external call (selections may have converged
    /// concurrently; a converged case never wastes an external call).
    ///
    /// Repeated invocations are allowed and append new solutions as
    /// history; nothing is overwritten.
    pub async fn reconcile(
        &self,
        case_id: &CaseId,
        option_set_id: &OptionSetId,
    ) -> Result<ReconcileOutcome, ReconcileError> {
        let case = self.store.fetch_case(case_id).await?;
        let set = self.store.fetch_set(option_set_id).await?;
        if set.case_id != *case_id {
            return Err(StoreError::not_found(format!(
                "option set {option_set_id} on case {case_id}"
            ))
            .into());
        }

        let selections = self.store.selections_for_set(option_set_id).await?;
        let report = SelectionService::<D>::evaluate(&case, &selections);
        if !report.is_divergence() {
            let e = NegotiationError::NoDivergence;
            record_failure(&*self.store, case_id, None, "reconcile", &e.to_string()).await;
            return Err(e.into());
        }

        let prompt = self.build_prompt(&case, &set).await?;

        // defensive re-check: a concurrent re-selection may have converged
        // the parties while the prompt was being built
        let fresh = self.store.selections_for_set(option_set_id).await?;
        let fresh_report = SelectionService::<D>::evaluate(&case, &fresh);
        if !fresh_report.is_divergence() {
            debug!(
                "selections on set {} converged before the external call",
                option_set_id
            );
            let e = NegotiationError::NoDivergence;
            record_failure(&*self.store, case_id, None, "reconcile", &e.to_string()).await;
            return Err(e.into());
        }

        // exactly one external call per attempt; retries are the caller's call
        let response = match self.gateway.complete(prompt).await {
            Ok(r) => r,
            Err(e) => {
                record_failure(&*self.store, case_id, None, "reconcile", &e.to_string()).await;
                return Err(e.into());
            }
        };

        let now = Utc::now();
        if let Some(draft) = parse_solution(&response) {
            let solution =
                CombinedSolution::from_draft(case_id.clone(), option_set_id.clone(), draft, now);
            self.store.append_solution(solution.clone()).await?;
            self.store
                .append_event(
                    TimelineEvent::new(
                        case_id.clone(),
                        TimelineEventKind::SolutionProposed,
                        "combined solution proposed",
                        now,
                    )
                    .with_metadata(serde_json::json!({
                        "solution_id": solution.id.as_str(),
                        "option_set_id": option_set_id.as_str(),
                    })),
                )
                .await?;
            info!("combined solution {} produced for case {}", solution.id, case_id);
            Ok(ReconcileOutcome::Structured(solution))
        } else {
            // degraded success: keep the verbatim text, do not fail the case
            warn!(
                "reconciliation response for case {} did not parse; keeping raw text",
                case_id
            );
            let solution = CombinedSolution::raw_fallback(
                case_id.clone(),
                option_set_id.clone(),
                response,
                now,
            );
            self.store.append_solution(solution.clone()).await?;
            self.store
                .append_event(
                    TimelineEvent::new(
                        case_id.clone(),
                        TimelineEventKind::SolutionFallback,
                        "reconciliation kept as raw text (response did not parse)",
                        now,
                    )
                    .with_metadata(serde_json::json!({
                        "solution_id": solution.id.as_str(),
                        "option_set_id": option_set_id.as_str(),
                    }))
                    .internal(),
                )
                .await?;
            Ok(ReconcileOutcome::Raw(solution))
        }
    }

    /// Context payload: statements, the diverging selections with their
    /// reasoning, and the full variant list. This is the only input the
    /// external service sees.
    async fn build_prompt(
        &self,
        case: &Case,
        set: &SettlementOptionSet,
    ) -> Result<ReasoningRequest, ReconcileError> {
        let statements = self.store.statements_for_case(&case.id).await?;
        let narrative: Vec<(String, String)> = statements
            .iter()
            .filter(|s| s.finalized)
            .map(|s| {
                let role = case
                    .role_of(&s.party_id)
                    .map(|r| r.as_str().to_string())
                    .unwrap_or_else(|| "party".to_string());
                (role, s.content.clone())
            })
            .collect();

        let selections = self.store.selections_for_set(&set.id).await?;
        let labelled: Vec<_> = selections
            .iter()
            .map(|s| {
                let role = case
                    .role_of(&s.party_id)
                    .map(|r| r.as_str().to_string())
                    .unwrap_or_else(|| "party".to_string());
                (role, s, set.variant(&s.variant_id))
            })
            .collect();

        Ok(ReasoningRequest::new(
            PromptTemplate::reconciliation_system(),
            PromptTemplate::reconciliation_prompt(&narrative, &labelled, &set.variants),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::datastore::{CaseRepository, OptionSetRepository, SelectionRepository};
    use crate::use_cases::shared::testing::{MemoryStore, StubGateway};
    use accord_domain::{CaseStage, OptionVariant, Selection, VariantId};

    const SOLUTION_JSON: &str = r#"{
        "summary": "Split the difference",
        "terms": "Respondent refunds 1000 EUR within 14 days",
        "concessions": {"complainant": ["Waives 200 EUR"], "respondent": ["Pays promptly"]},
        "acceptance_probability": 0.7
    }"#;

    async fn diverged_case(store: &MemoryStore) -> (Case, SettlementOptionSet) {
        let mut case = Case::file("Dispute", "a", "b", Utc::now());
        case.stage = CaseStage::ReconciliationPending;
        store.insert_case(case.clone()).await.unwrap();

        let set = SettlementOptionSet::new(
            case.id.clone(),
            vec![
                OptionVariant::new("opt-1", "Full refund", "1200 EUR", "Direct"),
                OptionVariant::new("opt-3", "No refund", "0 EUR", "Offset"),
            ],
            Utc::now(),
            7,
        );
        store.insert_active_set(set.clone(), Utc::now()).await.unwrap();

        for (party, variant) in [(&case.complainant, "opt-1"), (&case.respondent, "opt-3")] {
            store
                .upsert_selection(Selection::new(
                    set.id.clone(),
                    party.id.clone(),
                    VariantId::new(variant),
                    Some(format!("{} reasoning", party.role)),
                    Utc::now(),
                ))
                .await
                .unwrap();
        }
        (case, set)
    }

    #[tokio::test]
    async fn test_divergence_produces_structured_solution() {
        let store = Arc::new(MemoryStore::default());
        let gateway = Arc::new(StubGateway::with_responses(vec![Ok(
            SOLUTION_JSON.to_string()
        )]));
        let (case, set) = diverged_case(&store).await;
        let use_case = ReconcileUseCase::new(Arc::clone(&store), Arc::clone(&gateway));

        let outcome = use_case.reconcile(&case.id, &set.id).await.unwrap();
        assert!(!outcome.is_degraded());
        assert_eq!(
            outcome.solution().synthesized_terms,
            "Respondent refunds 1000 EUR within 14 days"
        );
        assert_eq!(store.solutions().len(), 1);
        assert_eq!(gateway.call_count(), 1);
        assert!(store.event_kinds().contains(&TimelineEventKind::SolutionProposed));
    }

    #[tokio::test]
    async fn test_consensus_fails_with_no_divergence() {
        let store = Arc::new(MemoryStore::default());
        let gateway = Arc::new(StubGateway::with_responses(vec![Ok(
            SOLUTION_JSON.to_string()
        )]));
        let (case, set) = diverged_case(&store).await;

        // respondent changes their mind and converges
        store
            .upsert_selection(Selection::new(
                set.id.clone(),
                case.respondent.id.clone(),
                VariantId::new("opt-1"),
                None,
                Utc::now(),
            ))
            .await
            .unwrap();

        let use_case = ReconcileUseCase::new(Arc::clone(&store), Arc::clone(&gateway));
        let err = use_case.reconcile(&case.id, &set.id).await.unwrap_err();
        assert!(matches!(
            err,
            ReconcileError::Rule(NegotiationError::NoDivergence)
        ));
        // a converged case never reaches the external service
        assert_eq!(gateway.call_count(), 0);
        assert!(store.solutions().is_empty());
    }

    #[tokio::test]
    async fn test_single_selection_fails_with_no_divergence() {
        let store = Arc::new(MemoryStore::default());
        let gateway = Arc::new(StubGateway::with_responses(vec![]));
        let (case, set) = diverged_case(&store).await;

        // wipe the respondent's selection by replaying only the complainant
        let store2 = Arc::new(MemoryStore::default());
        store2.insert_case(case.clone()).await.unwrap();
        store2.insert_active_set(set.clone(), Utc::now()).await.unwrap();
        store2
            .upsert_selection(Selection::new(
                set.id.clone(),
                case.complainant.id.clone(),
                VariantId::new("opt-1"),
                None,
                Utc::now(),
            ))
            .await
            .unwrap();

        let use_case = ReconcileUseCase::new(Arc::clone(&store2), Arc::clone(&gateway));
        let err = use_case.reconcile(&case.id, &set.id).await.unwrap_err();
        assert!(matches!(
            err,
            ReconcileError::Rule(NegotiationError::NoDivergence)
        ));
        assert_eq!(gateway.call_count(), 0);
    }

    #[tokio::test]
    async fn test_prose_response_degrades_to_raw_fallback() {
        let prose = "Honestly, both parties should meet in the middle and move on.";
        let store = Arc::new(MemoryStore::default());
        let gateway = Arc::new(StubGateway::with_responses(vec![Ok(prose.to_string())]));
        let (case, set) = diverged_case(&store).await;
        let use_case = ReconcileUseCase::new(Arc::clone(&store), Arc::clone(&gateway));

        let outcome = use_case.reconcile(&case.id, &set.id).await.unwrap();
        assert!(outcome.is_degraded());
        // the raw text is kept verbatim
        assert_eq!(outcome.solution().raw_response.as_deref(), Some(prose));
        assert_eq!(store.solutions().len(), 1);
        assert!(store.event_kinds().contains(&TimelineEventKind::SolutionFallback));
    }

    #[tokio::test]
    async fn test_gateway_failure_surfaces_synchronously() {
        let store = Arc::new(MemoryStore::default());
        let gateway = Arc::new(StubGateway::with_responses(vec![Err(
            ReasoningError::Timeout,
        )]));
        let (case, set) = diverged_case(&store).await;
        let use_case = ReconcileUseCase::new(Arc::clone(&store), Arc::clone(&gateway));

        let err = use_case.reconcile(&case.id, &set.id).await.unwrap_err();
        assert!(matches!(
            err,
            ReconcileError::Reasoning(ReasoningError::Timeout)
        ));
        // one attempt, one call, no hidden retries
        assert_eq!(gateway.call_count(), 1);
        assert!(store.solutions().is_empty());
        assert!(store.event_kinds().contains(&TimelineEventKind::OperationFailed));
    }

    #[tokio::test]
    async fn test_repeat_reconcile_appends_history() {
        let store = Arc::new(MemoryStore::default());
        let gateway = Arc::new(StubGateway::with_responses(vec![
            Ok(SOLUTION_JSON.to_string()),
            Ok(SOLUTION_JSON.to_string()),
        ]));
        let (case, set) = diverged_case(&store).await;
        let use_case = ReconcileUseCase::new(Arc::clone(&store), Arc::clone(&gateway));

        let first = use_case.reconcile(&case.id, &set.id).await.unwrap();
        let second = use_case.reconcile(&case.id, &set.id).await.unwrap();

        assert_ne!(first.solution().id, second.solution().id);
        assert_eq!(store.solutions().len(), 2);
    }
}
