//! Selection and consensus detection use cases

use crate::ports::datastore::{NegotiationStore, StoreError};
use crate::use_cases::shared::record_failure;
use accord_domain::{
    Case, ConsensusReport, NegotiationError, OptionSetId, PartyId, PartyRole, Selection,
    TimelineEvent, TimelineEventKind, VariantId,
};
use chrono::Utc;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

/// Errors from selection operations
#[derive(Error, Debug)]
pub enum SelectionError {
    #[error(transparent)]
    Rule(#[from] NegotiationError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("option set {0} is no longer selectable")]
    SetNotSelectable(OptionSetId),

    #[error("unknown option variant {0}")]
    UnknownVariant(VariantId),
}

/// Selection service: records party choices and reports consensus.
///
/// This component never mutates the case stage; the lifecycle controller
/// reads the consensus report and decides where the case goes.
pub struct SelectionService<D: NegotiationStore> {
    store: Arc<D>,
}

impl<D: NegotiationStore> SelectionService<D> {
    pub fn new(store: Arc<D>) -> Self {
        Self { store }
    }

    /// Record (or revise) a party's choice on an option set.
    ///
    /// Upsert keyed by `(option_set, party)`: a re-selection replaces the
    /// prior row's variant, reasoning, and timestamp in one atomic step.
    /// Parties may change their mind until a stage transition locks
    /// consensus in.
    pub async fn select(
        &self,
        option_set_id: &OptionSetId,
        party_id: &PartyId,
        variant_id: VariantId,
        reasoning: Option<String>,
    ) -> Result<Selection, SelectionError> {
        let now = Utc::now();
        let set = self.store.fetch_set(option_set_id).await?;
        let case = self.store.fetch_case(&set.case_id).await?;

        if let Err(e) = case.authorize_party(party_id) {
            record_failure(
                &*self.store,
                &case.id,
                Some(party_id.clone()),
                "selection",
                &e.to_string(),
            )
            .await;
            return Err(e.into());
        }

        if !case.stage.accepts_selections() {
            let e = NegotiationError::PhaseClosed(case.stage);
            record_failure(
                &*self.store,
                &case.id,
                Some(party_id.clone()),
                "selection",
                &e.to_string(),
            )
            .await;
            return Err(e.into());
        }

        if !set.is_selectable(now) {
            record_failure(
                &*self.store,
                &case.id,
                Some(party_id.clone()),
                "selection",
                "option set no longer selectable",
            )
            .await;
            return Err(SelectionError::SetNotSelectable(option_set_id.clone()));
        }

        if set.variant(&variant_id).is_none() {
            record_failure(
                &*self.store,
                &case.id,
                Some(party_id.clone()),
                "selection",
                "unknown option variant",
            )
            .await;
            return Err(SelectionError::UnknownVariant(variant_id));
        }

        let selection = Selection::new(
            option_set_id.clone(),
            party_id.clone(),
            variant_id,
            reasoning,
            now,
        );
        let stored = self.store.upsert_selection(selection).await?;

        self.store
            .append_event(
                TimelineEvent::new(
                    case.id.clone(),
                    TimelineEventKind::SelectionRecorded,
                    format!(
                        "{} selected option {}",
                        case.role_of(party_id).map(|r| r.as_str()).unwrap_or("party"),
                        stored.variant_id
                    ),
                    now,
                )
                .with_actor(party_id.clone())
                .with_metadata(serde_json::json!({
                    "option_set_id": option_set_id.as_str(),
                    "variant_id": stored.variant_id.as_str(),
                })),
            )
            .await?;

        info!(
            "selection recorded on set {} by party {}",
            option_set_id, party_id
        );
        Ok(stored)
    }

    /// Evaluate where the two parties currently stand on a set.
    ///
    /// Read-only: reports `both_selected` / `same_option` and never touches
    /// the case stage or appends events.
    pub async fn check_consensus(
        &self,
        option_set_id: &OptionSetId,
    ) -> Result<ConsensusReport, SelectionError> {
        let set = self.store.fetch_set(option_set_id).await?;
        let case = self.store.fetch_case(&set.case_id).await?;
        let selections = self.store.selections_for_set(option_set_id).await?;

        let report = Self::evaluate(&case, &selections);
        debug!(
            "consensus on set {}: both_selected={} same_option={}",
            option_set_id, report.both_selected, report.same_option
        );
        Ok(report)
    }

    pub(crate) fn evaluate(case: &Case, selections: &[Selection]) -> ConsensusReport {
        let by_role = |role: PartyRole| {
            selections
                .iter()
                .find(|s| case.role_of(&s.party_id) == Some(role))
        };
        ConsensusReport::evaluate(by_role(PartyRole::Complainant), by_role(PartyRole::Respondent))
    }
}
