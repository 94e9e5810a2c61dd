//! Settlement option store use cases
//!
//! Option-set generation against the reasoning service, active-set lookup,
//! and the expiry sweep.

use crate::ports::datastore::{NegotiationStore, StoreError};
use crate::ports::reasoning_gateway::{ReasoningError, ReasoningGateway, ReasoningRequest};
use crate::use_cases::shared::record_failure;
use accord_domain::{
    CaseId, DEFAULT_EXPIRY_DAYS, NegotiationError, PromptTemplate, SettlementOptionSet,
    TimelineEvent, TimelineEventKind, parse_option_variants,
};
use chrono::Utc;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors from option-set operations
#[derive(Error, Debug)]
pub enum OptionSetError {
    #[error(transparent)]
    Rule(#[from] NegotiationError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Reasoning(#[from] ReasoningError),

    /// The service answered, but no settlement options could be extracted.
    /// Unlike reconciliation there is no degraded path here: an option set
    /// with nothing selectable cannot be presented.
    #[error("reasoning response contained no usable settlement options")]
    MalformedResponse,
}

/// Settlement option store: generation, lookup, expiry.
pub struct OptionSetService<D: NegotiationStore, G: ReasoningGateway> {
    store: Arc<D>,
    gateway: Arc<G>,
    expiry_days: i64,
}

impl<D: NegotiationStore, G: ReasoningGateway> OptionSetService<D, G> {
    pub fn new(store: Arc<D>, gateway: Arc<G>) -> Self {
        Self {
            store,
            gateway,
            expiry_days: DEFAULT_EXPIRY_DAYS,
        }
    }

    pub fn with_expiry_days(mut self, days: i64) -> Self {
        self.expiry_days = days;
        self
    }

    /// Generate a fresh option set for a case.
    ///
    /// Generation is idempotent by existence, not by content: if an
    /// unexpired active set already exists the call fails with
    /// `DuplicateActiveSet`. The check runs twice: once up front so a
    /// doomed call never reaches the external service, and once inside the
    /// datastore's conditional insert, which is the atomic authority under
    /// concurrent triggers.
    pub async fn generate(
        &self,
        case_id: &CaseId,
        analysis_context: &str,
    ) -> Result<SettlementOptionSet, OptionSetError> {
        let now = Utc::now();
        let case = self.store.fetch_case(case_id).await?;

        if self.store.active_set(case_id, now).await?.is_some() {
            let e = NegotiationError::DuplicateActiveSet;
            record_failure(&*self.store, case_id, None, "option_generate", &e.to_string()).await;
            return Err(e.into());
        }

        let statements = self.store.statements_for_case(case_id).await?;
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

        let request = ReasoningRequest::new(
            PromptTemplate::options_system(),
            PromptTemplate::options_prompt(analysis_context, &narrative),
        );

        debug!("requesting settlement options for case {}", case_id);
        let response = match self.gateway.complete(request).await {
            Ok(r) => r,
            Err(e) => {
                record_failure(&*self.store, case_id, None, "option_generate", &e.to_string())
                    .await;
                return Err(e.into());
            }
        };

        let Some(variants) = parse_option_variants(&response) else {
            warn!("option generation for case {} returned no parseable options", case_id);
            record_failure(
                &*self.store,
                case_id,
                None,
                "option_generate",
                "no usable options in response",
            )
            .await;
            return Err(OptionSetError::MalformedResponse);
        };

        let set = SettlementOptionSet::new(case_id.clone(), variants, now, self.expiry_days);

        match self.store.insert_active_set(set.clone(), now).await {
            Ok(()) => {}
            Err(StoreError::ActiveSetExists(_)) => {
                // lost the race against a concurrent trigger
                let e = NegotiationError::DuplicateActiveSet;
                record_failure(&*self.store, case_id, None, "option_generate", &e.to_string())
                    .await;
                return Err(e.into());
            }
            Err(e) => return Err(e.into()),
        }

        self.store
            .append_event(
                TimelineEvent::new(
                    case_id.clone(),
                    TimelineEventKind::OptionSetGenerated,
                    format!("{} settlement options generated", set.variants.len()),
                    now,
                )
                .with_metadata(serde_json::json!({
                    "option_set_id": set.id.as_str(),
                    "variant_count": set.variants.len(),
                    "expires_at": set.expires_at.to_rfc3339(),
                })),
            )
            .await?;

        info!(
            "option set {} generated for case {} ({} variants)",
            set.id,
            case_id,
            set.variants.len()
        );
        Ok(set)
    }

    /// The current selectable set for a case, if any. Read-only.
    pub async fn get_active(
        &self,
        case_id: &CaseId,
    ) -> Result<Option<SettlementOptionSet>, OptionSetError> {
        Ok(self.store.active_set(case_id, Utc::now()).await?)
    }

    /// Maintenance sweep: flip expired active sets to `Expired`.
    ///
    /// Safe to run repeatedly and concurrently; already-flipped rows are
    /// not touched again. Returns the sets flipped by this run.
    pub async fn expire_stale(&self) -> Result<Vec<SettlementOptionSet>, OptionSetError> {
        let now = Utc::now();
        let flipped = self.store.expire_stale(now).await?;

        for set in &flipped {
            self.store
                .append_event(
                    TimelineEvent::new(
                        set.case_id.clone(),
                        TimelineEventKind::OptionSetExpired,
                        "settlement option set expired",
                        now,
                    )
                    .with_metadata(serde_json::json!({"option_set_id": set.id.as_str()}))
                    .internal(),
                )
                .await?;
        }

        if !flipped.is_empty() {
            info!("expired {} stale option sets", flipped.len());
        }
        Ok(flipped)
    }
}
