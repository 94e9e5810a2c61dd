//! Statement store use cases
//!
//! Submission, windowed edit/delete, finalization, and the completeness
//! check the lifecycle controller polls before starting analysis.

use crate::ports::datastore::{NegotiationStore, StoreError};
use crate::use_cases::shared::record_failure;
use accord_domain::{
    CaseId, CaseStage, NegotiationError, PartyId, PartyRole, Statement, StatementId,
    TimelineEvent, TimelineEventKind,
};
use chrono::Utc;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

/// Errors from statement operations
#[derive(Error, Debug)]
pub enum StatementError {
    #[error(transparent)]
    Rule(#[from] NegotiationError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Statement store: owns every mutation of party statements.
pub struct StatementService<D: NegotiationStore> {
    store: Arc<D>,
}

impl<D: NegotiationStore> StatementService<D> {
    pub fn new(store: Arc<D>) -> Self {
        Self { store }
    }

    /// Submit a new statement. Only permitted while the case is in the
    /// statement phase; anything later fails with `PhaseClosed`.
    pub async fn submit(
        &self,
        case_id: &CaseId,
        party_id: &PartyId,
        content: impl Into<String>,
    ) -> Result<Statement, StatementError> {
        let now = Utc::now();
        let mut case = self.store.fetch_case(case_id).await?;

        if let Err(e) = case.authorize_party(party_id) {
            record_failure(
                &*self.store,
                case_id,
                Some(party_id.clone()),
                "statement_submit",
                &e.to_string(),
            )
            .await;
            return Err(e.into());
        }

        if case.stage != CaseStage::StatementPhase {
            let e = NegotiationError::PhaseClosed(case.stage);
            record_failure(
                &*self.store,
                case_id,
                Some(party_id.clone()),
                "statement_submit",
                &e.to_string(),
            )
            .await;
            return Err(e.into());
        }

        let statement = Statement::new(case_id.clone(), party_id.clone(), content, now);
        self.store.insert_statement(statement.clone()).await?;

        // the respondent's first engagement flips their responded flag
        if case.role_of(party_id) == Some(PartyRole::Respondent) && !case.respondent.responded {
            case.respondent.mark_responded();
            self.store.update_case(case.clone()).await?;
        }

        let role = case.role_of(party_id).map(|r| r.as_str()).unwrap_or("party");
        self.store
            .append_event(
                TimelineEvent::new(
                    case_id.clone(),
                    TimelineEventKind::StatementSubmitted,
                    format!("{role} submitted a statement"),
                    now,
                )
                .with_actor(party_id.clone())
                .with_metadata(serde_json::json!({"statement_id": statement.id.as_str()})),
            )
            .await?;

        info!("statement {} submitted on case {}", statement.id, case_id);
        Ok(statement)
    }

    /// Edit an unfinalized statement within 15 minutes of its creation.
    /// The content is replaced; `created_at` is preserved for the windows.
    pub async fn edit(
        &self,
        statement_id: &StatementId,
        party_id: &PartyId,
        content: impl Into<String>,
    ) -> Result<Statement, StatementError> {
        let now = Utc::now();
        let mut statement = self.store.fetch_statement(statement_id).await?;

        if let Err(e) = statement.check_editable(party_id, now) {
            record_failure(
                &*self.store,
                &statement.case_id,
                Some(party_id.clone()),
                "statement_edit",
                &e.to_string(),
            )
            .await;
            return Err(e.into());
        }

        statement.apply_edit(content, now);
        self.store.update_statement(statement.clone()).await?;

        self.store
            .append_event(
                TimelineEvent::new(
                    statement.case_id.clone(),
                    TimelineEventKind::StatementEdited,
                    "statement edited",
                    now,
                )
                .with_actor(party_id.clone())
                .with_metadata(serde_json::json!({"statement_id": statement.id.as_str()})),
            )
            .await?;

        debug!("statement {} edited", statement.id);
        Ok(statement)
    }

    /// Delete an unfinalized statement within 5 minutes of its creation.
    pub async fn delete(
        &self,
        statement_id: &StatementId,
        party_id: &PartyId,
    ) -> Result<(), StatementError> {
        let now = Utc::now();
        let statement = self.store.fetch_statement(statement_id).await?;

        if let Err(e) = statement.check_deletable(party_id, now) {
            record_failure(
                &*self.store,
                &statement.case_id,
                Some(party_id.clone()),
                "statement_delete",
                &e.to_string(),
            )
            .await;
            return Err(e.into());
        }

        self.store.delete_statement(statement_id).await?;

        self.store
            .append_event(
                TimelineEvent::new(
                    statement.case_id.clone(),
                    TimelineEventKind::StatementDeleted,
                    "statement deleted",
                    now,
                )
                .with_actor(party_id.clone())
                .with_metadata(serde_json::json!({"statement_id": statement.id.as_str()})),
            )
            .await?;

        info!("statement {} deleted", statement.id);
        Ok(())
    }

    /// Irreversibly lock a statement. Ends both mutation windows early.
    pub async fn finalize(
        &self,
        statement_id: &StatementId,
        party_id: &PartyId,
    ) -> Result<Statement, StatementError> {
        let now = Utc::now();
        let mut statement = self.store.fetch_statement(statement_id).await?;

        if let Err(e) = statement.finalize(party_id) {
            record_failure(
                &*self.store,
                &statement.case_id,
                Some(party_id.clone()),
                "statement_finalize",
                &e.to_string(),
            )
            .await;
            return Err(e.into());
        }

        self.store.update_statement(statement.clone()).await?;

        self.store
            .append_event(
                TimelineEvent::new(
                    statement.case_id.clone(),
                    TimelineEventKind::StatementFinalized,
                    "statement finalized",
                    now,
                )
                .with_actor(party_id.clone())
                .with_metadata(serde_json::json!({"statement_id": statement.id.as_str()})),
            )
            .await?;

        info!("statement {} finalized", statement.id);
        Ok(statement)
    }

    /// Whether both roles have at least one finalized statement.
    ///
    /// Read-only; the lifecycle controller polls this to decide the
    /// statement-phase exit.
    pub async fn check_complete(&self, case_id: &CaseId) -> Result<bool, StatementError> {
        let case = self.store.fetch_case(case_id).await?;
        let statements = self.store.statements_for_case(case_id).await?;

        let has_finalized = |role: PartyRole| {
            statements
                .iter()
                .any(|s| s.finalized && case.role_of(&s.party_id) == Some(role))
        };

        Ok(has_finalized(PartyRole::Complainant) && has_finalized(PartyRole::Respondent))
    }
}
