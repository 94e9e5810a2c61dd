//! Datastore ports (repository interfaces)
//!
//! The datastore is the engine's only shared mutable resource. Every
//! component goes through these traits; no component ever mutates another
//! component's entities directly. Two operations require atomic
//! check-then-write semantics inside the adapter (the conditional
//! active-set insert and the selection upsert) and must never be
//! implemented as application-level read-then-write.

use accord_domain::{
    Case, CaseId, CombinedSolution, OptionSetId, Selection, SettlementOptionSet, Statement,
    StatementId, TimelineEvent,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors surfaced by datastore adapters
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("record not found: {0}")]
    NotFound(String),

    /// The conditional insert found an unexpired active set
    #[error("an active option set already exists for case {0}")]
    ActiveSetExists(CaseId),

    #[error("storage backend error: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn not_found(what: impl Into<String>) -> Self {
        StoreError::NotFound(what.into())
    }
}

/// Case rows
#[async_trait]
pub trait CaseRepository: Send + Sync {
    async fn insert_case(&self, case: Case) -> Result<(), StoreError>;

    async fn fetch_case(&self, id: &CaseId) -> Result<Case, StoreError>;

    /// Whole-row replace; the caller owns transition validation
    async fn update_case(&self, case: Case) -> Result<(), StoreError>;
}

/// Statement rows
#[async_trait]
pub trait StatementRepository: Send + Sync {
    async fn insert_statement(&self, statement: Statement) -> Result<(), StoreError>;

    async fn fetch_statement(&self, id: &StatementId) -> Result<Statement, StoreError>;

    async fn update_statement(&self, statement: Statement) -> Result<(), StoreError>;

    async fn delete_statement(&self, id: &StatementId) -> Result<(), StoreError>;

    async fn statements_for_case(&self, case_id: &CaseId) -> Result<Vec<Statement>, StoreError>;
}

/// Settlement option set rows
#[async_trait]
pub trait OptionSetRepository: Send + Sync {
    /// Conditional insert enforcing the active-set invariant.
    ///
    /// Atomically: if the case already has an `Active` set with
    /// `expires_at > now`, fail with [`StoreError::ActiveSetExists`] and
    /// change nothing. An `Active` set that is already past expiry (the
    /// sweep has not caught it yet) is marked superseded in the same
    /// critical section before the new row is inserted.
    async fn insert_active_set(
        &self,
        set: SettlementOptionSet,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    async fn fetch_set(&self, id: &OptionSetId) -> Result<SettlementOptionSet, StoreError>;

    /// The most recent `Active` set with `expires_at > now`, if any
    async fn active_set(
        &self,
        case_id: &CaseId,
        now: DateTime<Utc>,
    ) -> Result<Option<SettlementOptionSet>, StoreError>;

    /// Flip expired `Active` rows to `Expired` and return them.
    ///
    /// Safe to run repeatedly and concurrently; already-expired rows are
    /// not touched again.
    async fn expire_stale(&self, now: DateTime<Utc>)
    -> Result<Vec<SettlementOptionSet>, StoreError>;
}

/// Selection rows, unique per `(option_set, party)`
#[async_trait]
pub trait SelectionRepository: Send + Sync {
    /// Transactional upsert: insert the selection, or replace the existing
    /// row for the same `(option_set_id, party_id)` pair in one atomic
    /// step. Returns the stored row.
    async fn upsert_selection(&self, selection: Selection) -> Result<Selection, StoreError>;

    async fn selections_for_set(
        &self,
        option_set_id: &OptionSetId,
    ) -> Result<Vec<Selection>, StoreError>;
}

/// Combined solution rows; append-only history
#[async_trait]
pub trait SolutionRepository: Send + Sync {
    async fn append_solution(&self, solution: CombinedSolution) -> Result<(), StoreError>;

    async fn solutions_for_case(
        &self,
        case_id: &CaseId,
    ) -> Result<Vec<CombinedSolution>, StoreError>;
}

/// Timeline rows; append-only, never mutated or deleted
#[async_trait]
pub trait TimelineRepository: Send + Sync {
    async fn append_event(&self, event: TimelineEvent) -> Result<(), StoreError>;

    async fn events_for_case(&self, case_id: &CaseId) -> Result<Vec<TimelineEvent>, StoreError>;
}

/// Everything the engine needs from a datastore, as one bound.
pub trait NegotiationStore:
    CaseRepository
    + StatementRepository
    + OptionSetRepository
    + SelectionRepository
    + SolutionRepository
    + TimelineRepository
{
}

impl<T> NegotiationStore for T where
    T: CaseRepository
        + StatementRepository
        + OptionSetRepository
        + SelectionRepository
        + SolutionRepository
        + TimelineRepository
{
}
