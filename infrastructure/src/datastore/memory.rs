//! In-memory datastore adapter.
//!
//! Reference implementation of the repository ports. All tables live behind
//! one mutex, which gives the two check-then-write operations (the
//! conditional active-set insert and the selection upsert) their required
//! atomicity: each runs inside a single critical section, never as a
//! read-then-write across lock boundaries.
//!
//! An optional [`TimelineSink`] is notified after every timeline append.
//! Publication is fire-and-forget; the append is the durable part.

use accord_application::ports::datastore::{
    CaseRepository, OptionSetRepository, SelectionRepository, SolutionRepository,
    StatementRepository, StoreError, TimelineRepository,
};
use accord_application::ports::timeline_sink::TimelineSink;
use accord_domain::{
    Case, CaseId, CombinedSolution, OptionSetId, OptionSetStatus, PartyId, Selection,
    SettlementOptionSet, Statement, StatementId, TimelineEvent,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct Tables {
    cases: HashMap<CaseId, Case>,
    statements: HashMap<StatementId, Statement>,
    option_sets: HashMap<OptionSetId, SettlementOptionSet>,
    selections: HashMap<(OptionSetId, PartyId), Selection>,
    solutions: Vec<CombinedSolution>,
    events: Vec<TimelineEvent>,
}

/// Memory-backed negotiation store.
pub struct InMemoryStore {
    tables: Mutex<Tables>,
    sink: Option<Arc<dyn TimelineSink>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            tables: Mutex::new(Tables::default()),
            sink: None,
        }
    }

    /// Attach a timeline sink notified after each appended event.
    pub fn with_sink(mut self, sink: Arc<dyn TimelineSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Tables>, StoreError> {
        self.tables
            .lock()
            .map_err(|_| StoreError::Backend("store mutex poisoned".to_string()))
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CaseRepository for InMemoryStore {
    async fn insert_case(&self, case: Case) -> Result<(), StoreError> {
        self.lock()?.cases.insert(case.id.clone(), case);
        Ok(())
    }

    async fn fetch_case(&self, id: &CaseId) -> Result<Case, StoreError> {
        self.lock()?
            .cases
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::not_found(format!("case {id}")))
    }

    async fn update_case(&self, case: Case) -> Result<(), StoreError> {
        let mut tables = self.lock()?;
        if !tables.cases.contains_key(&case.id) {
            return Err(StoreError::not_found(format!("case {}", case.id)));
        }
        tables.cases.insert(case.id.clone(), case);
        Ok(())
    }
}

#[async_trait]
impl StatementRepository for InMemoryStore {
    async fn insert_statement(&self, statement: Statement) -> Result<(), StoreError> {
        self.lock()?
            .statements
            .insert(statement.id.clone(), statement);
        Ok(())
    }

    async fn fetch_statement(&self, id: &StatementId) -> Result<Statement, StoreError> {
        self.lock()?
            .statements
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::not_found(format!("statement {id}")))
    }

    async fn update_statement(&self, statement: Statement) -> Result<(), StoreError> {
        let mut tables = self.lock()?;
        if !tables.statements.contains_key(&statement.id) {
            return Err(StoreError::not_found(format!("statement {}", statement.id)));
        }
        tables.statements.insert(statement.id.clone(), statement);
        Ok(())
    }

    async fn delete_statement(&self, id: &StatementId) -> Result<(), StoreError> {
        self.lock()?
            .statements
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| StoreError::not_found(format!("statement {id}")))
    }

    async fn statements_for_case(&self, case_id: &CaseId) -> Result<Vec<Statement>, StoreError> {
        let mut statements: Vec<Statement> = self
            .lock()?
            .statements
            .values()
            .filter(|s| &s.case_id == case_id)
            .cloned()
            .collect();
        statements.sort_by_key(|s| s.created_at);
        Ok(statements)
    }
}

#[async_trait]
impl OptionSetRepository for InMemoryStore {
    async fn insert_active_set(
        &self,
        set: SettlementOptionSet,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut tables = self.lock()?;

        // conditional insert: the whole check-then-write happens under one
        // lock, so concurrent generators cannot both pass the check
        for existing in tables.option_sets.values_mut() {
            if existing.case_id == set.case_id && existing.status == OptionSetStatus::Active {
                if existing.is_expired(now) {
                    // stale active row the sweep has not caught yet
                    existing.mark_superseded();
                } else {
                    return Err(StoreError::ActiveSetExists(set.case_id.clone()));
                }
            }
        }

        tables.option_sets.insert(set.id.clone(), set);
        Ok(())
    }

    async fn fetch_set(&self, id: &OptionSetId) -> Result<SettlementOptionSet, StoreError> {
        self.lock()?
            .option_sets
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::not_found(format!("option set {id}")))
    }

    async fn active_set(
        &self,
        case_id: &CaseId,
        now: DateTime<Utc>,
    ) -> Result<Option<SettlementOptionSet>, StoreError> {
        Ok(self
            .lock()?
            .option_sets
            .values()
            .filter(|s| &s.case_id == case_id && s.is_selectable(now))
            .max_by_key(|s| s.generated_at)
            .cloned())
    }

    async fn expire_stale(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<SettlementOptionSet>, StoreError> {
        let mut tables = self.lock()?;
        let mut flipped = Vec::new();
        for set in tables.option_sets.values_mut() {
            if set.status == OptionSetStatus::Active && set.is_expired(now) {
                set.mark_expired();
                flipped.push(set.clone());
            }
        }
        Ok(flipped)
    }
}

#[async_trait]
impl SelectionRepository for InMemoryStore {
    async fn upsert_selection(&self, selection: Selection) -> Result<Selection, StoreError> {
        let key = (
            selection.option_set_id.clone(),
            selection.party_id.clone(),
        );
        // single-step upsert: the row-level uniqueness on (set, party) is
        // the map key itself
        self.lock()?.selections.insert(key, selection.clone());
        Ok(selection)
    }

    async fn selections_for_set(
        &self,
        option_set_id: &OptionSetId,
    ) -> Result<Vec<Selection>, StoreError> {
        Ok(self
            .lock()?
            .selections
            .values()
            .filter(|s| &s.option_set_id == option_set_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl SolutionRepository for InMemoryStore {
    async fn append_solution(&self, solution: CombinedSolution) -> Result<(), StoreError> {
        self.lock()?.solutions.push(solution);
        Ok(())
    }

    async fn solutions_for_case(
        &self,
        case_id: &CaseId,
    ) -> Result<Vec<CombinedSolution>, StoreError> {
        Ok(self
            .lock()?
            .solutions
            .iter()
            .filter(|s| &s.case_id == case_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl TimelineRepository for InMemoryStore {
    async fn append_event(&self, event: TimelineEvent) -> Result<(), StoreError> {
        self.lock()?.events.push(event.clone());
        // best-effort publication after the durable append
        if let Some(sink) = &self.sink {
            sink.publish(&event);
        }
        Ok(())
    }

    async fn events_for_case(&self, case_id: &CaseId) -> Result<Vec<TimelineEvent>, StoreError> {
        let mut events: Vec<TimelineEvent> = self
            .lock()?
            .events
            .iter()
            .filter(|e| &e.case_id == case_id)
            .cloned()
            .collect();
        events.sort_by_key(|e| e.recorded_at);
        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use accord_domain::{OptionVariant, TimelineEventKind, VariantId};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn sample_set(case_id: &CaseId, expiry_days: i64) -> SettlementOptionSet {
        SettlementOptionSet::new(
            case_id.clone(),
            vec![OptionVariant::new("opt-1", "Refund", "900 EUR", "Fair")],
            Utc::now(),
            expiry_days,
        )
    }

    #[tokio::test]
    async fn test_conditional_insert_rejects_second_active_set() {
        let store = InMemoryStore::new();
        let case_id = CaseId::new("case_1");
        let now = Utc::now();

        store
            .insert_active_set(sample_set(&case_id, 7), now)
            .await
            .unwrap();
        let err = store
            .insert_active_set(sample_set(&case_id, 7), now)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::ActiveSetExists(_)));
    }

    #[tokio::test]
    async fn test_conditional_insert_supersedes_stale_active_row() {
        let store = InMemoryStore::new();
        let case_id = CaseId::new("case_1");

        let stale = sample_set(&case_id, 0); // expires immediately
        let stale_id = stale.id.clone();
        store.insert_active_set(stale, Utc::now()).await.unwrap();

        let fresh = sample_set(&case_id, 7);
        store.insert_active_set(fresh, Utc::now()).await.unwrap();

        let prior = store.fetch_set(&stale_id).await.unwrap();
        assert_eq!(prior.status, OptionSetStatus::Superseded);
    }

    #[tokio::test]
    async fn test_selection_upsert_keeps_one_row_per_pair() {
        let store = InMemoryStore::new();
        let set_id = OptionSetId::new("optset_1");
        let party = PartyId::new("party_a");

        for variant in ["opt-1", "opt-2", "opt-1"] {
            store
                .upsert_selection(Selection::new(
                    set_id.clone(),
                    party.clone(),
                    VariantId::new(variant),
                    None,
                    Utc::now(),
                ))
                .await
                .unwrap();
        }

        let selections = store.selections_for_set(&set_id).await.unwrap();
        assert_eq!(selections.len(), 1);
        // latest write wins
        assert_eq!(selections[0].variant_id, VariantId::new("opt-1"));
    }

    #[tokio::test]
    async fn test_update_missing_case_is_not_found() {
        let store = InMemoryStore::new();
        let case = Case::file("Dispute", "a", "b", Utc::now());
        let err = store.update_case(case).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_sink_sees_every_append() {
        struct CountingSink(AtomicUsize);
        impl TimelineSink for CountingSink {
            fn publish(&self, _event: &TimelineEvent) {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }

        let sink = Arc::new(CountingSink(AtomicUsize::new(0)));
        let store = InMemoryStore::new().with_sink(Arc::clone(&sink) as Arc<dyn TimelineSink>);

        for i in 0..3 {
            store
                .append_event(TimelineEvent::new(
                    CaseId::new("case_1"),
                    TimelineEventKind::StageChanged,
                    format!("event {i}"),
                    Utc::now(),
                ))
                .await
                .unwrap();
        }

        assert_eq!(sink.0.load(Ordering::SeqCst), 3);
        assert_eq!(
            store.events_for_case(&CaseId::new("case_1")).await.unwrap().len(),
            3
        );
    }
}
