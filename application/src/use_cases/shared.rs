//! Helpers shared across use cases.

use crate::ports::datastore::TimelineRepository;
use accord_domain::{CaseId, PartyId, TimelineEvent, TimelineEventKind};
use chrono::Utc;
use tracing::warn;

/// Append an audit event for an attempted-but-rejected operation.
///
/// Failure paths must still reach the timeline. If even that append fails,
/// the original error still wins; the append failure is only logged.
pub(crate) async fn record_failure<D: TimelineRepository + ?Sized>(
    store: &D,
    case_id: &CaseId,
    actor: Option<PartyId>,
    operation: &str,
    reason: &str,
) {
    let mut event = TimelineEvent::new(
        case_id.clone(),
        TimelineEventKind::OperationFailed,
        format!("{operation} rejected: {reason}"),
        Utc::now(),
    )
    .with_metadata(serde_json::json!({"operation": operation, "error": reason}))
    .internal();

    if let Some(actor) = actor {
        event = event.with_actor(actor);
    }

    if let Err(e) = store.append_event(event).await {
        warn!("failed to append failure event for case {}: {}", case_id, e);
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! In-file test doubles: a memory-backed store and a scripted gateway.

    use crate::ports::datastore::{
        CaseRepository, OptionSetRepository, SelectionRepository, SolutionRepository,
        StatementRepository, StoreError, TimelineRepository,
    };
    use crate::ports::reasoning_gateway::{ReasoningError, ReasoningGateway, ReasoningRequest};
    use accord_domain::{
        Case, CaseId, CombinedSolution, OptionSetId, OptionSetStatus, PartyId, Selection,
        SettlementOptionSet, Statement, StatementId, TimelineEvent, TimelineEventKind,
    };
    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use std::collections::{HashMap, VecDeque};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct State {
        cases: HashMap<CaseId, Case>,
        statements: HashMap<StatementId, Statement>,
        sets: HashMap<OptionSetId, SettlementOptionSet>,
        selections: HashMap<(OptionSetId, PartyId), Selection>,
        solutions: Vec<CombinedSolution>,
        events: Vec<TimelineEvent>,
    }

    /// Memory-backed store for use-case tests. Mirrors the semantics the
    /// real adapter must provide: single critical section per operation.
    #[derive(Default)]
    pub(crate) struct MemoryStore {
        state: Mutex<State>,
    }

    impl MemoryStore {
        pub fn event_kinds(&self) -> Vec<TimelineEventKind> {
            self.state
                .lock()
                .unwrap()
                .events
                .iter()
                .map(|e| e.kind)
                .collect()
        }

        pub fn events(&self) -> Vec<TimelineEvent> {
            self.state.lock().unwrap().events.clone()
        }

        pub fn solutions(&self) -> Vec<CombinedSolution> {
            self.state.lock().unwrap().solutions.clone()
        }
    }

    #[async_trait]
    impl CaseRepository for MemoryStore {
        async fn insert_case(&self, case: Case) -> Result<(), StoreError> {
            self.state.lock().unwrap().cases.insert(case.id.clone(), case);
            Ok(())
        }

        async fn fetch_case(&self, id: &CaseId) -> Result<Case, StoreError> {
            self.state
                .lock()
                .unwrap()
                .cases
                .get(id)
                .cloned()
                .ok_or_else(|| StoreError::not_found(format!("case {id}")))
        }

        async fn update_case(&self, case: Case) -> Result<(), StoreError> {
            self.state.lock().unwrap().cases.insert(case.id.clone(), case);
            Ok(())
        }
    }

    #[async_trait]
    impl StatementRepository for MemoryStore {
        async fn insert_statement(&self, statement: Statement) -> Result<(), StoreError> {
            self.state
                .lock()
                .unwrap()
                .statements
                .insert(statement.id.clone(), statement);
            Ok(())
        }

        async fn fetch_statement(&self, id: &StatementId) -> Result<Statement, StoreError> {
            self.state
                .lock()
                .unwrap()
                .statements
                .get(id)
                .cloned()
                .ok_or_else(|| StoreError::not_found(format!("statement {id}")))
        }

        async fn update_statement(&self, statement: Statement) -> Result<(), StoreError> {
            self.state
                .lock()
                .unwrap()
                .statements
                .insert(statement.id.clone(), statement);
            Ok(())
        }

        async fn delete_statement(&self, id: &StatementId) -> Result<(), StoreError> {
            self.state.lock().unwrap().statements.remove(id);
            Ok(())
        }

        async fn statements_for_case(
            &self,
            case_id: &CaseId,
        ) -> Result<Vec<Statement>, StoreError> {
            Ok(self
                .state
                .lock()
                .unwrap()
                .statements
                .values()
                .filter(|s| &s.case_id == case_id)
                .cloned()
                .collect())
        }
    }

    #[async_trait]
    impl OptionSetRepository for MemoryStore {
        async fn insert_active_set(
            &self,
            set: SettlementOptionSet,
            now: DateTime<Utc>,
        ) -> Result<(), StoreError> {
            let mut state = self.state.lock().unwrap();
            for existing in state.sets.values_mut() {
                if existing.case_id == set.case_id && existing.status == OptionSetStatus::Active {
                    if existing.is_expired(now) {
                        existing.mark_superseded();
                    } else {
                        return Err(StoreError::ActiveSetExists(set.case_id.clone()));
                    }
                }
            }
            state.sets.insert(set.id.clone(), set);
            Ok(())
        }

        async fn fetch_set(&self, id: &OptionSetId) -> Result<SettlementOptionSet, StoreError> {
            self.state
                .lock()
                .unwrap()
                .sets
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
                .state
                .lock()
                .unwrap()
                .sets
                .values()
                .filter(|s| &s.case_id == case_id && s.is_selectable(now))
                .max_by_key(|s| s.generated_at)
                .cloned())
        }

        async fn expire_stale(
            &self,
            now: DateTime<Utc>,
        ) -> Result<Vec<SettlementOptionSet>, StoreError> {
            let mut state = self.state.lock().unwrap();
            let mut flipped = Vec::new();
            for set in state.sets.values_mut() {
                if set.status == OptionSetStatus::Active && set.is_expired(now) {
                    set.mark_expired();
                    flipped.push(set.clone());
                }
            }
            Ok(flipped)
        }
    }

    #[async_trait]
    impl SelectionRepository for MemoryStore {
        async fn upsert_selection(&self, selection: Selection) -> Result<Selection, StoreError> {
            let key = (selection.option_set_id.clone(), selection.party_id.clone());
            self.state
                .lock()
                .unwrap()
                .selections
                .insert(key, selection.clone());
            Ok(selection)
        }

        async fn selections_for_set(
            &self,
            option_set_id: &OptionSetId,
        ) -> Result<Vec<Selection>, StoreError> {
            Ok(self
                .state
                .lock()
                .unwrap()
                .selections
                .values()
                .filter(|s| &s.option_set_id == option_set_id)
                .cloned()
                .collect())
        }
    }

    #[async_trait]
    impl SolutionRepository for MemoryStore {
        async fn append_solution(&self, solution: CombinedSolution) -> Result<(), StoreError> {
            self.state.lock().unwrap().solutions.push(solution);
            Ok(())
        }

        async fn solutions_for_case(
            &self,
            case_id: &CaseId,
        ) -> Result<Vec<CombinedSolution>, StoreError> {
            Ok(self
                .state
                .lock()
                .unwrap()
                .solutions
                .iter()
                .filter(|s| &s.case_id == case_id)
                .cloned()
                .collect())
        }
    }

    #[async_trait]
    impl TimelineRepository for MemoryStore {
        async fn append_event(&self, event: TimelineEvent) -> Result<(), StoreError> {
            self.state.lock().unwrap().events.push(event);
            Ok(())
        }

        async fn events_for_case(
            &self,
            case_id: &CaseId,
        ) -> Result<Vec<TimelineEvent>, StoreError> {
            Ok(self
                .state
                .lock()
                .unwrap()
                .events
                .iter()
                .filter(|e| &e.case_id == case_id)
                .cloned()
                .collect())
        }
    }

    /// Gateway returning scripted responses, counting calls.
    pub(crate) struct StubGateway {
        responses: Mutex<VecDeque<Result<String, ReasoningError>>>,
        calls: AtomicUsize,
    }

    impl StubGateway {
        pub fn with_responses(
            responses: Vec<Result<String, ReasoningError>>,
        ) -> Self {
            Self {
                responses: Mutex::new(VecDeque::from(responses)),
                calls: AtomicUsize::new(0),
            }
        }

        pub fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ReasoningGateway for StubGateway {
        async fn complete(&self, _request: ReasoningRequest) -> Result<String, ReasoningError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(ReasoningError::Other("no scripted response".to_string())))
        }
    }
}
