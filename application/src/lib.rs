//! Application layer for accord
//!
//! This crate contains use cases and port definitions. It depends only on
//! the domain layer; adapters for the ports live in the infrastructure
//! layer.
//!
//! Callers drive the engine through
//! [`CaseLifecycleController`]. The services it composes enforce
//! their own invariants, but the controller is the only component that
//! moves a case through its stages.

pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use ports::{
    datastore::{
        CaseRepository, NegotiationStore, OptionSetRepository, SelectionRepository,
        SolutionRepository, StatementRepository, StoreError, TimelineRepository,
    },
    reasoning_gateway::{ReasoningError, ReasoningGateway, ReasoningRequest},
    timeline_sink::{NoSink, TimelineSink},
};
pub use use_cases::{
    case_controller::{CaseFlowError, CaseLifecycleController},
    options::{OptionSetError, OptionSetService},
    reconcile::{ReconcileError, ReconcileUseCase},
    selections::{SelectionError, SelectionService},
    statements::{StatementError, StatementService},
};
