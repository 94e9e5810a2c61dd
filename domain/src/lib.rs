//! Domain layer for accord
//!
//! This crate contains the core negotiation entities, invariants, and rules.
//! It has no dependencies on infrastructure concerns: no I/O, no async, no
//! clock: operations that depend on time take `now` as an argument.
//!
//! # Core Concepts
//!
//! ## Case lifecycle
//!
//! A case moves through an explicit stage machine ([`CaseStage`]); every
//! transition is validated against an allow-list and anything else fails
//! with [`NegotiationError::InvalidTransition`].
//!
//! ## Consensus / Divergence
//!
//! Once both parties select an option variant, [`ConsensusReport`] reports
//! whether they agreed. Agreement is by variant identifier only. Divergence
//! feeds the reconciliation step, whose output is the
//! [`ReconcileOutcome`] tagged union: structured when the reasoning
//! service cooperated, a verbatim raw fallback when it did not.

pub mod case;
pub mod core;
pub mod prompt;
pub mod selection;
pub mod settlement;
pub mod solution;
pub mod statement;
pub mod timeline;

// Re-export commonly used types
pub use case::{
    entities::{Case, Party, PartyRole},
    stage::CaseStage,
};
pub use crate::core::{
    error::NegotiationError,
    ids::{CaseId, EventId, OptionSetId, PartyId, SolutionId, StatementId, VariantId},
};
pub use prompt::PromptTemplate;
pub use selection::{consensus::ConsensusReport, entities::Selection};
pub use settlement::entities::{
    DEFAULT_EXPIRY_DAYS, OptionSetStatus, OptionVariant, SettlementOptionSet,
};
pub use solution::{
    entities::{CombinedSolution, PartyConcession, ReconcileOutcome, SolutionDraft},
    parsing::{parse_option_variants, parse_solution, parse_solution_json},
};
pub use statement::entities::{DELETE_WINDOW_MINUTES, EDIT_WINDOW_MINUTES, Statement};
pub use timeline::entities::{TimelineEvent, TimelineEventKind};
