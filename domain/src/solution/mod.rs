//! Combined solutions: reconciliation output and response parsing.

pub mod entities;
pub mod parsing;

pub use entities::{CombinedSolution, PartyConcession, ReconcileOutcome, SolutionDraft};
pub use parsing::{parse_option_variants, parse_solution, parse_solution_json};
