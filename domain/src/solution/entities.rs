//! Combined solutions produced by reconciliation.

use crate::case::entities::PartyRole;
use crate::core::ids::{CaseId, OptionSetId, SolutionId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What one side is asked to give up under a combined solution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartyConcession {
    pub role: PartyRole,
    pub items: Vec<String>,
}

impl PartyConcession {
    pub fn new(role: PartyRole, items: Vec<String>) -> Self {
        Self { role, items }
    }
}

/// Structured fields extracted from a reconciliation response, before they
/// are bound to a case. Produced by [`crate::solution::parsing`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolutionDraft {
    pub summary: String,
    pub terms: String,
    pub concessions: Vec<PartyConcession>,
    pub acceptance_probability: Option<f64>,
    pub legal_basis: Vec<String>,
}

/// A synthesized compromise proposal for a diverged case.
///
/// Solutions accumulate: a repeated reconciliation appends a new record and
/// leaves prior ones as history. When structured parsing of the reasoning
/// service's response failed, `raw_response` holds the verbatim text and the
/// structured fields are empty. That is a degraded result, not an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombinedSolution {
    pub id: SolutionId,
    pub case_id: CaseId,
    pub option_set_id: OptionSetId,
    pub summary: String,
    pub synthesized_terms: String,
    pub concessions: Vec<PartyConcession>,
    pub acceptance_probability: Option<f64>,
    pub legal_basis: Vec<String>,
    /// Verbatim service response; populated only on the degraded path
    pub raw_response: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl CombinedSolution {
    /// Bind a successfully parsed draft to its case and source option set.
    pub fn from_draft(
        case_id: CaseId,
        option_set_id: OptionSetId,
        draft: SolutionDraft,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: SolutionId::generate(),
            case_id,
            option_set_id,
            summary: draft.summary,
            synthesized_terms: draft.terms,
            concessions: draft.concessions,
            acceptance_probability: draft.acceptance_probability,
            legal_basis: draft.legal_basis,
            raw_response: None,
            created_at: now,
        }
    }

    /// Degraded record: the service answered, but not in a parseable shape.
    pub fn raw_fallback(
        case_id: CaseId,
        option_set_id: OptionSetId,
        raw: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: SolutionId::generate(),
            case_id,
            option_set_id,
            summary: String::new(),
            synthesized_terms: String::new(),
            concessions: Vec::new(),
            acceptance_probability: None,
            legal_basis: Vec::new(),
            raw_response: Some(raw.into()),
            created_at: now,
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.raw_response.is_some()
    }
}

/// Result of one reconciliation attempt.
///
/// Kept as an explicit tagged union so callers must acknowledge the
/// degraded path; parse failure is never an exception.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ReconcileOutcome {
    /// The response parsed into structured terms
    Structured(CombinedSolution),
    /// The response was kept verbatim as a raw fallback
    Raw(CombinedSolution),
}

impl ReconcileOutcome {
    pub fn solution(&self) -> &CombinedSolution {
        match self {
            ReconcileOutcome::Structured(s) | ReconcileOutcome::Raw(s) => s,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, ReconcileOutcome::Raw(_))
    }
}
