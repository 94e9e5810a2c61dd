//! Consensus evaluation over the two parties' selections.
//!
//! Pure domain logic: the report never mutates anything, and the lifecycle
//! controller decides what to do with it.

use super::entities::Selection;
use serde::{Deserialize, Serialize};

/// Snapshot of where the two parties stand on one option set.
///
/// `same_option` compares variant identifiers only. Two variants with
/// identical terms but different ids do not agree; ids are the canonical
/// reference, and there is no tie-break.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsensusReport {
    /// Both roles have a selection on the set
    pub both_selected: bool,
    /// `both_selected` and the two variant ids are equal
    pub same_option: bool,
    /// The selections that exist, in (complainant, respondent) order
    pub selections: Vec<Selection>,
}

impl ConsensusReport {
    /// Evaluate the two roles' current selections.
    pub fn evaluate(
        complainant: Option<&Selection>,
        respondent: Option<&Selection>,
    ) -> Self {
        let both_selected = complainant.is_some() && respondent.is_some();
        let same_option = match (complainant, respondent) {
            (Some(a), Some(b)) => a.variant_id == b.variant_id,
            _ => false,
        };
        let selections = [complainant, respondent]
            .into_iter()
            .flatten()
            .cloned()
            .collect();

        Self {
            both_selected,
            same_option,
            selections,
        }
    }

    /// Both parties locked onto the identical variant
    pub fn is_consensus(&self) -> bool {
        self.both_selected && self.same_option
    }

    /// Both parties selected, but different variants
    pub fn is_divergence(&self) -> bool {
        self.both_selected && !self.same_option
    }
}
