//! Party selections against an option set.

use crate::core::ids::{OptionSetId, PartyId, VariantId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One party's current choice on one option set.
///
/// Keyed by `(option_set_id, party_id)`: a party has at most one selection
/// per set. Re-selecting replaces the variant, the reasoning, and the
/// timestamp in place; history is not kept.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Selection {
    pub option_set_id: OptionSetId,
    pub party_id: PartyId,
    pub variant_id: VariantId,
    pub reasoning: Option<String>,
    pub selected_at: DateTime<Utc>,
}

impl Selection {
    pub fn new(
        option_set_id: OptionSetId,
        party_id: PartyId,
        variant_id: VariantId,
        reasoning: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            option_set_id,
            party_id,
            variant_id,
            reasoning,
            selected_at: now,
        }
    }

    /// Replace this selection with a newer choice by the same party.
    pub fn revise(
        &mut self,
        variant_id: VariantId,
        reasoning: Option<String>,
        now: DateTime<Utc>,
    ) {
        self.variant_id = variant_id;
        self.reasoning = reasoning;
        self.selected_at = now;
    }
}
