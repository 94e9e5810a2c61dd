//! Case and party entities.

use super::stage::CaseStage;
use crate::core::error::NegotiationError;
use crate::core::ids::{CaseId, PartyId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Role of a party within one case.
///
/// The role is fixed at case creation and stored on the row; it is never
/// re-derived from user identity at read time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartyRole {
    Complainant,
    Respondent,
}

impl PartyRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            PartyRole::Complainant => "complainant",
            PartyRole::Respondent => "respondent",
        }
    }

    /// The other side of the table
    pub fn counterpart(&self) -> PartyRole {
        match self {
            PartyRole::Complainant => PartyRole::Respondent,
            PartyRole::Respondent => PartyRole::Complainant,
        }
    }
}

impl std::fmt::Display for PartyRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One side of a dispute, scoped to a single case.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Party {
    pub id: PartyId,
    pub case_id: CaseId,
    pub role: PartyRole,
    /// Identity handle supplied by the authentication collaborator
    pub user_ref: String,
    /// Whether this party has engaged with the case at least once
    pub responded: bool,
}

impl Party {
    pub fn new(case_id: CaseId, role: PartyRole, user_ref: impl Into<String>) -> Self {
        Self {
            id: PartyId::generate(),
            case_id,
            role,
            user_ref: user_ref.into(),
            responded: false,
        }
    }

    pub fn mark_responded(&mut self) {
        self.responded = true;
    }
}

/// A filed dispute between a complainant and a respondent.
///
/// The case owns its stage: the only way to change it is
/// [`Case::transition_to`], which validates against the stage allow-list.
/// Reads never move the stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Case {
    pub id: CaseId,
    /// Human-facing reference number, assigned at filing
    pub reference: String,
    pub title: String,
    pub complainant: Party,
    pub respondent: Party,
    pub stage: CaseStage,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Case {
    /// File a new case. The complainant is the filer and counts as having
    /// engaged; the respondent's `responded` flag stays down until their
    /// first action.
    pub fn file(
        title: impl Into<String>,
        complainant_ref: impl Into<String>,
        respondent_ref: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        let id = CaseId::generate();
        let mut complainant = Party::new(id.clone(), PartyRole::Complainant, complainant_ref);
        complainant.mark_responded();
        let respondent = Party::new(id.clone(), PartyRole::Respondent, respondent_ref);
        let reference = Self::reference_number(&id, now);

        Self {
            id,
            reference,
            title: title.into(),
            complainant,
            respondent,
            stage: CaseStage::StatementPhase,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply a validated stage transition.
    ///
    /// Fails with [`NegotiationError::InvalidTransition`] and leaves the
    /// case untouched when the allow-list does not permit the move.
    pub fn transition_to(
        &mut self,
        to: CaseStage,
        now: DateTime<Utc>,
    ) -> Result<(), NegotiationError> {
        self.stage.check_transition(to)?;
        self.stage = to;
        self.updated_at = now;
        Ok(())
    }

    /// Look up a party of this case by id
    pub fn party(&self, party_id: &PartyId) -> Option<&Party> {
        [&self.complainant, &self.respondent]
            .into_iter()
            .find(|p| &p.id == party_id)
    }

    pub fn party_by_role(&self, role: PartyRole) -> &Party {
        match role {
            PartyRole::Complainant => &self.complainant,
            PartyRole::Respondent => &self.respondent,
        }
    }

    /// Role of the given party, if they belong to this case
    pub fn role_of(&self, party_id: &PartyId) -> Option<PartyRole> {
        self.party(party_id).map(|p| p.role)
    }

    /// Check that the caller is one of the two parties
    pub fn authorize_party(&self, party_id: &PartyId) -> Result<&Party, NegotiationError> {
        self.party(party_id).ok_or(NegotiationError::NotOwner)
    }

    fn reference_number(id: &CaseId, now: DateTime<Utc>) -> String {
        // e.g. "DSP-2026-4F2A9C1B": year plus a slice of the case id
        let tail: String = id
            .as_str()
            .chars()
            .rev()
            .filter(|c| c.is_ascii_alphanumeric())
            .take(8)
            .collect::<String>()
            .to_uppercase();
        format!("DSP-{}-{}", now.format("%Y"), tail)
    }
}
