//! Party statements and their mutation windows.

use crate::core::error::NegotiationError;
use crate::core::ids::{CaseId, PartyId, StatementId};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Statements may be edited for this long after creation
pub const EDIT_WINDOW_MINUTES: i64 = 15;

/// Statements may be deleted for this long after creation
pub const DELETE_WINDOW_MINUTES: i64 = 5;

/// One party's narrative of the dispute.
///
/// A statement belongs to the submitting party until finalized, and is
/// immutable thereafter. Both mutation windows are measured from
/// `created_at`; editing does not reopen them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Statement {
    pub id: StatementId,
    pub case_id: CaseId,
    pub party_id: PartyId,
    pub content: String,
    pub finalized: bool,
    pub created_at: DateTime<Utc>,
    pub edited_at: Option<DateTime<Utc>>,
}

impl Statement {
    pub fn new(
        case_id: CaseId,
        party_id: PartyId,
        content: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: StatementId::generate(),
            case_id,
            party_id,
            content: content.into(),
            finalized: false,
            created_at: now,
            edited_at: None,
        }
    }

    /// Check that the caller authored this statement
    pub fn authorize(&self, caller: &PartyId) -> Result<(), NegotiationError> {
        if &self.party_id == caller {
            Ok(())
        } else {
            Err(NegotiationError::NotOwner)
        }
    }

    pub fn within_edit_window(&self, now: DateTime<Utc>) -> bool {
        now - self.created_at <= Duration::minutes(EDIT_WINDOW_MINUTES)
    }

    pub fn within_delete_window(&self, now: DateTime<Utc>) -> bool {
        now - self.created_at <= Duration::minutes(DELETE_WINDOW_MINUTES)
    }

    /// Validate an edit attempt: ownership, then finalization, then window.
    pub fn check_editable(
        &self,
        caller: &PartyId,
        now: DateTime<Utc>,
    ) -> Result<(), NegotiationError> {
        self.authorize(caller)?;
        if self.finalized {
            return Err(NegotiationError::AlreadyFinalized);
        }
        if !self.within_edit_window(now) {
            return Err(NegotiationError::EditWindowExpired);
        }
        Ok(())
    }

    /// Validate a delete attempt.
    pub fn check_deletable(
        &self,
        caller: &PartyId,
        now: DateTime<Utc>,
    ) -> Result<(), NegotiationError> {
        self.authorize(caller)?;
        if self.finalized {
            return Err(NegotiationError::AlreadyFinalized);
        }
        if !self.within_delete_window(now) {
            return Err(NegotiationError::DeleteWindowExpired);
        }
        Ok(())
    }

    /// Replace the content. `created_at` is preserved so the windows keep
    /// counting from the original submission.
    pub fn apply_edit(&mut self, content: impl Into<String>, now: DateTime<Utc>) {
        self.content = content.into();
        self.edited_at = Some(now);
    }

    /// Irreversibly lock the statement. Subsequent edit/delete attempts
    /// fail with [`NegotiationError::AlreadyFinalized`].
    pub fn finalize(&mut self, caller: &PartyId) -> Result<(), NegotiationError> {
        self.authorize(caller)?;
        if self.finalized {
            return Err(NegotiationError::AlreadyFinalized);
        }
        self.finalized = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn statement_at(created_at: DateTime<Utc>) -> Statement {
        Statement::new(
            CaseId::new("case_1"),
            PartyId::new("party_a"),
            "The deposit was never returned.",
            created_at,
        )
    }

    #[test]
    fn test_edit_allowed_inside_window() {
        let t0 = Utc::now();
        let stmt = statement_at(t0);
        let author = PartyId::new("party_a");
        assert!(stmt.check_editable(&author, t0 + Duration::minutes(10)).is_ok());
        assert!(stmt.check_editable(&author, t0 + Duration::minutes(15)).is_ok());
    }

    #[test]
    fn test_edit_rejected_after_window() {
        let t0 = Utc::now();
        let stmt = statement_at(t0);
        let author = PartyId::new("party_a");
        let err = stmt
            .check_editable(&author, t0 + Duration::minutes(16))
            .unwrap_err();
        assert_eq!(err, NegotiationError::EditWindowExpired);
    }

    #[test]
    fn test_delete_window_is_shorter() {
        let t0 = Utc::now();
        let stmt = statement_at(t0);
        let author = PartyId::new("party_a");
        assert!(stmt.check_deletable(&author, t0 + Duration::minutes(5)).is_ok());
        let err = stmt
            .check_deletable(&author, t0 + Duration::minutes(6))
            .unwrap_err();
        assert_eq!(err, NegotiationError::DeleteWindowExpired);
    }

    #[test]
    fn test_windows_measured_from_creation_not_last_edit() {
        let t0 = Utc::now();
        let mut stmt = statement_at(t0);
        let author = PartyId::new("party_a");

        stmt.apply_edit("Updated narrative.", t0 + Duration::minutes(14));
        assert_eq!(stmt.created_at, t0);

        // the edit at +14min does not extend the window past +15min
        let err = stmt
            .check_editable(&author, t0 + Duration::minutes(16))
            .unwrap_err();
        assert_eq!(err, NegotiationError::EditWindowExpired);
    }

    #[test]
    fn test_non_author_is_rejected_before_window_checks() {
        let t0 = Utc::now();
        let stmt = statement_at(t0);
        let stranger = PartyId::new("party_b");
        assert_eq!(
            stmt.check_editable(&stranger, t0).unwrap_err(),
            NegotiationError::NotOwner
        );
        assert_eq!(
            stmt.check_deletable(&stranger, t0).unwrap_err(),
            NegotiationError::NotOwner
        );
    }

    #[test]
    fn test_finalize_is_irreversible() {
        let t0 = Utc::now();
        let mut stmt = statement_at(t0);
        let author = PartyId::new("party_a");

        stmt.finalize(&author).unwrap();
        assert!(stmt.finalized);

        // even inside the windows, a finalized statement cannot change
        assert_eq!(
            stmt.check_editable(&author, t0).unwrap_err(),
            NegotiationError::AlreadyFinalized
        );
        assert_eq!(
            stmt.check_deletable(&author, t0).unwrap_err(),
            NegotiationError::AlreadyFinalized
        );
        assert_eq!(
            stmt.finalize(&author).unwrap_err(),
            NegotiationError::AlreadyFinalized
        );
    }

    #[test]
    fn test_edit_replaces_content_and_stamps_edited_at() {
        let t0 = Utc::now();
        let mut stmt = statement_at(t0);
        let t1 = t0 + Duration::minutes(2);
        stmt.apply_edit("Corrected amount: 1200 EUR.", t1);
        assert_eq!(stmt.content, "Corrected amount: 1200 EUR.");
        assert_eq!(stmt.edited_at, Some(t1));
    }
}
