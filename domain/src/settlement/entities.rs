//! Settlement option sets and their variants.

use crate::core::ids::{CaseId, OptionSetId, VariantId};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Option sets expire this many days after generation unless configured otherwise
pub const DEFAULT_EXPIRY_DAYS: i64 = 7;

/// Status of a settlement option set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptionSetStatus {
    /// The set parties are currently selecting from
    Active,
    /// Past its expiry timestamp, flipped by the maintenance sweep
    Expired,
    /// Replaced by a newer generation
    Superseded,
}

impl OptionSetStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OptionSetStatus::Active => "active",
            OptionSetStatus::Expired => "expired",
            OptionSetStatus::Superseded => "superseded",
        }
    }
}

impl std::fmt::Display for OptionSetStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One candidate settlement term-set within a generated set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionVariant {
    pub id: VariantId,
    pub title: String,
    pub terms: String,
    pub rationale: String,
}

impl OptionVariant {
    pub fn new(
        id: impl Into<VariantId>,
        title: impl Into<String>,
        terms: impl Into<String>,
        rationale: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            terms: terms.into(),
            rationale: rationale.into(),
        }
    }
}

/// An AI-generated set of settlement options for a case.
///
/// At most one `Active` unexpired set exists per case at any instant; the
/// datastore's conditional insert is the authority on that invariant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettlementOptionSet {
    pub id: OptionSetId,
    pub case_id: CaseId,
    pub generated_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub status: OptionSetStatus,
    /// Ordered as generated; order is presentation order
    pub variants: Vec<OptionVariant>,
}

impl SettlementOptionSet {
    pub fn new(
        case_id: CaseId,
        variants: Vec<OptionVariant>,
        now: DateTime<Utc>,
        expiry_days: i64,
    ) -> Self {
        Self {
            id: OptionSetId::generate(),
            case_id,
            generated_at: now,
            expires_at: now + Duration::days(expiry_days),
            status: OptionSetStatus::Active,
            variants,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    /// Active and not past expiry
    pub fn is_selectable(&self, now: DateTime<Utc>) -> bool {
        self.status == OptionSetStatus::Active && !self.is_expired(now)
    }

    /// Flip an active set to `Expired`. No-op on sets that already left the
    /// active state, so the sweep can run repeatedly and concurrently.
    pub fn mark_expired(&mut self) {
        if self.status == OptionSetStatus::Active {
            self.status = OptionSetStatus::Expired;
        }
    }

    pub fn mark_superseded(&mut self) {
        if self.status == OptionSetStatus::Active {
            self.status = OptionSetStatus::Superseded;
        }
    }

    pub fn variant(&self, id: &VariantId) -> Option<&OptionVariant> {
        self.variants.iter().find(|v| &v.id == id)
    }
}
