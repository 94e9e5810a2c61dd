//! Identifier value objects.
//!
//! Every persisted entity is keyed by a string newtype. IDs are opaque:
//! equality is byte equality and nothing else. Consensus detection in
//! particular compares [`VariantId`]s by identifier, never by option content.

use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($(#[$doc:meta])* $name:ident, $prefix:literal) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(String);

        impl $name {
            /// Creates an identifier from an existing string.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Generates a new unique identifier.
            pub fn generate() -> Self {
                Self(format!("{}_{}", $prefix, uuid_v4()))
            }

            /// Returns the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl<T: Into<String>> From<T> for $name {
            fn from(s: T) -> Self {
                Self::new(s)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_newtype!(
    /// Unique identifier for a filed case.
    CaseId,
    "case"
);

id_newtype!(
    /// Unique identifier for a party within a case.
    PartyId,
    "party"
);

id_newtype!(
    /// Unique identifier for a party statement.
    StatementId,
    "stmt"
);

id_newtype!(
    /// Unique identifier for a settlement option set.
    OptionSetId,
    "optset"
);

id_newtype!(
    /// Identifier for one option variant within a set.
    ///
    /// Variant IDs are the canonical reference for selections: two variants
    /// with identical terms but different IDs are different options.
    VariantId,
    "opt"
);

id_newtype!(
    /// Unique identifier for a combined solution.
    SolutionId,
    "sol"
);

id_newtype!(
    /// Unique identifier for a timeline event.
    EventId,
    "evt"
);

/// Generate a simple UUID v4 (without external dependency)
fn uuid_v4() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};

    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();

    // Simple pseudo-random based on time
    let nanos = now.as_nanos();
    format!(
        "{:08x}-{:04x}-4{:03x}-{:04x}-{:012x}",
        (nanos >> 96) as u32,
        (nanos >> 80) as u16,
        (nanos >> 64) as u16 & 0x0fff,
        ((nanos >> 48) as u16 & 0x3fff) | 0x8000,
        (nanos & 0xffffffffffff) as u64
    )
}
