//! Settlement option sets: generation output, expiry, and the active-set invariant.

pub mod entities;

pub use entities::{DEFAULT_EXPIRY_DAYS, OptionSetStatus, OptionVariant, SettlementOptionSet};
