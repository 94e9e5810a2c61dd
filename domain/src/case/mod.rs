//! Case aggregate: the filed dispute, its two parties, and the stage machine.

pub mod entities;
pub mod stage;

pub use entities::{Case, Party, PartyRole};
pub use stage::CaseStage;
