//! Statement entity and mutation-window rules.

pub mod entities;

pub use entities::{DELETE_WINDOW_MINUTES, EDIT_WINDOW_MINUTES, Statement};
