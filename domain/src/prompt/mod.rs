//! Prompt construction for the external reasoning service.

pub mod template;

pub use template::PromptTemplate;
