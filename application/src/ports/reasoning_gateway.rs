//! Reasoning gateway port
//!
//! Defines the interface to the external reasoning service. The service is
//! a fallible black box: it may answer with structured JSON, with prose, or
//! not at all. The engine makes exactly one call per operation; retries
//! are a caller decision, never hidden in here.

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur when calling the reasoning service.
///
/// All of these surface synchronously to the caller; none is retried
/// internally. A malformed-but-delivered response is *not* an error at this
/// level: the raw text is returned and the caller decides what to do.
#[derive(Error, Debug)]
pub enum ReasoningError {
    #[error("reasoning service timed out")]
    Timeout,

    #[error("transport failure: {0}")]
    Transport(String),

    #[error("reasoning service unavailable: {0}")]
    Unavailable(String),

    #[error("other reasoning error: {0}")]
    Other(String),
}

impl ReasoningError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, ReasoningError::Timeout)
    }
}

/// One request to the reasoning service
#[derive(Debug, Clone)]
pub struct ReasoningRequest {
    pub system_prompt: String,
    pub prompt: String,
}

impl ReasoningRequest {
    pub fn new(system_prompt: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            prompt: prompt.into(),
        }
    }
}

/// Gateway to the external reasoning service
///
/// Implementations (adapters) live in the infrastructure layer and must
/// bound the call with a configured timeout. There is no streaming and no
/// cancellation signal; the timeout is the only bound.
#[async_trait]
pub trait ReasoningGateway: Send + Sync {
    /// Send one prompt and return the raw response text.
    async fn complete(&self, request: ReasoningRequest) -> Result<String, ReasoningError>;
}
