//! HTTP adapter for the external reasoning service.
//!
//! Posts the prompt as JSON and returns the response text. The configured
//! timeout is the only bound on the call; timeouts and transport failures
//! surface synchronously as [`ReasoningError`] and are never retried here.

use crate::config::file_config::ReasoningConfig;
use accord_application::ports::reasoning_gateway::{
    ReasoningError, ReasoningGateway, ReasoningRequest,
};
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

/// Reasoning gateway over HTTP
pub struct HttpReasoningGateway {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl HttpReasoningGateway {
    /// Build a gateway from configuration. The request timeout is baked
    /// into the client.
    pub fn new(config: &ReasoningConfig) -> Result<Self, ReasoningError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ReasoningError::Other(format!("could not build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ReasoningGateway for HttpReasoningGateway {
    async fn complete(&self, request: ReasoningRequest) -> Result<String, ReasoningError> {
        debug!("posting reasoning request to {}", self.endpoint);

        let mut http_request = self.client.post(&self.endpoint).json(&serde_json::json!({
            "system": request.system_prompt,
            "prompt": request.prompt,
        }));
        if let Some(key) = &self.api_key {
            http_request = http_request.bearer_auth(key);
        }

        let response = http_request.send().await.map_err(|e| {
            if e.is_timeout() {
                ReasoningError::Timeout
            } else {
                ReasoningError::Transport(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ReasoningError::Unavailable(format!(
                "HTTP {} {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unknown")
            )));
        }

        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                ReasoningError::Timeout
            } else {
                ReasoningError::Transport(e.to_string())
            }
        })?;

        // services that wrap their answer in a JSON envelope get unwrapped;
        // anything else is returned verbatim ("raw text always acceptable")
        if let Ok(json) = serde_json::from_str::<serde_json::Value>(&body) {
            for key in ["text", "completion", "response"] {
                if let Some(text) = json.get(key).and_then(|v| v.as_str()) {
                    return Ok(text.to_string());
                }
            }
        }

        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gateway_builds_from_config() {
        let config = ReasoningConfig {
            endpoint: "http://127.0.0.1:9/never".to_string(),
            api_key: Some("secret".to_string()),
            timeout_secs: 1,
        };
        let gateway = HttpReasoningGateway::new(&config).unwrap();
        assert_eq!(gateway.endpoint(), "http://127.0.0.1:9/never");
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_transport_error() {
        // port 9 (discard) is not listening; the connect fails fast
        let config = ReasoningConfig {
            endpoint: "http://127.0.0.1:9/never".to_string(),
            api_key: None,
            timeout_secs: 1,
        };
        let gateway = HttpReasoningGateway::new(&config).unwrap();

        let err = gateway
            .complete(ReasoningRequest::new("system", "prompt"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ReasoningError::Transport(_) | ReasoningError::Timeout
        ));
    }
}
