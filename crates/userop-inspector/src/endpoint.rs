//! Rate-limited RPC endpoint validation.

use std::time::Duration;

use alloy_provider::{Provider, RootProvider};
use alloy_transport::TransportError;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::time::{Instant, sleep, timeout};
use tracing::{debug, info};

use crate::trace::parse_endpoint;

/// Default minimum spacing between validations
pub const DEFAULT_MIN_INTERVAL: Duration = Duration::from_millis(500);

/// Errors validating an RPC endpoint
#[derive(Debug, Error)]
pub enum EndpointError {
    #[error("Invalid RPC URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("RPC endpoint unreachable: {0}")]
    Unreachable(#[from] TransportError),

    #[error("Timeout on eth_chainId after {0:?}")]
    Timeout(Duration),
}

/// Checks an RPC URL by asking it for its chain id
///
/// Calls are spaced at least `min_interval` apart; a call arriving early waits
/// out the remainder instead of being dropped.
#[derive(Debug)]
pub struct EndpointValidator {
    min_interval: Duration,
    request_timeout: Duration,
    last_call: Mutex<Option<Instant>>,
}

impl EndpointValidator {
    /// Validator enforcing `min_interval` between calls
    pub fn new(min_interval: Duration, request_timeout: Duration) -> Self {
        Self { min_interval, request_timeout, last_call: Mutex::new(None) }
    }

    /// Chain id reported by `rpc_url`
    pub async fn validate(&self, rpc_url: &str) -> Result<u64, EndpointError> {
        let url = parse_endpoint(rpc_url)
            .map_err(|e| EndpointError::InvalidUrl { url: rpc_url.to_string(), reason: e.to_string() })?;

        {
            let mut last_call = self.last_call.lock().await;
            if let Some(remaining) =
                last_call.and_then(|at| self.min_interval.checked_sub(at.elapsed()))
            {
                debug!(target: "userop-endpoint", wait = ?remaining, "Throttling endpoint validation");
                sleep(remaining).await;
            }
            *last_call = Some(Instant::now());
        }

        let provider: RootProvider = RootProvider::new_http(url);
        let chain_id = timeout(self.request_timeout, provider.get_chain_id())
            .await
            .map_err(|_| EndpointError::Timeout(self.request_timeout))??;

        info!(target: "userop-endpoint", chain_id, "Validated RPC endpoint");
        Ok(chain_id)
    }
}

impl Default for EndpointValidator {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_INTERVAL, Duration::from_secs(30))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};
    use wiremock::matchers::{body_partial_json, method};
    use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

    use super::*;

    struct ChainId(&'static str);

    impl Respond for ChainId {
        fn respond(&self, request: &Request) -> ResponseTemplate {
            let body: Value = serde_json::from_slice(&request.body).unwrap_or_default();
            ResponseTemplate::new(200)
                .set_body_json(json!({ "jsonrpc": "2.0", "id": body["id"], "result": self.0 }))
        }
    }

    async fn base_node() -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({ "method": "eth_chainId" })))
            .respond_with(ChainId("0x2105"))
            .mount(&server)
            .await;
        server
    }

    #[tokio::test]
    async fn test_validate_returns_chain_id() {
        let server = base_node().await;
        let validator = EndpointValidator::default();
        assert_eq!(validator.validate(&server.uri()).await.unwrap(), 8453);
    }

    #[tokio::test]
    async fn test_calls_are_spaced() {
        let server = base_node().await;
        let interval = Duration::from_millis(300);
        let validator = EndpointValidator::new(interval, Duration::from_secs(5));

        let start = Instant::now();
        validator.validate(&server.uri()).await.unwrap();
        validator.validate(&server.uri()).await.unwrap();
        assert!(start.elapsed() >= interval);
    }

    #[tokio::test]
    async fn test_invalid_url() {
        let err = EndpointValidator::default().validate("localhost:8545").await.unwrap_err();
        assert!(matches!(err, EndpointError::InvalidUrl { .. }));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = EndpointValidator::default().validate(&server.uri()).await.unwrap_err();
        assert!(matches!(err, EndpointError::Unreachable(_)));
    }
}
