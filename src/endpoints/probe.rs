/// Endpoint health probes
use super::Endpoint;
use async_trait::async_trait;
use reqwest::StatusCode;
use std::time::Duration;
use tracing::debug;

/// Identifier queried by probes; it never exists on the ledger
pub const HEALTH_CHECK_DID: &str = "did:cheqd:testnet:healthcheck";

/// gRPC status codes that prove the node answered the query
const GRPC_NOT_FOUND: i64 = 5;
const GRPC_INVALID_ARGUMENT: i64 = 3;

/// Decides whether an endpoint is serving requests
#[async_trait]
pub trait HealthProbe: Send + Sync {
    async fn probe(&self, endpoint: &Endpoint) -> bool;
}

/// Probe that asks the node's REST gateway for a nonexistent DID
pub struct HttpHealthProbe {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpHealthProbe {
    pub fn new(client: reqwest::Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    pub fn probe_url(endpoint: &Endpoint) -> String {
        format!("{}/cheqd/did/v2/{}/versions", endpoint.base_url(), HEALTH_CHECK_DID)
    }
}

#[async_trait]
impl HealthProbe for HttpHealthProbe {
    async fn probe(&self, endpoint: &Endpoint) -> bool {
        let response = match self
            .client
            .get(Self::probe_url(endpoint))
            .timeout(self.timeout)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                debug!("Health check failed for endpoint {}: connection failed: {}", endpoint.url, e);
                return false;
            }
        };

        let status = response.status();
        if status.is_success() {
            debug!("Health check passed for endpoint {}: service responded successfully", endpoint.url);
            return true;
        }

        let body: Option<serde_json::Value> = response.json().await.ok();
        let healthy = is_answered(status, body.as_ref());

        if healthy {
            debug!("Health check passed for endpoint {}: service responded with {}", endpoint.url, status);
        } else {
            debug!("Health check failed for endpoint {}: service error {}", endpoint.url, status);
        }
        healthy
    }
}

/// A "not found" or "invalid argument" answer means the node is up
pub(crate) fn is_answered(status: StatusCode, body: Option<&serde_json::Value>) -> bool {
    if status == StatusCode::NOT_FOUND || status == StatusCode::BAD_REQUEST {
        return true;
    }
    grpc_code(body).map_or(false, |code| code == GRPC_NOT_FOUND || code == GRPC_INVALID_ARGUMENT)
}

/// `code` field of a gRPC-gateway error body
pub(crate) fn grpc_code(body: Option<&serde_json::Value>) -> Option<i64> {
    body?.get("code")?.as_i64()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoints::EndpointRole;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn endpoint_for(server: &MockServer) -> Endpoint {
        Endpoint {
            url: server.address().to_string(),
            use_tls: false,
            timeout: Duration::from_secs(2),
            role: EndpointRole::Primary,
        }
    }

    #[test]
    fn test_is_answered() {
        assert!(is_answered(StatusCode::NOT_FOUND, None));
        assert!(is_answered(StatusCode::BAD_REQUEST, None));
        assert!(is_answered(
            StatusCode::INTERNAL_SERVER_ERROR,
            Some(&json!({"code": 5, "message": "not found"}))
        ));
        assert!(!is_answered(
            StatusCode::INTERNAL_SERVER_ERROR,
            Some(&json!({"code": 14, "message": "unavailable"}))
        ));
        assert!(!is_answered(StatusCode::BAD_GATEWAY, None));
    }

    #[tokio::test]
    async fn test_probe_not_found_is_healthy() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("/cheqd/did/v2/{}/versions", HEALTH_CHECK_DID)))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({"code": 5, "message": "not found"})))
            .mount(&server)
            .await;

        let probe = HttpHealthProbe::new(reqwest::Client::new(), Duration::from_secs(2));
        assert!(probe.probe(&endpoint_for(&server)).await);
    }

    #[tokio::test]
    async fn test_probe_server_error_is_unhealthy() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let probe = HttpHealthProbe::new(reqwest::Client::new(), Duration::from_secs(2));
        assert!(!probe.probe(&endpoint_for(&server)).await);
    }

    #[tokio::test]
    async fn test_probe_unreachable_is_unhealthy() {
        let endpoint = Endpoint {
            url: "127.0.0.1:9".to_string(),
            use_tls: false,
            timeout: Duration::from_millis(200),
            role: EndpointRole::Fallback,
        };
        let probe = HttpHealthProbe::new(reqwest::Client::new(), Duration::from_millis(200));
        assert!(!probe.probe(&endpoint).await);
    }
}
