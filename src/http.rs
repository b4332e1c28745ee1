//! HTTP client implementation for the kbview crate
//!
//! This module provides the JSON transport used to talk to the knowledge-base
//! service: URL building, bearer authentication, the `{ code, msg, data }`
//! response envelope and retrying of rate-limited requests.

use crate::config::ClientConfig;
use crate::error::{Error, Result};
use rand::{Rng, thread_rng};
use reqwest::{Client as ReqwestClient, RequestBuilder, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, error, instrument, warn};
use url::Url;

/// Path prefix of every API route
const API_PREFIX: [&str; 2] = ["api", "v1"];

/// Upper bound for a single backoff sleep in seconds
const MAX_BACKOFF_SECS: u64 = 60;

/// HTTP client for making requests to the knowledge-base API
///
/// Cloning is cheap; clones share the underlying connection pool.
///
/// # Examples
///
/// ```no_run
/// use kbview::config::ClientConfig;
/// use kbview::http::HttpClient;
///
/// let config = ClientConfig::builder()
///     .base_url("http://127.0.0.1:5300")
///     .token(Some("your-token".to_string()))
///     .build()
///     .unwrap();
/// let client = HttpClient::new(config).unwrap();
/// ```
#[derive(Clone)]
pub struct HttpClient {
    /// The underlying reqwest client
    client: ReqwestClient,

    /// Base URL for API requests
    base_url: Url,

    /// Bearer token for authentication
    token: Option<String>,

    /// Whether to automatically retry requests when rate limited
    retry_on_rate_limit: bool,

    /// Maximum number of retry attempts for rate-limited requests
    max_retries: u32,

    /// Default retry delay in seconds if no Retry-After header is provided
    default_retry_after_secs: u64,
}

impl HttpClient {
    /// Create a new HTTP client from a resolved configuration
    pub fn new(config: ClientConfig) -> Result<Self> {
        let client = ReqwestClient::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.clone())
            .build()?;

        let base_url = Url::parse(&config.base_url)
            .map_err(|e| Error::Config(format!("Invalid base URL: {}", e)))?;
        if base_url.cannot_be_a_base() {
            return Err(Error::Config(format!(
                "Base URL cannot carry a path: {}",
                config.base_url
            )));
        }

        Ok(Self {
            client,
            base_url,
            token: config.token,
            retry_on_rate_limit: config.retry_on_rate_limit,
            max_retries: config.max_retries,
            default_retry_after_secs: config.default_retry_after_secs,
        })
    }

    /// Base URL this client talks to
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Build an API URL from path segments; each segment is percent-encoded
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| Error::Config("Base URL cannot carry a path".to_string()))?;
            path.pop_if_empty();
            path.extend(API_PREFIX);
            path.extend(segments);
        }
        Ok(url)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Send a GET request and decode the response payload
    #[instrument(skip(self), level = "debug")]
    pub async fn get<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T> {
        let url = self.endpoint(segments)?;
        debug!("Sending GET request to {}", url.path());
        let request = self.authorize(self.client.get(url));
        self.execute_request(request).await
    }

    /// Send a POST request with a JSON body and decode the response payload
    #[instrument(skip(self, body), level = "debug")]
    pub async fn post<T: DeserializeOwned, B: Serialize + std::fmt::Debug>(
        &self,
        segments: &[&str],
        body: &B,
    ) -> Result<T> {
        let url = self.endpoint(segments)?;
        debug!("Sending POST request to {}", url.path());
        let request = self.authorize(self.client.post(url).json(body));
        self.execute_request(request).await
    }

    /// Backoff for the given attempt: `base * 2^(attempt-1)` with ±20% jitter
    fn backoff_secs(base_delay: u64, attempt: u32) -> u64 {
        let exp_factor = 2u64.saturating_pow(attempt.saturating_sub(1));
        let mut delay = base_delay.saturating_mul(exp_factor);
        if delay > 1 {
            let jitter_factor = thread_rng().gen_range(0.8..1.2);
            delay = ((delay as f64) * jitter_factor) as u64;
        }
        delay.min(MAX_BACKOFF_SECS)
    }

    /// Execute an HTTP request and handle the response
    async fn execute_request<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let mut attempts = 0;

        loop {
            let request_clone = request
                .try_clone()
                .ok_or_else(|| Error::Other("Failed to clone request for retry".to_string()))?;

            let response = request_clone.send().await?;
            let status = response.status();

            if status == StatusCode::TOO_MANY_REQUESTS {
                attempts += 1;

                let retry_after = response
                    .headers()
                    .get("retry-after")
                    .and_then(|h| h.to_str().ok())
                    .and_then(|s| s.parse::<u64>().ok())
                    .unwrap_or(self.default_retry_after_secs);

                let response_text = response.text().await?;
                warn!("Rate limited: {} - {}", status, response_text);

                if self.retry_on_rate_limit && attempts <= self.max_retries {
                    let delay = Self::backoff_secs(retry_after, attempts);
                    debug!(
                        "Retrying after {} seconds (attempt {}/{})",
                        delay, attempts, self.max_retries
                    );
                    tokio::time::sleep(Duration::from_secs(delay)).await;
                    continue;
                }

                return Err(Error::RateLimit {
                    retry_after_secs: retry_after,
                });
            }

            let response_text = response.text().await?;

            if status.is_success() {
                return decode_payload(&response_text);
            }

            error!("API error: {} - {}", status, response_text);
            return Err(match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                    Error::Auth("Invalid or missing access token".to_string())
                }
                _ => Error::Api {
                    status_code: status.as_u16(),
                    message: envelope_message(&response_text).unwrap_or(response_text),
                },
            });
        }
    }
}

/// True when a JSON object looks like a `{ code, msg, data }` envelope
fn is_envelope(value: &Value) -> bool {
    value
        .as_object()
        .is_some_and(|obj| obj.get("code").is_some_and(Value::is_i64) && obj.contains_key("msg"))
}

/// Pull the `msg` out of an error envelope, if the body is one
fn envelope_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    if !is_envelope(&value) {
        return None;
    }
    value.get("msg")?.as_str().map(str::to_string)
}

/// Decode a successful response body, unwrapping the envelope when present
fn decode_payload<T: DeserializeOwned>(body: &str) -> Result<T> {
    let value: Value = serde_json::from_str(body).map_err(|e| {
        error!("Failed to parse response: {}", e);
        Error::UnexpectedResponse(format!("Failed to parse response: {}", e))
    })?;

    let payload = if is_envelope(&value) {
        let code = value.get("code").and_then(Value::as_i64).unwrap_or_default();
        if code != 0 {
            let message = value
                .get("msg")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            return Err(Error::Api {
                status_code: u16::try_from(code).unwrap_or(u16::MAX),
                message,
            });
        }
        value.get("data").cloned().unwrap_or(Value::Null)
    } else {
        value
    };

    serde_json::from_value(payload).map_err(|e| {
        error!("Failed to decode payload: {}", e);
        Error::Json(e)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct TestResponse {
        message: String,
    }

    fn client_for(server: &mockito::ServerGuard, token: Option<&str>) -> HttpClient {
        let config = ClientConfig::builder()
            .base_url(server.url())
            .token(token.map(str::to_string))
            .default_retry_after_secs(0)
            .build()
            .unwrap();
        HttpClient::new(config).unwrap()
    }

    #[test]
    fn test_endpoint_encodes_segments() {
        let config = ClientConfig::builder()
            .base_url("http://localhost:5300/prefix")
            .build()
            .unwrap();
        let client = HttpClient::new(config).unwrap();

        let url = client.endpoint(&["knowledge", "bases", "a b/c"]).unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:5300/prefix/api/v1/knowledge/bases/a%20b%2Fc"
        );
    }

    #[tokio::test]
    async fn test_get_request_unwraps_envelope() {
        let mut server = Server::new_async().await;
        let mock_server = server
            .mock("GET", "/api/v1/test")
            .match_header("authorization", "Bearer test-token")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"code": 0, "msg": "ok", "data": {"message": "success"}}"#)
            .expect(1)
            .create_async()
            .await;

        let client = client_for(&server, Some("test-token"));

        let response: TestResponse = client.get(&["test"]).await.unwrap();
        assert_eq!(response.message, "success");

        mock_server.assert_async().await;
    }

    #[tokio::test]
    async fn test_post_request_accepts_bare_body() {
        let mut server = Server::new_async().await;
        let mock_server = server
            .mock("POST", "/api/v1/test")
            .match_body(mockito::Matcher::Json(serde_json::json!({"test": "data"})))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"message": "success"}"#)
            .expect(1)
            .create_async()
            .await;

        let client = client_for(&server, None);

        let body = serde_json::json!({"test": "data"});
        let response: TestResponse = client.post(&["test"], &body).await.unwrap();
        assert_eq!(response.message, "success");

        mock_server.assert_async().await;
    }

    #[tokio::test]
    async fn test_envelope_error_code() {
        let mut server = Server::new_async().await;
        let mock_server = server
            .mock("GET", "/api/v1/test")
            .with_status(200)
            .with_body(r#"{"code": 404, "msg": "knowledge base not found", "data": null}"#)
            .create_async()
            .await;

        let client = client_for(&server, None);

        let result: Result<TestResponse> = client.get(&["test"]).await;
        match result {
            Err(Error::Api {
                status_code,
                message,
            }) => {
                assert_eq!(status_code, 404);
                assert_eq!(message, "knowledge base not found");
            }
            other => panic!("expected API error, got {:?}", other),
        }

        mock_server.assert_async().await;
    }

    #[tokio::test]
    async fn test_unauthorized_maps_to_auth_error() {
        let mut server = Server::new_async().await;
        let mock_server = server
            .mock("GET", "/api/v1/test")
            .with_status(401)
            .with_body("Unauthorized")
            .create_async()
            .await;

        let client = client_for(&server, Some("bad-token"));

        let result: Result<TestResponse> = client.get(&["test"]).await;
        assert!(matches!(result, Err(Error::Auth(_))));

        mock_server.assert_async().await;
    }

    #[tokio::test]
    async fn test_server_error_keeps_status_and_body() {
        let mut server = Server::new_async().await;
        let mock_server = server
            .mock("GET", "/api/v1/test")
            .with_status(500)
            .with_body("boom")
            .create_async()
            .await;

        let client = client_for(&server, None);

        let result: Result<TestResponse> = client.get(&["test"]).await;
        match result {
            Err(Error::Api {
                status_code,
                message,
            }) => {
                assert_eq!(status_code, 500);
                assert_eq!(message, "boom");
            }
            other => panic!("expected API error, got {:?}", other),
        }

        mock_server.assert_async().await;
    }

    #[tokio::test]
    async fn test_malformed_body_is_unexpected_response() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/v1/test")
            .with_status(200)
            .with_body("<html>not json</html>")
            .create_async()
            .await;

        let client = client_for(&server, None);

        let result: Result<TestResponse> = client.get(&["test"]).await;
        assert!(matches!(result, Err(Error::UnexpectedResponse(_))));
    }

    #[tokio::test]
    async fn test_payload_shape_mismatch_is_json_error() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/v1/test")
            .with_status(200)
            .with_body(r#"{"code": 0, "msg": "ok", "data": {"unexpected": true}}"#)
            .create_async()
            .await;

        let client = client_for(&server, None);

        let result: Result<TestResponse> = client.get(&["test"]).await;
        assert!(matches!(result, Err(Error::Json(_))));
    }

    #[tokio::test]
    async fn test_rate_limit_retry_success() {
        let mut server = Server::new_async().await;

        let mock_rate_limit = server
            .mock("GET", "/api/v1/test")
            .with_status(429)
            .with_header("retry-after", "0")
            .with_body("slow down")
            .expect(1)
            .create_async()
            .await;

        let mock_success = server
            .mock("GET", "/api/v1/test")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"message": "success after retry"}"#)
            .expect(1)
            .create_async()
            .await;

        let client = client_for(&server, None);

        let response: TestResponse = client.get(&["test"]).await.unwrap();
        assert_eq!(response.message, "success after retry");

        mock_rate_limit.assert_async().await;
        mock_success.assert_async().await;
    }

    #[tokio::test]
    async fn test_rate_limit_max_retries_exceeded() {
        let mut server = Server::new_async().await;

        let mock_rate_limit = server
            .mock("GET", "/api/v1/test")
            .with_status(429)
            .with_header("retry-after", "0")
            .with_body("slow down")
            .expect(2)
            .create_async()
            .await;

        let config = ClientConfig::builder()
            .base_url(server.url())
            .max_retries(1)
            .build()
            .unwrap();
        let client = HttpClient::new(config).unwrap();

        let result: Result<TestResponse> = client.get(&["test"]).await;
        assert!(matches!(
            result,
            Err(Error::RateLimit {
                retry_after_secs: 0
            })
        ));

        mock_rate_limit.assert_async().await;
    }

    #[test]
    fn test_backoff_is_capped() {
        assert_eq!(HttpClient::backoff_secs(0, 3), 0);
        assert_eq!(HttpClient::backoff_secs(1, 1), 1);
        assert!(HttpClient::backoff_secs(50, 5) <= MAX_BACKOFF_SECS);
    }
}
