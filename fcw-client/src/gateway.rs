//! Request gateway for the clustering service
//!
//! The only path to the remote service. Bodies are sent as JSON and every
//! failure, transport or HTTP, comes back as a single [`ApiError`].

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

const USER_AGENT: &str = concat!("fcw/", env!("CARGO_PKG_VERSION"));

/// Failure of a gateway call, carrying the best available message
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ApiError {
    pub message: String,
    /// HTTP status when the service answered, `None` for transport failures
    pub status: Option<u16>,
}

impl ApiError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: None,
        }
    }

    pub fn with_status(message: impl Into<String>, status: u16) -> Self {
        Self {
            message: message.into(),
            status: Some(status),
        }
    }
}

/// Outbound calls to the clustering service
#[async_trait]
pub trait ServiceGateway: Send + Sync {
    /// Issue `method` against `endpoint` with an optional JSON body
    async fn call(
        &self,
        endpoint: &str,
        method: Method,
        body: Option<Value>,
    ) -> Result<Value, ApiError>;
}

/// POST a typed body and decode a typed response through the gateway
pub async fn post_json<B, T>(
    gateway: &dyn ServiceGateway,
    endpoint: &str,
    body: &B,
) -> Result<T, ApiError>
where
    B: Serialize + ?Sized,
    T: DeserializeOwned,
{
    let body = serde_json::to_value(body)
        .map_err(|e| ApiError::new(format!("Failed to encode request: {}", e)))?;

    let value = gateway.call(endpoint, Method::POST, Some(body)).await?;

    serde_json::from_value(value)
        .map_err(|e| ApiError::new(format!("Unexpected response from {}: {}", endpoint, e)))
}

/// Pull a human-readable message out of an error body
///
/// Accepts `{"error": "text"}` and `{"error": {"message": "text"}}`.
pub fn error_message_from_body(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    let message = match value.get("error")? {
        Value::String(text) => text.clone(),
        Value::Object(inner) => inner.get("message")?.as_str()?.to_string(),
        _ => return None,
    };

    if message.trim().is_empty() {
        None
    } else {
        Some(message)
    }
}

/// reqwest-backed gateway
pub struct HttpGateway {
    http_client: reqwest::Client,
    base_url: String,
}

impl HttpGateway {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ApiError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::new(format!("Network error: {}", e)))?;

        Ok(Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl ServiceGateway for HttpGateway {
    async fn call(
        &self,
        endpoint: &str,
        method: Method,
        body: Option<Value>,
    ) -> Result<Value, ApiError> {
        let url = format!("{}{}", self.base_url, endpoint);
        tracing::debug!(method = %method, url = %url, "Calling clustering service");

        let mut request = self
            .http_client
            .request(method, &url)
            .header(CONTENT_TYPE, "application/json");
        if let Some(body) = body {
            let bytes = serde_json::to_vec(&body)
                .map_err(|e| ApiError::new(format!("Failed to encode request: {}", e)))?;
            request = request.body(bytes);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ApiError::new(format!("Network error: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            let message = error_message_from_body(&error_text).unwrap_or_else(|| {
                format!(
                    "HTTP {}: {}",
                    status.as_u16(),
                    status.canonical_reason().unwrap_or("Unknown Status")
                )
            });
            tracing::debug!(status = status.as_u16(), message = %message, "Service returned error");
            return Err(ApiError::with_status(message, status.as_u16()));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| ApiError::with_status(format!("Invalid response body: {}", e), status.as_u16()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_plain_string() {
        assert_eq!(
            error_message_from_body(r#"{"error": "Directory path required"}"#),
            Some("Directory path required".to_string())
        );
    }

    #[test]
    fn test_error_message_nested_object() {
        assert_eq!(
            error_message_from_body(r#"{"error": {"code": "NOT_FOUND", "message": "gone"}}"#),
            Some("gone".to_string())
        );
    }

    #[test]
    fn test_error_message_unusable_bodies() {
        assert_eq!(error_message_from_body(""), None);
        assert_eq!(error_message_from_body("<html>502</html>"), None);
        assert_eq!(error_message_from_body(r#"{"detail": "x"}"#), None);
        assert_eq!(error_message_from_body(r#"{"error": "  "}"#), None);
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let gateway = HttpGateway::new("http://localhost:5000/api/", Duration::from_secs(1)).unwrap();
        assert_eq!(gateway.base_url(), "http://localhost:5000/api");
    }
}
