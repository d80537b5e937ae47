use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::services::retry::IsRetryable;
use crate::services::session::Session;

/// Thin transport wrapper for the HeadShot HTTP API.
///
/// Non-2xx responses are ordinary [`ApiError::Status`] values. Bodies that
/// are missing or not JSON decode to an empty object. The session's bearer
/// credential is attached whenever one is present.
pub struct ApiClient {
    http: Client,
    base_url: String,
    session: Arc<Session>,
}

/// A 2xx response with its decoded body.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl ApiResponse {
    pub fn json<T: DeserializeOwned>(self) -> Result<T, ApiError> {
        serde_json::from_value(self.body).map_err(ApiError::Decode)
    }
}

impl ApiClient {
    pub fn new(
        base_url: &str,
        timeout: Duration,
        session: Arc<Session>,
    ) -> Result<Self, ApiError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            session,
        })
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    pub async fn get(&self, path: &str) -> Result<ApiResponse, ApiError> {
        self.request::<()>(Method::GET, path, None).await
    }

    pub async fn post<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<ApiResponse, ApiError> {
        self.request(Method::POST, path, Some(body)).await
    }

    /// `POST` without a body.
    pub async fn post_empty(&self, path: &str) -> Result<ApiResponse, ApiError> {
        self.request::<()>(Method::POST, path, None).await
    }

    pub async fn delete(&self, path: &str) -> Result<ApiResponse, ApiError> {
        self.request::<()>(Method::DELETE, path, None).await
    }

    /// Issue one request against `path` (relative to the base URL).
    pub async fn request<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<ApiResponse, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        let request_id = Uuid::new_v4();

        let mut builder = self
            .http
            .request(method.clone(), &url)
            .header("x-request-id", request_id.to_string());
        if let Some(token) = self.session.credential() {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let start = Instant::now();
        let outcome = self.execute(builder).await;
        let elapsed = start.elapsed();

        let label = match &outcome {
            Ok(response) => response.status.as_u16().to_string(),
            Err(ApiError::Status { status, .. }) => status.as_u16().to_string(),
            Err(_) => "transport".to_string(),
        };
        metrics::counter!(
            "headshot_api_requests_total",
            "method" => method.to_string(),
            "status" => label.clone()
        )
        .increment(1);
        metrics::histogram!("headshot_api_request_seconds").record(elapsed.as_secs_f64());

        match &outcome {
            Ok(_) => tracing::debug!(
                %request_id,
                %method,
                path,
                status = %label,
                elapsed_ms = elapsed.as_millis() as u64,
                "API request succeeded"
            ),
            Err(e) => tracing::warn!(
                %request_id,
                %method,
                path,
                status = %label,
                elapsed_ms = elapsed.as_millis() as u64,
                error = %e,
                "API request failed"
            ),
        }

        outcome
    }

    async fn execute(&self, builder: reqwest::RequestBuilder) -> Result<ApiResponse, ApiError> {
        let response = builder.send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;
        let body = decode_body(&bytes);

        if status.is_success() {
            Ok(ApiResponse { status, body })
        } else {
            Err(ApiError::Status { status, body })
        }
    }
}

fn status_suffix(body: &Value) -> String {
    match body.get("error").and_then(Value::as_str) {
        Some(message) => format!(": {message}"),
        None => String::new(),
    }
}

fn decode_body(bytes: &[u8]) -> Value {
    serde_json::from_slice(bytes).unwrap_or_else(|_| Value::Object(serde_json::Map::new()))
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("server responded with {status}{}", status_suffix(.body))]
    Status { status: StatusCode, body: Value },

    #[error("unexpected response body: {0}")]
    Decode(#[source] serde_json::Error),
}

impl ApiError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// The service's structured `error` message, if it sent one.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ApiError::Status { body, .. } => body.get("error").and_then(Value::as_str),
            _ => None,
        }
    }

    /// Message for the user: the server's own words, or `fallback`.
    pub fn user_message(&self, fallback: &str) -> String {
        self.server_message().unwrap_or(fallback).to_string()
    }
}

impl IsRetryable for ApiError {
    fn is_retryable(&self) -> bool {
        match self {
            ApiError::Transport(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            ApiError::Status { status, .. } => {
                status.is_server_error() || *status == StatusCode::TOO_MANY_REQUESTS
            }
            ApiError::Decode(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_body_tolerates_garbage() {
        assert_eq!(decode_body(b""), serde_json::json!({}));
        assert_eq!(decode_body(b"<html>oops</html>"), serde_json::json!({}));
        assert_eq!(decode_body(br#"{"id": 1}"#), serde_json::json!({"id": 1}));
    }

    #[test]
    fn test_server_message_and_fallback() {
        let err = ApiError::Status {
            status: StatusCode::BAD_REQUEST,
            body: serde_json::json!({"error": "Unknown package."}),
        };
        assert_eq!(err.server_message(), Some("Unknown package."));
        assert_eq!(err.user_message("Unknown error"), "Unknown package.");
        assert_eq!(err.to_string(), "server responded with 400 Bad Request: Unknown package.");

        let bare = ApiError::Status {
            status: StatusCode::BAD_GATEWAY,
            body: serde_json::json!({}),
        };
        assert_eq!(bare.user_message("Unknown error"), "Unknown error");
    }

    #[test]
    fn test_status_retryability() {
        let busy = ApiError::Status {
            status: StatusCode::SERVICE_UNAVAILABLE,
            body: Value::Null,
        };
        let missing = ApiError::Status {
            status: StatusCode::NOT_FOUND,
            body: Value::Null,
        };
        assert!(busy.is_retryable());
        assert!(!missing.is_retryable());
    }
}
