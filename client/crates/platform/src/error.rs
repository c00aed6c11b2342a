//! API Error Types
//!
//! Every network call resolves to either a response body or an [`ApiError`].
//! The variants integrate with the unified `kernel::AppError` system through
//! [`ApiError::to_app_error`].

use std::time::Duration;

use kernel::{AppError, ErrorKind};
use serde_json::Value;
use thiserror::Error;

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

/// Failure of a single logical request
///
/// `Clone` so one in-flight outcome can be handed to every waiter that
/// joined it.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApiError {
    /// No response: connection refused, reset, DNS failure
    #[error("Network error: {0}")]
    Network(String),

    /// Exceeded the client-side budget
    #[error("Request timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    /// The server responded with a 4xx/5xx status
    #[error("HTTP {status}: {message}")]
    Http {
        status: u16,
        message: String,
        body: Option<Value>,
    },

    /// The refresh endpoint failed; the session has been cleared
    #[error("Token refresh failed: {0}")]
    Refresh(Box<ApiError>),

    /// Malformed response body or token
    #[error("Decode error: {0}")]
    Decode(String),
}

impl ApiError {
    /// Build an `Http` error from a raw error response
    ///
    /// The message comes from the envelope `message`, then a `detail` field,
    /// then the status reason phrase.
    pub fn from_response(status: u16, body: &str) -> Self {
        let body: Option<Value> = serde_json::from_str(body).ok();
        let message = body
            .as_ref()
            .and_then(extract_message)
            .unwrap_or_else(|| reason_phrase(status).to_string());
        ApiError::Http {
            status,
            message,
            body,
        }
    }

    /// HTTP status, if the server answered
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::Network(_) => ErrorKind::Network,
            ApiError::Timeout(_) => ErrorKind::Timeout,
            ApiError::Http { status, .. } => ErrorKind::from_status(*status),
            ApiError::Refresh(_) => ErrorKind::SessionExpired,
            ApiError::Decode(_) => ErrorKind::Decode,
        }
    }

    /// Whether this is the 401 that triggers refresh-and-replay
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Http { status: 401, .. })
    }

    /// Whether the query layer may retry this failure
    pub fn is_retryable(&self) -> bool {
        match self {
            ApiError::Network(_) | ApiError::Timeout(_) => true,
            ApiError::Http { status, .. } => matches!(*status, 408 | 429 | 500..=599),
            ApiError::Refresh(_) | ApiError::Decode(_) => false,
        }
    }

    /// Message suitable for a "failed to load" state
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Http { message, .. } => message.clone(),
            ApiError::Refresh(_) => "Your session has expired".to_string(),
            other => other.to_string(),
        }
    }

    /// Convert to AppError
    pub fn to_app_error(&self) -> AppError {
        let err = AppError::new(self.kind(), self.user_message());
        match self {
            ApiError::Refresh(_) => err.with_action("Please sign in again"),
            ApiError::Network(_) | ApiError::Timeout(_) => {
                err.with_action("Check your connection and try again")
            }
            _ => err,
        }
    }

    /// Log the error with appropriate level
    pub fn log(&self) {
        match self {
            ApiError::Network(reason) => {
                tracing::warn!(reason = %reason, "Backend unreachable");
            }
            ApiError::Timeout(budget) => {
                tracing::warn!(budget_ms = budget.as_millis() as u64, "Request timed out");
            }
            ApiError::Http { status, message, .. } if *status >= 500 => {
                tracing::error!(status, message = %message, "Backend error");
            }
            ApiError::Refresh(cause) => {
                tracing::warn!(cause = %cause, "Session refresh failed");
            }
            ApiError::Decode(reason) => {
                tracing::error!(reason = %reason, "Malformed response");
            }
            _ => {
                tracing::debug!(error = %self, "Request rejected");
            }
        }
    }
}

impl From<ApiError> for AppError {
    fn from(err: ApiError) -> Self {
        err.to_app_error()
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Decode(err.to_string())
    }
}

fn extract_message(body: &Value) -> Option<String> {
    let non_empty = |s: &str| (!s.trim().is_empty()).then(|| s.to_string());

    if let Some(message) = body.get("message").and_then(Value::as_str).and_then(non_empty) {
        return Some(message);
    }
    match body.get("detail")? {
        Value::String(detail) => non_empty(detail.as_str()),
        // validation errors: [{"loc": [...], "msg": "...", "type": "..."}]
        Value::Array(items) => items
            .first()
            .and_then(|item| item.get("msg"))
            .and_then(Value::as_str)
            .and_then(non_empty),
        _ => None,
    }
}

fn reason_phrase(status: u16) -> &'static str {
    http::StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .unwrap_or("Unexpected response")
}

/// Failure below the HTTP layer, reported by a transport
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("Request timed out")]
    Timeout,

    #[error("Connection failed: {0}")]
    Network(String),

    #[error("Invalid request: {0}")]
    Build(String),
}

impl TransportError {
    /// Map into the API taxonomy; `budget` is reported for timeouts
    pub fn into_api_error(self, budget: Duration) -> ApiError {
        match self {
            TransportError::Timeout => ApiError::Timeout(budget),
            TransportError::Network(reason) => ApiError::Network(reason),
            TransportError::Build(reason) => ApiError::Decode(reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_from_envelope() {
        let err = ApiError::from_response(
            400,
            r#"{"status":"error","message":"Invalid date range","data":null}"#,
        );
        assert_eq!(err.status(), Some(400));
        assert_eq!(err.user_message(), "Invalid date range");
    }

    #[test]
    fn test_message_from_detail() {
        let err = ApiError::from_response(401, r#"{"detail":"Could not validate credentials"}"#);
        assert!(err.is_unauthorized());
        assert_eq!(err.user_message(), "Could not validate credentials");

        let err = ApiError::from_response(
            422,
            r#"{"detail":[{"loc":["query","page"],"msg":"value is not a valid integer"}]}"#,
        );
        assert_eq!(err.user_message(), "value is not a valid integer");
    }

    #[test]
    fn test_message_falls_back_to_reason_phrase() {
        let err = ApiError::from_response(503, "<html>upstream down</html>");
        assert_eq!(err.user_message(), "Service Unavailable");
        match err {
            ApiError::Http { body, .. } => assert!(body.is_none()),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_retryable_classification() {
        assert!(ApiError::Network("reset".into()).is_retryable());
        assert!(ApiError::Timeout(Duration::from_secs(10)).is_retryable());
        assert!(ApiError::from_response(429, "").is_retryable());
        assert!(ApiError::from_response(502, "").is_retryable());
        assert!(!ApiError::from_response(401, "").is_retryable());
        assert!(!ApiError::from_response(404, "").is_retryable());
        assert!(!ApiError::Refresh(Box::new(ApiError::from_response(401, ""))).is_retryable());
        assert!(!ApiError::Decode("bad".into()).is_retryable());
    }

    #[test]
    fn test_timeout_is_not_unauthorized() {
        assert!(!ApiError::Timeout(Duration::from_secs(1)).is_unauthorized());
    }

    #[test]
    fn test_to_app_error() {
        let err = ApiError::Refresh(Box::new(ApiError::from_response(401, ""))).to_app_error();
        assert_eq!(err.kind(), ErrorKind::SessionExpired);
        assert_eq!(err.action(), Some("Please sign in again"));

        let err: AppError = ApiError::from_response(404, r#"{"detail":"Not Found"}"#).into();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.message(), "Not Found");
    }

    #[test]
    fn test_transport_error_mapping() {
        let budget = Duration::from_millis(2500);
        assert_eq!(
            TransportError::Timeout.into_api_error(budget),
            ApiError::Timeout(budget)
        );
        assert_eq!(
            TransportError::Network("refused".into()).into_api_error(budget),
            ApiError::Network("refused".into())
        );
    }
}
