//! API DTOs (Data Transfer Objects)

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::entity::user_profile::UserProfile;

/// Payload of a response that may or may not use the `{status, message, data}`
/// envelope
pub fn envelope_payload(body: Value) -> Value {
    match body {
        Value::Object(mut map) if map.get("data").is_some_and(Value::is_object) => {
            map.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    }
}

// ============================================================================
// Sign In
// ============================================================================

/// Sign in request
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Sign in payload (inside the response envelope)
#[derive(Debug, Clone, Deserialize)]
pub struct LoginData {
    pub user_data: UserProfile,
    pub access_token: String,
    pub refresh_token: String,
}

// ============================================================================
// Sign Up
// ============================================================================

/// Sign up request
#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
}

// ============================================================================
// Refresh
// ============================================================================

/// Body-style refresh request
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Refresh payload; both camelCase and snake_case backends are accepted
#[derive(Debug, Clone, Deserialize)]
pub struct RefreshedTokens {
    #[serde(alias = "accessToken")]
    pub access_token: String,
    #[serde(default, alias = "refreshToken")]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub user: Option<UserProfile>,
}

// ============================================================================
// OAuth
// ============================================================================

/// OAuth initiation response
#[derive(Debug, Clone, Deserialize)]
pub struct OAuthLoginResponse {
    pub authorization_url: String,
    pub state: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_refreshed_tokens_accepts_both_casings() {
        let camel: RefreshedTokens =
            serde_json::from_value(json!({"accessToken": "a", "refreshToken": "r"})).unwrap();
        let snake: RefreshedTokens =
            serde_json::from_value(json!({"access_token": "a", "refresh_token": "r"})).unwrap();
        assert_eq!(camel.access_token, snake.access_token);
        assert_eq!(camel.refresh_token, snake.refresh_token);
        assert!(camel.user.is_none());
    }

    #[test]
    fn test_envelope_payload() {
        assert_eq!(
            envelope_payload(json!({"status": "success", "data": {"state": "s"}})),
            json!({"state": "s"})
        );
        assert_eq!(envelope_payload(json!({"state": "s"})), json!({"state": "s"}));
        assert_eq!(
            envelope_payload(json!({"status": "error", "data": null})),
            json!({"status": "error", "data": null})
        );
    }

    #[test]
    fn test_refresh_request_is_camel_case() {
        let body = serde_json::to_value(RefreshRequest {
            refresh_token: "r".into(),
        })
        .unwrap();
        assert_eq!(body, json!({"refreshToken": "r"}));
    }
}
