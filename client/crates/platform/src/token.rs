//! JWT claim decoding
//!
//! Claims are read without signature verification; the backend is the
//! authority on validity. The client only needs `exp` to decide whether a
//! stored session is worth presenting.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use thiserror::Error;

/// Token decoding error
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("Token is not a three-part JWT")]
    Malformed,

    #[error("Token payload is not valid base64url")]
    InvalidEncoding,

    #[error("Token payload is not a JSON object")]
    InvalidPayload,

    #[error("Token has no usable exp claim")]
    MissingExpiry,
}

/// Decoded (unverified) payload of a JWT
#[derive(Debug, Clone, PartialEq)]
pub struct TokenClaims {
    claims: Map<String, Value>,
}

impl TokenClaims {
    /// `exp` claim in seconds since the epoch
    pub fn exp(&self) -> Option<i64> {
        match self.claims.get("exp")? {
            Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
            _ => None,
        }
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp()?, 0)
    }

    /// Whether the token expired strictly before `now`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> Result<bool, TokenError> {
        let expires_at = self.expires_at().ok_or(TokenError::MissingExpiry)?;
        Ok(expires_at < now)
    }
}

/// Decode the payload segment of a JWT
pub fn decode_claims(token: &str) -> Result<TokenClaims, TokenError> {
    let mut parts = token.split('.');
    let (Some(_header), Some(payload), Some(_signature), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(TokenError::Malformed);
    };
    if payload.is_empty() {
        return Err(TokenError::Malformed);
    }

    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|_| TokenError::InvalidEncoding)?;
    match serde_json::from_slice::<Value>(&bytes) {
        Ok(Value::Object(claims)) => Ok(TokenClaims { claims }),
        _ => Err(TokenError::InvalidPayload),
    }
}
