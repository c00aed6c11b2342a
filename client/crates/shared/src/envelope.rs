//! Response Envelope
//!
//! Every backend response is wrapped as `{status, message, data}`.

use serde::{Deserialize, Serialize};

use crate::error::app_error::{AppError, AppResult};

/// Standard response wrapper
///
/// `data` is optional: the backend omits it (or sends `null`) when an
/// operation produced nothing, e.g. a rejected login.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct ApiResponse<T> {
    pub status: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    /// Whether the backend reported success (`"success"` or `"200"`)
    pub fn is_success(&self) -> bool {
        matches!(self.status.as_str(), "success" | "200")
    }

    /// Unwrap the payload, failing with a decode error when it is absent
    pub fn into_data(self) -> AppResult<T> {
        match self.data {
            Some(data) => Ok(data),
            None => {
                let message = if self.message.is_empty() {
                    "Response contained no data".to_string()
                } else {
                    self.message
                };
                Err(AppError::decode(message))
            }
        }
    }
}
