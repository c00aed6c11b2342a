//! User Profile Entity
//!
//! The signed-in user as reported by the backend.

use serde::{Deserialize, Serialize};

/// User profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Backend user ID (UUID string)
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    /// OAuth provider name (`google`), if the account was created through one
    #[serde(default)]
    pub oauth_provider: Option<String>,
    #[serde(default)]
    pub profile_picture: Option<String>,
    #[serde(default)]
    pub is_oauth_user: bool,
}

impl UserProfile {
    /// "First Last", falling back to the email when both names are blank
    pub fn display_name(&self) -> String {
        let name = format!("{} {}", self.first_name.trim(), self.last_name.trim());
        let name = name.trim();
        if name.is_empty() {
            self.email.clone()
        } else {
            name.to_string()
        }
    }
}
