//! Session Entity
//!
//! Credentials and profile of the signed-in user. The authenticated flag is
//! derived from the access token, never stored separately, so it cannot
//! disagree with it.

use std::fmt;

use super::user_profile::UserProfile;

/// Client session
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Session {
    access_token: Option<String>,
    refresh_token: Option<String>,
    user: Option<UserProfile>,
}

impl Session {
    /// Signed-out session
    pub fn empty() -> Self {
        Self::default()
    }

    /// Signed-in session
    pub fn authenticated(
        access_token: impl Into<String>,
        refresh_token: Option<String>,
        user: Option<UserProfile>,
    ) -> Self {
        Self {
            access_token: Some(access_token.into()),
            refresh_token,
            user,
        }
    }

    /// Rebuild from persisted parts
    pub(crate) fn from_parts(
        access_token: Option<String>,
        refresh_token: Option<String>,
        user: Option<UserProfile>,
    ) -> Self {
        Self {
            access_token,
            refresh_token,
            user,
        }
    }

    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }

    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref()
    }

    pub fn user(&self) -> Option<&UserProfile> {
        self.user.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.access_token.is_some()
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |t: &Option<String>| t.as_ref().map(|_| "<redacted>");
        f.debug_struct("Session")
            .field("access_token", &redact(&self.access_token))
            .field("refresh_token", &redact(&self.refresh_token))
            .field("user", &self.user.as_ref().map(|u| &u.email))
            .field("is_authenticated", &self.is_authenticated())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authenticated_iff_access_token() {
        assert!(!Session::empty().is_authenticated());
        assert!(Session::authenticated("a", None, None).is_authenticated());
        assert!(!Session::from_parts(None, Some("r".into()), None).is_authenticated());
    }

    #[test]
    fn test_debug_redacts_tokens() {
        let session = Session::authenticated("secret-access", Some("secret-refresh".into()), None);
        let debug = format!("{session:?}");
        assert!(!debug.contains("secret-access"));
        assert!(!debug.contains("secret-refresh"));
        assert!(debug.contains("<redacted>"));
    }
}
