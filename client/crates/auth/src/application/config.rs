//! Application Configuration
//!
//! Routes and storage settings for the Auth application layer.

/// How the refresh endpoint is called
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshRoute {
    /// `POST {path}` with `{"refreshToken": ..}` in the body
    Body { path: String },
    /// `GET {path}`; the refresh token travels as a cookie
    Cookie { path: String },
}

impl RefreshRoute {
    pub fn path(&self) -> &str {
        match self {
            RefreshRoute::Body { path } | RefreshRoute::Cookie { path } => path,
        }
    }
}

/// Auth application configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Namespace key of the persisted session record
    pub storage_key: String,
    /// Password sign-in route
    pub login_path: String,
    /// Registration route
    pub register_path: String,
    /// OAuth initiation route; `{provider}` is substituted
    pub oauth_login_path: String,
    /// Refresh endpoint and style
    pub refresh: RefreshRoute,
    /// View the guard redirects to when there is no usable session
    pub login_route: String,
    /// View shown after a completed OAuth sign-in
    pub home_route: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            storage_key: "auth-storage".to_string(),
            login_path: "/auth/login".to_string(),
            register_path: "/auth/register".to_string(),
            oauth_login_path: "/auth/oauth/{provider}/login".to_string(),
            refresh: RefreshRoute::Body {
                path: "/auth/refresh".to_string(),
            },
            login_route: "/auth".to_string(),
            home_route: "/dashboard".to_string(),
        }
    }
}

impl AuthConfig {
    /// Use the cookie-based `GET /auth/refresh-token` endpoint
    #[must_use]
    pub fn with_cookie_refresh(mut self) -> Self {
        self.refresh = RefreshRoute::Cookie {
            path: "/auth/refresh-token".to_string(),
        };
        self
    }

    /// OAuth initiation path for a provider
    pub fn oauth_login_path_for(&self, provider: &str) -> String {
        self.oauth_login_path.replace("{provider}", provider)
    }
}
