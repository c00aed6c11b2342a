//! Route Guard
//!
//! Decides whether a protected view may be entered. The stored access token
//! must be present and its `exp` claim must not have passed; otherwise the
//! session is cleared and the caller is sent to the login view.
//!
//! An expired token is a hard logout. No refresh is attempted at navigation
//! time; the interceptor refreshes on the next 401 instead.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use platform::token::decode_claims;

use crate::application::config::AuthConfig;
use crate::application::session_store::SessionStore;
use crate::domain::repository::SessionRepository;

/// Why a navigation was redirected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectReason {
    NoToken,
    Expired,
    InvalidToken,
}

/// Outcome of a guard check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    Redirect { to: String, reason: RedirectReason },
}

impl GuardDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, GuardDecision::Allow)
    }
}

pub struct RouteGuard<P> {
    session: SessionStore<P>,
    config: Arc<AuthConfig>,
}

impl<P> RouteGuard<P>
where
    P: SessionRepository + Send + Sync + 'static,
{
    pub fn new(session: SessionStore<P>, config: Arc<AuthConfig>) -> Self {
        Self { session, config }
    }

    pub async fn check(&self) -> GuardDecision {
        self.check_at(Utc::now()).await
    }

    /// Check against an explicit clock
    pub async fn check_at(&self, now: DateTime<Utc>) -> GuardDecision {
        let Some(token) = self.session.access_token() else {
            tracing::debug!("No access token; redirecting to login");
            return self.redirect(RedirectReason::NoToken);
        };

        let reason = match decode_claims(&token).and_then(|claims| claims.is_expired_at(now)) {
            Ok(false) => return GuardDecision::Allow,
            Ok(true) => {
                tracing::info!("Access token expired; signing out");
                RedirectReason::Expired
            }
            Err(e) => {
                tracing::warn!(error = %e, "Access token unreadable; signing out");
                RedirectReason::InvalidToken
            }
        };

        self.session.logout().await;
        self.redirect(reason)
    }

    fn redirect(&self, reason: RedirectReason) -> GuardDecision {
        GuardDecision::Redirect {
            to: self.config.login_route.clone(),
            reason,
        }
    }
}
