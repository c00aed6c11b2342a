//! Token Refresh
//!
//! Exchanges the refresh credential for a new access token. At most one
//! refresh request is in flight at a time: callers that fail with 401 while
//! a refresh is running await that same refresh instead of starting another,
//! so a rotating refresh token is never spent twice.
//!
//! The refresh request goes out without an access token and bypasses the
//! interceptor. Success replaces the session through `login`; any failure
//! clears it through `logout` and surfaces as [`ApiError::Refresh`].

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use futures::future::{BoxFuture, FutureExt, Shared};
use platform::error::ApiError;
use platform::http::FetchDescriptor;
use platform::transport::HttpTransport;
use serde_json::Value;

use crate::application::config::{AuthConfig, RefreshRoute};
use crate::application::request_client::RequestClient;
use crate::domain::entity::session::Session;
use crate::domain::repository::SessionRepository;
use crate::presentation::dto::{RefreshRequest, RefreshedTokens, envelope_payload};

type RefreshFuture = Shared<BoxFuture<'static, Result<Session, ApiError>>>;

struct InflightRefresh {
    id: u64,
    future: RefreshFuture,
}

/// Coalescing refresh coordinator
pub struct TokenRefresher<T, P> {
    client: RequestClient<T, P>,
    config: Arc<AuthConfig>,
    inflight: Arc<Mutex<Option<InflightRefresh>>>,
    next_id: Arc<AtomicU64>,
}

impl<T, P> Clone for TokenRefresher<T, P> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            config: Arc::clone(&self.config),
            inflight: Arc::clone(&self.inflight),
            next_id: Arc::clone(&self.next_id),
        }
    }
}

impl<T, P> TokenRefresher<T, P>
where
    T: HttpTransport + Send + Sync + 'static,
    P: SessionRepository + Send + Sync + 'static,
{
    pub fn new(client: RequestClient<T, P>, config: Arc<AuthConfig>) -> Self {
        Self {
            client,
            config,
            inflight: Arc::new(Mutex::new(None)),
            next_id: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Obtain a session newer than `stale_token`
    ///
    /// `stale_token` is the access token the rejected request carried. If the
    /// session already holds a different token, it is returned without a
    /// network call. Otherwise this joins the running refresh or starts one.
    pub async fn refresh(&self, stale_token: Option<&str>) -> Result<Session, ApiError> {
        let future = {
            let mut slot = self.inflight.lock().unwrap_or_else(PoisonError::into_inner);
            match slot.as_ref() {
                Some(inflight) => {
                    tracing::debug!(refresh_id = inflight.id, "Joining in-flight refresh");
                    inflight.future.clone()
                }
                None => {
                    let current = self.client.session().snapshot();
                    if current.access_token().is_some() && current.access_token() != stale_token {
                        tracing::debug!("Access token already replaced; skipping refresh");
                        return Ok(current);
                    }

                    let id = self.next_id.fetch_add(1, Ordering::Relaxed);
                    let future = self.clone().run(id).boxed().shared();
                    *slot = Some(InflightRefresh {
                        id,
                        future: future.clone(),
                    });
                    future
                }
            }
        };
        future.await
    }

    async fn run(self, id: u64) -> Result<Session, ApiError> {
        tracing::debug!(refresh_id = id, "Refreshing session");
        let session = self.client.session();

        let result = match self.request_tokens().await {
            Ok(tokens) => {
                let current = session.snapshot();
                let refresh_token = tokens
                    .refresh_token
                    .or_else(|| current.refresh_token().map(str::to_string));
                let user = tokens.user.or_else(|| current.user().cloned());
                let refreshed = session.login(tokens.access_token, refresh_token, user).await;
                tracing::info!(refresh_id = id, "Session refreshed");
                Ok(refreshed)
            }
            Err(cause) => {
                session.logout().await;
                let err = ApiError::Refresh(Box::new(cause));
                err.log();
                Err(err)
            }
        };

        let mut slot = self.inflight.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.as_ref().is_some_and(|inflight| inflight.id == id) {
            *slot = None;
        }
        result
    }

    async fn request_tokens(&self) -> Result<RefreshedTokens, ApiError> {
        let descriptor = match &self.config.refresh {
            RefreshRoute::Body { path } => {
                let stored = self.client.session().snapshot();
                let Some(refresh_token) = stored.refresh_token().map(str::to_string) else {
                    return Err(ApiError::Http {
                        status: 401,
                        message: "No refresh token available".to_string(),
                        body: None,
                    });
                };
                let body = serde_json::to_value(RefreshRequest { refresh_token })?;
                FetchDescriptor::post(path.as_str()).with_body(body)
            }
            RefreshRoute::Cookie { path } => FetchDescriptor::get(path.as_str()),
        };

        let body = self
            .client
            .dispatch(&descriptor, None, self.client.config().refresh_timeout)
            .await?;
        parse_tokens(body)
    }
}

fn parse_tokens(body: Value) -> Result<RefreshedTokens, ApiError> {
    serde_json::from_value(envelope_payload(body))
        .map_err(|e| ApiError::Decode(format!("Invalid refresh response: {e}")))
}

#[cfg(test)]
mod tests {
    use super::parse_tokens;
    use crate::application::config::AuthConfig;
    use crate::test_support::{harness, refresher, user};
    use platform::error::ApiError;
    use platform::http::Method;
    use platform::testing::Reply;
    use serde_json::json;
    use std::time::Duration;

    #[test]
    fn test_parse_tokens_envelope_and_bare() {
        let wrapped = parse_tokens(json!({
            "status": "success",
            "message": "Token refreshed successfully",
            "data": {"access_token": "a2", "refresh_token": "r2"}
        }))
        .unwrap();
        assert_eq!(wrapped.access_token, "a2");

        let bare = parse_tokens(json!({"accessToken": "a3"})).unwrap();
        assert_eq!(bare.access_token, "a3");
        assert_eq!(bare.refresh_token, None);

        assert!(matches!(
            parse_tokens(json!({"data": {"token": "x"}})),
            Err(ApiError::Decode(_))
        ));
    }

    #[tokio::test]
    async fn test_body_refresh_replaces_tokens_and_keeps_user() {
        let h = harness();
        h.transport.on(
            Method::Post,
            "/auth/refresh",
            Reply::json(200, json!({"status": "success", "data": {"accessToken": "a2", "refreshToken": "r2"}})),
        );
        h.session.login("a1", Some("r1".into()), Some(user())).await;

        let session = refresher(&h, AuthConfig::default())
            .refresh(Some("a1"))
            .await
            .unwrap();
        assert_eq!(session.access_token(), Some("a2"));
        assert_eq!(session.refresh_token(), Some("r2"));
        assert_eq!(session.user(), Some(&user()));

        let recorded = &h.transport.requests()[0];
        assert_eq!(recorded.bearer, None);
        assert_eq!(recorded.body, Some(json!({"refreshToken": "r1"})));
    }

    #[tokio::test]
    async fn test_cookie_refresh_uses_get() {
        let h = harness();
        h.transport.on(
            Method::Get,
            "/auth/refresh-token",
            Reply::json(200, json!({"status": "success", "data": {"access_token": "a2", "refresh_token": "r2"}})),
        );
        h.session.login("a1", None, None).await;

        let session = refresher(&h, AuthConfig::default().with_cookie_refresh())
            .refresh(Some("a1"))
            .await
            .unwrap();
        assert_eq!(session.access_token(), Some("a2"));
        assert_eq!(h.transport.count(Method::Get, "/auth/refresh-token"), 1);
    }

    #[tokio::test]
    async fn test_missing_refresh_token_fails_without_network() {
        let h = harness();
        h.session.login("a1", None, None).await;

        let err = refresher(&h, AuthConfig::default())
            .refresh(Some("a1"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Refresh(_)));
        assert!(!h.session.is_authenticated());
        assert!(h.transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_failed_refresh_logs_out() {
        let h = harness();
        h.transport.on(
            Method::Post,
            "/auth/refresh",
            Reply::json(401, json!({"detail": "Invalid or expired refresh token"})),
        );
        h.session.login("a1", Some("r1".into()), None).await;

        let err = refresher(&h, AuthConfig::default())
            .refresh(Some("a1"))
            .await
            .unwrap_err();
        match err {
            ApiError::Refresh(cause) => assert_eq!(cause.status(), Some(401)),
            other => panic!("unexpected: {other:?}"),
        }
        assert!(!h.session.is_authenticated());
        assert!(h.memory.snapshot("auth-storage").is_none());
    }

    #[tokio::test]
    async fn test_replaced_token_skips_refresh() {
        let h = harness();
        h.session.login("a2", Some("r2".into()), None).await;

        let session = refresher(&h, AuthConfig::default())
            .refresh(Some("a1"))
            .await
            .unwrap();
        assert_eq!(session.access_token(), Some("a2"));
        assert!(h.transport.requests().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_refreshes_coalesce() {
        let h = harness();
        h.transport.on(
            Method::Post,
            "/auth/refresh",
            Reply::json(200, json!({"data": {"accessToken": "a2", "refreshToken": "r2"}}))
                .with_delay(Duration::from_millis(200)),
        );
        h.session.login("a1", Some("r1".into()), None).await;
        let refresher = refresher(&h, AuthConfig::default());

        let (a, b, c) = tokio::join!(
            refresher.refresh(Some("a1")),
            refresher.refresh(Some("a1")),
            refresher.refresh(Some("a1")),
        );
        for result in [a, b, c] {
            assert_eq!(result.unwrap().access_token(), Some("a2"));
        }
        assert_eq!(h.transport.count(Method::Post, "/auth/refresh"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_timeout_is_a_refresh_failure() {
        let h = harness();
        h.transport.on(
            Method::Post,
            "/auth/refresh",
            Reply::json(200, json!({"data": {"accessToken": "a2"}}))
                .with_delay(Duration::from_secs(30)),
        );
        h.session.login("a1", Some("r1".into()), None).await;

        let err = refresher(&h, AuthConfig::default())
            .refresh(Some("a1"))
            .await
            .unwrap_err();
        match err {
            ApiError::Refresh(cause) => assert!(matches!(*cause, ApiError::Timeout(_))),
            other => panic!("unexpected: {other:?}"),
        }
        assert!(!h.session.is_authenticated());
    }
}
