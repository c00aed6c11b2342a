//! Auth-Refresh Interceptor
//!
//! Wraps the [`RequestClient`]. A call that fails with 401 triggers one
//! refresh and exactly one replay with the new token; the replay's outcome is
//! final. Any other failure, including timeouts, passes straight through.
//!
//! ```text
//! Sent ──ok / non-401──▶ done
//!  │
//!  └─401─▶ refresh ──fail──▶ Refresh error (session cleared)
//!             │
//!             └─ok─▶ Replayed ──any──▶ done
//! ```

use std::sync::Arc;

use platform::error::ApiError;
use platform::fetch::Fetcher;
use platform::http::FetchDescriptor;
use platform::transport::HttpTransport;
use serde_json::Value;

use crate::application::config::AuthConfig;
use crate::application::refresh::TokenRefresher;
use crate::application::request_client::RequestClient;
use crate::application::session_store::SessionStore;
use crate::domain::repository::SessionRepository;

/// Where one logical call stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CallPhase {
    Sent,
    Replayed,
}

/// API client with transparent refresh-and-replay
pub struct AuthenticatedClient<T, P> {
    client: RequestClient<T, P>,
    refresher: TokenRefresher<T, P>,
}

impl<T, P> Clone for AuthenticatedClient<T, P> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            refresher: self.refresher.clone(),
        }
    }
}

impl<T, P> AuthenticatedClient<T, P>
where
    T: HttpTransport + Send + Sync + 'static,
    P: SessionRepository + Send + Sync + 'static,
{
    pub fn new(client: RequestClient<T, P>, config: Arc<AuthConfig>) -> Self {
        let refresher = TokenRefresher::new(client.clone(), config);
        Self { client, refresher }
    }

    pub fn session(&self) -> &SessionStore<P> {
        self.client.session()
    }

    /// The underlying non-refreshing client
    pub fn request_client(&self) -> &RequestClient<T, P> {
        &self.client
    }

    pub fn refresher(&self) -> &TokenRefresher<T, P> {
        &self.refresher
    }

    /// Send, refreshing and replaying once on 401
    pub async fn send(&self, descriptor: &FetchDescriptor) -> Result<Value, ApiError> {
        let budget = self.client.config().timeout;
        let mut phase = CallPhase::Sent;

        loop {
            let token = self.client.session().access_token();
            let result = self
                .client
                .dispatch(descriptor, token.as_deref(), budget)
                .await;

            match (result, phase) {
                (Err(err), CallPhase::Sent) if err.is_unauthorized() => {
                    tracing::debug!(key = descriptor.key(), "Unauthorized; refreshing");
                    self.refresher.refresh(token.as_deref()).await?;
                    phase = CallPhase::Replayed;
                }
                (result, phase) => {
                    if let Err(err) = &result {
                        tracing::debug!(key = descriptor.key(), ?phase, error = %err, "Request failed");
                    }
                    return result;
                }
            }
        }
    }
}

impl<T, P> Fetcher for AuthenticatedClient<T, P>
where
    T: HttpTransport + Send + Sync + 'static,
    P: SessionRepository + Send + Sync + 'static,
{
    async fn fetch(&self, descriptor: &FetchDescriptor) -> Result<Value, ApiError> {
        self.send(descriptor).await
    }
}
