//! OAuth Use Case
//!
//! Two halves of the provider redirect flow:
//! - `initiate` asks the backend for the provider's authorization URL
//! - `complete` reads the tokens the backend put on the callback target

use std::sync::Arc;

use platform::error::ApiError;
use platform::http::FetchDescriptor;
use platform::transport::HttpTransport;
use url::Url;

use crate::application::config::AuthConfig;
use crate::application::request_client::RequestClient;
use crate::domain::entity::session::Session;
use crate::domain::repository::SessionRepository;
use crate::error::{AuthError, AuthResult};
use crate::presentation::dto::{OAuthLoginResponse, envelope_payload};

/// Where to send the user to sign in with the provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthRedirect {
    pub authorization_url: Url,
    /// Anti-forgery state the backend will check on callback
    pub state: String,
}

/// Result of handling the OAuth callback
#[derive(Debug)]
pub enum CallbackOutcome {
    SignedIn { session: Session, redirect_to: String },
    Failed { error: AuthError, redirect_to: String },
}

impl CallbackOutcome {
    /// View to navigate to next
    pub fn redirect_to(&self) -> &str {
        match self {
            CallbackOutcome::SignedIn { redirect_to, .. }
            | CallbackOutcome::Failed { redirect_to, .. } => redirect_to,
        }
    }

    pub fn is_signed_in(&self) -> bool {
        matches!(self, CallbackOutcome::SignedIn { .. })
    }
}

/// OAuth use case
pub struct OAuthUseCase<T, P> {
    client: RequestClient<T, P>,
    config: Arc<AuthConfig>,
}

impl<T, P> OAuthUseCase<T, P>
where
    T: HttpTransport + Send + Sync + 'static,
    P: SessionRepository + Send + Sync + 'static,
{
    pub fn new(client: RequestClient<T, P>, config: Arc<AuthConfig>) -> Self {
        Self { client, config }
    }

    /// Fetch the provider authorization URL
    pub async fn initiate(&self, provider: &str) -> AuthResult<OAuthRedirect> {
        let descriptor = FetchDescriptor::get(self.config.oauth_login_path_for(provider));
        let body = self
            .client
            .dispatch(&descriptor, None, self.client.config().timeout)
            .await?;

        let response: OAuthLoginResponse =
            serde_json::from_value(envelope_payload(body)).map_err(ApiError::from)?;
        let authorization_url = Url::parse(&response.authorization_url).map_err(|e| {
            AuthError::Rejected(format!("Invalid authorization URL from backend: {e}"))
        })?;

        tracing::info!(provider, "OAuth sign-in initiated");
        Ok(OAuthRedirect {
            authorization_url,
            state: response.state,
        })
    }

    /// Handle the callback navigation target
    ///
    /// Accepts an absolute URL or a path such as
    /// `/oauth-callback?access_token=..&refresh_token=..`.
    pub async fn complete(&self, callback: &str) -> CallbackOutcome {
        match self.sign_in_from_callback(callback).await {
            Ok(session) => CallbackOutcome::SignedIn {
                session,
                redirect_to: self.config.home_route.clone(),
            },
            Err(error) => {
                error.log();
                CallbackOutcome::Failed {
                    error,
                    redirect_to: self.config.login_route.clone(),
                }
            }
        }
    }

    async fn sign_in_from_callback(&self, callback: &str) -> AuthResult<Session> {
        let url = parse_callback(callback)?;

        let mut access_token = None;
        let mut refresh_token = None;
        for (name, value) in url.query_pairs() {
            match name.as_ref() {
                "error" => return Err(AuthError::OAuthDenied(value.into_owned())),
                "access_token" if !value.is_empty() => access_token = Some(value.into_owned()),
                "refresh_token" if !value.is_empty() => refresh_token = Some(value.into_owned()),
                _ => {}
            }
        }

        let (Some(access_token), Some(refresh_token)) = (access_token, refresh_token) else {
            return Err(AuthError::MissingCallbackTokens);
        };
        Ok(self
            .client
            .session()
            .login(access_token, Some(refresh_token), None)
            .await)
    }
}

fn parse_callback(callback: &str) -> AuthResult<Url> {
    match Url::parse(callback) {
        Ok(url) => Ok(url),
        Err(url::ParseError::RelativeUrlWithoutBase) => Url::parse("http://localhost/")
            .and_then(|base| base.join(callback))
            .map_err(|e| AuthError::InvalidCallbackUrl(e.to_string())),
        Err(e) => Err(AuthError::InvalidCallbackUrl(e.to_string())),
    }
}
