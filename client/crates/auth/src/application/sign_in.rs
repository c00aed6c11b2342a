//! Sign In Use Case
//!
//! Authenticates with email and password and establishes the session.

use std::sync::Arc;

use kernel::ApiResponse;
use platform::error::ApiError;
use platform::http::FetchDescriptor;
use platform::transport::HttpTransport;

use crate::application::config::AuthConfig;
use crate::application::request_client::RequestClient;
use crate::domain::entity::session::Session;
use crate::domain::repository::SessionRepository;
use crate::error::{AuthError, AuthResult};
use crate::presentation::dto::{LoginData, LoginRequest};

/// Sign in input
pub struct SignInInput {
    pub email: String,
    pub password: String,
}

/// Sign in use case
pub struct SignInUseCase<T, P> {
    client: RequestClient<T, P>,
    config: Arc<AuthConfig>,
}

impl<T, P> SignInUseCase<T, P>
where
    T: HttpTransport + Send + Sync + 'static,
    P: SessionRepository + Send + Sync + 'static,
{
    pub fn new(client: RequestClient<T, P>, config: Arc<AuthConfig>) -> Self {
        Self { client, config }
    }

    pub async fn execute(&self, input: SignInInput) -> AuthResult<Session> {
        let body = serde_json::to_value(LoginRequest {
            email: input.email,
            password: input.password,
        })?;
        let descriptor = FetchDescriptor::post(self.config.login_path.as_str()).with_body(body);

        // sent anonymously
        let response = self
            .client
            .dispatch(&descriptor, None, self.client.config().timeout)
            .await
            .map_err(|err| match err.status() {
                Some(401 | 404) => AuthError::InvalidCredentials,
                _ => AuthError::Api(err),
            })
            .inspect_err(AuthError::log)?;

        let envelope: ApiResponse<LoginData> =
            serde_json::from_value(response).map_err(ApiError::from)?;
        let data = envelope
            .into_data()
            .map_err(|e| AuthError::Rejected(e.message().to_string()))?;

        let session = self
            .client
            .session()
            .login(data.access_token, Some(data.refresh_token), Some(data.user_data))
            .await;
        Ok(session)
    }
}
