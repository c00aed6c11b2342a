//! Sign Up Use Case
//!
//! Registers a new account. Registration does not sign the user in.

use std::sync::Arc;

use kernel::ApiResponse;
use platform::error::ApiError;
use platform::http::FetchDescriptor;
use platform::transport::HttpTransport;

use crate::application::config::AuthConfig;
use crate::application::request_client::RequestClient;
use crate::domain::entity::user_profile::UserProfile;
use crate::domain::repository::SessionRepository;
use crate::error::{AuthError, AuthResult};
use crate::presentation::dto::RegisterRequest;

/// Sign up input
pub struct SignUpInput {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
}

/// Sign up use case
pub struct SignUpUseCase<T, P> {
    client: RequestClient<T, P>,
    config: Arc<AuthConfig>,
}

impl<T, P> SignUpUseCase<T, P>
where
    T: HttpTransport + Send + Sync + 'static,
    P: SessionRepository + Send + Sync + 'static,
{
    pub fn new(client: RequestClient<T, P>, config: Arc<AuthConfig>) -> Self {
        Self { client, config }
    }

    pub async fn execute(&self, input: SignUpInput) -> AuthResult<UserProfile> {
        let body = serde_json::to_value(RegisterRequest {
            first_name: input.first_name,
            last_name: input.last_name,
            email: input.email,
            password: input.password,
        })?;
        let descriptor = FetchDescriptor::post(self.config.register_path.as_str()).with_body(body);

        let response = self
            .client
            .dispatch(&descriptor, None, self.client.config().timeout)
            .await?;
        let envelope: ApiResponse<UserProfile> =
            serde_json::from_value(response).map_err(ApiError::from)?;

        // duplicate emails come back as 200 with status "error" and no data
        let user = envelope
            .into_data()
            .map_err(|e| AuthError::Rejected(e.message().to_string()))?;
        tracing::info!(user_id = %user.id, "Account registered");
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::{SignUpInput, SignUpUseCase};
    use crate::application::config::AuthConfig;
    use crate::error::AuthError;
    use crate::test_support::harness;
    use platform::http::Method;
    use platform::testing::Reply;
    use serde_json::json;
    use std::sync::Arc;

    fn input() -> SignUpInput {
        SignUpInput {
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            email: "ada@example.com".into(),
            password: "secret".into(),
        }
    }

    #[tokio::test]
    async fn test_register_returns_profile_without_login() {
        let h = harness();
        h.transport.on(
            Method::Post,
            "/auth/register",
            Reply::json(
                200,
                json!({
                    "status": "success",
                    "message": "User registered successfully",
                    "data": {
                        "id": "u-9",
                        "first_name": "Ada",
                        "last_name": "Lovelace",
                        "email": "ada@example.com",
                        "is_oauth_user": false
                    }
                }),
            ),
        );

        let use_case = SignUpUseCase::new(h.client.clone(), Arc::new(AuthConfig::default()));
        let user = use_case.execute(input()).await.unwrap();
        assert_eq!(user.id, "u-9");
        assert!(!h.session.is_authenticated());
        assert_eq!(
            h.transport.requests()[0].body,
            Some(json!({
                "first_name": "Ada",
                "last_name": "Lovelace",
                "email": "ada@example.com",
                "password": "secret"
            }))
        );
    }

    #[tokio::test]
    async fn test_duplicate_email_is_rejected() {
        let h = harness();
        h.transport.on(
            Method::Post,
            "/auth/register",
            Reply::json(200, json!({"status": "error", "message": "Email already registered", "data": null})),
        );

        let use_case = SignUpUseCase::new(h.client.clone(), Arc::new(AuthConfig::default()));
        match use_case.execute(input()).await {
            Err(AuthError::Rejected(message)) => assert_eq!(message, "Email already registered"),
            other => panic!("unexpected: {other:?}"),
        }
    }
}
