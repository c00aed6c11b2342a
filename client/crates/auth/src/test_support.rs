//! Shared fixtures for the auth tests

use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use platform::config::ClientConfig;
use platform::storage::MemoryStore;
use platform::testing::ScriptedTransport;
use serde_json::json;

use crate::application::config::AuthConfig;
use crate::application::interceptor::AuthenticatedClient;
use crate::application::refresh::TokenRefresher;
use crate::application::request_client::RequestClient;
use crate::application::session_store::SessionStore;
use crate::domain::entity::user_profile::UserProfile;
use crate::infra::storage::StoredSessionRepository;

pub type TestRepository = StoredSessionRepository<MemoryStore>;

pub struct Harness {
    pub transport: ScriptedTransport,
    pub memory: MemoryStore,
    pub session: SessionStore<TestRepository>,
    pub client: RequestClient<ScriptedTransport, TestRepository>,
}

pub fn harness() -> Harness {
    let transport = ScriptedTransport::default();
    let memory = MemoryStore::default();
    let repo = StoredSessionRepository::new(memory.clone(), AuthConfig::default().storage_key);
    let session = SessionStore::new(Arc::new(repo));
    let client = RequestClient::new(
        Arc::new(transport.clone()),
        Arc::new(ClientConfig::default()),
        session.clone(),
    );
    Harness {
        transport,
        memory,
        session,
        client,
    }
}

pub fn refresher(
    h: &Harness,
    config: AuthConfig,
) -> TokenRefresher<ScriptedTransport, TestRepository> {
    TokenRefresher::new(h.client.clone(), Arc::new(config))
}

pub fn authenticated(
    h: &Harness,
    config: AuthConfig,
) -> AuthenticatedClient<ScriptedTransport, TestRepository> {
    AuthenticatedClient::new(h.client.clone(), Arc::new(config))
}

pub fn user() -> UserProfile {
    UserProfile {
        id: "u-1".to_string(),
        first_name: "Ada".to_string(),
        last_name: "Lovelace".to_string(),
        email: "a@b.com".to_string(),
        oauth_provider: None,
        profile_picture: None,
        is_oauth_user: false,
    }
}

/// Unsigned JWT expiring at `exp`
pub fn jwt(exp: i64) -> String {
    let header = URL_SAFE_NO_PAD.encode(json!({"alg": "HS256", "typ": "JWT"}).to_string());
    let payload = URL_SAFE_NO_PAD.encode(json!({"sub": "u-1", "exp": exp}).to_string());
    format!("{header}.{payload}.signature")
}
