//! Stored Session Repository
//!
//! Persists the session as one JSON record under a namespace key:
//!
//! ```json
//! {"state":{"token":"..","refreshToken":"..","user":{..},"isAuthenticated":true},"version":0}
//! ```

use platform::storage::KeyValueStore;
use serde::{Deserialize, Serialize};

use crate::domain::entity::{session::Session, user_profile::UserProfile};
use crate::domain::repository::SessionRepository;
use crate::error::AuthResult;

const RECORD_VERSION: u32 = 0;

#[derive(Debug, Serialize, Deserialize)]
struct PersistedRecord {
    state: PersistedState,
    #[serde(default)]
    version: u32,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PersistedState {
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    user: Option<UserProfile>,
    /// Written for readers of the record; ignored on load
    #[serde(default)]
    is_authenticated: bool,
}

/// Session repository backed by a [`KeyValueStore`]
#[derive(Debug, Clone)]
pub struct StoredSessionRepository<S> {
    store: S,
    key: String,
}

impl<S> StoredSessionRepository<S>
where
    S: KeyValueStore + Sync,
{
    pub fn new(store: S, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

impl<S> SessionRepository for StoredSessionRepository<S>
where
    S: KeyValueStore + Sync,
{
    async fn load(&self) -> AuthResult<Option<Session>> {
        let Some(raw) = self.store.get(&self.key).await? else {
            return Ok(None);
        };
        let record: PersistedRecord = serde_json::from_str(&raw)?;
        if record.version != RECORD_VERSION {
            tracing::debug!(version = record.version, "Loading session record from another version");
        }
        let state = record.state;
        Ok(Some(Session::from_parts(
            state.token,
            state.refresh_token,
            state.user,
        )))
    }

    async fn save(&self, session: &Session) -> AuthResult<()> {
        let record = PersistedRecord {
            state: PersistedState {
                token: session.access_token().map(str::to_string),
                refresh_token: session.refresh_token().map(str::to_string),
                user: session.user().cloned(),
                is_authenticated: session.is_authenticated(),
            },
            version: RECORD_VERSION,
        };
        let raw = serde_json::to_string(&record)?;
        self.store.set(&self.key, &raw).await?;
        Ok(())
    }

    async fn clear(&self) -> AuthResult<()> {
        self.store.remove(&self.key).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::StoredSessionRepository;
    use crate::domain::entity::session::Session;
    use crate::domain::repository::SessionRepository;
    use crate::error::AuthError;
    use platform::storage::{KeyValueStore, MemoryStore};
    use serde_json::{Value, json};

    #[tokio::test]
    async fn test_save_writes_namespaced_record() {
        let store = MemoryStore::new();
        let repo = StoredSessionRepository::new(store.clone(), "auth-storage");

        repo.save(&Session::authenticated("a1", Some("r1".into()), None))
            .await
            .unwrap();

        let raw: Value = serde_json::from_str(&store.snapshot("auth-storage").unwrap()).unwrap();
        assert_eq!(
            raw,
            json!({
                "state": {
                    "token": "a1",
                    "refreshToken": "r1",
                    "user": null,
                    "isAuthenticated": true
                },
                "version": 0
            })
        );
    }

    #[tokio::test]
    async fn test_load_rederives_authenticated_flag() {
        let store = MemoryStore::new();
        store
            .set(
                "auth-storage",
                r#"{"state":{"token":null,"refreshToken":"r","isAuthenticated":true},"version":0}"#,
            )
            .await
            .unwrap();
        let repo = StoredSessionRepository::new(store, "auth-storage");

        let session = repo.load().await.unwrap().unwrap();
        assert!(!session.is_authenticated());
        assert_eq!(session.refresh_token(), Some("r"));
    }

    #[tokio::test]
    async fn test_load_missing_and_corrupt() {
        let store = MemoryStore::new();
        let repo = StoredSessionRepository::new(store.clone(), "auth-storage");
        assert!(repo.load().await.unwrap().is_none());

        store.set("auth-storage", "{not json").await.unwrap();
        assert!(matches!(repo.load().await, Err(AuthError::Serialization(_))));

        repo.clear().await.unwrap();
        assert!(repo.load().await.unwrap().is_none());
    }
}
