//! Session Store
//!
//! Single owner of the client session. Only [`SessionStore::login`] and
//! [`SessionStore::logout`] mutate it; every reader gets a snapshot. Each
//! change is written through to the session repository, and persistence
//! failures are logged without affecting the in-memory state.

use std::sync::Arc;

use tokio::sync::{Mutex, watch};

use crate::domain::entity::{session::Session, user_profile::UserProfile};
use crate::domain::repository::SessionRepository;

/// Shared session context
pub struct SessionStore<P> {
    state: Arc<watch::Sender<Session>>,
    repo: Arc<P>,
    /// Orders state changes with their persistence
    write: Arc<Mutex<()>>,
}

impl<P> Clone for SessionStore<P> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            repo: Arc::clone(&self.repo),
            write: Arc::clone(&self.write),
        }
    }
}

impl<P> SessionStore<P>
where
    P: SessionRepository + Send + Sync + 'static,
{
    /// Create a store holding an empty session
    pub fn new(repo: Arc<P>) -> Self {
        let (state, _) = watch::channel(Session::empty());
        Self {
            state: Arc::new(state),
            repo,
            write: Arc::new(Mutex::new(())),
        }
    }

    /// Rehydrate from the repository
    ///
    /// A missing or unreadable record leaves the session empty.
    pub async fn restore(&self) -> Session {
        let _guard = self.write.lock().await;
        match self.repo.load().await {
            Ok(Some(session)) => {
                tracing::info!(
                    authenticated = session.is_authenticated(),
                    "Session restored"
                );
                self.state.send_replace(session.clone());
                session
            }
            Ok(None) => {
                tracing::debug!("No persisted session");
                Session::empty()
            }
            Err(e) => {
                e.log();
                tracing::warn!("Starting with an empty session");
                self.state.send_replace(Session::empty());
                Session::empty()
            }
        }
    }

    /// Copy of the current session
    pub fn snapshot(&self) -> Session {
        self.state.borrow().clone()
    }

    pub fn access_token(&self) -> Option<String> {
        self.state.borrow().access_token().map(str::to_string)
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().is_authenticated()
    }

    /// Receiver notified on every login and logout
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.state.subscribe()
    }

    /// Replace the session with new credentials
    pub async fn login(
        &self,
        access_token: impl Into<String>,
        refresh_token: Option<String>,
        user: Option<UserProfile>,
    ) -> Session {
        let session = Session::authenticated(access_token, refresh_token, user);

        let _guard = self.write.lock().await;
        self.state.send_replace(session.clone());
        tracing::info!(
            user_id = session.user().map(|u| u.id.as_str()),
            "Session established"
        );
        if let Err(e) = self.repo.save(&session).await {
            e.log();
        }
        session
    }

    /// Clear the session
    pub async fn logout(&self) {
        let _guard = self.write.lock().await;
        let previous = self.state.send_replace(Session::empty());
        if previous.is_authenticated() {
            tracing::info!("Session cleared");
        }
        if let Err(e) = self.repo.clear().await {
            e.log();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::SessionStore;
    use crate::domain::entity::{session::Session, user_profile::UserProfile};
    use crate::domain::repository::SessionRepository;
    use crate::error::{AuthError, AuthResult};
    use crate::infra::storage::StoredSessionRepository;
    use platform::storage::{KeyValueStore, MemoryStore, StorageError};
    use std::sync::{Arc, Mutex};

    fn user() -> UserProfile {
        UserProfile {
            id: "u-1".into(),
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            email: "a@b.com".into(),
            oauth_provider: None,
            profile_picture: None,
            is_oauth_user: false,
        }
    }

    fn store() -> (SessionStore<StoredSessionRepository<MemoryStore>>, MemoryStore) {
        let memory = MemoryStore::new();
        let repo = StoredSessionRepository::new(memory.clone(), "auth-storage");
        (SessionStore::new(Arc::new(repo)), memory)
    }

    struct BrokenRepository;

    impl SessionRepository for BrokenRepository {
        async fn load(&self) -> AuthResult<Option<Session>> {
            Err(AuthError::Storage(StorageError::InvalidKey("x".into())))
        }

        async fn save(&self, _session: &Session) -> AuthResult<()> {
            Err(AuthError::Storage(StorageError::InvalidKey("x".into())))
        }

        async fn clear(&self) -> AuthResult<()> {
            Err(AuthError::Storage(StorageError::InvalidKey("x".into())))
        }
    }

    #[tokio::test]
    async fn test_login_logout_keep_flag_in_sync() {
        let (store, _) = store();
        assert!(!store.is_authenticated());
        assert_eq!(store.access_token(), None);

        store.login("a1", Some("r1".into()), Some(user())).await;
        let session = store.snapshot();
        assert!(session.is_authenticated());
        assert_eq!(session.access_token(), Some("a1"));
        assert_eq!(session.refresh_token(), Some("r1"));
        assert_eq!(session.user(), Some(&user()));

        store.logout().await;
        let session = store.snapshot();
        assert!(!session.is_authenticated());
        assert_eq!(session, Session::empty());
    }

    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_login_log_carries_user_id_not_email() {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_max_level(tracing::Level::INFO)
            .with_writer(move || writer.clone())
            .finish();
        let _default = tracing::subscriber::set_default(subscriber);

        let (store, _) = store();
        store.login("secret-access", Some("secret-refresh".into()), Some(user())).await;

        let output = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains("Session established"));
        assert!(output.contains(&user().id));
        assert!(!output.contains(&user().email));
        assert!(!output.contains("secret-access"));
        assert!(!output.contains("secret-refresh"));
    }

    #[tokio::test]
    async fn test_login_overwrites_everything() {
        let (store, _) = store();
        store.login("a1", Some("r1".into()), Some(user())).await;
        store.login("a2", None, None).await;

        let session = store.snapshot();
        assert_eq!(session.access_token(), Some("a2"));
        assert_eq!(session.refresh_token(), None);
        assert_eq!(session.user(), None);
    }

    #[tokio::test]
    async fn test_snapshot_is_a_copy() {
        let (store, _) = store();
        store.login("a1", None, None).await;
        let before = store.snapshot();
        store.logout().await;
        assert_eq!(before.access_token(), Some("a1"));
    }

    #[tokio::test]
    async fn test_persist_and_restore() {
        let (store, memory) = store();
        store.login("a1", Some("r1".into()), Some(user())).await;
        assert!(memory.snapshot("auth-storage").is_some());

        let repo = StoredSessionRepository::new(memory.clone(), "auth-storage");
        let restored = SessionStore::new(Arc::new(repo));
        let session = restored.restore().await;
        assert_eq!(session.access_token(), Some("a1"));
        assert!(restored.is_authenticated());

        restored.logout().await;
        assert!(memory.snapshot("auth-storage").is_none());
    }

    #[tokio::test]
    async fn test_corrupt_record_restores_empty() {
        let memory = MemoryStore::new();
        memory.set("auth-storage", "][").await.unwrap();
        let store = SessionStore::new(Arc::new(StoredSessionRepository::new(
            memory,
            "auth-storage",
        )));

        let session = store.restore().await;
        assert!(!session.is_authenticated());
        assert!(!store.is_authenticated());
    }

    #[tokio::test]
    async fn test_persistence_failures_do_not_affect_state() {
        let store = SessionStore::new(Arc::new(BrokenRepository));
        assert!(!store.restore().await.is_authenticated());

        store.login("a1", None, None).await;
        assert!(store.is_authenticated());
        store.logout().await;
        assert!(!store.is_authenticated());
    }

    #[tokio::test]
    async fn test_subscribe_sees_transitions() {
        let (store, _) = store();
        let mut rx = store.subscribe();

        store.login("a1", None, None).await;
        rx.changed().await.unwrap();
        assert!(rx.borrow_and_update().is_authenticated());

        store.logout().await;
        rx.changed().await.unwrap();
        assert!(!rx.borrow_and_update().is_authenticated());
    }
}
