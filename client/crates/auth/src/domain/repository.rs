//! Repository Traits
//!
//! Interface for session persistence. Implementation is in infrastructure layer.

use crate::domain::entity::session::Session;
use crate::error::AuthResult;

/// Session repository trait
#[trait_variant::make(SessionRepository: Send)]
pub trait LocalSessionRepository {
    /// Load the persisted session; `None` if nothing was stored
    async fn load(&self) -> AuthResult<Option<Session>>;

    /// Persist the full session
    async fn save(&self, session: &Session) -> AuthResult<()>;

    /// Remove the persisted session
    async fn clear(&self) -> AuthResult<()>;
}
