//! Domain Layer
//!
//! Contains the session entity, the user profile, and the persistence trait.

pub mod entity;
pub mod repository;

// Re-exports
pub use entity::{session::Session, user_profile::UserProfile};
pub use repository::SessionRepository;
