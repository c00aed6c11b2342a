//! Auth (Authentication) Client Module
//!
//! Clean Architecture structure:
//! - `domain/` - Session entity, user profile, repository trait
//! - `application/` - Session store, request pipeline, use cases
//! - `infra/` - Session persistence on durable storage
//! - `presentation/` - Wire DTOs of the backend auth endpoints
//!
//! ## Features
//! - Email + password sign in and registration
//! - OAuth redirect flow (initiate and callback handling)
//! - Bearer-token request client with refresh-and-replay on 401
//! - Route guard with token expiry checks
//!
//! ## Session Model
//! - One shared session context, mutated only by login/logout
//! - Concurrent 401s share a single refresh request
//! - Refresh failure always signs the user out

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

#[cfg(test)]
mod test_support;

// Re-exports for convenience
pub use application::{
    AuthConfig, AuthenticatedClient, CallbackOutcome, GuardDecision, OAuthUseCase,
    RequestClient, RouteGuard, SessionStore, SignInInput, SignInUseCase, SignUpInput,
    SignUpUseCase,
};
pub use domain::{Session, SessionRepository, UserProfile};
pub use error::{AuthError, AuthResult};
pub use infra::StoredSessionRepository;

// Re-export kernel error types for unified error handling
pub use kernel::{AppError, AppResult, ErrorKind};

pub mod models {
    pub use crate::domain::entity::*;
    pub use crate::presentation::dto::*;
}
