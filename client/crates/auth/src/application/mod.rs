//! Application Layer
//!
//! Session state, the request pipeline, and use cases.

pub mod config;
pub mod interceptor;
pub mod oauth;
pub mod refresh;
pub mod request_client;
pub mod route_guard;
pub mod session_store;
pub mod sign_in;
pub mod sign_up;

// Re-exports
pub use config::{AuthConfig, RefreshRoute};
pub use interceptor::AuthenticatedClient;
pub use oauth::{CallbackOutcome, OAuthRedirect, OAuthUseCase};
pub use refresh::TokenRefresher;
pub use request_client::RequestClient;
pub use route_guard::{GuardDecision, RedirectReason, RouteGuard};
pub use session_store::SessionStore;
pub use sign_in::{SignInInput, SignInUseCase};
pub use sign_up::{SignUpInput, SignUpUseCase};
