//! Shared Kernel - Domain-crossing minimal core
//!
//! This crate contains the "smallest core" of the dashboard client vocabulary:
//! - Error classification and the unified error type shown to consumers
//! - The `{status, message, data}` envelope every backend response uses
//!
//! **Design Principle**: Only include things that are "hard to change"
//! and have consistent meaning across all crates.

pub mod error {
    pub mod app_error;
    pub mod conversions;
    pub mod kind;
}
pub mod envelope;

pub use envelope::ApiResponse;
pub use error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};
