//! Presentation Layer
//!
//! Wire shapes of the backend auth endpoints.

pub mod dto;
