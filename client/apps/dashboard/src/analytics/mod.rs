//! Analytics views
//!
//! Typed response models and request descriptors for the dashboard's read
//! endpoints.

pub mod endpoints;
pub mod models;
