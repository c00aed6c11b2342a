//! Platform Crate - Technical Infrastructure
//!
//! This crate provides the technical foundations of the dashboard client:
//! - Request descriptors and nested query-string encoding
//! - The HTTP transport seam and its `reqwest` implementation
//! - The error taxonomy every network call resolves to
//! - Durable key-value storage for client state
//! - Unverified JWT claim decoding
//! - Client configuration

pub mod config;
pub mod error;
pub mod fetch;
pub mod http;
pub mod query_string;
pub mod storage;
pub mod token;
pub mod transport;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use config::ClientConfig;
pub use error::ApiError;
pub use fetch::Fetcher;
pub use crate::http::{FetchDescriptor, Method, QueryValue};
pub use transport::{HttpTransport, RawRequest, RawResponse, ReqwestTransport};
