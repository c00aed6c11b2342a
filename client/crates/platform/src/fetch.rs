//! Fetcher seam
//!
//! Anything that can turn a [`FetchDescriptor`] into a JSON body. The query
//! cache is generic over this trait so it can sit on top of either the bare
//! request client or the authenticated (refreshing) one.

use serde_json::Value;

use crate::error::ApiError;
use crate::http::FetchDescriptor;

#[trait_variant::make(Fetcher: Send)]
pub trait LocalFetcher {
    /// Resolve a descriptor to its response body
    ///
    /// An empty 2xx body resolves to `Value::Null`.
    async fn fetch(&self, descriptor: &FetchDescriptor) -> Result<Value, ApiError>;
}
