//! Query Crate - Response Cache
//!
//! Keyed caching of backend reads on top of any [`platform::Fetcher`]:
//! - Deduplication of concurrent identical requests
//! - Freshness window and explicit invalidation
//! - Bounded retry with exponential backoff for transient failures
//! - Mutations that invalidate cached reads
//! - Cursor-paginated feeds with an in-flight guard

pub mod client;
pub mod config;
pub mod entry;
pub mod infinite;
pub mod key;
pub mod pagination;

#[cfg(test)]
mod test_support;

pub use client::QueryClient;
pub use config::{FetchOptions, QueryConfig, RetryPolicy};
pub use entry::{QueryState, QueryStatus};
pub use infinite::{InfiniteQuery, PageFetch, SkipReason};
pub use key::QueryKey;
pub use pagination::{DefaultPagination, PaginationPolicy, SearchAfter};
