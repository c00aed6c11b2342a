//! Query Client
//!
//! Keyed response cache over a [`Fetcher`].
//!
//! - A successful result is served from memory until it is `stale_after` old
//!   or explicitly invalidated.
//! - Concurrent fetches of the same key share one in-flight load.
//! - Retryable failures are retried with exponential backoff before they
//!   reach the caller.
//! - Each load carries a generation. When the entry is removed or the load is
//!   superseded before it completes, its response still reaches the callers
//!   awaiting it but is not written to the cache.
//! - Paginated feeds are kept alongside the plain entries, keyed by the
//!   descriptor of their first page, and follow the same freshness and
//!   invalidation rules.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::FutureExt;
use platform::error::ApiError;
use platform::fetch::Fetcher;
use platform::http::FetchDescriptor;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::time::Instant;

use crate::config::{FetchOptions, QueryConfig, RetryPolicy};
use crate::entry::{CacheEntry, FeedEntry, QueryState, SharedFeed, lock_feed};
use crate::infinite::InfiniteQuery;
use crate::key::QueryKey;
use crate::pagination::PaginationPolicy;

struct Inner<F> {
    fetcher: F,
    config: QueryConfig,
    entries: Mutex<HashMap<QueryKey, CacheEntry>>,
    feeds: Mutex<HashMap<QueryKey, SharedFeed>>,
    next_generation: AtomicU64,
}

/// Shared query cache; clones share one cache
pub struct QueryClient<F> {
    inner: Arc<Inner<F>>,
}

impl<F> Clone for QueryClient<F> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<F> QueryClient<F>
where
    F: Fetcher + Send + Sync + 'static,
{
    pub fn new(fetcher: F, config: QueryConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                fetcher,
                config,
                entries: Mutex::new(HashMap::new()),
                feeds: Mutex::new(HashMap::new()),
                next_generation: AtomicU64::new(1),
            }),
        }
    }

    pub fn config(&self) -> &QueryConfig {
        &self.inner.config
    }

    pub fn fetcher(&self) -> &F {
        &self.inner.fetcher
    }

    /// Fetch with the client defaults
    pub async fn fetch(&self, descriptor: &FetchDescriptor) -> Result<Value, ApiError> {
        self.fetch_with(descriptor, FetchOptions::default()).await
    }

    /// Fetch and deserialize the body
    pub async fn fetch_as<T: DeserializeOwned>(
        &self,
        descriptor: &FetchDescriptor,
    ) -> Result<T, ApiError> {
        let body = self.fetch(descriptor).await?;
        Ok(serde_json::from_value(body)?)
    }

    /// Serve from cache, join the running load, or start a new one
    pub async fn fetch_with(
        &self,
        descriptor: &FetchDescriptor,
        options: FetchOptions,
    ) -> Result<Value, ApiError> {
        let key = QueryKey::of(descriptor);
        let stale_after = options.stale_after.unwrap_or(self.inner.config.stale_after);
        let retry = options.retry.unwrap_or(self.inner.config.retry);

        let load = {
            let mut entries = self.entries();
            let entry = entries.entry(key.clone()).or_insert_with(CacheEntry::new);
            if let Some(data) = entry.fresh_data(Instant::now(), stale_after) {
                tracing::debug!(key = %key, "Cache hit");
                return Ok(data.clone());
            }

            match entry.inflight.clone() {
                Some(inflight) => {
                    tracing::debug!(key = %key, "Joining in-flight query");
                    inflight
                }
                None => {
                    let generation = self.next_generation();
                    let load = self
                        .clone()
                        .load(key.clone(), descriptor.clone(), retry, generation)
                        .boxed()
                        .shared();
                    entry.generation = generation;
                    entry.inflight = Some(load.clone());
                    tracing::debug!(key = %key, generation, "Cache miss; fetching");
                    load
                }
            }
        };
        load.await
    }

    /// Send a write through the fetcher, then invalidate `invalidates`
    ///
    /// Mutations are neither cached nor retried.
    pub async fn mutate(
        &self,
        descriptor: &FetchDescriptor,
        invalidates: &[&str],
    ) -> Result<Value, ApiError> {
        let body = self.inner.fetcher.fetch(descriptor).await?;
        for key in invalidates {
            self.invalidate(key);
        }
        tracing::debug!(
            method = %descriptor.method(),
            key = descriptor.key(),
            "Mutation applied"
        );
        Ok(body)
    }

    /// Mark every entry created from descriptor key `key` as stale
    ///
    /// A load in flight for such an entry is superseded: its waiters still
    /// get its result, but the next fetch starts a new load.
    pub fn invalidate(&self, key: &str) -> usize {
        let mut entries = self.entries();
        let mut count = 0;
        for (query_key, entry) in entries.iter_mut() {
            if query_key.base() != key {
                continue;
            }
            entry.invalidated = true;
            if entry.inflight.take().is_some() {
                entry.generation = self.next_generation();
            }
            count += 1;
        }
        drop(entries);
        for (query_key, feed) in self.feeds().iter() {
            if query_key.base() == key {
                lock_feed(feed).invalidated = true;
                count += 1;
            }
        }
        tracing::debug!(key, count, "Invalidated queries");
        count
    }

    pub fn invalidate_all(&self) {
        let mut entries = self.entries();
        for entry in entries.values_mut() {
            entry.invalidated = true;
            if entry.inflight.take().is_some() {
                entry.generation = self.next_generation();
            }
        }
        drop(entries);
        for feed in self.feeds().values() {
            lock_feed(feed).invalidated = true;
        }
    }

    /// Drop every entry and feed created from descriptor key `key`
    ///
    /// Handles to a removed feed keep working but are detached from the cache.
    pub fn remove(&self, key: &str) -> usize {
        let mut removed = {
            let mut entries = self.entries();
            let before = entries.len();
            entries.retain(|query_key, _| query_key.base() != key);
            before - entries.len()
        };
        let mut feeds = self.feeds();
        let before = feeds.len();
        feeds.retain(|query_key, _| query_key.base() != key);
        removed += before - feeds.len();
        tracing::debug!(key, removed, "Removed queries");
        removed
    }

    pub fn clear(&self) {
        self.entries().clear();
        self.feeds().clear();
    }

    /// Snapshot of the entry `descriptor` maps to
    pub fn state(&self, descriptor: &FetchDescriptor) -> QueryState {
        let key = QueryKey::of(descriptor);
        let now = Instant::now();
        let stale_after = self.inner.config.stale_after;
        if let Some(entry) = self.entries().get(&key) {
            return entry.state(now, stale_after);
        }
        match self.feeds().get(&key) {
            Some(feed) => lock_feed(feed).state(now, stale_after),
            None => QueryState::idle(),
        }
    }

    /// Open a cursor-paginated feed
    ///
    /// `descriptor_for` builds the request for a cursor; the first page is
    /// requested with `initial_cursor`. The feed is keyed by that first
    /// descriptor. An existing fresh feed for the key is shared with the new
    /// handle; a stale or invalidated one is restarted.
    pub fn infinite<B, P>(
        &self,
        descriptor_for: B,
        policy: P,
        initial_cursor: Option<Value>,
    ) -> InfiniteQuery<F, P>
    where
        B: Fn(Option<&Value>) -> FetchDescriptor + Send + Sync + 'static,
        P: PaginationPolicy,
    {
        let key = QueryKey::of(&descriptor_for(initial_cursor.as_ref()));
        let feed = Arc::clone(
            self.feeds()
                .entry(key.clone())
                .or_insert_with(FeedEntry::shared),
        );

        {
            let mut entry = lock_feed(&feed);
            let fresh = entry.is_fresh(Instant::now(), self.inner.config.stale_after);
            if !entry.pages.is_empty() && !fresh && !entry.fetching {
                tracing::debug!(key = %key, pages = entry.pages.len(), "Feed is stale; starting over");
                entry.restart();
            } else if !entry.pages.is_empty() {
                tracing::debug!(key = %key, pages = entry.pages.len(), "Reusing cached feed");
            }
        }

        InfiniteQuery::new(
            self.clone(),
            key,
            Arc::new(descriptor_for),
            policy,
            initial_cursor,
            feed,
        )
    }

    async fn load(
        self,
        key: QueryKey,
        descriptor: FetchDescriptor,
        retry: RetryPolicy,
        generation: u64,
    ) -> Result<Value, ApiError> {
        let result = self.fetch_with_retry(&key, &descriptor, retry).await;
        if let Err(err) = &result {
            err.log();
        }

        let mut entries = self.entries();
        match entries.get_mut(&key) {
            Some(entry) if entry.generation == generation => {
                entry.record(&result, Instant::now());
            }
            _ => tracing::debug!(key = %key, generation, "Discarding superseded response"),
        }
        result
    }

    pub(crate) async fn fetch_with_retry(
        &self,
        key: &QueryKey,
        descriptor: &FetchDescriptor,
        retry: RetryPolicy,
    ) -> Result<Value, ApiError> {
        let mut attempt = 0;
        loop {
            match self.inner.fetcher.fetch(descriptor).await {
                Err(err) if err.is_retryable() && attempt < retry.retries => {
                    let delay = retry.delay_for(attempt);
                    attempt += 1;
                    tracing::warn!(
                        key = %key,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "Retrying query"
                    );
                    tokio::time::sleep(delay).await;
                }
                result => return result,
            }
        }
    }

    fn next_generation(&self) -> u64 {
        self.inner.next_generation.fetch_add(1, Ordering::Relaxed)
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<QueryKey, CacheEntry>> {
        self.inner
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn feeds(&self) -> MutexGuard<'_, HashMap<QueryKey, SharedFeed>> {
        self.inner
            .feeds
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
