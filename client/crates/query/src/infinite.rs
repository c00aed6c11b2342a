//! Infinite (cursor-paginated) queries
//!
//! Pages are appended in request order. At most one page request runs at a
//! time; a call made while one is running, or after the feed has ended, does
//! nothing.
//!
//! `cursors[i]` is the continuation read from `pages[i]`, and `pages[i]` was
//! requested with `cursors[i - 1]` (the initial cursor for the first page).
//!
//! Feeds are cache entries: a handle created for a key that already has a
//! fresh feed reuses its pages, and a stale or invalidated feed starts over.

use std::sync::{Arc, Mutex, MutexGuard};

use platform::error::ApiError;
use platform::fetch::Fetcher;
use platform::http::FetchDescriptor;
use serde_json::Value;
use tokio::time::Instant;

use crate::client::QueryClient;
use crate::entry::{FeedEntry, SharedFeed, lock_feed};
use crate::key::QueryKey;
use crate::pagination::PaginationPolicy;

pub(crate) type DescriptorFactory = Arc<dyn Fn(Option<&Value>) -> FetchDescriptor + Send + Sync>;

/// Outcome of [`InfiniteQuery::fetch_next_page`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageFetch {
    Appended { index: usize },
    Skipped(SkipReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Another page request is running
    InFlight,
    /// The last page had no continuation cursor
    Exhausted,
    /// The feed was reset while the page was loading
    Reset,
}

/// Handle to one paginated feed
///
/// The feed itself lives in the [`QueryClient`] under the key of its first
/// page's descriptor, so every handle for that key sees the same pages.
pub struct InfiniteQuery<F, P> {
    client: QueryClient<F>,
    key: QueryKey,
    descriptor_for: DescriptorFactory,
    policy: Arc<P>,
    initial_cursor: Option<Value>,
    feed: SharedFeed,
}

impl<F, P> Clone for InfiniteQuery<F, P> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            key: self.key.clone(),
            descriptor_for: Arc::clone(&self.descriptor_for),
            policy: Arc::clone(&self.policy),
            initial_cursor: self.initial_cursor.clone(),
            feed: Arc::clone(&self.feed),
        }
    }
}

impl<F, P> InfiniteQuery<F, P>
where
    F: Fetcher + Send + Sync + 'static,
    P: PaginationPolicy,
{
    pub(crate) fn new(
        client: QueryClient<F>,
        key: QueryKey,
        descriptor_for: DescriptorFactory,
        policy: P,
        initial_cursor: Option<Value>,
        feed: SharedFeed,
    ) -> Self {
        Self {
            client,
            key,
            descriptor_for,
            policy: Arc::new(policy),
            initial_cursor,
            feed,
        }
    }

    pub fn key(&self) -> &QueryKey {
        &self.key
    }

    /// Request the next page, or the first one if nothing was loaded yet
    pub async fn fetch_next_page(&self) -> Result<PageFetch, ApiError> {
        let (cursor, session) = {
            let mut feed = self.feed();
            if feed.fetching {
                tracing::debug!(key = %self.key, "Page request already running; skipping");
                return Ok(PageFetch::Skipped(SkipReason::InFlight));
            }
            if !feed.has_next {
                tracing::debug!(key = %self.key, pages = feed.pages.len(), "Feed exhausted; skipping");
                return Ok(PageFetch::Skipped(SkipReason::Exhausted));
            }
            feed.fetching = true;
            let cursor = match feed.cursors.last() {
                Some(cursor) => cursor.clone(),
                None => self.initial_cursor.clone(),
            };
            (cursor, feed.session)
        };
        // dropped after the feed lock below is released
        let _fetching = FetchingFlag {
            feed: &self.feed,
            session,
        };

        let descriptor = (self.descriptor_for)(cursor.as_ref());
        let result = self
            .client
            .fetch_with_retry(&self.key, &descriptor, self.client.config().retry)
            .await;

        let mut feed = self.feed();
        if feed.session != session {
            tracing::debug!(key = %self.key, "Discarding page from a reset feed");
            return Ok(PageFetch::Skipped(SkipReason::Reset));
        }
        let page = match result {
            Ok(page) => page,
            Err(err) => {
                err.log();
                feed.error = Some(err.clone());
                return Err(err);
            }
        };

        let next = self.policy.next_cursor(&page);
        let index = feed.record_page(page, next, Instant::now());
        tracing::debug!(key = %self.key, index, has_next = feed.has_next, "Page appended");
        Ok(PageFetch::Appended { index })
    }

    /// Start the feed over from the initial cursor
    ///
    /// Every handle sharing the feed sees the reset.
    pub fn reset(&self) {
        self.feed().restart();
    }

    pub fn pages(&self) -> Vec<Value> {
        self.feed().pages.clone()
    }

    pub fn cursors(&self) -> Vec<Option<Value>> {
        self.feed().cursors.clone()
    }

    pub fn page_count(&self) -> usize {
        self.feed().pages.len()
    }

    pub fn has_next_page(&self) -> bool {
        self.feed().has_next
    }

    pub fn is_fetching_next_page(&self) -> bool {
        self.feed().fetching
    }

    /// Error of the last page request, cleared by the next page that arrives
    pub fn error(&self) -> Option<ApiError> {
        self.feed().error.clone()
    }

    fn feed(&self) -> MutexGuard<'_, FeedEntry> {
        lock_feed(&self.feed)
    }
}

/// Clears `fetching` however the page request ends, including cancellation
struct FetchingFlag<'a> {
    feed: &'a Mutex<FeedEntry>,
    session: u64,
}

impl Drop for FetchingFlag<'_> {
    fn drop(&mut self) {
        let mut feed = lock_feed(self.feed);
        if feed.session == self.session {
            feed.fetching = false;
        }
    }
}
