//! Cache entries
//!
//! The status of an entry is derived from its fields, so it cannot disagree
//! with them: an attached in-flight load means `Loading`, a recorded error
//! means `Error`, data means `Success`, and nothing at all means `Idle`.
//!
//! A [`FeedEntry`] is the paginated form of an entry. It keeps the same
//! bookkeeping plus the ordered pages and the cursor read from each one.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures::future::{BoxFuture, Shared};
use platform::error::ApiError;
use serde_json::Value;
use tokio::time::Instant;

pub(crate) type LoadFuture = Shared<BoxFuture<'static, Result<Value, ApiError>>>;
pub(crate) type SharedFeed = Arc<Mutex<FeedEntry>>;

/// Lifecycle of a cached query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStatus {
    Idle,
    Loading,
    Success,
    Error,
}

/// Snapshot of one cache entry
#[derive(Debug, Clone)]
pub struct QueryState {
    pub status: QueryStatus,
    /// Last successful body; kept while a refetch is loading or has failed
    pub data: Option<Value>,
    pub error: Option<ApiError>,
    pub last_fetched_at: Option<Instant>,
    pub is_stale: bool,
}

impl QueryState {
    pub(crate) fn idle() -> Self {
        Self {
            status: QueryStatus::Idle,
            data: None,
            error: None,
            last_fetched_at: None,
            is_stale: true,
        }
    }
}

pub(crate) struct CacheEntry {
    pub(crate) data: Option<Value>,
    pub(crate) error: Option<ApiError>,
    pub(crate) fetched_at: Option<Instant>,
    pub(crate) invalidated: bool,
    /// Identity of the load allowed to write this entry
    pub(crate) generation: u64,
    pub(crate) inflight: Option<LoadFuture>,
}

impl CacheEntry {
    pub(crate) fn new() -> Self {
        Self {
            data: None,
            error: None,
            fetched_at: None,
            invalidated: false,
            generation: 0,
            inflight: None,
        }
    }

    pub(crate) fn status(&self) -> QueryStatus {
        if self.inflight.is_some() {
            QueryStatus::Loading
        } else if self.error.is_some() {
            QueryStatus::Error
        } else if self.data.is_some() {
            QueryStatus::Success
        } else {
            QueryStatus::Idle
        }
    }

    /// Cached body, if it is still within the freshness window
    pub(crate) fn fresh_data(&self, now: Instant, stale_after: Duration) -> Option<&Value> {
        if self.invalidated || self.error.is_some() {
            return None;
        }
        let fetched_at = self.fetched_at?;
        if now.saturating_duration_since(fetched_at) < stale_after {
            self.data.as_ref()
        } else {
            None
        }
    }

    pub(crate) fn record(&mut self, result: &Result<Value, ApiError>, now: Instant) {
        match result {
            Ok(data) => {
                self.data = Some(data.clone());
                self.error = None;
                self.fetched_at = Some(now);
                self.invalidated = false;
            }
            Err(err) => self.error = Some(err.clone()),
        }
        self.inflight = None;
    }

    pub(crate) fn state(&self, now: Instant, stale_after: Duration) -> QueryState {
        QueryState {
            status: self.status(),
            data: self.data.clone(),
            error: self.error.clone(),
            last_fetched_at: self.fetched_at,
            is_stale: self.fresh_data(now, stale_after).is_none(),
        }
    }
}

pub(crate) struct FeedEntry {
    pub(crate) pages: Vec<Value>,
    /// `cursors[i]` is the continuation read from `pages[i]`
    pub(crate) cursors: Vec<Option<Value>>,
    pub(crate) has_next: bool,
    pub(crate) fetching: bool,
    pub(crate) error: Option<ApiError>,
    /// When the most recent page arrived
    pub(crate) fetched_at: Option<Instant>,
    pub(crate) invalidated: bool,
    /// Bumped on restart; pages requested in an older session are dropped
    pub(crate) session: u64,
}

impl FeedEntry {
    pub(crate) fn shared() -> SharedFeed {
        Arc::new(Mutex::new(Self {
            pages: Vec::new(),
            cursors: Vec::new(),
            has_next: true,
            fetching: false,
            error: None,
            fetched_at: None,
            invalidated: false,
            session: 0,
        }))
    }

    pub(crate) fn status(&self) -> QueryStatus {
        if self.fetching {
            QueryStatus::Loading
        } else if self.error.is_some() {
            QueryStatus::Error
        } else if !self.pages.is_empty() {
            QueryStatus::Success
        } else {
            QueryStatus::Idle
        }
    }

    pub(crate) fn is_fresh(&self, now: Instant, stale_after: Duration) -> bool {
        match self.fetched_at {
            Some(fetched_at) if !self.invalidated => {
                now.saturating_duration_since(fetched_at) < stale_after
            }
            _ => false,
        }
    }

    pub(crate) fn record_page(&mut self, page: Value, next: Option<Value>, now: Instant) -> usize {
        self.has_next = next.is_some();
        self.cursors.push(next);
        self.pages.push(page);
        self.error = None;
        self.fetched_at = Some(now);
        self.pages.len() - 1
    }

    /// Drop every page and start again from the initial cursor
    pub(crate) fn restart(&mut self) {
        self.session += 1;
        self.pages.clear();
        self.cursors.clear();
        self.has_next = true;
        self.fetching = false;
        self.error = None;
        self.fetched_at = None;
        self.invalidated = false;
    }

    /// Pages are reported as one JSON array in fetch order
    pub(crate) fn state(&self, now: Instant, stale_after: Duration) -> QueryState {
        QueryState {
            status: self.status(),
            data: (!self.pages.is_empty()).then(|| Value::Array(self.pages.clone())),
            error: self.error.clone(),
            last_fetched_at: self.fetched_at,
            is_stale: !self.is_fresh(now, stale_after),
        }
    }
}

pub(crate) fn lock_feed(feed: &Mutex<FeedEntry>) -> MutexGuard<'_, FeedEntry> {
    feed.lock().unwrap_or_else(PoisonError::into_inner)
}
