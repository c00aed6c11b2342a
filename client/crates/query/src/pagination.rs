//! Pagination policies
//!
//! A policy reads the continuation cursor out of the page that just arrived.
//! `None` ends the feed.

use serde_json::Value;

pub trait PaginationPolicy: Send + Sync {
    fn next_cursor(&self, page: &Value) -> Option<Value>;
}

impl<F> PaginationPolicy for F
where
    F: Fn(&Value) -> Option<Value> + Send + Sync,
{
    fn next_cursor(&self, page: &Value) -> Option<Value> {
        self(page)
    }
}

/// Cursor conventions used across the backend
///
/// Checked in order:
/// 1. `data.next_search_after` (search-after feeds)
/// 2. `nextCursor` / `next_cursor`
/// 3. `hasMore: false` or `next_page: null` end the feed
/// 4. `next_page`
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultPagination;

impl PaginationPolicy for DefaultPagination {
    fn next_cursor(&self, page: &Value) -> Option<Value> {
        if let Some(cursor) = present(page.pointer("/data/next_search_after")) {
            return Some(cursor.clone());
        }
        if let Some(cursor) = present(page.get("nextCursor")).or(present(page.get("next_cursor"))) {
            return Some(cursor.clone());
        }
        if page.get("hasMore") == Some(&Value::Bool(false)) {
            return None;
        }
        present(page.get("next_page")).cloned()
    }
}

/// Follow `data.next_search_after` only
#[derive(Debug, Clone, Copy, Default)]
pub struct SearchAfter;

impl PaginationPolicy for SearchAfter {
    fn next_cursor(&self, page: &Value) -> Option<Value> {
        present(page.pointer("/data/next_search_after")).cloned()
    }
}

/// A usable cursor: not null, not `false`, not an empty string
fn present(value: Option<&Value>) -> Option<&Value> {
    match value? {
        Value::Null | Value::Bool(false) => None,
        Value::String(s) if s.is_empty() => None,
        other => Some(other),
    }
}
