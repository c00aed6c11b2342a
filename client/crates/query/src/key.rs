//! Cache identity
//!
//! Two descriptors share a cache entry when their key, method, query and body
//! all match. The query part is rendered with a fixed encoding so key order in
//! the descriptor never matters.

use std::fmt;

use platform::http::{FetchDescriptor, Method};
use platform::query_string::{self, ArrayFormat};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey {
    base: String,
    method: Method,
    query: String,
    body: Option<String>,
}

impl QueryKey {
    pub fn of(descriptor: &FetchDescriptor) -> Self {
        Self {
            base: descriptor.key().to_string(),
            method: descriptor.method(),
            query: query_string::encode(descriptor.query(), ArrayFormat::Indices),
            body: descriptor.body().map(|b| b.to_string()),
        }
    }

    /// The descriptor key this entry was created from
    pub fn base(&self) -> &str {
        &self.base
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.base)?;
        if !self.query.is_empty() {
            write!(f, "?{}", self.query)?;
        }
        if let Some(body) = &self.body {
            write!(f, " {body}")?;
        }
        Ok(())
    }
}
