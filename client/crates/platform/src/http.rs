//! Request descriptors
//!
//! A [`FetchDescriptor`] is the immutable description of one logical HTTP
//! request: method, path, query parameters and optional JSON body, plus the
//! cache-identity key the query layer groups it under.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value;

/// HTTP methods the dashboard backend accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
    Patch,
}

impl Method {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
            Method::Patch => "PATCH",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Method> for http::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => http::Method::GET,
            Method::Post => http::Method::POST,
            Method::Put => http::Method::PUT,
            Method::Delete => http::Method::DELETE,
            Method::Patch => http::Method::PATCH,
        }
    }
}

/// A query parameter value
///
/// Scalars are kept as strings or integers so the value is hashable and
/// ordered; lists and maps nest arbitrarily.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum QueryValue {
    Bool(bool),
    Int(i64),
    Str(String),
    List(Vec<QueryValue>),
    Map(BTreeMap<String, QueryValue>),
}

impl QueryValue {
    /// Convert an arbitrary JSON value (e.g. an opaque pagination cursor)
    ///
    /// `null` has no query representation and yields `None`.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::Bool(b) => Some(QueryValue::Bool(*b)),
            Value::Number(n) => Some(match n.as_i64() {
                Some(i) => QueryValue::Int(i),
                None => QueryValue::Str(n.to_string()),
            }),
            Value::String(s) => Some(QueryValue::Str(s.clone())),
            Value::Array(items) => Some(QueryValue::List(
                items.iter().filter_map(QueryValue::from_json).collect(),
            )),
            Value::Object(map) => Some(QueryValue::Map(
                map.iter()
                    .filter_map(|(k, v)| QueryValue::from_json(v).map(|v| (k.clone(), v)))
                    .collect(),
            )),
        }
    }
}

impl From<&str> for QueryValue {
    fn from(value: &str) -> Self {
        QueryValue::Str(value.to_string())
    }
}

impl From<String> for QueryValue {
    fn from(value: String) -> Self {
        QueryValue::Str(value)
    }
}

impl From<bool> for QueryValue {
    fn from(value: bool) -> Self {
        QueryValue::Bool(value)
    }
}

impl From<i64> for QueryValue {
    fn from(value: i64) -> Self {
        QueryValue::Int(value)
    }
}

impl From<i32> for QueryValue {
    fn from(value: i32) -> Self {
        QueryValue::Int(i64::from(value))
    }
}

impl From<u32> for QueryValue {
    fn from(value: u32) -> Self {
        QueryValue::Int(i64::from(value))
    }
}

impl From<f64> for QueryValue {
    fn from(value: f64) -> Self {
        QueryValue::Str(value.to_string())
    }
}

/// Dates are sent as `YYYY-MM-DD`
impl From<NaiveDate> for QueryValue {
    fn from(value: NaiveDate) -> Self {
        QueryValue::Str(value.format("%Y-%m-%d").to_string())
    }
}

impl From<DateTime<Utc>> for QueryValue {
    fn from(value: DateTime<Utc>) -> Self {
        QueryValue::Str(value.to_rfc3339())
    }
}

impl<V: Into<QueryValue>> From<Vec<V>> for QueryValue {
    fn from(values: Vec<V>) -> Self {
        QueryValue::List(values.into_iter().map(Into::into).collect())
    }
}

impl<V: Into<QueryValue>> From<BTreeMap<String, V>> for QueryValue {
    fn from(values: BTreeMap<String, V>) -> Self {
        QueryValue::Map(values.into_iter().map(|(k, v)| (k, v.into())).collect())
    }
}

/// Immutable description of one logical HTTP request
///
/// Built with the consuming `with_*` methods; once handed to a client it is
/// only read. `url` is either a path relative to the configured base URL or
/// an absolute URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchDescriptor {
    key: String,
    method: Method,
    url: String,
    query: BTreeMap<String, QueryValue>,
    body: Option<Value>,
}

impl FetchDescriptor {
    /// Create a descriptor; the cache key defaults to the URL
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        let url = url.into();
        Self {
            key: url.clone(),
            method,
            url,
            query: BTreeMap::new(),
            body: None,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::Get, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::Post, url)
    }

    pub fn put(url: impl Into<String>) -> Self {
        Self::new(Method::Put, url)
    }

    pub fn delete(url: impl Into<String>) -> Self {
        Self::new(Method::Delete, url)
    }

    pub fn patch(url: impl Into<String>) -> Self {
        Self::new(Method::Patch, url)
    }

    /// Set the cache-identity key
    #[must_use]
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    /// Add a query parameter
    #[must_use]
    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<QueryValue>) -> Self {
        self.query.insert(name.into(), value.into());
        self
    }

    /// Add a query parameter only when a value is present
    #[must_use]
    pub fn with_query_opt<V: Into<QueryValue>>(
        self,
        name: impl Into<String>,
        value: Option<V>,
    ) -> Self {
        match value {
            Some(value) => self.with_query(name, value),
            None => self,
        }
    }

    /// Set the JSON body
    #[must_use]
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn query(&self) -> &BTreeMap<String, QueryValue> {
        &self.query
    }

    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }
}
