//! Analytics request descriptors
//!
//! One builder per endpoint. Cache keys are fixed per view so a whole view can
//! be invalidated at once, whatever its parameters.

use chrono::NaiveDate;
use platform::http::{FetchDescriptor, QueryValue};
use serde_json::Value;

pub const SUMMARY_KEY: &str = "analytics-summary";
pub const SALES_TREND_KEY: &str = "analytics-sales-trend";
pub const PRODUCTS_KEY: &str = "analytics-products";
pub const CUSTOMERS_KEY: &str = "analytics-customers";
pub const NEWS_OVERVIEW_KEY: &str = "news-overview";
pub const RECENT_NEWS_KEY: &str = "recent-news";
pub const TRANSACTIONS_KEY: &str = "transactions";

/// Recent news page size the feed uses unless told otherwise
pub const RECENT_NEWS_PAGE_SIZE: u32 = 10;

/// Optional reporting window; the backend defaults to the last 30 days
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            start_date: Some(start_date),
            end_date: Some(end_date),
        }
    }

    fn apply(&self, descriptor: FetchDescriptor) -> FetchDescriptor {
        descriptor
            .with_query_opt("start_date", self.start_date)
            .with_query_opt("end_date", self.end_date)
    }
}

/// Filter shared by the news views
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewsFilter {
    pub search_query: Option<String>,
    pub range: DateRange,
}

impl NewsFilter {
    fn apply(&self, descriptor: FetchDescriptor) -> FetchDescriptor {
        self.range
            .apply(descriptor)
            .with_query_opt("search_query", self.search_query.as_deref())
    }
}

pub fn summary(range: &DateRange) -> FetchDescriptor {
    range.apply(FetchDescriptor::get("/analytics/summary").with_key(SUMMARY_KEY))
}

pub fn sales_trend(range: &DateRange) -> FetchDescriptor {
    range.apply(FetchDescriptor::get("/analytics/sales-pgsql").with_key(SALES_TREND_KEY))
}

pub fn products(range: &DateRange) -> FetchDescriptor {
    range.apply(FetchDescriptor::get("/analytics/products").with_key(PRODUCTS_KEY))
}

pub fn customers(range: &DateRange) -> FetchDescriptor {
    range.apply(FetchDescriptor::get("/analytics/customers").with_key(CUSTOMERS_KEY))
}

pub fn news_overview(filter: &NewsFilter) -> FetchDescriptor {
    filter.apply(FetchDescriptor::get("/analytics/news").with_key(NEWS_OVERVIEW_KEY))
}

/// One page of the recent-news feed
///
/// `search_after` is the cursor from the previous page; the first page has
/// none.
pub fn recent_news(filter: &NewsFilter, size: u32, search_after: Option<&Value>) -> FetchDescriptor {
    filter
        .apply(FetchDescriptor::get("/analytics/news/recent").with_key(RECENT_NEWS_KEY))
        .with_query("size", size)
        .with_query_opt("search_after", search_after.and_then(QueryValue::from_json))
}

/// Transactions table request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionsQuery {
    pub page: u32,
    pub page_size: u32,
    pub search_query: Option<String>,
    pub min_date: Option<NaiveDate>,
    pub max_date: Option<NaiveDate>,
}

impl Default for TransactionsQuery {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: 5,
            search_query: None,
            min_date: None,
            max_date: None,
        }
    }
}

pub fn transactions(query: &TransactionsQuery) -> FetchDescriptor {
    FetchDescriptor::get("/transactions")
        .with_key(TRANSACTIONS_KEY)
        .with_query("page", query.page)
        .with_query("page_size", query.page_size)
        .with_query_opt(
            "search_query",
            query.search_query.as_deref().filter(|q| !q.trim().is_empty()),
        )
        .with_query_opt("min_date", query.min_date)
        .with_query_opt("max_date", query.max_date)
}
