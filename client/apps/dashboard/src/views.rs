//! Dashboard views
//!
//! Loads every view through the query cache. A view that fails to load ends
//! in a `Failed` state carrying the message to show; it never blocks the
//! others.

use kernel::ApiResponse;
use platform::error::ApiError;
use platform::fetch::Fetcher;
use platform::http::FetchDescriptor;
use query::{InfiniteQuery, PaginationPolicy, QueryClient, SearchAfter};
use serde::de::DeserializeOwned;

use crate::analytics::endpoints::{self, DateRange, NewsFilter, TransactionsQuery};
use crate::analytics::models::{
    CustomerAnalytics, NewsArticle, NewsOverview, PeriodSummary, ProductAnalytics,
    RecentNewsPage, SalesTrendPoint, TransactionsPage,
};

/// Load outcome of one view
#[derive(Debug, Clone, PartialEq)]
pub enum ViewState<T> {
    Loaded(T),
    Failed(String),
}

impl<T> ViewState<T> {
    pub fn loaded(&self) -> Option<&T> {
        match self {
            ViewState::Loaded(value) => Some(value),
            ViewState::Failed(_) => None,
        }
    }
}

#[derive(Debug)]
pub struct Dashboard {
    pub summary: ViewState<PeriodSummary>,
    pub sales_trend: ViewState<Vec<SalesTrendPoint>>,
    pub products: ViewState<ProductAnalytics>,
    pub customers: ViewState<CustomerAnalytics>,
    pub news_overview: ViewState<NewsOverview>,
    pub transactions: ViewState<TransactionsPage>,
    pub recent_news: ViewState<Vec<NewsArticle>>,
}

/// Fetch a view and unwrap its envelope
pub async fn load_view<F, T>(
    queries: &QueryClient<F>,
    name: &'static str,
    descriptor: &FetchDescriptor,
) -> ViewState<T>
where
    F: Fetcher + Send + Sync + 'static,
    T: DeserializeOwned,
{
    let result = queries
        .fetch_as::<ApiResponse<T>>(descriptor)
        .await
        .and_then(|response| {
            response
                .into_data()
                .map_err(|e| ApiError::Decode(e.message().to_string()))
        });
    match result {
        Ok(data) => {
            tracing::debug!(view = name, "View loaded");
            ViewState::Loaded(data)
        }
        Err(err) => {
            tracing::warn!(view = name, error = %err, "View failed to load");
            ViewState::Failed(err.user_message())
        }
    }
}

/// Recent news feed with at least its first page loaded
///
/// A feed still cached for the same filter is reused as is.
pub async fn recent_news_feed<F>(
    queries: &QueryClient<F>,
    filter: NewsFilter,
) -> (InfiniteQuery<F, SearchAfter>, ViewState<Vec<NewsArticle>>)
where
    F: Fetcher + Send + Sync + 'static,
{
    let feed = queries.infinite(
        move |cursor| endpoints::recent_news(&filter, endpoints::RECENT_NEWS_PAGE_SIZE, cursor),
        SearchAfter,
        None,
    );
    let first_page = match feed.page_count() {
        0 => feed.fetch_next_page().await.map(|_| ()),
        _ => Ok(()),
    };
    let state = match first_page {
        Ok(()) => ViewState::Loaded(articles(&feed)),
        Err(err) => {
            tracing::warn!(view = "recent-news", error = %err, "View failed to load");
            ViewState::Failed(err.user_message())
        }
    };
    (feed, state)
}

/// All articles loaded so far, in feed order
pub fn articles<F, P>(feed: &InfiniteQuery<F, P>) -> Vec<NewsArticle>
where
    F: Fetcher + Send + Sync + 'static,
    P: PaginationPolicy,
{
    feed.pages()
        .into_iter()
        .filter_map(|page| {
            let page = page.get("data")?.clone();
            match serde_json::from_value::<RecentNewsPage>(page) {
                Ok(page) => Some(page.items),
                Err(e) => {
                    tracing::warn!(error = %e, "Skipping malformed news page");
                    None
                }
            }
        })
        .flatten()
        .collect()
}

pub async fn load_dashboard<F>(queries: &QueryClient<F>, range: DateRange) -> Dashboard
where
    F: Fetcher + Send + Sync + 'static,
{
    let news = NewsFilter {
        search_query: None,
        range,
    };
    let requests = [
        endpoints::summary(&range),
        endpoints::sales_trend(&range),
        endpoints::products(&range),
        endpoints::customers(&range),
        endpoints::news_overview(&news),
        endpoints::transactions(&TransactionsQuery::default()),
    ];

    let (summary, sales_trend, products, customers, news_overview, transactions, recent) = tokio::join!(
        load_view(queries, "summary", &requests[0]),
        load_view(queries, "sales-trend", &requests[1]),
        load_view(queries, "products", &requests[2]),
        load_view(queries, "customers", &requests[3]),
        load_view(queries, "news-overview", &requests[4]),
        load_view(queries, "transactions", &requests[5]),
        recent_news_feed(queries, news),
    );
    let (_feed, recent_news) = recent;

    Dashboard {
        summary,
        sales_trend,
        products,
        customers,
        news_overview,
        transactions,
        recent_news,
    }
}

#[cfg(test)]
mod tests {
    use super::{ViewState, load_dashboard};
    use crate::analytics::endpoints::DateRange;
    use platform::error::ApiError;
    use platform::fetch::Fetcher;
    use platform::http::FetchDescriptor;
    use query::{QueryClient, QueryConfig, RetryPolicy};
    use serde_json::{Value, json};
    use std::collections::HashMap;

    /// Answers by URL
    struct StaticFetcher {
        routes: HashMap<&'static str, Result<Value, ApiError>>,
    }

    impl Fetcher for StaticFetcher {
        async fn fetch(&self, descriptor: &FetchDescriptor) -> Result<Value, ApiError> {
            self.routes
                .get(descriptor.url())
                .cloned()
                .unwrap_or_else(|| Err(ApiError::from_response(404, r#"{"detail":"Not Found"}"#)))
        }
    }

    fn envelope(data: Value) -> Result<Value, ApiError> {
        Ok(json!({"status": "success", "message": "ok", "data": data}))
    }

    fn summary_card(title: &str) -> Value {
        json!({"summary_title": title, "current_period": 10, "previous_period": 5, "growth": 100.0})
    }

    #[tokio::test]
    async fn test_failed_view_does_not_block_others() {
        let routes = HashMap::from([
            (
                "/analytics/summary",
                envelope(json!({
                    "sales_summary": summary_card("Products Sold"),
                    "orders_summary": summary_card("Orders"),
                    "revenue_summary": summary_card("Revenue"),
                    "aov_summary": summary_card("Average Order Value")
                })),
            ),
            (
                "/analytics/sales-pgsql",
                envelope(json!([
                    {"transaction_date": "2024-03-01", "total_sales": 120.5, "total_transactions": 3}
                ])),
            ),
            (
                "/analytics/products",
                Err(ApiError::from_response(
                    500,
                    r#"{"detail":"Internal server error: connection lost"}"#,
                )),
            ),
            (
                "/analytics/customers",
                envelope(json!({"age_spending": [], "age_group": []})),
            ),
            (
                "/analytics/news",
                Ok(json!({"status": "error", "message": "Elasticsearch unavailable", "data": null})),
            ),
            (
                "/transactions",
                envelope(json!({
                    "items": [],
                    "metadata": {"current_page": 1, "page_size": 5, "total_pages": 0, "total_items": 0}
                })),
            ),
            (
                "/analytics/news/recent",
                envelope(json!({
                    "items": [{
                        "title": "Harga cabai naik",
                        "url": "https://example.com/a",
                        "publish_date": "2024-11-02T08:00:00"
                    }],
                    "next_search_after": null
                })),
            ),
        ]);
        let queries = QueryClient::new(
            StaticFetcher { routes },
            QueryConfig::default().with_retry(RetryPolicy::none()),
        );

        let dashboard = load_dashboard(&queries, DateRange::default()).await;

        let summary = dashboard.summary.loaded().unwrap();
        assert_eq!(summary.orders_summary.summary_title, "Orders");
        assert_eq!(dashboard.sales_trend.loaded().map(Vec::len), Some(1));
        assert_eq!(
            dashboard.products,
            ViewState::Failed("Internal server error: connection lost".to_string())
        );
        assert_eq!(
            dashboard.news_overview,
            ViewState::Failed("Decode error: Elasticsearch unavailable".to_string())
        );
        assert!(dashboard.customers.loaded().is_some());
        assert_eq!(dashboard.transactions.loaded().map(|t| t.metadata.total_items), Some(0));
        assert_eq!(
            dashboard.recent_news.loaded().map(|items| items[0].title.as_str()),
            Some("Harga cabai naik")
        );
    }
}
