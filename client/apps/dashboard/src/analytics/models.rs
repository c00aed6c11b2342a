//! Analytics response models
//!
//! Each endpoint answers with the `{status, message, data}` envelope; these
//! are the `data` payloads.

use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::Value;

// =============================================================================
// Sales
// =============================================================================

/// One summary card
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Summary {
    pub summary_title: String,
    pub current_period: f64,
    pub previous_period: f64,
    /// Percent change; absent when the previous period is zero
    #[serde(default)]
    pub growth: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PeriodSummary {
    pub sales_summary: Summary,
    pub orders_summary: Summary,
    pub revenue_summary: Summary,
    pub aov_summary: Summary,
}

/// Daily sales point
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SalesTrendPoint {
    pub transaction_date: NaiveDate,
    pub total_sales: f64,
    pub total_transactions: u64,
}

// =============================================================================
// Products
// =============================================================================

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CategorySale {
    pub category_name: String,
    pub total_quantity: u64,
    pub total_sales: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TopSoldProduct {
    pub product_name: String,
    pub total_quantity: u64,
    pub total_sales: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProductAnalytics {
    #[serde(default)]
    pub category_sales: Vec<CategorySale>,
    #[serde(default)]
    pub top_sold_products: Vec<TopSoldProduct>,
}

// =============================================================================
// Customers
// =============================================================================

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AgeSpending {
    pub age: u32,
    pub total_spending: f64,
    pub transaction_count: u64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AgeGroupSales {
    pub age_group: String,
    pub category: String,
    pub total_sales: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CustomerAnalytics {
    #[serde(default)]
    pub age_spending: Vec<AgeSpending>,
    #[serde(default)]
    pub age_group: Vec<AgeGroupSales>,
}

// =============================================================================
// News
// =============================================================================

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewsDateRange {
    pub earliest: Option<String>,
    pub latest: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewsStatistics {
    pub total_articles: u64,
    pub unique_authors: u64,
    pub unique_tags: u64,
    pub date_range: NewsDateRange,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct KeywordCount {
    pub keyword: String,
    pub count: u64,
    #[serde(default)]
    pub percent: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TagCount {
    pub tag: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TimelinePoint {
    pub date: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewsOverview {
    pub statistics: NewsStatistics,
    #[serde(default)]
    pub top_title_keywords: Vec<KeywordCount>,
    #[serde(default)]
    pub tag_distribution: Vec<TagCount>,
    #[serde(default)]
    pub timeline: Vec<TimelinePoint>,
    #[serde(default)]
    pub top_keywords: Vec<KeywordCount>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewsArticle {
    pub title: String,
    #[serde(default)]
    pub author: Option<String>,
    pub url: String,
    #[serde(default)]
    pub main_image: Option<String>,
    #[serde(default)]
    pub tag: Vec<String>,
    pub publish_date: String,
}

/// One page of the recent-news feed
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RecentNewsPage {
    #[serde(default)]
    pub items: Vec<NewsArticle>,
    /// Sort values of the last hit; the cursor for the next page
    #[serde(default)]
    pub next_search_after: Option<Value>,
}

// =============================================================================
// Transactions
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Gender {
    Female,
    Male,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TransactionRow {
    pub transaction_id: String,
    pub transaction_date: NaiveDate,
    pub customer_name: String,
    #[serde(default)]
    pub gender: Option<Gender>,
    #[serde(default)]
    pub age: Option<u32>,
    pub products_name: String,
    pub total_amount: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct PageMetadata {
    pub current_page: u32,
    pub page_size: u32,
    pub total_pages: u32,
    pub total_items: u64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TransactionsPage {
    pub items: Vec<TransactionRow>,
    pub metadata: PageMetadata,
}
