//! Dashboard Client Entry Point
//!
//! Restores the session, applies the route guard, signs in with configured
//! credentials when needed, and loads every dashboard view once.
//! Uses `anyhow` for startup errors; everything below surfaces
//! `ApiError` / `AuthError`.

mod analytics;
mod views;

use std::env;
use std::sync::Arc;

use anyhow::Context;
use chrono::NaiveDate;
use auth::{
    AuthConfig, AuthenticatedClient, GuardDecision, RequestClient, RouteGuard, SessionStore,
    SignInInput, SignInUseCase, StoredSessionRepository,
};
use platform::storage::FileStore;
use platform::{ClientConfig, ReqwestTransport};
use query::{QueryClient, QueryConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::analytics::endpoints::DateRange;
use crate::views::ViewState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "dashboard=info,auth=info,query=info,platform=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Arc::new(ClientConfig::from_env().context("Invalid client configuration")?);
    let auth_config = Arc::new(AuthConfig::default());
    tracing::info!(base_url = %config.base_url, "Dashboard client starting");

    // Session
    let repository = StoredSessionRepository::new(
        FileStore::new(&config.storage_dir),
        auth_config.storage_key.clone(),
    );
    let session = SessionStore::new(Arc::new(repository));
    session.restore().await;

    let transport = Arc::new(ReqwestTransport::new().context("Failed to build HTTP client")?);
    let client = RequestClient::new(transport, Arc::clone(&config), session.clone());

    // Route guard
    let guard = RouteGuard::new(session.clone(), Arc::clone(&auth_config));
    if let GuardDecision::Redirect { to, reason } = guard.check().await {
        tracing::info!(redirect = %to, ?reason, "Sign-in required");
        let (email, password) = credentials_from_env()?;
        let signed_in = SignInUseCase::new(client.clone(), Arc::clone(&auth_config))
            .execute(SignInInput { email, password })
            .await
            .map_err(|e| e.to_app_error())
            .context("Sign-in failed")?;
        tracing::info!(user_id = signed_in.user().map(|u| u.id.as_str()), "Signed in");
    }

    // Views
    let api = AuthenticatedClient::new(client, auth_config);
    let queries = QueryClient::new(api, QueryConfig::default());
    let range = date_range_from_env()?;
    let dashboard = views::load_dashboard(&queries, range).await;

    if let ViewState::Loaded(summary) = &dashboard.summary {
        for card in [
            &summary.sales_summary,
            &summary.orders_summary,
            &summary.revenue_summary,
            &summary.aov_summary,
        ] {
            tracing::info!(
                title = %card.summary_title,
                current = card.current_period,
                previous = card.previous_period,
                growth = card.growth,
                "Summary"
            );
        }
    }
    if let Some(page) = dashboard.transactions.loaded() {
        tracing::info!(
            rows = page.items.len(),
            total = page.metadata.total_items,
            pages = page.metadata.total_pages,
            "Transactions"
        );
    }
    tracing::info!(
        sales_points = dashboard.sales_trend.loaded().map(Vec::len),
        categories = dashboard.products.loaded().map(|p| p.category_sales.len()),
        age_groups = dashboard.customers.loaded().map(|c| c.age_group.len()),
        articles = dashboard.news_overview.loaded().map(|n| n.statistics.total_articles),
        recent_news = dashboard.recent_news.loaded().map(Vec::len),
        "Dashboard loaded"
    );

    Ok(())
}

fn credentials_from_env() -> anyhow::Result<(String, String)> {
    let email = env::var("DASHBOARD_EMAIL")
        .context("Not signed in and DASHBOARD_EMAIL is not set")?;
    let password = env::var("DASHBOARD_PASSWORD")
        .context("Not signed in and DASHBOARD_PASSWORD is not set")?;
    Ok((email, password))
}

/// Reporting window from `DASHBOARD_START_DATE` / `DASHBOARD_END_DATE`
///
/// Both or neither must be set. Neither means the backend default.
fn date_range_from_env() -> anyhow::Result<DateRange> {
    let read = |name: &str| -> anyhow::Result<Option<NaiveDate>> {
        match env::var(name) {
            Ok(value) if !value.trim().is_empty() => NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
                .map(Some)
                .with_context(|| format!("{name} must be a YYYY-MM-DD date")),
            _ => Ok(None),
        }
    };

    match (read("DASHBOARD_START_DATE")?, read("DASHBOARD_END_DATE")?) {
        (Some(start), Some(end)) => {
            anyhow::ensure!(start <= end, "DASHBOARD_START_DATE is after DASHBOARD_END_DATE");
            Ok(DateRange::new(start, end))
        }
        (None, None) => Ok(DateRange::default()),
        _ => anyhow::bail!("Set both DASHBOARD_START_DATE and DASHBOARD_END_DATE, or neither"),
    }
}
