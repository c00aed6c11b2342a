//! Request Client
//!
//! Sends descriptors through an [`HttpTransport`] with the current access
//! token attached. Never touches the session beyond reading it.

use std::sync::Arc;
use std::time::Duration;

use platform::config::ClientConfig;
use platform::error::ApiError;
use platform::fetch::Fetcher;
use platform::http::FetchDescriptor;
use platform::transport::{HttpTransport, RawRequest};
use serde_json::Value;

use crate::application::session_store::SessionStore;
use crate::domain::repository::SessionRepository;

/// Plain (non-refreshing) API client
pub struct RequestClient<T, P> {
    transport: Arc<T>,
    config: Arc<ClientConfig>,
    session: SessionStore<P>,
}

impl<T, P> Clone for RequestClient<T, P> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            config: Arc::clone(&self.config),
            session: self.session.clone(),
        }
    }
}

impl<T, P> RequestClient<T, P>
where
    T: HttpTransport + Send + Sync + 'static,
    P: SessionRepository + Send + Sync + 'static,
{
    pub fn new(transport: Arc<T>, config: Arc<ClientConfig>, session: SessionStore<P>) -> Self {
        Self {
            transport,
            config,
            session,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn session(&self) -> &SessionStore<P> {
        &self.session
    }

    /// Send with the session's current access token, if any
    pub async fn send(&self, descriptor: &FetchDescriptor) -> Result<Value, ApiError> {
        let token = self.session.access_token();
        self.dispatch(descriptor, token.as_deref(), self.config.timeout)
            .await
    }

    /// Send with an explicit token and budget
    pub(crate) async fn dispatch(
        &self,
        descriptor: &FetchDescriptor,
        token: Option<&str>,
        budget: Duration,
    ) -> Result<Value, ApiError> {
        let request = RawRequest::from_descriptor(&self.config, descriptor, token, budget)?;
        tracing::debug!(
            method = %descriptor.method(),
            path = request.url.path(),
            authenticated = token.is_some(),
            "Dispatching request"
        );

        let response = match tokio::time::timeout(budget, self.transport.execute(request)).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => return Err(e.into_api_error(budget)),
            Err(_) => return Err(ApiError::Timeout(budget)),
        };

        if !response.is_success() {
            return Err(ApiError::from_response(response.status, &response.body));
        }
        parse_body(&response.body)
    }
}

fn parse_body(body: &str) -> Result<Value, ApiError> {
    if body.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(body).map_err(|e| ApiError::Decode(format!("Invalid JSON response: {e}")))
}

impl<T, P> Fetcher for RequestClient<T, P>
where
    T: HttpTransport + Send + Sync + 'static,
    P: SessionRepository + Send + Sync + 'static,
{
    async fn fetch(&self, descriptor: &FetchDescriptor) -> Result<Value, ApiError> {
        self.send(descriptor).await
    }
}

#[cfg(test)]
mod tests {
    use crate::test_support::harness;
    use platform::error::ApiError;
    use platform::http::{FetchDescriptor, Method};
    use platform::testing::Reply;
    use serde_json::{Value, json};
    use std::time::Duration;

    #[tokio::test]
    async fn test_attaches_bearer_when_authenticated() {
        let h = harness();
        h.transport.on(
            Method::Get,
            "/analytics/summary",
            Reply::json(200, json!({"status": "success", "data": {"total_sales": 10}})),
        );
        h.session.login("a1", Some("r1".into()), None).await;

        let body = h
            .client
            .send(&FetchDescriptor::get("/analytics/summary"))
            .await
            .unwrap();
        assert_eq!(body["data"]["total_sales"], 10);

        let recorded = h.transport.requests();
        assert_eq!(recorded[0].bearer.as_deref(), Some("a1"));
    }

    #[tokio::test]
    async fn test_anonymous_when_signed_out() {
        let h = harness();
        h.transport.on(Method::Post, "/auth/login", Reply::json(200, json!({})));

        h.client
            .send(&FetchDescriptor::post("/auth/login").with_body(json!({"email": "a@b.com"})))
            .await
            .unwrap();
        assert_eq!(h.transport.requests()[0].bearer, None);
    }

    #[tokio::test]
    async fn test_error_status_preserved() {
        let h = harness();
        h.transport.on(
            Method::Get,
            "/transactions",
            Reply::json(403, json!({"status": "error", "message": "Forbidden region"})),
        );
        h.session.login("a1", None, None).await;

        let err = h
            .client
            .send(&FetchDescriptor::get("/transactions"))
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(403));
        assert_eq!(err.user_message(), "Forbidden region");
        // the plain client never touches the session
        assert!(h.session.is_authenticated());
    }

    #[tokio::test]
    async fn test_401_does_not_mutate_session() {
        let h = harness();
        h.transport
            .on(Method::Get, "/transactions", Reply::json(401, json!({"detail": "expired"})));
        h.session.login("a1", Some("r1".into()), None).await;

        let err = h
            .client
            .send(&FetchDescriptor::get("/transactions"))
            .await
            .unwrap_err();
        assert!(err.is_unauthorized());
        assert_eq!(h.session.access_token().as_deref(), Some("a1"));
        assert_eq!(h.transport.count(Method::Post, "/auth/refresh"), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_budget() {
        let h = harness();
        h.transport.on(
            Method::Get,
            "/analytics/products",
            Reply::json(200, json!({})).with_delay(Duration::from_secs(11)),
        );

        let err = h
            .client
            .send(&FetchDescriptor::get("/analytics/products"))
            .await
            .unwrap_err();
        assert_eq!(err, ApiError::Timeout(Duration::from_secs(10)));
    }

    #[tokio::test]
    async fn test_network_failure() {
        let h = harness();
        h.transport
            .on(Method::Get, "/analytics/news", Reply::network_failure());

        let err = h
            .client
            .send(&FetchDescriptor::get("/analytics/news"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Network(_)));
    }

    #[tokio::test]
    async fn test_empty_and_invalid_bodies() {
        let h = harness();
        h.transport.on(Method::Delete, "/transactions/1", Reply::text(204, ""));
        h.transport.on(Method::Get, "/analytics/customers", Reply::text(200, "<html>"));

        let empty = h
            .client
            .send(&FetchDescriptor::delete("/transactions/1"))
            .await
            .unwrap();
        assert_eq!(empty, Value::Null);

        let err = h
            .client
            .send(&FetchDescriptor::get("/analytics/customers"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
    }

    #[tokio::test]
    async fn test_query_is_encoded() {
        let h = harness();
        h.transport.on(Method::Get, "/transactions", Reply::json(200, json!({})));

        h.client
            .send(
                &FetchDescriptor::get("/transactions")
                    .with_query("page", 2)
                    .with_query("page_size", 5),
            )
            .await
            .unwrap();
        assert_eq!(
            h.transport.requests()[0].query.as_deref(),
            Some("page=2&page_size=5")
        );
    }
}
