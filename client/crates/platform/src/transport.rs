//! HTTP transport seam
//!
//! [`RawRequest`] is a fully resolved request (absolute URL, encoded query,
//! headers, serialized body, timeout budget). A transport executes it and
//! reports the status and body text, or a [`TransportError`] when no response
//! arrived. Status interpretation happens above this layer.

use std::time::Duration;

use http::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use url::Url;

use crate::config::ClientConfig;
use crate::error::{ApiError, TransportError};
use crate::http::{FetchDescriptor, Method};
use crate::query_string;

/// Client version header sent with every request
pub const APP_VERSION_HEADER: HeaderName = HeaderName::from_static("app-version");

/// A request ready to hand to a transport
#[derive(Debug, Clone)]
pub struct RawRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<Vec<u8>>,
    pub timeout: Duration,
}

impl RawRequest {
    /// Resolve a descriptor against the configuration
    ///
    /// `token`, when present, is attached as a bearer credential.
    pub fn from_descriptor(
        config: &ClientConfig,
        descriptor: &FetchDescriptor,
        token: Option<&str>,
        timeout: Duration,
    ) -> Result<Self, ApiError> {
        let mut url = config
            .endpoint(descriptor.url())
            .map_err(|e| ApiError::Decode(format!("Invalid URL {:?}: {e}", descriptor.url())))?;

        if !descriptor.query().is_empty() {
            let encoded = query_string::encode(descriptor.query(), config.array_format);
            if !encoded.is_empty() {
                let merged = match url.query() {
                    Some(existing) if !existing.is_empty() => format!("{existing}&{encoded}"),
                    _ => encoded,
                };
                url.set_query(Some(&merged));
            }
        }

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let version = HeaderValue::from_str(&config.app_version)
            .map_err(|_| ApiError::Decode("App version is not a valid header value".into()))?;
        headers.insert(APP_VERSION_HEADER, version);
        if let Some(token) = token {
            let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|_| ApiError::Decode("Access token is not a valid header value".into()))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let body = descriptor.body().map(serde_json::to_vec).transpose()?;

        Ok(Self {
            method: descriptor.method(),
            url,
            headers,
            body,
            timeout,
        })
    }

    /// Bearer token carried by this request, if any
    pub fn bearer_token(&self) -> Option<&str> {
        self.headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
    }
}

/// Status and body text of a completed exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Executes resolved requests
#[trait_variant::make(HttpTransport: Send)]
pub trait LocalHttpTransport {
    async fn execute(&self, request: RawRequest) -> Result<RawResponse, TransportError>;
}

/// `reqwest`-backed transport with a cookie jar
///
/// The jar carries the refresh cookie used by the cookie-based refresh route.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .build()
            .map_err(|e| TransportError::Build(e.to_string()))?;
        Ok(Self { client })
    }

    /// Use a preconfigured client (proxies, custom TLS roots)
    pub fn with_http_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl HttpTransport for ReqwestTransport {
    async fn execute(&self, request: RawRequest) -> Result<RawResponse, TransportError> {
        let mut builder = self
            .client
            .request(request.method.into(), request.url)
            .headers(request.headers)
            .timeout(request.timeout);
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(map_reqwest_error)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(map_reqwest_error)?;
        Ok(RawResponse { status, body })
    }
}

fn map_reqwest_error(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout
    } else if err.is_builder() {
        TransportError::Build(err.to_string())
    } else {
        TransportError::Network(err.to_string())
    }
}
