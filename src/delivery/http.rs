// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! HTTP delivery client

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::Client;
use url::Url;

use super::client::{Delivered, DeliveryClient, DeliveryFailure, DeliveryResult};
use super::endpoint::Endpoint;
use crate::error::{Error, Result};
use crate::report::Report;

/// Default user agent for outgoing report requests
pub const DEFAULT_USER_AGENT: &str = concat!("csp-sentinel/", env!("CARGO_PKG_VERSION"));

/// HTTP delivery configuration
#[derive(Debug, Clone)]
pub struct DeliveryConfig {
    /// User agent for report requests
    pub user_agent: String,
    /// Per-request timeout
    pub timeout: Duration,
    /// Base URL relative endpoints are resolved against
    pub base_url: Option<Url>,
    /// Bearer token for the collector
    pub bearer_token: Option<String>,
    /// Basic auth (username, password)
    pub basic_auth: Option<(String, String)>,
    /// Extra headers sent with every report
    pub headers: Vec<(String, String)>,
    /// Proxy URL
    pub proxy: Option<String>,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: Duration::from_secs(10),
            base_url: None,
            bearer_token: None,
            basic_auth: None,
            headers: vec![],
            proxy: None,
        }
    }
}

impl DeliveryConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set base URL for relative endpoints
    pub fn base_url(mut self, base: Url) -> Self {
        self.base_url = Some(base);
        self
    }

    /// Set bearer token
    pub fn bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    /// Set basic auth
    pub fn basic_auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.basic_auth = Some((username.into(), password.into()));
        self
    }

    /// Add header
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Set proxy
    pub fn proxy(mut self, proxy: impl Into<String>) -> Self {
        self.proxy = Some(proxy.into());
        self
    }
}

/// Delivers reports with an HTTP POST
#[derive(Clone)]
pub struct HttpDeliveryClient {
    client: Client,
    config: DeliveryConfig,
}

impl HttpDeliveryClient {
    /// Create a client with default configuration
    pub fn new() -> Result<Self> {
        Self::with_config(DeliveryConfig::default())
    }

    /// Create a client with custom configuration
    pub fn with_config(config: DeliveryConfig) -> Result<Self> {
        let mut default_headers = HeaderMap::new();
        for (name, value) in &config.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| Error::config(format!("Invalid header name '{}': {}", name, e)))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| Error::config(format!("Invalid header value: {}", e)))?;
            default_headers.insert(name, value);
        }

        if let Some(ref token) = config.bearer_token {
            default_headers.insert(
                "authorization",
                HeaderValue::from_str(&format!("Bearer {}", token))
                    .map_err(|e| Error::config(format!("Invalid bearer token: {}", e)))?,
            );
        } else if let Some((ref user, ref pass)) = config.basic_auth {
            let encoded = base64::Engine::encode(
                &base64::engine::general_purpose::STANDARD,
                format!("{}:{}", user, pass),
            );
            default_headers.insert(
                "authorization",
                HeaderValue::from_str(&format!("Basic {}", encoded))
                    .map_err(|e| Error::config(format!("Invalid basic auth: {}", e)))?,
            );
        }

        let mut builder = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .default_headers(default_headers);

        if let Some(ref proxy_url) = config.proxy {
            builder = builder.proxy(
                reqwest::Proxy::all(proxy_url)
                    .map_err(|e| Error::Config(format!("Invalid proxy URL: {}", e)))?,
            );
        }

        let client = builder.build()?;

        Ok(Self { client, config })
    }

    /// Get client configuration
    pub fn config(&self) -> &DeliveryConfig {
        &self.config
    }

    /// Resolve the endpoint against the configured base URL
    pub fn target_url(&self, endpoint: &Endpoint) -> std::result::Result<Url, DeliveryFailure> {
        endpoint
            .resolve(self.config.base_url.as_ref())
            .map_err(|e| DeliveryFailure::Unresolvable(e.to_string()))
    }
}

#[async_trait]
impl DeliveryClient for HttpDeliveryClient {
    async fn send(&self, endpoint: &Endpoint, report: &Report) -> DeliveryResult {
        let url = self.target_url(endpoint)?;
        let body = serde_json::to_vec(report).map_err(|e| DeliveryFailure::Encoding(e.to_string()))?;
        let start = Instant::now();

        let response = self
            .client
            .post(url.clone())
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    DeliveryFailure::Timeout(start.elapsed().as_millis() as u64)
                } else {
                    DeliveryFailure::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        tracing::debug!(
            url = %url,
            status = status.as_u16(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Report POST finished"
        );

        if status.is_success() {
            Ok(Delivered {
                status: status.as_u16(),
            })
        } else {
            Err(DeliveryFailure::Status(status.as_u16()))
        }
    }

    fn name(&self) -> &str {
        "http"
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::report::{build_report, ViolationEvent};

    fn report() -> Report {
        let event = ViolationEvent::new()
            .blocked_uri("https://evil.example/x.js")
            .directive("script-src");
        build_report(&event, chrono::Utc::now(), "ua", "https://app.example/")
    }

    #[tokio::test]
    async fn test_posts_json_report() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/csp-violations"))
            .and(header("content-type", "application/json"))
            .and(body_partial_json(json!({
                "userAgent": "ua",
                "violation": { "blocked-uri": "https://evil.example/x.js" }
            })))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let base = Url::parse(&server.uri()).unwrap();
        let client = HttpDeliveryClient::with_config(DeliveryConfig::new().base_url(base)).unwrap();
        let endpoint = Endpoint::parse("/csp-violations").unwrap();

        let result = client.send(&endpoint, &report()).await;
        assert_eq!(result, Ok(Delivered { status: 204 }));
    }

    #[tokio::test]
    async fn test_non_success_status_is_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = HttpDeliveryClient::new().unwrap();
        let endpoint = Endpoint::parse(format!("{}/reports", server.uri())).unwrap();

        let result = client.send(&endpoint, &report()).await;
        assert_eq!(result, Err(DeliveryFailure::Status(503)));
    }

    #[tokio::test]
    async fn test_sends_bearer_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header("authorization", "Bearer s3cret"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let client =
            HttpDeliveryClient::with_config(DeliveryConfig::new().bearer_token("s3cret")).unwrap();
        let endpoint = Endpoint::parse(server.uri()).unwrap();

        assert!(client.send(&endpoint, &report()).await.is_ok());
    }

    #[tokio::test]
    async fn test_relative_endpoint_without_base() {
        let client = HttpDeliveryClient::new().unwrap();
        let endpoint = Endpoint::parse("/csp-violations").unwrap();

        let result = client.send(&endpoint, &report()).await;
        assert!(matches!(result, Err(DeliveryFailure::Unresolvable(_))));
    }

    #[tokio::test]
    async fn test_transport_error_is_failure() {
        let client = HttpDeliveryClient::with_config(
            DeliveryConfig::new().timeout(Duration::from_secs(2)),
        )
        .unwrap();
        // Port 9 (discard) is not listening on loopback
        let endpoint = Endpoint::parse("http://127.0.0.1:9/csp").unwrap();

        let result = client.send(&endpoint, &report()).await;
        assert!(result.is_err());
        assert!(result.unwrap_err().is_retryable());
    }

    #[test]
    fn test_invalid_header_rejected() {
        let config = DeliveryConfig::new().header("bad header", "x");
        assert!(matches!(
            HttpDeliveryClient::with_config(config),
            Err(e) if e.is_config()
        ));
    }
}
