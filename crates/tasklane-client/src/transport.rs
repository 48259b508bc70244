//! HTTP transport seam
//!
//! The guard talks to the network only through [`Transport`], so it can be
//! driven by reqwest in production and by scripted transports in tests.

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use url::Url;

use crate::error::TransportError;
use crate::request::{ApiRequest, ApiResponse};

#[async_trait]
pub trait Transport: Send + Sync {
    /// Any HTTP status is a successful send. Only I/O and URL problems are
    /// transport errors.
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, TransportError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    base_url: Url,
    http_client: Client,
}

impl ReqwestTransport {
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self, TransportError> {
        let http_client = Client::builder().timeout(timeout).build()?;

        tracing::debug!(base_url = %base_url, "HTTP transport initialized");

        Ok(Self {
            base_url: with_trailing_slash(base_url),
            http_client,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolve a request path against the base URL, keeping any base path prefix
    pub fn url_for(&self, path: &str) -> Result<Url, TransportError> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, TransportError> {
        let url = self.url_for(&request.path)?;

        let mut builder = self
            .http_client
            .request(request.method.clone(), url)
            .headers(request.headers.clone());

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.to_string());
        }

        let response = builder.send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?.to_vec();

        tracing::trace!(
            method = %request.method,
            path = %request.path,
            status = status.as_u16(),
            "HTTP exchange"
        );

        Ok(ApiResponse {
            status,
            headers,
            body,
        })
    }
}

fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}
