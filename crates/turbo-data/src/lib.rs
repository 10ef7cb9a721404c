//! HTTP client utilities for the TurboCommerce storefront cart.
//!
//! Provides a small builder API for outbound JSON requests. Native builds
//! send through `reqwest`; `wasm32` builds send through Spin's outbound HTTP.
//!
//! # Example
//!
//! ```rust,ignore
//! use turbo_data::FetchClient;
//! use serde::Deserialize;
//!
//! #[derive(Deserialize)]
//! struct Stock {
//!     amount: i64,
//! }
//!
//! let client = FetchClient::new().with_base_url("http://localhost:3333");
//!
//! let stock: Stock = client.get_json("/stock/1").await?;
//! ```

mod error;
mod request;
mod response;

use std::collections::HashMap;
use std::time::Duration;

use serde::de::DeserializeOwned;

pub use error::FetchError;
pub use request::RequestBuilder;
pub use response::Response;

/// HTTP client for making outbound requests.
#[derive(Debug, Clone)]
pub struct FetchClient {
    base_url: Option<String>,
    default_headers: HashMap<String, String>,
    timeout: Option<Duration>,
    #[cfg(not(target_arch = "wasm32"))]
    http: reqwest::Client,
}

impl Default for FetchClient {
    fn default() -> Self {
        Self::new()
    }
}

impl FetchClient {
    /// Create a new HTTP client.
    pub fn new() -> Self {
        Self {
            base_url: None,
            default_headers: HashMap::new(),
            timeout: None,
            #[cfg(not(target_arch = "wasm32"))]
            http: reqwest::Client::new(),
        }
    }

    /// Create a client with a base URL that will be prepended to all requests.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Add a default header that will be included in all requests.
    pub fn with_default_header(
        mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.default_headers.insert(key.into(), value.into());
        self
    }

    /// Authenticate every request with a bearer token.
    pub fn with_bearer_token(self, token: impl AsRef<str>) -> Self {
        let value = format!("Bearer {}", token.as_ref());
        self.with_default_header("Authorization", value)
    }

    /// Per-request timeout. Ignored by the Spin transport.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Create a GET request. Relative URLs are joined onto the base URL.
    pub fn get(&self, url: impl Into<String>) -> ClientRequestBuilder {
        let url = url.into();
        let full_url = match &self.base_url {
            Some(base) => {
                if url.starts_with("http://") || url.starts_with("https://") {
                    url
                } else {
                    format!(
                        "{}/{}",
                        base.trim_end_matches('/'),
                        url.trim_start_matches('/')
                    )
                }
            }
            None => url,
        };

        let mut builder = RequestBuilder::new(full_url).accept("application/json");
        for (key, value) in &self.default_headers {
            builder = builder.header(key.clone(), value.clone());
        }

        ClientRequestBuilder {
            builder,
            timeout: self.timeout,
            #[cfg(not(target_arch = "wasm32"))]
            http: self.http.clone(),
        }
    }

    /// GET a path and decode a 2xx JSON body.
    ///
    /// Transport failures, non-2xx statuses and undecodable bodies all come
    /// back as a [`FetchError`].
    pub async fn get_json<T: DeserializeOwned>(&self, url: impl Into<String>) -> Result<T, FetchError> {
        self.get(url).send().await?.error_for_status()?.json()
    }
}

/// A request builder bound to a client.
pub struct ClientRequestBuilder {
    builder: RequestBuilder,
    #[cfg_attr(target_arch = "wasm32", allow(dead_code))]
    timeout: Option<Duration>,
    #[cfg(not(target_arch = "wasm32"))]
    http: reqwest::Client,
}

impl ClientRequestBuilder {
    /// Send the request and return the response.
    #[cfg(not(target_arch = "wasm32"))]
    pub async fn send(self) -> Result<Response, FetchError> {
        self.builder.validate()?;
        let RequestBuilder { url, headers } = self.builder;

        tracing::debug!(url = %url, "sending request");

        let mut request = self.http.get(&url);
        for (key, value) in &headers {
            request = request.header(key.as_str(), value.as_str());
        }
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await?;
        let status = response.status().as_u16();
        let headers: HashMap<String, String> = response
            .headers()
            .iter()
            .map(|(k, v)| (k.as_str().to_string(), v.to_str().unwrap_or("").to_string()))
            .collect();
        let body = response.bytes().await?.to_vec();

        tracing::debug!(status, url = %url, "received response");
        Ok(Response::new(status, headers, body))
    }

    /// Send the request through Spin's outbound HTTP.
    #[cfg(target_arch = "wasm32")]
    pub async fn send(self) -> Result<Response, FetchError> {
        use spin_sdk::http::{Method, Request};

        self.builder.validate()?;

        let mut request = Request::builder();
        request.method(Method::Get);
        request.uri(&self.builder.url);
        for (key, value) in &self.builder.headers {
            request.header(key.as_str(), value.as_str());
        }
        let request = request.build();

        let response: spin_sdk::http::Response = spin_sdk::http::send(request)
            .await
            .map_err(|e| FetchError::RequestError(e.to_string()))?;

        let status = *response.status();
        let headers: HashMap<String, String> = response
            .headers()
            .map(|(k, v)| (k.to_string(), v.as_str().unwrap_or("").to_string()))
            .collect();
        let body = response.into_body();

        Ok(Response::new(status, headers, body))
    }
}

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{FetchClient, FetchError, Response};
}
