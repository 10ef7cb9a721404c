//! HTTP request builder.

use crate::FetchError;
use std::collections::HashMap;

/// A builder for constructing GET requests.
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    pub(crate) url: String,
    pub(crate) headers: HashMap<String, String>,
}

impl RequestBuilder {
    /// Create a new request builder.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            headers: HashMap::new(),
        }
    }

    /// Add a header to the request.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Set the Accept header.
    pub fn accept(self, content_type: impl Into<String>) -> Self {
        self.header("Accept", content_type)
    }

    /// Get the target URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Reject URLs the transport cannot send to.
    pub(crate) fn validate(&self) -> Result<(), FetchError> {
        if self.url.starts_with("http://") || self.url.starts_with("https://") {
            Ok(())
        } else {
            Err(FetchError::InvalidUrl(self.url.clone()))
        }
    }
}
