//! # Page Transport
//!
//! The seam between the controller and the network.
//!
//! A [`PageTransport`] dereferences one normalized cursor into one [`PageResult`].
//! The controller never talks to HTTP directly, which keeps it testable with the
//! channel-backed [`mock`] transport and lets an integration supply its own client
//! (authentication headers, CSRF tokens and the like live there, not here).
//!
//! - [`http::HttpTransport`]: `reqwest` client for `{count, next, previous, results}` endpoints.
//! - [`mock`]: deterministic transports for tests.

pub mod http;
pub mod mock;

pub use http::{HttpConfig, HttpConfigBuilder, HttpTransport};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One page of a remote collection, as returned by the backend.
///
/// Item order is the server's and is preserved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageResult<T> {
    #[serde(rename = "count")]
    pub total_count: u64,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub previous: Option<String>,
    #[serde(rename = "results")]
    pub items: Vec<T>,
}

impl<T> PageResult<T> {
    pub fn new(items: Vec<T>, total_count: u64) -> Self {
        Self {
            total_count,
            next: None,
            previous: None,
            items,
        }
    }

    pub fn with_next(mut self, next: impl Into<String>) -> Self {
        self.next = Some(next.into());
        self
    }

    pub fn with_previous(mut self, previous: impl Into<String>) -> Self {
        self.previous = Some(previous.into());
        self
    }

    /// Rejects pages that claim fewer records in total than they carry.
    pub fn validate(&self, path: &str) -> Result<(), TransportError> {
        if self.items.len() as u64 > self.total_count {
            return Err(TransportError::Decode {
                path: path.to_string(),
                message: format!(
                    "page carries {} items but reports a total of {}",
                    self.items.len(),
                    self.total_count
                ),
            });
        }
        Ok(())
    }
}

/// Why a page could not be fetched.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("Request to {path} timed out")]
    Timeout { path: String },

    #[error("Could not reach server for {path}: {message}")]
    Connect { path: String, message: String },

    #[error("{path} returned HTTP {status}")]
    Status { path: String, status: u16 },

    #[error("Invalid page payload from {path}: {message}")]
    Decode { path: String, message: String },

    #[error("Transport closed")]
    Closed,

    #[error("Transport dropped the response")]
    Dropped,
}

impl TransportError {
    /// Timeouts, connection failures, 5xx and 429 may succeed on retry.
    pub fn is_retryable(&self) -> bool {
        match self {
            TransportError::Timeout { .. } | TransportError::Connect { .. } => true,
            TransportError::Status { status, .. } => *status >= 500 || *status == 429,
            TransportError::Decode { .. } | TransportError::Closed | TransportError::Dropped => false,
        }
    }
}

/// Dereferences cursors into pages.
#[async_trait]
pub trait PageTransport<T>: Send + Sync + 'static {
    /// Fetches the page at `path`, a normalized relative cursor.
    async fn get_page(&self, path: &str) -> Result<PageResult<T>, TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_result_wire_format() {
        let page: PageResult<serde_json::Value> = serde_json::from_str(
            r#"{"count": 23, "next": "http://host/facet/area/?page=3", "previous": null,
                "results": [{"id": 11}, {"id": 12}]}"#,
        )
        .unwrap();

        assert_eq!(page.total_count, 23);
        assert_eq!(page.next.as_deref(), Some("http://host/facet/area/?page=3"));
        assert_eq!(page.previous, None);
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.items[1]["id"], 12);
    }

    #[test]
    fn test_validate_rejects_oversized_page() {
        let page = PageResult::new(vec![1, 2, 3], 2);
        let err = page.validate("/facet/area/").unwrap_err();
        assert!(matches!(err, TransportError::Decode { .. }));
        assert!(PageResult::new(vec![1, 2], 2).validate("/facet/area/").is_ok());
    }

    #[test]
    fn test_retryable_classification() {
        let status = |status| TransportError::Status { path: "/x/".into(), status };
        assert!(status(503).is_retryable());
        assert!(status(429).is_retryable());
        assert!(!status(404).is_retryable());
        assert!(TransportError::Timeout { path: "/x/".into() }.is_retryable());
        assert!(!TransportError::Closed.is_retryable());
    }
}
