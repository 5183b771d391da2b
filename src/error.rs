//! # Collection Errors
//!
//! Every failure the collection client can report, in one place.
//!
//! Contract violations ([`CollectionError::InvalidCursor`],
//! [`CollectionError::MalformedCursor`], [`CollectionError::PageOutOfRange`]) point at a
//! caller or server bug and are returned immediately. A [`CollectionError::Transport`]
//! failure is expected in normal operation: the controller records it in its state as
//! an [`ErrorKind::TransportFailure`] and keeps the last good page visible.

use serde::Serialize;
use thiserror::Error;

use crate::transport::TransportError;

/// Result alias used throughout the crate.
pub type Result<T, E = CollectionError> = std::result::Result<T, E>;

/// Errors returned by the normalizer, codec, controller and selector.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum CollectionError {
    /// The string is not a usable absolute or relative URL.
    #[error("Invalid cursor {cursor:?}: {reason}")]
    InvalidCursor { cursor: String, reason: String },

    /// The cursor parsed, but its pagination parameters are unusable.
    #[error("Malformed cursor {cursor:?}: {reason}")]
    MalformedCursor { cursor: String, reason: String },

    /// A page outside `1..=total_pages` was requested.
    #[error("Page {requested} out of range (total pages: {total_pages})")]
    PageOutOfRange { requested: u32, total_pages: u32 },

    /// The request never produced a usable page.
    #[error("Transport failure: {0}")]
    Transport(#[from] TransportError),

    /// The controller was closed; no further operations are accepted.
    #[error("Collection controller closed")]
    Closed,

    /// The selector has no open session to commit or cancel.
    #[error("Selector is not open")]
    SelectorClosed,

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl CollectionError {
    pub(crate) fn invalid_cursor(cursor: impl Into<String>, reason: impl Into<String>) -> Self {
        CollectionError::InvalidCursor {
            cursor: cursor.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn malformed_cursor(cursor: impl Into<String>, reason: impl Into<String>) -> Self {
        CollectionError::MalformedCursor {
            cursor: cursor.into(),
            reason: reason.into(),
        }
    }

    /// Machine-readable classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CollectionError::InvalidCursor { .. } => ErrorKind::InvalidCursor,
            CollectionError::MalformedCursor { .. } => ErrorKind::MalformedCursor,
            CollectionError::PageOutOfRange { .. } => ErrorKind::PageOutOfRange,
            CollectionError::Transport(_) => ErrorKind::TransportFailure,
            CollectionError::Closed | CollectionError::SelectorClosed => ErrorKind::Closed,
            CollectionError::Config(_) => ErrorKind::Config,
        }
    }

    /// Whether issuing the same request again may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            CollectionError::Transport(e) => e.is_retryable(),
            _ => false,
        }
    }
}

/// Classification of a failure, as exposed to rendering layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidCursor,
    MalformedCursor,
    PageOutOfRange,
    TransportFailure,
    Closed,
    Config,
}

/// The failure recorded in collection state when a fetch does not land.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FetchFailure {
    pub kind: ErrorKind,
    pub message: String,
    pub retryable: bool,
}

impl From<&CollectionError> for FetchFailure {
    fn from(e: &CollectionError) -> Self {
        Self {
            kind: e.kind(),
            message: e.to_string(),
            retryable: e.is_retryable(),
        }
    }
}
