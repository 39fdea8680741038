//! Error types for the SwipeList API client.
//!
//! # Design
//! `Auth` is the only variant callers are expected to react to specially:
//! it means the stored credentials are no longer usable and a fresh login is
//! required. Every other variant is a plain remote or transport failure that
//! the caller may retry later. Non-2xx responses land in `HttpError` with the
//! raw status code and body for debugging.

use std::time::Duration;

use thiserror::Error;

/// Result alias used throughout the client.
pub type ApiResult<T> = Result<T, ApiError>;

/// Errors returned by `SwipeListClient` and the request/response helpers.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Invalid credentials, or an expired session that could not be refreshed.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// The server returned a status of 400 or above.
    #[error("API error {status}: {body}")]
    HttpError { status: u16, body: String },

    /// The request never produced a response (DNS, refused connection, TLS).
    #[error("connection error: {0}")]
    Connection(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The request did not complete within the configured bound.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    DeserializationError(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    SerializationError(String),

    /// A read-modify-write targeted an item id that the list does not contain.
    #[error("item {item_id} not found in list {list_id}")]
    ItemNotFound { list_id: String, item_id: String },

    /// The client configuration is unusable.
    #[error("configuration error: {0}")]
    Config(String),
}

impl ApiError {
    /// True for failures that need a fresh login rather than a retry.
    pub fn is_auth(&self) -> bool {
        matches!(self, ApiError::Auth(_))
    }

    /// HTTP status carried by the error, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::HttpError { status, .. } => Some(*status),
            _ => None,
        }
    }
}
