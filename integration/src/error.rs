//! Error types surfaced to the host.

use swipelist_core::ApiError;
use thiserror::Error;

/// Why a login or re-auth flow could not create an entry.
#[derive(Debug, Error)]
pub enum FlowError {
    #[error("invalid email or password")]
    InvalidAuth(#[source] ApiError),

    #[error("cannot connect to SwipeList: {0}")]
    CannotConnect(#[source] ApiError),

    #[error("account {0} is already configured")]
    AlreadyConfigured(String),
}

impl FlowError {
    /// Stable key the host's form uses to pick a translated message.
    pub fn code(&self) -> &'static str {
        match self {
            FlowError::InvalidAuth(_) => "invalid_auth",
            FlowError::CannotConnect(_) => "cannot_connect",
            FlowError::AlreadyConfigured(_) => "already_configured",
        }
    }
}

impl From<ApiError> for FlowError {
    fn from(err: ApiError) -> Self {
        if err.is_auth() {
            FlowError::InvalidAuth(err)
        } else {
            FlowError::CannotConnect(err)
        }
    }
}

/// A poll failed and there was no earlier data to fall back on.
#[derive(Debug, Error)]
pub enum UpdateFailed {
    #[error("authentication failed: {0}")]
    Auth(#[source] ApiError),

    #[error("error communicating with API: {0}")]
    Api(#[source] ApiError),
}

impl From<ApiError> for UpdateFailed {
    fn from(err: ApiError) -> Self {
        if err.is_auth() {
            UpdateFailed::Auth(err)
        } else {
            UpdateFailed::Api(err)
        }
    }
}

/// Failure of a todo entity operation.
#[derive(Debug, Error)]
pub enum EntityError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("todo item has no summary")]
    MissingSummary,

    #[error("todo item has no uid")]
    MissingUid,
}

/// Failure while bringing up an account.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("invalid client configuration: {0}")]
    Config(#[source] ApiError),

    #[error("initial refresh failed: {0}")]
    FirstRefresh(#[from] UpdateFailed),

    /// Another live entry already has this entry id or unique id.
    #[error("account {0} is already configured")]
    AlreadyConfigured(String),
}
