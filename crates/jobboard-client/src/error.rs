//! Client error taxonomy.

use jobboard_core::UnknownStatus;
use thiserror::Error;

use crate::guard::EntityKey;
use crate::transport::TransportError;

/// Errors surfaced by client operations.
#[derive(Debug, Error)]
pub enum ApiError {
    /// No usable credential, or the server rejected it.
    #[error("not signed in")]
    Unauthenticated,

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("not found: {0}")]
    NotFound(String),

    /// The request conflicts with server state (e.g. a duplicate application).
    #[error("conflict: {0}")]
    Conflict(String),

    /// Any other 4xx answer. Retrying the same request will not help.
    #[error("request rejected ({status}): {detail}")]
    Rejected { status: u16, detail: String },

    /// Network failure, 5xx, or a response the client could not read.
    #[error("temporary failure: {0}")]
    Transient(String),

    #[error(transparent)]
    InvalidStatus(#[from] UnknownStatus),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A mutation on the same entity is still pending.
    #[error("a change to {0} is already in progress")]
    Busy(EntityKey),
}

impl ApiError {
    /// Whether the caller should route the user to authentication.
    pub const fn requires_login(&self) -> bool {
        matches!(self, Self::Unauthenticated)
    }

    /// Whether repeating the same request later may succeed.
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Transient(_) | Self::Busy(_))
    }

    /// Short message suitable for showing to a person.
    pub fn user_message(&self) -> String {
        match self {
            Self::Unauthenticated => "Please sign in to continue.".into(),
            Self::Forbidden(_) => "You are not permitted to do that.".into(),
            Self::NotFound(_) => "This item no longer exists.".into(),
            Self::Conflict(detail) | Self::Rejected { detail, .. } if !detail.is_empty() => {
                detail.clone()
            }
            Self::Conflict(_) => "This conflicts with the current state.".into(),
            Self::Rejected { .. } => "The request was rejected.".into(),
            Self::Transient(_) => "Something went wrong. Please try again.".into(),
            Self::InvalidStatus(e) => e.to_string(),
            Self::InvalidInput(detail) => detail.clone(),
            Self::Busy(_) => "Please wait for the previous request to finish.".into(),
        }
    }
}

impl From<TransportError> for ApiError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Status { status: 401, .. } => Self::Unauthenticated,
            TransportError::Status {
                status: 403,
                detail,
            } => Self::Forbidden(detail),
            TransportError::Status {
                status: 404,
                detail,
            } => Self::NotFound(detail),
            TransportError::Status {
                status: 409,
                detail,
            } => Self::Conflict(detail),
            TransportError::Status { status, detail } if (400..500).contains(&status) => {
                Self::Rejected { status, detail }
            }
            TransportError::Status { status, detail } => {
                Self::Transient(format!("server error {status}: {detail}"))
            }
            TransportError::Network(msg) => Self::Transient(msg),
            TransportError::Decode(msg) => Self::Transient(format!("unreadable response: {msg}")),
            TransportError::Config(msg) => Self::InvalidInput(msg),
        }
    }
}
