//! Error taxonomy for remote fetch operations.
//!
//! Fetchers classify collaborator failures into a small set of kinds the UI
//! can render distinctly (access denied vs. deleted vs. throttled). Errors
//! are never retried by the core; they surface at the affected level.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Classification of a failed remote operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FetchErrorKind {
    /// No valid credential for the tenant; sign-in required.
    NotAuthenticated,
    /// Authenticated but RBAC denies the operation.
    AccessDenied,
    /// The resource was deleted or renamed remotely.
    NotFound,
    /// Network failure or remote throttling.
    NetworkOrThrottling,
    /// Anything the collaborator did not give us enough to classify.
    Transient,
}

impl FetchErrorKind {
    pub fn label(&self) -> &'static str {
        match self {
            FetchErrorKind::NotAuthenticated => "not authenticated",
            FetchErrorKind::AccessDenied => "access denied",
            FetchErrorKind::NotFound => "not found",
            FetchErrorKind::NetworkOrThrottling => "network/throttled",
            FetchErrorKind::Transient => "transient",
        }
    }
}

/// A failed fetch or mutation against the remote service.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{} error: {message}", kind.label())]
pub struct FetchError {
    pub kind: FetchErrorKind,
    pub message: String,
}

impl FetchError {
    pub fn new(kind: FetchErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn transient(message: impl Into<String>) -> Self {
        Self::new(FetchErrorKind::Transient, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(FetchErrorKind::NotFound, message)
    }

    /// Classify an HTTP status from the remote service.
    ///
    /// 401 -> NotAuthenticated, 403 -> AccessDenied, 404 -> NotFound,
    /// 429 and 5xx -> NetworkOrThrottling, everything else -> Transient.
    pub fn from_http_status(status: u16, message: impl Into<String>) -> Self {
        let kind = match status {
            401 => FetchErrorKind::NotAuthenticated,
            403 => FetchErrorKind::AccessDenied,
            404 => FetchErrorKind::NotFound,
            429 => FetchErrorKind::NetworkOrThrottling,
            500..=599 => FetchErrorKind::NetworkOrThrottling,
            _ => FetchErrorKind::Transient,
        };
        Self::new(kind, message)
    }
}

/// Result type alias for remote operations.
pub type FetchResult<T> = Result<T, FetchError>;

// =============================================================================
// TESTS
// =============================================================================
