/**
 * Backend Error Types
 *
 * This module defines the error taxonomy for client-initiated realtime
 * operations. Validation and conflict errors are detected and reported
 * before any persistence attempt; storage failures abort the operation and
 * are reported to the caller, who retries the whole user-facing action.
 *
 * # Error Categories
 *
 * - `InvalidArgument` - malformed identities, missing required fields
 * - `Conflict` - duplicate friend request, already-friends
 * - `NotFound` - operating on a record that doesn't exist
 * - `Storage` - a durable read/write failed
 */
use axum::http::StatusCode;
use thiserror::Error;

use crate::backend::store::StoreError;

/// Errors reported to the initiator of a realtime operation
#[derive(Debug, Error)]
pub enum RealtimeError {
    /// Malformed identities or missing required fields.
    /// Rejected before any side effect.
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Human-readable error message
        message: String,
    },

    /// The operation contradicts existing state (e.g. already friends).
    /// Rejected with no side effect.
    #[error("Conflict: {message}")]
    Conflict {
        /// Human-readable error message
        message: String,
    },

    /// The referenced record does not exist
    #[error("Not found: {message}")]
    NotFound {
        /// Human-readable error message
        message: String,
    },

    /// A durable write or read failed; the triggering operation fails and
    /// the caller is expected to retry the whole action.
    #[error("Storage failure: {0}")]
    Storage(#[from] StoreError),
}

impl RealtimeError {
    /// Create a new invalid-argument error
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Create a new conflict error
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    /// Create a new not-found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Stable machine-readable code, used in `error` events on the channel
    pub fn code(&self) -> &'static str {
        match self {
            RealtimeError::InvalidArgument { .. } => "invalid_argument",
            RealtimeError::Conflict { .. } => "conflict",
            RealtimeError::NotFound { .. } => "not_found",
            RealtimeError::Storage(_) => "storage_failure",
        }
    }

    /// HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            RealtimeError::InvalidArgument { .. } => StatusCode::BAD_REQUEST,
            RealtimeError::Conflict { .. } => StatusCode::CONFLICT,
            RealtimeError::NotFound { .. } => StatusCode::NOT_FOUND,
            RealtimeError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
