//! Shared Module
//!
//! Types shared between the realtime server and the client reconciliation
//! layer. Everything here is serializable and travels either over the
//! realtime channel or through the REST history/send endpoints.

/// Realtime channel events (tagged variants)
pub mod event;

/// Shared error types
pub mod error;

/// Conversation, message, friend request and notification types
pub mod messaging;

/// Re-export commonly used types for convenience
pub use error::SharedError;
pub use event::{ClientEvent, ServerEvent, UserStatus};
