//! Backend Error Module
//!
//! Defines the realtime subsystem's error taxonomy and its conversion into
//! HTTP responses. Delivery failures (push to an offline or unreachable
//! session) are deliberately absent: they are logged and swallowed, never
//! surfaced, because durable persistence has already succeeded by the time a
//! push is attempted.

/// Error type definitions
pub mod types;

/// Conversions to HTTP responses
pub mod conversion;

pub use types::RealtimeError;
