//! Routes Module
//!
//! HTTP surface of the realtime subsystem: the WebSocket endpoint plus the
//! REST history/send endpoints the client reconciliation layer treats as the
//! durable source of truth.

/// REST handlers
pub mod api;

/// Router configuration
pub mod router;

pub use router::create_router;
