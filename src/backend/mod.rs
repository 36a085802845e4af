//! Backend Module
//!
//! Server-side code for the realtime-routing process: one process owns the
//! in-memory presence state; delivery and routing components are handed the
//! registry and the storage facade, they never reach into globals.

/// Error types and HTTP conversions
pub mod error;

/// In-memory presence registry
pub mod presence;

/// Realtime components: connection lifecycle, resolver, delivery, router
pub mod realtime;

/// HTTP/WebSocket routes
pub mod routes;

/// Server configuration, state and initialization
pub mod server;

/// Storage facade and implementations
pub mod store;
