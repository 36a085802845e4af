//! Ripple - Realtime Presence & Delivery
//!
//! Ripple is the realtime subsystem of a social-networking backend: it tracks
//! which users are currently connected, routes chat messages and social-graph
//! events (friend requests, notifications, read receipts, typing hints) to
//! the right live sessions, and reconciles that transient channel with the
//! durable, database-backed conversation history.
//!
//! # Module Structure
//!
//! - **`shared`** - Types shared between server and client
//!   - Tagged realtime event enums
//!   - Conversation, message, friend request and notification structures
//!   - Shared error types
//!
//! - **`backend`** - The realtime-routing server
//!   - Presence registry and WebSocket connection lifecycle
//!   - Message delivery pipeline and social event router
//!   - Storage facade (Postgres via sqlx, plus an in-memory store)
//!   - Axum routes and server wiring
//!
//! - **`client`** - Client reconciliation layer (UI-free)
//!   - Reconnection state machine with bounded backoff
//!   - Conversation view that merges REST history with realtime pushes
//!   - REST client for the history/send endpoints
//!
//! # Delivery Model
//!
//! At-least-once with client-side deduplication: a message is durably
//! recorded before its delivery push is attempted (write-before-notify), and
//! the client deduplicates by durable message identity. Presence and typing
//! events are best-effort and never retried.

/// Shared types and data structures
pub mod shared;

/// Backend server-side code
pub mod backend;

/// Client reconciliation layer
pub mod client;
