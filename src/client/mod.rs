//! Client Module
//!
//! The client reconciliation layer, UI-free: everything a frontend needs to
//! keep a conversation view correct when REST history fetches and realtime
//! pushes race, without rendering anything.
//!
//! - **`connector`** - reconnection state machine with bounded retries
//! - **`conversation`** - authoritative message list, deduplicated by
//!   durable message identity; typing indicator with client-side expiry
//! - **`rest`** - HTTP client for the history/send endpoints

/// Reconnection state machine
pub mod connector;

/// Conversation view reconciliation
pub mod conversation;

/// REST API client
pub mod rest;

pub use connector::{ConnectionState, Connector, ConnectorConfig};
pub use conversation::{ConversationView, PushOutcome};
pub use rest::{ApiClient, ClientError};
