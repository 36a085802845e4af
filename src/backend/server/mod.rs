//! Server Module
//!
//! Configuration, application state and initialization for the
//! realtime-routing process.

/// Environment-driven configuration
pub mod config;

/// Server initialization
pub mod init;

/// Application state
pub mod state;

pub use config::ServerConfig;
pub use state::AppState;
