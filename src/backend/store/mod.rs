//! Storage Facade
//!
//! The durable store is the system of record; this module is the narrow seam
//! the realtime components talk through. Three collaborator interfaces:
//!
//! - [`ConversationStore`] - conversations and messages, keyed by participant
//!   pair and conversation identity
//! - [`FriendStore`] - the friend graph, pending requests and notifications
//! - [`StatusStore`] - durable "online/offline + last seen" per user
//!
//! The store serializes its own writes; callers never wrap multiple calls in
//! a transaction. A crash between a message insert and the conversation
//! touch leaves a stale last-message pointer that heals on the next send.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::shared::event::UserStatus;
use crate::shared::messaging::{ChatMessage, Conversation, FriendRequest, Notification};

/// In-memory implementation (tests, database-less runs)
pub mod memory;

/// Postgres implementation via sqlx
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Errors surfaced by a storage backend
#[derive(Debug, Error, Clone)]
pub enum StoreError {
    /// The backend failed to execute a read or write
    #[error("database error: {0}")]
    Database(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Database(err.to_string())
    }
}

/// Conversations and their messages
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Find the direct conversation whose participant set equals `{a, b}`
    async fn find_direct(&self, user_a: Uuid, user_b: Uuid)
        -> Result<Option<Conversation>, StoreError>;

    /// Load a conversation with its participants
    async fn conversation_by_id(&self, id: Uuid) -> Result<Option<Conversation>, StoreError>;

    /// Persist a new conversation and its membership records
    async fn insert_conversation(&self, conversation: &Conversation) -> Result<(), StoreError>;

    /// Persist a new message, including its initial read receipts
    async fn insert_message(&self, message: &ChatMessage) -> Result<(), StoreError>;

    /// Update the conversation's last-message pointer and last-activity time
    async fn touch_conversation(
        &self,
        id: Uuid,
        last_message_id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    /// One page of a conversation's messages, newest first
    async fn messages_page(
        &self,
        conversation_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ChatMessage>, StoreError>;

    /// Append a read receipt for every message in the conversation authored
    /// by someone other than the reader that doesn't already carry one.
    /// Idempotent; returns the number of receipts appended.
    async fn mark_messages_read(
        &self,
        conversation_id: Uuid,
        reader_id: Uuid,
        read_at: DateTime<Utc>,
    ) -> Result<u64, StoreError>;
}

/// Friend graph, pending requests and notifications
#[async_trait]
pub trait FriendStore: Send + Sync {
    /// Whether `a` has `b` in their friend list
    async fn are_friends(&self, user_a: Uuid, user_b: Uuid) -> Result<bool, StoreError>;

    /// Add `friend_id` to `user_id`'s friend list; idempotent set-add
    async fn add_friend(&self, user_id: Uuid, friend_id: Uuid) -> Result<(), StoreError>;

    /// Remove `friend_id` from `user_id`'s friend list
    async fn remove_friend(&self, user_id: Uuid, friend_id: Uuid) -> Result<(), StoreError>;

    /// The pending request from `sender_id` to `receiver_id`, if any
    async fn pending_request_between(
        &self,
        sender_id: Uuid,
        receiver_id: Uuid,
    ) -> Result<Option<FriendRequest>, StoreError>;

    /// Look up a pending request by id
    async fn request_by_id(&self, id: Uuid) -> Result<Option<FriendRequest>, StoreError>;

    /// Persist a new pending request
    async fn insert_request(&self, request: &FriendRequest) -> Result<(), StoreError>;

    /// Delete a request record; returns false if it did not exist
    async fn delete_request(&self, id: Uuid) -> Result<bool, StoreError>;

    /// Persist a notification
    async fn insert_notification(&self, notification: &Notification) -> Result<(), StoreError>;

    /// Flip a stored notification to read; returns false if it did not exist
    async fn mark_notification_read(&self, id: Uuid) -> Result<bool, StoreError>;
}

/// Durable per-user presence status
#[async_trait]
pub trait StatusStore: Send + Sync {
    /// Write through the user's status and last-seen timestamp
    async fn set_status(
        &self,
        user_id: Uuid,
        status: UserStatus,
        last_seen: DateTime<Utc>,
    ) -> Result<(), StoreError>;
}
