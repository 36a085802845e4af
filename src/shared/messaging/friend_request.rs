//! Friend Request Data Structure
//!
//! A pending friend request between two users. Requests have no status
//! column: accepting, declining or cancelling deletes the record, while any
//! notification created alongside it lives on independently.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Represents a pending friend request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FriendRequest {
    /// Unique request ID
    pub id: Uuid,
    /// User who sent the request
    pub sender_id: Uuid,
    /// User who received the request
    pub receiver_id: Uuid,
    /// When the request was created
    pub created_at: DateTime<Utc>,
}

impl FriendRequest {
    /// Create a new pending friend request
    pub fn new(sender_id: Uuid, receiver_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            sender_id,
            receiver_id,
            created_at: Utc::now(),
        }
    }

    /// Whether `other` is the same pair in the opposite direction
    pub fn is_reverse_of(&self, sender_id: Uuid, receiver_id: Uuid) -> bool {
        self.sender_id == receiver_id && self.receiver_id == sender_id
    }
}
