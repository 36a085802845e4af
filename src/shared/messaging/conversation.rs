//! Conversation Data Structure
//!
//! Represents an ongoing exchange between a fixed set of participants. Direct
//! conversations always have exactly two participants; at most one direct
//! conversation exists per unordered pair (enforced by the resolver's
//! find-or-create, see the backend realtime module).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of conversation
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ConversationKind {
    /// Exactly two participants
    Direct,
    /// N participants with roles
    Group,
}

impl ConversationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConversationKind::Direct => "direct",
            ConversationKind::Group => "group",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "group" => ConversationKind::Group,
            _ => ConversationKind::Direct,
        }
    }
}

/// Role of a participant within a conversation
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ParticipantRole {
    Admin,
    Member,
}

impl ParticipantRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParticipantRole::Admin => "admin",
            ParticipantRole::Member => "member",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "admin" => ParticipantRole::Admin,
            _ => ParticipantRole::Member,
        }
    }
}

/// One participant's membership record
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Participant {
    /// Participant user ID
    pub user_id: Uuid,
    /// Role within the conversation
    pub role: ParticipantRole,
    /// Whether the participant is still active in the conversation
    pub is_active: bool,
    /// Last time this participant read messages here
    pub last_read: DateTime<Utc>,
}

/// Represents a conversation between users
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Conversation {
    /// Unique conversation ID
    pub id: Uuid,
    /// Direct or group
    pub kind: ConversationKind,
    /// Membership records
    pub participants: Vec<Participant>,
    /// When the conversation was created
    pub created_at: DateTime<Utc>,
    /// Timestamp of the most recent message or membership change
    pub last_activity: DateTime<Utc>,
    /// Pointer to the most recent message, if any
    pub last_message_id: Option<Uuid>,
}

impl Conversation {
    /// Create a new direct conversation between two users, both as members
    pub fn new_direct(user_a: Uuid, user_b: Uuid) -> Self {
        let now = Utc::now();
        let member = |user_id| Participant {
            user_id,
            role: ParticipantRole::Member,
            is_active: true,
            last_read: now,
        };
        Self {
            id: Uuid::new_v4(),
            kind: ConversationKind::Direct,
            participants: vec![member(user_a), member(user_b)],
            created_at: now,
            last_activity: now,
            last_message_id: None,
        }
    }

    /// Check if user is a participant
    pub fn has_participant(&self, user_id: Uuid) -> bool {
        self.participants.iter().any(|p| p.user_id == user_id)
    }

    /// Get the other participant (for direct conversations)
    pub fn other_participant(&self, current_user_id: Uuid) -> Option<Uuid> {
        self.participants
            .iter()
            .map(|p| p.user_id)
            .find(|&id| id != current_user_id)
    }

    /// Whether this is the direct conversation between exactly this pair,
    /// in either order.
    pub fn is_direct_between(&self, user_a: Uuid, user_b: Uuid) -> bool {
        self.kind == ConversationKind::Direct
            && self.participants.len() == 2
            && self.has_participant(user_a)
            && self.has_participant(user_b)
    }

    /// Record a new most-recent message
    pub fn touch(&mut self, message_id: Uuid, at: DateTime<Utc>) {
        self.last_message_id = Some(message_id);
        self.last_activity = at;
    }
}
