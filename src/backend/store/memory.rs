//! In-Memory Store
//!
//! Mutex-guarded maps implementing the storage facade. Used by the test
//! suite and as the fallback backend when `DATABASE_URL` is not configured,
//! so the server can still be run locally without Postgres.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::shared::event::UserStatus;
use crate::shared::messaging::{ChatMessage, Conversation, FriendRequest, Notification};

use super::{ConversationStore, FriendStore, StatusStore, StoreError};

#[derive(Debug, Default)]
struct MemoryInner {
    conversations: HashMap<Uuid, Conversation>,
    /// conversation id -> messages in insertion order (oldest first)
    messages: HashMap<Uuid, Vec<ChatMessage>>,
    friends: HashMap<Uuid, HashSet<Uuid>>,
    requests: HashMap<Uuid, FriendRequest>,
    notifications: HashMap<Uuid, Notification>,
    statuses: HashMap<Uuid, (UserStatus, DateTime<Utc>)>,
}

/// In-memory storage backend
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<MemoryInner>,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent write fail, for exercising storage-failure
    /// paths in tests.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn write_guard(&self) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Database("simulated write failure".to_string()));
        }
        Ok(())
    }

    /// Stored notifications targeting a user, oldest first
    pub fn notifications_for(&self, user_id: Uuid) -> Vec<Notification> {
        let inner = self.inner.lock().unwrap();
        let mut list: Vec<Notification> = inner
            .notifications
            .values()
            .filter(|n| n.user_id == user_id)
            .cloned()
            .collect();
        list.sort_by_key(|n| n.created_at);
        list
    }

    /// The user's durable status record, if any
    pub fn status_of(&self, user_id: Uuid) -> Option<(UserStatus, DateTime<Utc>)> {
        self.inner.lock().unwrap().statuses.get(&user_id).copied()
    }

    /// The user's friend list
    pub fn friends_of(&self, user_id: Uuid) -> Vec<Uuid> {
        let inner = self.inner.lock().unwrap();
        inner
            .friends
            .get(&user_id)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Number of stored pending requests
    pub fn pending_request_count(&self) -> usize {
        self.inner.lock().unwrap().requests.len()
    }

    /// Total number of stored messages across all conversations
    pub fn message_count(&self) -> usize {
        self.inner.lock().unwrap().messages.values().map(|v| v.len()).sum()
    }
}

#[async_trait]
impl ConversationStore for MemoryStore {
    async fn find_direct(
        &self,
        user_a: Uuid,
        user_b: Uuid,
    ) -> Result<Option<Conversation>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .conversations
            .values()
            .find(|c| c.is_direct_between(user_a, user_b))
            .cloned())
    }

    async fn conversation_by_id(&self, id: Uuid) -> Result<Option<Conversation>, StoreError> {
        Ok(self.inner.lock().unwrap().conversations.get(&id).cloned())
    }

    async fn insert_conversation(&self, conversation: &Conversation) -> Result<(), StoreError> {
        self.write_guard()?;
        let mut inner = self.inner.lock().unwrap();
        inner.conversations.insert(conversation.id, conversation.clone());
        Ok(())
    }

    async fn insert_message(&self, message: &ChatMessage) -> Result<(), StoreError> {
        self.write_guard()?;
        let mut inner = self.inner.lock().unwrap();
        inner
            .messages
            .entry(message.conversation_id)
            .or_default()
            .push(message.clone());
        Ok(())
    }

    async fn touch_conversation(
        &self,
        id: Uuid,
        last_message_id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        self.write_guard()?;
        let mut inner = self.inner.lock().unwrap();
        if let Some(conversation) = inner.conversations.get_mut(&id) {
            conversation.touch(last_message_id, at);
        }
        Ok(())
    }

    async fn messages_page(
        &self,
        conversation_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ChatMessage>, StoreError> {
        let inner = self.inner.lock().unwrap();
        let mut all: Vec<ChatMessage> = inner
            .messages
            .get(&conversation_id)
            .cloned()
            .unwrap_or_default();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(all
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn mark_messages_read(
        &self,
        conversation_id: Uuid,
        reader_id: Uuid,
        read_at: DateTime<Utc>,
    ) -> Result<u64, StoreError> {
        self.write_guard()?;
        let mut inner = self.inner.lock().unwrap();
        let mut appended = 0u64;
        if let Some(messages) = inner.messages.get_mut(&conversation_id) {
            for message in messages.iter_mut() {
                if message.sender_id != reader_id && message.mark_read_by(reader_id, read_at) {
                    appended += 1;
                }
            }
        }
        Ok(appended)
    }
}

#[async_trait]
impl FriendStore for MemoryStore {
    async fn are_friends(&self, user_a: Uuid, user_b: Uuid) -> Result<bool, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .friends
            .get(&user_a)
            .map_or(false, |set| set.contains(&user_b)))
    }

    async fn add_friend(&self, user_id: Uuid, friend_id: Uuid) -> Result<(), StoreError> {
        self.write_guard()?;
        let mut inner = self.inner.lock().unwrap();
        inner.friends.entry(user_id).or_default().insert(friend_id);
        Ok(())
    }

    async fn remove_friend(&self, user_id: Uuid, friend_id: Uuid) -> Result<(), StoreError> {
        self.write_guard()?;
        let mut inner = self.inner.lock().unwrap();
        if let Some(set) = inner.friends.get_mut(&user_id) {
            set.remove(&friend_id);
        }
        Ok(())
    }

    async fn pending_request_between(
        &self,
        sender_id: Uuid,
        receiver_id: Uuid,
    ) -> Result<Option<FriendRequest>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .requests
            .values()
            .find(|r| r.sender_id == sender_id && r.receiver_id == receiver_id)
            .cloned())
    }

    async fn request_by_id(&self, id: Uuid) -> Result<Option<FriendRequest>, StoreError> {
        Ok(self.inner.lock().unwrap().requests.get(&id).cloned())
    }

    async fn insert_request(&self, request: &FriendRequest) -> Result<(), StoreError> {
        self.write_guard()?;
        let mut inner = self.inner.lock().unwrap();
        inner.requests.insert(request.id, request.clone());
        Ok(())
    }

    async fn delete_request(&self, id: Uuid) -> Result<bool, StoreError> {
        self.write_guard()?;
        Ok(self.inner.lock().unwrap().requests.remove(&id).is_some())
    }

    async fn insert_notification(&self, notification: &Notification) -> Result<(), StoreError> {
        self.write_guard()?;
        let mut inner = self.inner.lock().unwrap();
        inner.notifications.insert(notification.id, notification.clone());
        Ok(())
    }

    async fn mark_notification_read(&self, id: Uuid) -> Result<bool, StoreError> {
        self.write_guard()?;
        let mut inner = self.inner.lock().unwrap();
        match inner.notifications.get_mut(&id) {
            Some(notification) => {
                notification.is_read = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl StatusStore for MemoryStore {
    async fn set_status(
        &self,
        user_id: Uuid,
        status: UserStatus,
        last_seen: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        self.write_guard()?;
        let mut inner = self.inner.lock().unwrap();
        inner.statuses.insert(user_id, (status, last_seen));
        Ok(())
    }
}
