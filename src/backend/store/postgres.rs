//! Postgres storage backend
//!
//! sqlx-backed implementation of the storage facade. Writes are individual
//! statements; the message insert and the conversation touch are two separate
//! calls by design (see the module docs in `store`).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::shared::event::UserStatus;
use crate::shared::messaging::{
    ChatMessage, Conversation, ConversationKind, FriendRequest, MessageKind, Notification,
    Participant, ParticipantRole, ReadReceipt,
};

use super::{ConversationStore, FriendStore, StatusStore, StoreError};

/// Postgres-backed store
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn load_participants(&self, conversation_id: Uuid) -> Result<Vec<Participant>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT user_id, role, is_active, last_read
            FROM conversation_participants
            WHERE conversation_id = $1
            "#,
        )
        .bind(conversation_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| Participant {
                user_id: row.get("user_id"),
                role: ParticipantRole::from_str(row.get::<String, _>("role").as_str()),
                is_active: row.get("is_active"),
                last_read: row.get("last_read"),
            })
            .collect())
    }

    async fn load_receipts(&self, message_id: Uuid) -> Result<Vec<ReadReceipt>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT user_id, read_at FROM message_reads WHERE message_id = $1 ORDER BY read_at ASC
            "#,
        )
        .bind(message_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| ReadReceipt {
                user_id: row.get("user_id"),
                read_at: row.get("read_at"),
            })
            .collect())
    }

    fn conversation_from_row(row: &sqlx::postgres::PgRow, participants: Vec<Participant>) -> Conversation {
        Conversation {
            id: row.get("id"),
            kind: ConversationKind::from_str(row.get::<String, _>("kind").as_str()),
            participants,
            created_at: row.get("created_at"),
            last_activity: row.get("last_activity"),
            last_message_id: row.get("last_message_id"),
        }
    }
}

#[async_trait]
impl ConversationStore for PgStore {
    async fn find_direct(
        &self,
        user_a: Uuid,
        user_b: Uuid,
    ) -> Result<Option<Conversation>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT c.id, c.kind, c.created_at, c.last_activity, c.last_message_id
            FROM conversations c
            INNER JOIN conversation_participants p1
                ON p1.conversation_id = c.id AND p1.user_id = $1
            INNER JOIN conversation_participants p2
                ON p2.conversation_id = c.id AND p2.user_id = $2
            WHERE c.kind = 'direct'
            ORDER BY c.created_at ASC
            LIMIT 1
            "#,
        )
        .bind(user_a)
        .bind(user_b)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => {
                let participants = self.load_participants(row.get("id")).await?;
                Ok(Some(Self::conversation_from_row(&row, participants)))
            }
            None => Ok(None),
        }
    }

    async fn conversation_by_id(&self, id: Uuid) -> Result<Option<Conversation>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, kind, created_at, last_activity, last_message_id
            FROM conversations
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => {
                let participants = self.load_participants(id).await?;
                Ok(Some(Self::conversation_from_row(&row, participants)))
            }
            None => Ok(None),
        }
    }

    async fn insert_conversation(&self, conversation: &Conversation) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO conversations (id, kind, created_at, last_activity, last_message_id)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(conversation.id)
        .bind(conversation.kind.as_str())
        .bind(conversation.created_at)
        .bind(conversation.last_activity)
        .bind(conversation.last_message_id)
        .execute(&self.pool)
        .await?;

        for participant in &conversation.participants {
            sqlx::query(
                r#"
                INSERT INTO conversation_participants (conversation_id, user_id, role, is_active, last_read)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(conversation.id)
            .bind(participant.user_id)
            .bind(participant.role.as_str())
            .bind(participant.is_active)
            .bind(participant.last_read)
            .execute(&self.pool)
            .await?;
        }

        Ok(())
    }

    async fn insert_message(&self, message: &ChatMessage) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO messages (id, conversation_id, sender_id, kind, content, created_at, is_deleted)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(message.id)
        .bind(message.conversation_id)
        .bind(message.sender_id)
        .bind(message.kind.as_str())
        .bind(&message.content)
        .bind(message.created_at)
        .bind(message.is_deleted)
        .execute(&self.pool)
        .await?;

        for receipt in &message.read_by {
            sqlx::query(
                r#"
                INSERT INTO message_reads (message_id, user_id, read_at)
                VALUES ($1, $2, $3)
                ON CONFLICT (message_id, user_id) DO NOTHING
                "#,
            )
            .bind(message.id)
            .bind(receipt.user_id)
            .bind(receipt.read_at)
            .execute(&self.pool)
            .await?;
        }

        Ok(())
    }

    async fn touch_conversation(
        &self,
        id: Uuid,
        last_message_id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            UPDATE conversations SET last_message_id = $1, last_activity = $2 WHERE id = $3
            "#,
        )
        .bind(last_message_id)
        .bind(at)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn messages_page(
        &self,
        conversation_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ChatMessage>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, conversation_id, sender_id, kind, content, created_at, is_deleted
            FROM messages
            WHERE conversation_id = $1 AND is_deleted = FALSE
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(conversation_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let mut messages = Vec::with_capacity(rows.len());
        for row in rows {
            let id: Uuid = row.get("id");
            let read_by = self.load_receipts(id).await?;
            messages.push(ChatMessage {
                id,
                conversation_id: row.get("conversation_id"),
                sender_id: row.get("sender_id"),
                kind: MessageKind::from_str(row.get::<String, _>("kind").as_str()),
                content: row.get("content"),
                created_at: row.get("created_at"),
                read_by,
                is_deleted: row.get("is_deleted"),
            });
        }

        Ok(messages)
    }

    async fn mark_messages_read(
        &self,
        conversation_id: Uuid,
        reader_id: Uuid,
        read_at: DateTime<Utc>,
    ) -> Result<u64, StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO message_reads (message_id, user_id, read_at)
            SELECT m.id, $2, $3
            FROM messages m
            WHERE m.conversation_id = $1 AND m.sender_id <> $2
            ON CONFLICT (message_id, user_id) DO NOTHING
            "#,
        )
        .bind(conversation_id)
        .bind(reader_id)
        .bind(read_at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}

#[async_trait]
impl FriendStore for PgStore {
    async fn are_friends(&self, user_a: Uuid, user_b: Uuid) -> Result<bool, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT COUNT(*) as count FROM friendships WHERE user_id = $1 AND friend_id = $2
            "#,
        )
        .bind(user_a)
        .bind(user_b)
        .fetch_one(&self.pool)
        .await?;

        let count: i64 = row.get("count");
        Ok(count > 0)
    }

    async fn add_friend(&self, user_id: Uuid, friend_id: Uuid) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO friendships (user_id, friend_id, created_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, friend_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(friend_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn remove_friend(&self, user_id: Uuid, friend_id: Uuid) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            DELETE FROM friendships WHERE user_id = $1 AND friend_id = $2
            "#,
        )
        .bind(user_id)
        .bind(friend_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn pending_request_between(
        &self,
        sender_id: Uuid,
        receiver_id: Uuid,
    ) -> Result<Option<FriendRequest>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, sender_id, receiver_id, created_at
            FROM friend_requests
            WHERE sender_id = $1 AND receiver_id = $2
            LIMIT 1
            "#,
        )
        .bind(sender_id)
        .bind(receiver_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| FriendRequest {
            id: row.get("id"),
            sender_id: row.get("sender_id"),
            receiver_id: row.get("receiver_id"),
            created_at: row.get("created_at"),
        }))
    }

    async fn request_by_id(&self, id: Uuid) -> Result<Option<FriendRequest>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, sender_id, receiver_id, created_at FROM friend_requests WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| FriendRequest {
            id: row.get("id"),
            sender_id: row.get("sender_id"),
            receiver_id: row.get("receiver_id"),
            created_at: row.get("created_at"),
        }))
    }

    async fn insert_request(&self, request: &FriendRequest) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO friend_requests (id, sender_id, receiver_id, created_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(request.id)
        .bind(request.sender_id)
        .bind(request.receiver_id)
        .bind(request.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete_request(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            DELETE FROM friend_requests WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn insert_notification(&self, notification: &Notification) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO notifications (id, user_id, actor_id, kind, message, is_read, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(notification.id)
        .bind(notification.user_id)
        .bind(notification.actor_id)
        .bind(notification.kind.as_str())
        .bind(&notification.message)
        .bind(notification.is_read)
        .bind(notification.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn mark_notification_read(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE notifications SET is_read = TRUE WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl StatusStore for PgStore {
    async fn set_status(
        &self,
        user_id: Uuid,
        status: UserStatus,
        last_seen: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO user_status (user_id, status, last_seen)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id) DO UPDATE SET status = $2, last_seen = $3
            "#,
        )
        .bind(user_id)
        .bind(status.as_str())
        .bind(last_seen)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
