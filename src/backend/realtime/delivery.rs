//! Message Delivery Pipeline
//!
//! Accepts an inbound chat send, persists it, and fans the persisted result
//! out to the recipient's live sessions. Ordering guarantee: the message is
//! durably recorded before any delivery push is attempted.
//!
//! The persisted message is pushed to the **recipient only**. The sender's
//! own UI update comes exclusively from the return value of `send`.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::backend::error::RealtimeError;
use crate::backend::presence::PresenceRegistry;
use crate::backend::store::ConversationStore;
use crate::shared::messaging::ChatMessage;
use crate::shared::ServerEvent;

use super::resolver::ConversationResolver;
use super::push_to_user;

/// The delivery pipeline for direct messages
pub struct DeliveryPipeline {
    store: Arc<dyn ConversationStore>,
    resolver: ConversationResolver,
    presence: Arc<PresenceRegistry>,
}

impl DeliveryPipeline {
    pub fn new(store: Arc<dyn ConversationStore>, presence: Arc<PresenceRegistry>) -> Self {
        let resolver = ConversationResolver::new(store.clone());
        Self {
            store,
            resolver,
            presence,
        }
    }

    /// Persist a text message from `sender` to `recipient` and push it to the
    /// recipient's sessions. Returns the persisted message; the caller hands
    /// it back to the sending client as the authoritative local echo.
    ///
    /// Persistence failure aborts the whole operation. Push failure does
    /// not: the message is already durable and shows up on the recipient's
    /// next history fetch.
    pub async fn send(
        &self,
        sender: Uuid,
        recipient: Uuid,
        text: &str,
    ) -> Result<ChatMessage, RealtimeError> {
        if sender.is_nil() || recipient.is_nil() {
            return Err(RealtimeError::invalid_argument("sender or recipient identity missing"));
        }
        if sender == recipient {
            return Err(RealtimeError::invalid_argument("cannot message yourself"));
        }
        if text.trim().is_empty() {
            return Err(RealtimeError::invalid_argument("message text is empty"));
        }

        let conversation = self.resolver.find_or_create_direct(sender, recipient).await?;

        // The sender is pre-seeded as a reader by the constructor.
        let message = ChatMessage::new_text(conversation.id, sender, text.to_string());
        self.store.insert_message(&message).await?;

        // The message is already durable; the stale pointer heals on the
        // next successful send.
        if let Err(err) = self
            .store
            .touch_conversation(conversation.id, message.id, message.created_at)
            .await
        {
            tracing::warn!(
                "conversation {} not updated after message {}: {}",
                conversation.id,
                message.id,
                err
            );
        }

        let delivered = push_to_user(
            &self.presence,
            recipient,
            &ServerEvent::ReceiveMessage {
                message: message.clone(),
            },
        );
        tracing::debug!(
            "message {} (\"{}\") delivered to {} session(s) of {}",
            message.id,
            message.preview(32),
            delivered,
            recipient
        );

        Ok(message)
    }

    /// Append a read receipt for every message in the conversation authored
    /// by someone other than `reader` that doesn't already have one, then
    /// broadcast `messages_read` to the other active participants
    /// (best-effort). Returns the number of receipts appended; calling twice
    /// in a row appends nothing the second time.
    pub async fn mark_read(
        &self,
        conversation_id: Uuid,
        reader: Uuid,
    ) -> Result<u64, RealtimeError> {
        if conversation_id.is_nil() || reader.is_nil() {
            return Err(RealtimeError::invalid_argument("conversation or reader identity missing"));
        }

        let read_at = Utc::now();
        let appended = self
            .store
            .mark_messages_read(conversation_id, reader, read_at)
            .await?;

        match self.store.conversation_by_id(conversation_id).await {
            Ok(Some(conversation)) => {
                let event = ServerEvent::MessagesRead {
                    conversation_id,
                    read_by: reader,
                    read_at,
                };
                for participant in &conversation.participants {
                    if participant.user_id != reader && participant.is_active {
                        push_to_user(&self.presence, participant.user_id, &event);
                    }
                }
            }
            Ok(None) => {}
            Err(err) => {
                // Receipts are already durable; the broadcast is a hint.
                tracing::warn!(
                    "messages_read broadcast skipped for {}: {}",
                    conversation_id,
                    err
                );
            }
        }

        Ok(appended)
    }

    /// One page of a conversation's history, newest first
    pub async fn history_page(
        &self,
        conversation_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ChatMessage>, RealtimeError> {
        Ok(self.store.messages_page(conversation_id, limit, offset).await?)
    }
}
