//! Conversation View Reconciliation
//!
//! The authoritative client-side view of one conversation's message list.
//! REST history is the source of truth; realtime pushes are hints that are
//! merged by durable message identity, so the view stays correct when a
//! fetch and a push race or when a push arrives twice.
//!
//! Self-originated echoes are discarded outright: the sender's own send call
//! already appended the authoritative copy, and one legacy server variant
//! broadcast to both ends.

use std::collections::HashSet;
use std::time::{Duration, Instant};

use uuid::Uuid;

use crate::shared::messaging::ChatMessage;

/// Clear the typing indicator if no repeat signal arrives within this window
pub const TYPING_TIMEOUT: Duration = Duration::from_secs(4);

/// What happened to a pushed message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    /// New message, merged into the view
    Merged,
    /// Already present under the same durable identity
    Duplicate,
    /// Originated from this side; the send result already covered it
    SelfEcho,
    /// Belongs to a different counterpart's conversation
    OtherConversation,
}

/// Client-side view of one direct conversation
#[derive(Debug)]
pub struct ConversationView {
    self_id: Uuid,
    counterpart_id: Uuid,
    /// Display order: oldest first
    messages: Vec<ChatMessage>,
    seen_ids: HashSet<Uuid>,
    needs_refetch: bool,
    typing_since: Option<Instant>,
}

impl ConversationView {
    pub fn new(self_id: Uuid, counterpart_id: Uuid) -> Self {
        Self {
            self_id,
            counterpart_id,
            messages: Vec::new(),
            seen_ids: HashSet::new(),
            needs_refetch: false,
            typing_since: None,
        }
    }

    /// Messages in display order, oldest first
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Merge one REST history page (newest first, as served). Existing
    /// entries win on identity collisions, so a page can be re-fetched
    /// freely.
    pub fn merge_history_page(&mut self, page: Vec<ChatMessage>) {
        // Reverse for display: oldest-within-page first.
        for message in page.into_iter().rev() {
            self.insert(message);
        }
    }

    /// Append the authoritative local echo returned by the send call
    pub fn apply_send_result(&mut self, message: ChatMessage) {
        self.insert(message);
    }

    /// Merge a realtime push by durable identity
    pub fn apply_push(&mut self, message: ChatMessage) -> PushOutcome {
        if message.sender_id == self.self_id {
            return PushOutcome::SelfEcho;
        }
        if message.sender_id != self.counterpart_id {
            return PushOutcome::OtherConversation;
        }
        if self.seen_ids.contains(&message.id) {
            return PushOutcome::Duplicate;
        }

        // A push that lands behind the newest displayed message means the
        // last fetch and this push raced; the next fetch reconciles.
        if let Some(newest) = self.messages.last() {
            if message.created_at < newest.created_at {
                self.needs_refetch = true;
            }
        }

        self.insert(message);
        PushOutcome::Merged
    }

    /// Whether a raced push suggested a re-fetch; reading clears the flag
    pub fn take_refetch_hint(&mut self) -> bool {
        std::mem::take(&mut self.needs_refetch)
    }

    /// Record a typing hint from the counterpart
    pub fn set_counterpart_typing(&mut self, is_typing: bool, now: Instant) {
        self.typing_since = if is_typing { Some(now) } else { None };
    }

    /// Whether the typing indicator should currently be shown
    pub fn counterpart_typing(&self, now: Instant) -> bool {
        self.typing_since
            .map_or(false, |since| now.duration_since(since) < TYPING_TIMEOUT)
    }

    fn insert(&mut self, message: ChatMessage) {
        if !self.seen_ids.insert(message.id) {
            return;
        }
        // Insert keeping ascending created_at; pushes usually land at the end.
        let position = self
            .messages
            .iter()
            .rposition(|m| m.created_at <= message.created_at)
            .map(|i| i + 1)
            .unwrap_or(0);
        self.messages.insert(position, message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration as ChronoDuration, Utc};

    fn message_at(sender: Uuid, content: &str, offset_ms: i64) -> ChatMessage {
        let mut message = ChatMessage::new_text(Uuid::new_v4(), sender, content.to_string());
        message.created_at = Utc::now() + ChronoDuration::milliseconds(offset_ms);
        message
    }

    #[test]
    fn test_history_page_is_reversed_for_display() {
        let (me, them) = (Uuid::new_v4(), Uuid::new_v4());
        let mut view = ConversationView::new(me, them);

        // Server serves newest first.
        let newest = message_at(them, "newest", 2);
        let older = message_at(me, "older", 1);
        view.merge_history_page(vec![newest, older]);

        let contents: Vec<&str> = view.messages().iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["older", "newest"]);
    }

    #[test]
    fn test_push_after_fetch_dedupes_by_id() {
        let (me, them) = (Uuid::new_v4(), Uuid::new_v4());
        let mut view = ConversationView::new(me, them);

        let message = message_at(them, "hi", 0);
        view.merge_history_page(vec![message.clone()]);

        assert_eq!(view.apply_push(message), PushOutcome::Duplicate);
        assert_eq!(view.messages().len(), 1);
    }

    #[test]
    fn test_self_echo_is_discarded() {
        let (me, them) = (Uuid::new_v4(), Uuid::new_v4());
        let mut view = ConversationView::new(me, them);

        let sent = message_at(me, "mine", 0);
        view.apply_send_result(sent.clone());

        // Legacy dual-broadcast variant: the same message comes back as a push.
        assert_eq!(view.apply_push(sent), PushOutcome::SelfEcho);
        assert_eq!(view.messages().len(), 1);
    }

    #[test]
    fn test_raced_push_sets_refetch_hint() {
        let (me, them) = (Uuid::new_v4(), Uuid::new_v4());
        let mut view = ConversationView::new(me, them);

        view.merge_history_page(vec![message_at(them, "later", 10)]);
        assert_eq!(view.apply_push(message_at(them, "earlier", 0)), PushOutcome::Merged);

        assert!(view.take_refetch_hint());
        // Reading the hint clears it.
        assert!(!view.take_refetch_hint());

        let contents: Vec<&str> = view.messages().iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["earlier", "later"]);
    }

    #[test]
    fn test_foreign_push_is_ignored() {
        let (me, them) = (Uuid::new_v4(), Uuid::new_v4());
        let mut view = ConversationView::new(me, them);

        let outcome = view.apply_push(message_at(Uuid::new_v4(), "who?", 0));
        assert_eq!(outcome, PushOutcome::OtherConversation);
        assert!(view.messages().is_empty());
    }

    #[test]
    fn test_typing_indicator_expires() {
        let (me, them) = (Uuid::new_v4(), Uuid::new_v4());
        let mut view = ConversationView::new(me, them);
        let start = Instant::now();

        view.set_counterpart_typing(true, start);
        assert!(view.counterpart_typing(start + Duration::from_secs(1)));
        assert!(!view.counterpart_typing(start + TYPING_TIMEOUT));

        // A repeat signal extends the window; an explicit stop clears it.
        view.set_counterpart_typing(true, start + Duration::from_secs(3));
        assert!(view.counterpart_typing(start + Duration::from_secs(6)));
        view.set_counterpart_typing(false, start + Duration::from_secs(6));
        assert!(!view.counterpart_typing(start + Duration::from_secs(6)));
    }
}
