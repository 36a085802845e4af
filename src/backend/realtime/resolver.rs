//! Conversation Resolver
//!
//! Finds or lazily creates the direct conversation shared by a pair of
//! participants. Symmetric in its arguments: `(a, b)` and `(b, a)` resolve to
//! the same record.
//!
//! Two near-simultaneous first messages between the same pair can both miss
//! the lookup and insert; there is no cross-process lock. `find_direct`
//! orders by creation time, so every later lookup settles on one record and
//! the loser is wasted, not wrong, data.

use std::sync::Arc;

use uuid::Uuid;

use crate::backend::error::RealtimeError;
use crate::backend::store::ConversationStore;
use crate::shared::messaging::Conversation;

/// Resolves participant pairs to durable conversations
pub struct ConversationResolver {
    store: Arc<dyn ConversationStore>,
}

impl ConversationResolver {
    pub fn new(store: Arc<dyn ConversationStore>) -> Self {
        Self { store }
    }

    /// The direct conversation between `user_a` and `user_b`, created on
    /// first contact with both participants as members.
    pub async fn find_or_create_direct(
        &self,
        user_a: Uuid,
        user_b: Uuid,
    ) -> Result<Conversation, RealtimeError> {
        if user_a.is_nil() || user_b.is_nil() {
            return Err(RealtimeError::invalid_argument("participant identity missing"));
        }
        if user_a == user_b {
            return Err(RealtimeError::invalid_argument(
                "a direct conversation needs two distinct participants",
            ));
        }

        if let Some(existing) = self.store.find_direct(user_a, user_b).await? {
            return Ok(existing);
        }

        let conversation = Conversation::new_direct(user_a, user_b);
        self.store.insert_conversation(&conversation).await?;
        tracing::info!(
            "created direct conversation {} for {} and {}",
            conversation.id,
            user_a,
            user_b
        );
        Ok(conversation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::store::MemoryStore;
    use assert_matches::assert_matches;

    #[tokio::test]
    async fn test_find_or_create_is_stable() {
        let store = Arc::new(MemoryStore::new());
        let resolver = ConversationResolver::new(store);
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());

        let first = resolver.find_or_create_direct(a, b).await.unwrap();
        let second = resolver.find_or_create_direct(a, b).await.unwrap();
        assert_eq!(first.id, second.id);
    }

    #[tokio::test]
    async fn test_pair_is_symmetric() {
        let store = Arc::new(MemoryStore::new());
        let resolver = ConversationResolver::new(store);
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());

        let forward = resolver.find_or_create_direct(a, b).await.unwrap();
        let backward = resolver.find_or_create_direct(b, a).await.unwrap();
        assert_eq!(forward.id, backward.id);
    }

    #[tokio::test]
    async fn test_self_pair_is_rejected() {
        let store = Arc::new(MemoryStore::new());
        let resolver = ConversationResolver::new(store);
        let a = Uuid::new_v4();

        let result = resolver.find_or_create_direct(a, a).await;
        assert_matches!(result, Err(RealtimeError::InvalidArgument { .. }));
    }

    #[tokio::test]
    async fn test_nil_identity_is_rejected() {
        let store = Arc::new(MemoryStore::new());
        let resolver = ConversationResolver::new(store);

        let result = resolver.find_or_create_direct(Uuid::nil(), Uuid::new_v4()).await;
        assert_matches!(result, Err(RealtimeError::InvalidArgument { .. }));
    }
}
