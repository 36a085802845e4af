//! Social Event Router
//!
//! Friend-request traffic and generic notifications: validated, persisted,
//! then pushed to the target's live sessions. Persistence always happens
//! regardless of delivery success; the stored record is what a client
//! reconciles against on its next fetch.

use std::sync::Arc;

use uuid::Uuid;

use crate::backend::error::RealtimeError;
use crate::backend::presence::PresenceRegistry;
use crate::backend::store::FriendStore;
use crate::shared::messaging::{FriendRequest, Notification, NotificationKind};
use crate::shared::ServerEvent;

use super::push_to_user;

/// Router behavior toggles
#[derive(Debug, Clone, Copy)]
pub struct RouterConfig {
    /// Whether declining a friend request notifies the original sender.
    /// Privacy-sensitive; off by default.
    pub notify_on_decline: bool,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            notify_on_decline: false,
        }
    }
}

/// Routes friend-request and notification events
pub struct SocialEventRouter {
    store: Arc<dyn FriendStore>,
    presence: Arc<PresenceRegistry>,
    config: RouterConfig,
}

impl SocialEventRouter {
    pub fn new(
        store: Arc<dyn FriendStore>,
        presence: Arc<PresenceRegistry>,
        config: RouterConfig,
    ) -> Self {
        Self {
            store,
            presence,
            config,
        }
    }

    /// Create a pending friend request from `sender` to `receiver`, persist
    /// a notification for the receiver and push `new_friend_request` to
    /// their sessions.
    pub async fn send_friend_request(
        &self,
        sender: Uuid,
        receiver: Uuid,
    ) -> Result<FriendRequest, RealtimeError> {
        if sender.is_nil() || receiver.is_nil() {
            return Err(RealtimeError::invalid_argument("sender or receiver identity missing"));
        }
        if sender == receiver {
            return Err(RealtimeError::invalid_argument(
                "cannot send a friend request to yourself",
            ));
        }
        if self.store.are_friends(sender, receiver).await? {
            return Err(RealtimeError::conflict("already friends"));
        }
        if self
            .store
            .pending_request_between(sender, receiver)
            .await?
            .is_some()
        {
            return Err(RealtimeError::conflict("friend request already pending"));
        }
        if self
            .store
            .pending_request_between(receiver, sender)
            .await?
            .is_some()
        {
            return Err(RealtimeError::conflict(
                "this user already sent you a friend request",
            ));
        }

        let request = FriendRequest::new(sender, receiver);
        self.store.insert_request(&request).await?;

        let notification = Notification::new(
            receiver,
            sender,
            NotificationKind::FriendRequest,
            "You have a new friend request",
        );
        self.store.insert_notification(&notification).await?;

        push_to_user(
            &self.presence,
            receiver,
            &ServerEvent::NewFriendRequest {
                request: request.clone(),
                notification,
            },
        );

        Ok(request)
    }

    /// Accept a pending request: both users gain each other as friends, the
    /// request record is deleted, and the original sender gets a
    /// `friend_request_status` push plus a durable acceptance notification.
    pub async fn accept_friend_request(
        &self,
        request_id: Uuid,
        by: Uuid,
    ) -> Result<(), RealtimeError> {
        let request = self
            .store
            .request_by_id(request_id)
            .await?
            .ok_or_else(|| RealtimeError::not_found("friend request not found"))?;

        if request.receiver_id != by {
            return Err(RealtimeError::invalid_argument(
                "only the receiver can accept a friend request",
            ));
        }

        self.store.add_friend(request.sender_id, request.receiver_id).await?;
        self.store.add_friend(request.receiver_id, request.sender_id).await?;
        self.store.delete_request(request.id).await?;

        let notification = Notification::new(
            request.sender_id,
            request.receiver_id,
            NotificationKind::FriendAccept,
            "Your friend request was accepted",
        );
        self.store.insert_notification(&notification).await?;

        push_to_user(
            &self.presence,
            request.sender_id,
            &ServerEvent::FriendRequestStatus { notification },
        );

        Ok(())
    }

    /// Decline a pending request. The record is deleted either way; whether
    /// the original sender is told depends on `notify_on_decline`.
    pub async fn decline_friend_request(
        &self,
        request_id: Uuid,
        by: Uuid,
    ) -> Result<(), RealtimeError> {
        let request = self
            .store
            .request_by_id(request_id)
            .await?
            .ok_or_else(|| RealtimeError::not_found("friend request not found"))?;

        if request.receiver_id != by {
            return Err(RealtimeError::invalid_argument(
                "only the receiver can decline a friend request",
            ));
        }

        self.store.delete_request(request.id).await?;

        if self.config.notify_on_decline {
            let notification = Notification::new(
                request.sender_id,
                request.receiver_id,
                NotificationKind::FriendDecline,
                "Your friend request was declined",
            );
            self.store.insert_notification(&notification).await?;
            push_to_user(
                &self.presence,
                request.sender_id,
                &ServerEvent::FriendRequestStatus { notification },
            );
        }

        Ok(())
    }

    /// Sender-initiated withdrawal of a pending request. No push.
    pub async fn cancel_friend_request(
        &self,
        sender: Uuid,
        receiver: Uuid,
    ) -> Result<(), RealtimeError> {
        let request = self
            .store
            .pending_request_between(sender, receiver)
            .await?
            .ok_or_else(|| RealtimeError::not_found("friend request not found"))?;

        self.store.delete_request(request.id).await?;
        Ok(())
    }

    /// Symmetric removal from both friend lists. No push.
    pub async fn remove_friend(&self, user_id: Uuid, friend_id: Uuid) -> Result<(), RealtimeError> {
        if user_id.is_nil() || friend_id.is_nil() {
            return Err(RealtimeError::invalid_argument("user or friend identity missing"));
        }
        self.store.remove_friend(user_id, friend_id).await?;
        self.store.remove_friend(friend_id, user_id).await?;
        Ok(())
    }

    /// Persist a generic notification and push it if the target is online
    pub async fn send_notification(
        &self,
        sender: Uuid,
        receiver: Uuid,
        kind: NotificationKind,
        message: &str,
    ) -> Result<Notification, RealtimeError> {
        if sender.is_nil() || receiver.is_nil() {
            return Err(RealtimeError::invalid_argument("sender or receiver identity missing"));
        }
        if message.trim().is_empty() {
            return Err(RealtimeError::invalid_argument("notification message is empty"));
        }

        let notification = Notification::new(receiver, sender, kind, message);
        self.store.insert_notification(&notification).await?;

        push_to_user(
            &self.presence,
            receiver,
            &ServerEvent::NewNotification {
                notification: notification.clone(),
            },
        );

        Ok(notification)
    }

    /// Mark a stored notification read and tell the user's *other* sessions,
    /// so a badge cleared on one device clears everywhere.
    pub async fn mark_notification_read(
        &self,
        notification_id: Uuid,
        user_id: Uuid,
        origin_session: Option<Uuid>,
    ) -> Result<(), RealtimeError> {
        let existed = self.store.mark_notification_read(notification_id).await?;
        if !existed {
            return Err(RealtimeError::not_found("notification not found"));
        }

        let event = ServerEvent::NotificationRead { notification_id };
        for session in self.presence.sessions_for(user_id) {
            if Some(session.id()) == origin_session {
                continue;
            }
            session.push(event.clone());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::presence::SessionHandle;
    use crate::backend::store::MemoryStore;
    use assert_matches::assert_matches;
    use tokio::sync::mpsc;

    struct Fixture {
        store: Arc<MemoryStore>,
        presence: Arc<PresenceRegistry>,
        router: SocialEventRouter,
    }

    fn fixture() -> Fixture {
        fixture_with(RouterConfig::default())
    }

    fn fixture_with(config: RouterConfig) -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let presence = Arc::new(PresenceRegistry::new());
        let router = SocialEventRouter::new(store.clone(), presence.clone(), config);
        Fixture {
            store,
            presence,
            router,
        }
    }

    fn connect(presence: &PresenceRegistry, user: Uuid) -> mpsc::UnboundedReceiver<ServerEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        presence.register(user, SessionHandle::new(Uuid::new_v4(), tx));
        rx
    }

    #[tokio::test]
    async fn test_friend_request_persists_and_pushes() {
        let f = fixture();
        let (alice, bob) = (Uuid::new_v4(), Uuid::new_v4());
        let mut bob_rx = connect(&f.presence, bob);

        let request = f.router.send_friend_request(alice, bob).await.unwrap();

        match bob_rx.try_recv().unwrap() {
            ServerEvent::NewFriendRequest { request: got, notification } => {
                assert_eq!(got.id, request.id);
                assert_eq!(notification.kind, NotificationKind::FriendRequest);
                assert_eq!(notification.actor_id, alice);
            }
            other => panic!("unexpected event: {:?}", other),
        }
        assert_eq!(f.store.pending_request_count(), 1);
        assert_eq!(f.store.notifications_for(bob).len(), 1);
    }

    #[tokio::test]
    async fn test_self_request_is_rejected_without_side_effects() {
        let f = fixture();
        let alice = Uuid::new_v4();

        let result = f.router.send_friend_request(alice, alice).await;

        assert_matches!(result, Err(RealtimeError::InvalidArgument { .. }));
        assert_eq!(f.store.pending_request_count(), 0);
        assert!(f.store.notifications_for(alice).is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_and_reverse_requests_conflict() {
        let f = fixture();
        let (alice, bob) = (Uuid::new_v4(), Uuid::new_v4());

        f.router.send_friend_request(alice, bob).await.unwrap();

        assert_matches!(
            f.router.send_friend_request(alice, bob).await,
            Err(RealtimeError::Conflict { .. })
        );
        // Bob already has a pending request from Alice, so his own request
        // back is a reverse-pending conflict, not a new record.
        assert_matches!(
            f.router.send_friend_request(bob, alice).await,
            Err(RealtimeError::Conflict { .. })
        );
        assert_eq!(f.store.pending_request_count(), 1);
    }

    #[tokio::test]
    async fn test_already_friends_conflict() {
        let f = fixture();
        let (alice, bob) = (Uuid::new_v4(), Uuid::new_v4());
        f.store.add_friend(alice, bob).await.unwrap();

        assert_matches!(
            f.router.send_friend_request(alice, bob).await,
            Err(RealtimeError::Conflict { .. })
        );
    }

    #[tokio::test]
    async fn test_accept_adds_both_and_notifies_sender() {
        let f = fixture();
        let (alice, bob) = (Uuid::new_v4(), Uuid::new_v4());
        let mut alice_rx = connect(&f.presence, alice);

        let request = f.router.send_friend_request(alice, bob).await.unwrap();
        f.router.accept_friend_request(request.id, bob).await.unwrap();

        assert!(f.store.are_friends(alice, bob).await.unwrap());
        assert!(f.store.are_friends(bob, alice).await.unwrap());
        assert_eq!(f.store.pending_request_count(), 0);

        match alice_rx.try_recv().unwrap() {
            ServerEvent::FriendRequestStatus { notification } => {
                assert_eq!(notification.kind, NotificationKind::FriendAccept);
                assert_eq!(notification.user_id, alice);
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_accept_unknown_request_is_not_found() {
        let f = fixture();
        assert_matches!(
            f.router.accept_friend_request(Uuid::new_v4(), Uuid::new_v4()).await,
            Err(RealtimeError::NotFound { .. })
        );
    }

    #[tokio::test]
    async fn test_decline_is_silent_by_default() {
        let f = fixture();
        let (alice, bob) = (Uuid::new_v4(), Uuid::new_v4());
        let mut alice_rx = connect(&f.presence, alice);

        let request = f.router.send_friend_request(alice, bob).await.unwrap();
        f.router.decline_friend_request(request.id, bob).await.unwrap();

        assert_eq!(f.store.pending_request_count(), 0);
        assert!(alice_rx.try_recv().is_err());
        // The receiver's friend_request notification survives the deletion.
        assert_eq!(f.store.notifications_for(bob).len(), 1);
        assert!(f.store.notifications_for(alice).is_empty());
    }

    #[tokio::test]
    async fn test_decline_notifies_when_configured() {
        let f = fixture_with(RouterConfig {
            notify_on_decline: true,
        });
        let (alice, bob) = (Uuid::new_v4(), Uuid::new_v4());
        let mut alice_rx = connect(&f.presence, alice);

        let request = f.router.send_friend_request(alice, bob).await.unwrap();
        f.router.decline_friend_request(request.id, bob).await.unwrap();

        match alice_rx.try_recv().unwrap() {
            ServerEvent::FriendRequestStatus { notification } => {
                assert_eq!(notification.kind, NotificationKind::FriendDecline);
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_cancel_deletes_without_push() {
        let f = fixture();
        let (alice, bob) = (Uuid::new_v4(), Uuid::new_v4());
        let mut bob_rx = connect(&f.presence, bob);

        f.router.send_friend_request(alice, bob).await.unwrap();
        let _ = bob_rx.try_recv(); // consume the new_friend_request push

        f.router.cancel_friend_request(alice, bob).await.unwrap();
        assert_eq!(f.store.pending_request_count(), 0);
        assert!(bob_rx.try_recv().is_err());

        assert_matches!(
            f.router.cancel_friend_request(alice, bob).await,
            Err(RealtimeError::NotFound { .. })
        );
    }

    #[tokio::test]
    async fn test_remove_friend_is_symmetric() {
        let f = fixture();
        let (alice, bob) = (Uuid::new_v4(), Uuid::new_v4());
        f.store.add_friend(alice, bob).await.unwrap();
        f.store.add_friend(bob, alice).await.unwrap();

        f.router.remove_friend(alice, bob).await.unwrap();

        assert!(!f.store.are_friends(alice, bob).await.unwrap());
        assert!(!f.store.are_friends(bob, alice).await.unwrap());
    }

    #[tokio::test]
    async fn test_generic_notification_offline_target_still_persists() {
        let f = fixture();
        let (alice, bob) = (Uuid::new_v4(), Uuid::new_v4());

        let notification = f
            .router
            .send_notification(alice, bob, NotificationKind::PostLike, "Alice liked your post")
            .await
            .unwrap();

        let stored = f.store.notifications_for(bob);
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].id, notification.id);
    }

    #[tokio::test]
    async fn test_mark_notification_read_skips_origin_session() {
        let f = fixture();
        let (alice, bob) = (Uuid::new_v4(), Uuid::new_v4());

        let notification = f
            .router
            .send_notification(alice, bob, NotificationKind::PostComment, "New comment")
            .await
            .unwrap();

        // Two devices: the phone marks it read, only the laptop hears.
        let (phone_tx, mut phone_rx) = mpsc::unbounded_channel();
        let phone_session = Uuid::new_v4();
        f.presence.register(bob, SessionHandle::new(phone_session, phone_tx));
        let mut laptop_rx = connect(&f.presence, bob);

        f.router
            .mark_notification_read(notification.id, bob, Some(phone_session))
            .await
            .unwrap();

        assert!(phone_rx.try_recv().is_err());
        assert_matches!(
            laptop_rx.try_recv().unwrap(),
            ServerEvent::NotificationRead { notification_id } if notification_id == notification.id
        );
        assert!(f.store.notifications_for(bob)[0].is_read);
    }
}
