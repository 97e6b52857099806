use log::*;

use crate::{
    db_types::{ChatMessage, Conversation, NewNotification, Notification},
    traits::{MessagingApiError, MessagingManagement},
};

/// Support chat and user notifications.
pub struct MessagingApi<B> {
    db: B,
}

impl<B> MessagingApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

impl<B> MessagingApi<B>
where B: MessagingManagement
{
    pub async fn create_conversation(
        &self,
        user_id: &str,
        title: Option<String>,
    ) -> Result<Conversation, MessagingApiError> {
        let conversation = self.db.insert_conversation(user_id, title).await?;
        debug!("💬️ Conversation [{}] opened for user {user_id}", conversation.id);
        Ok(conversation)
    }

    pub async fn conversation(&self, id: &str) -> Result<Option<Conversation>, MessagingApiError> {
        self.db.fetch_conversation(id).await
    }

    pub async fn conversations_for_user(&self, user_id: &str) -> Result<Vec<Conversation>, MessagingApiError> {
        self.db.conversations_for_user(user_id).await
    }

    /// Post a message into an existing conversation. The caller is responsible for the access check; this method
    /// only verifies that the conversation exists.
    pub async fn post_message(
        &self,
        conversation_id: &str,
        sender_id: &str,
        content: &str,
    ) -> Result<ChatMessage, MessagingApiError> {
        if self.db.fetch_conversation(conversation_id).await?.is_none() {
            return Err(MessagingApiError::ConversationNotFound(conversation_id.to_string()));
        }
        let message = self.db.insert_message(conversation_id, sender_id, content).await?;
        debug!("💬️ Message [{}] posted to conversation {conversation_id}", message.id);
        Ok(message)
    }

    pub async fn messages(&self, conversation_id: &str) -> Result<Vec<ChatMessage>, MessagingApiError> {
        self.db.messages_for_conversation(conversation_id).await
    }

    pub async fn message(&self, message_id: &str) -> Result<Option<ChatMessage>, MessagingApiError> {
        self.db.fetch_message(message_id).await
    }

    pub async fn mark_message_read(&self, message_id: &str) -> Result<(), MessagingApiError> {
        self.db.mark_message_read(message_id).await
    }

    pub async fn unread_message_count(&self, user_id: &str) -> Result<i64, MessagingApiError> {
        self.db.unread_message_count(user_id).await
    }

    /// Record a notification for a user. Fire-and-forget from the caller's perspective: failures are logged and
    /// surfaced to the immediate caller only, never to the flow that triggered the notification.
    pub async fn notify(&self, notification: NewNotification) -> Result<Notification, MessagingApiError> {
        let notification = self.db.insert_notification(notification).await?;
        debug!("💬️ Notification [{}] stored for user {}", notification.id, notification.user_id);
        Ok(notification)
    }

    pub async fn notifications_for_user(&self, user_id: &str) -> Result<Vec<Notification>, MessagingApiError> {
        self.db.notifications_for_user(user_id).await
    }

    pub async fn mark_notification_read(&self, id: &str, user_id: &str) -> Result<(), MessagingApiError> {
        self.db.mark_notification_read(id, user_id).await
    }

    pub async fn mark_all_notifications_read(&self, user_id: &str) -> Result<u64, MessagingApiError> {
        self.db.mark_all_notifications_read(user_id).await
    }
}
