use thiserror::Error;

use crate::db_types::{ChatMessage, Conversation, NewNotification, Notification};

/// Storage contract for support chat and user notifications.
#[allow(async_fn_in_trait)]
pub trait MessagingManagement {
    async fn insert_conversation(&self, user_id: &str, title: Option<String>)
        -> Result<Conversation, MessagingApiError>;

    async fn fetch_conversation(&self, id: &str) -> Result<Option<Conversation>, MessagingApiError>;

    async fn conversations_for_user(&self, user_id: &str) -> Result<Vec<Conversation>, MessagingApiError>;

    async fn insert_message(
        &self,
        conversation_id: &str,
        sender_id: &str,
        content: &str,
    ) -> Result<ChatMessage, MessagingApiError>;

    /// Messages for a conversation, oldest first.
    async fn messages_for_conversation(&self, conversation_id: &str) -> Result<Vec<ChatMessage>, MessagingApiError>;

    async fn fetch_message(&self, message_id: &str) -> Result<Option<ChatMessage>, MessagingApiError>;

    async fn mark_message_read(&self, message_id: &str) -> Result<(), MessagingApiError>;

    /// Unread messages addressed to the user, i.e. in their conversations but sent by someone else.
    async fn unread_message_count(&self, user_id: &str) -> Result<i64, MessagingApiError>;

    async fn insert_notification(&self, notification: NewNotification) -> Result<Notification, MessagingApiError>;

    /// Notifications for the user, newest first.
    async fn notifications_for_user(&self, user_id: &str) -> Result<Vec<Notification>, MessagingApiError>;

    async fn mark_notification_read(&self, id: &str, user_id: &str) -> Result<(), MessagingApiError>;

    async fn mark_all_notifications_read(&self, user_id: &str) -> Result<u64, MessagingApiError>;
}

#[derive(Debug, Clone, Error)]
pub enum MessagingApiError {
    #[error("Internal database error: {0}")]
    DatabaseError(String),
    #[error("Conversation {0} not found")]
    ConversationNotFound(String),
    #[error("Message {0} not found")]
    MessageNotFound(String),
    #[error("Notification {0} not found")]
    NotificationNotFound(String),
}

impl From<sqlx::Error> for MessagingApiError {
    fn from(e: sqlx::Error) -> Self {
        MessagingApiError::DatabaseError(e.to_string())
    }
}
