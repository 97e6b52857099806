use log::debug;
use sqlx::SqliteConnection;

use crate::{
    db_types::{new_record_id, ChatMessage, Conversation},
    traits::MessagingApiError,
};

pub async fn insert_conversation(
    user_id: &str,
    title: Option<String>,
    conn: &mut SqliteConnection,
) -> Result<Conversation, MessagingApiError> {
    let conversation: Conversation = sqlx::query_as(
        r#"
            INSERT INTO conversations (id, user_id, title)
            VALUES ($1, $2, $3)
            RETURNING *;
        "#,
    )
    .bind(new_record_id())
    .bind(user_id)
    .bind(&title)
    .fetch_one(conn)
    .await?;
    debug!("📝️ Conversation [{}] inserted", conversation.id);
    Ok(conversation)
}

pub async fn fetch_conversation(
    id: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Conversation>, MessagingApiError> {
    let conversation =
        sqlx::query_as("SELECT * FROM conversations WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(conversation)
}

pub async fn conversations_for_user(
    user_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Vec<Conversation>, MessagingApiError> {
    let conversations = sqlx::query_as("SELECT * FROM conversations WHERE user_id = $1 ORDER BY created_at DESC")
        .bind(user_id)
        .fetch_all(conn)
        .await?;
    Ok(conversations)
}

pub async fn insert_message(
    conversation_id: &str,
    sender_id: &str,
    content: &str,
    conn: &mut SqliteConnection,
) -> Result<ChatMessage, MessagingApiError> {
    let message: ChatMessage = sqlx::query_as(
        r#"
            INSERT INTO messages (id, conversation_id, sender_id, content)
            VALUES ($1, $2, $3, $4)
            RETURNING *;
        "#,
    )
    .bind(new_record_id())
    .bind(conversation_id)
    .bind(sender_id)
    .bind(content)
    .fetch_one(conn)
    .await?;
    Ok(message)
}

pub async fn fetch_message(
    message_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<ChatMessage>, MessagingApiError> {
    let message = sqlx::query_as("SELECT * FROM messages WHERE id = $1").bind(message_id).fetch_optional(conn).await?;
    Ok(message)
}

pub async fn messages_for_conversation(
    conversation_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Vec<ChatMessage>, MessagingApiError> {
    let messages = sqlx::query_as("SELECT * FROM messages WHERE conversation_id = $1 ORDER BY created_at ASC")
        .bind(conversation_id)
        .fetch_all(conn)
        .await?;
    Ok(messages)
}

pub async fn mark_message_read(message_id: &str, conn: &mut SqliteConnection) -> Result<bool, MessagingApiError> {
    let result = sqlx::query("UPDATE messages SET is_read = 1 WHERE id = $1").bind(message_id).execute(conn).await?;
    Ok(result.rows_affected() > 0)
}

/// Unread messages in the user's conversations that were sent by somebody else.
pub async fn unread_message_count(user_id: &str, conn: &mut SqliteConnection) -> Result<i64, MessagingApiError> {
    let count: i64 = sqlx::query_scalar(
        r#"
            SELECT COUNT(*) FROM messages
            JOIN conversations ON messages.conversation_id = conversations.id
            WHERE conversations.user_id = $1 AND messages.is_read = 0 AND messages.sender_id <> $1
        "#,
    )
    .bind(user_id)
    .fetch_one(conn)
    .await?;
    Ok(count)
}
