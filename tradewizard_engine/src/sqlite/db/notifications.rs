use sqlx::SqliteConnection;

use crate::{
    db_types::{new_record_id, NewNotification, Notification},
    traits::MessagingApiError,
};

pub async fn insert_notification(
    notification: NewNotification,
    conn: &mut SqliteConnection,
) -> Result<Notification, MessagingApiError> {
    let notification: Notification = sqlx::query_as(
        r#"
            INSERT INTO notifications (id, user_id, message, kind, related_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *;
        "#,
    )
    .bind(new_record_id())
    .bind(&notification.user_id)
    .bind(&notification.message)
    .bind(&notification.kind)
    .bind(&notification.related_id)
    .fetch_one(conn)
    .await?;
    Ok(notification)
}

pub async fn notifications_for_user(
    user_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Vec<Notification>, MessagingApiError> {
    let notifications = sqlx::query_as("SELECT * FROM notifications WHERE user_id = $1 ORDER BY created_at DESC")
        .bind(user_id)
        .fetch_all(conn)
        .await?;
    Ok(notifications)
}

pub async fn mark_notification_read(
    id: &str,
    user_id: &str,
    conn: &mut SqliteConnection,
) -> Result<bool, MessagingApiError> {
    let result = sqlx::query("UPDATE notifications SET is_read = 1 WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .execute(conn)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn mark_all_notifications_read(
    user_id: &str,
    conn: &mut SqliteConnection,
) -> Result<u64, MessagingApiError> {
    let result = sqlx::query("UPDATE notifications SET is_read = 1 WHERE user_id = $1 AND is_read = 0")
        .bind(user_id)
        .execute(conn)
        .await?;
    Ok(result.rows_affected())
}
