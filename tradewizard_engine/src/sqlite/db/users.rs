use log::debug;
use sqlx::SqliteConnection;

use crate::{
    db_types::{NewUser, User},
    traits::AccountApiError,
};

pub async fn insert_user(user: NewUser, conn: &mut SqliteConnection) -> Result<User, AccountApiError> {
    if fetch_user_by_email(&user.email, &mut *conn).await?.is_some() {
        return Err(AccountApiError::EmailAlreadyRegistered(user.email));
    }
    let user: User = sqlx::query_as(
        r#"
            INSERT INTO users (id, name, email, password_hash, is_admin)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *;
        "#,
    )
    .bind(&user.id)
    .bind(&user.name)
    .bind(&user.email)
    .bind(&user.password_hash)
    .bind(user.is_admin)
    .fetch_one(&mut *conn)
    .await?;
    debug!("📝️ User [{}] inserted", user.id);
    Ok(user)
}

pub async fn fetch_user_by_id(id: &str, conn: &mut SqliteConnection) -> Result<Option<User>, AccountApiError> {
    let user = sqlx::query_as("SELECT * FROM users WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(user)
}

pub async fn fetch_user_by_email(email: &str, conn: &mut SqliteConnection) -> Result<Option<User>, AccountApiError> {
    let user = sqlx::query_as("SELECT * FROM users WHERE email = $1").bind(email).fetch_optional(conn).await?;
    Ok(user)
}
