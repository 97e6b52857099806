use thiserror::Error;

use crate::db_types::{NewUser, User};

/// Storage contract for user accounts.
#[allow(async_fn_in_trait)]
pub trait UserManagement {
    /// Insert a new user. Fails with [`AccountApiError::EmailAlreadyRegistered`] if the email is taken.
    async fn insert_user(&self, user: NewUser) -> Result<User, AccountApiError>;

    async fn fetch_user_by_id(&self, id: &str) -> Result<Option<User>, AccountApiError>;

    async fn fetch_user_by_email(&self, email: &str) -> Result<Option<User>, AccountApiError>;
}

#[derive(Debug, Clone, Error)]
pub enum AccountApiError {
    #[error("Internal database error: {0}")]
    DatabaseError(String),
    #[error("Email {0} is already registered")]
    EmailAlreadyRegistered(String),
    #[error("User account not found")]
    UserNotFound,
    #[error("Incorrect email or password")]
    InvalidCredentials,
}

impl From<sqlx::Error> for AccountApiError {
    fn from(e: sqlx::Error) -> Self {
        AccountApiError::DatabaseError(e.to_string())
    }
}
