use log::*;

use crate::{
    db_types::{NewUser, User},
    helpers::{hash_password, verify_password},
    traits::{AccountApiError, UserManagement},
};

/// User registration, credential checks and account lookups.
pub struct AccountsApi<B> {
    db: B,
}

impl<B> AccountsApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

impl<B> AccountsApi<B>
where B: UserManagement
{
    /// Register a new account. The password is salted and hashed before it goes anywhere near storage.
    pub async fn register(&self, name: String, email: String, password: &str) -> Result<User, AccountApiError> {
        let user = NewUser::new(name, email, hash_password(password));
        let user = self.db.insert_user(user).await?;
        info!("👤️ New user registered: {} ({})", user.id, user.email);
        Ok(user)
    }

    /// Check an email/password pair. Both an unknown email and a wrong password map to the same
    /// `InvalidCredentials` error so the response does not leak which accounts exist.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<User, AccountApiError> {
        let user = self.db.fetch_user_by_email(email).await?.ok_or(AccountApiError::InvalidCredentials)?;
        if verify_password(password, &user.password_hash) {
            debug!("👤️ User {} authenticated", user.id);
            Ok(user)
        } else {
            debug!("👤️ Failed login attempt for {email}");
            Err(AccountApiError::InvalidCredentials)
        }
    }

    pub async fn fetch_user(&self, id: &str) -> Result<Option<User>, AccountApiError> {
        self.db.fetch_user_by_id(id).await
    }

    pub async fn fetch_user_by_email(&self, email: &str) -> Result<Option<User>, AccountApiError> {
        self.db.fetch_user_by_email(email).await
    }
}
