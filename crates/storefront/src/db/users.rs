//! User and session repository.

use chrono::Utc;

use nevyra_core::api::ProfileUpdate;
use nevyra_core::{Email, UserId};

use super::{Database, RepositoryError};
use crate::models::User;

/// Repository for accounts and their bearer sessions.
pub struct UserRepository<'a> {
    db: &'a Database,
}

impl<'a> UserRepository<'a> {
    #[must_use]
    pub const fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Get a user by their email address.
    pub async fn get_by_email(&self, email: &Email) -> Option<User> {
        self.db
            .read()
            .await
            .users
            .values()
            .find(|u| &u.email == email)
            .cloned()
    }

    /// Get a user by their ID.
    pub async fn get_by_id(&self, id: UserId) -> Option<User> {
        self.db.read().await.users.get(&id).cloned()
    }

    /// Every user, oldest account first.
    pub async fn list(&self) -> Vec<User> {
        let mut users: Vec<User> = self.db.read().await.users.values().cloned().collect();
        users.sort_by_key(|u| u.created_at);
        users
    }

    /// Create a new user with a password hash.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email already exists.
    pub async fn create_with_password(
        &self,
        email: &Email,
        password_hash: String,
        name: Option<String>,
    ) -> Result<User, RepositoryError> {
        let mut collections = self.db.write().await;
        if collections.users.values().any(|u| &u.email == email) {
            return Err(RepositoryError::Conflict(format!(
                "An account with {email} already exists"
            )));
        }

        let user = User {
            id: UserId::generate(),
            email: email.clone(),
            password_hash,
            name,
            phone: None,
            created_at: Utc::now(),
        };
        collections.users.insert(user.id, user.clone());
        Ok(user)
    }

    /// Replace the name and phone. Blank values clear the field.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user does not exist.
    pub async fn update_profile(
        &self,
        id: UserId,
        update: &ProfileUpdate,
    ) -> Result<User, RepositoryError> {
        let mut collections = self.db.write().await;
        let user = collections
            .users
            .get_mut(&id)
            .ok_or(RepositoryError::NotFound("User"))?;

        if let Some(name) = &update.name {
            user.name = non_blank(name);
        }
        if let Some(phone) = &update.phone {
            user.phone = non_blank(phone);
        }
        Ok(user.clone())
    }

    /// Record a session under the hash of its token.
    pub async fn create_session(&self, token_hash: String, user_id: UserId) {
        self.db.write().await.sessions.insert(token_hash, user_id);
    }

    /// The user a session belongs to.
    pub async fn get_by_session(&self, token_hash: &str) -> Option<User> {
        let collections = self.db.read().await;
        collections
            .sessions
            .get(token_hash)
            .and_then(|id| collections.users.get(id))
            .cloned()
    }
}

fn non_blank(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}
