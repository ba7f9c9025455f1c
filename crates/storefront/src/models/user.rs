//! User records.

use chrono::{DateTime, Utc};

use nevyra_core::api::UserProfile;
use nevyra_core::{Email, UserId};

/// A registered shopper.
#[derive(Debug, Clone)]
pub struct User {
    pub id: UserId,
    pub email: Email,
    /// Argon2id PHC string.
    pub password_hash: String,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// The account as the API shows it.
    #[must_use]
    pub fn profile(&self, is_admin: bool) -> UserProfile {
        UserProfile {
            id: self.id,
            email: self.email.as_str().to_string(),
            name: self.name.clone(),
            phone: self.phone.clone(),
            is_admin,
        }
    }
}
