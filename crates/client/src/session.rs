//! Signed-in state: the bearer token and the user's email.
//!
//! Both are persisted next to the cart (`token`, `userEmail`). Signing in
//! or out publishes [`StoreEvent::AuthChanged`] on the shared bus.

use std::sync::Arc;

use secrecy::SecretString;
use tracing::instrument;

use nevyra_core::api::{LoginRequest, ProfileUpdate, RegisterRequest, UserProfile};
use nevyra_core::{Email, Field, FieldErrors};

use crate::api::{ApiError, CommerceApi};
use crate::error::{ClientError, Result};
use crate::events::{ChangeBus, StoreEvent};
use crate::storage::{KeyValueStore, TOKEN_KEY, USER_EMAIL_KEY};

/// Minimum password length accepted at registration.
pub const MIN_PASSWORD_LENGTH: usize = 8;

#[derive(Clone)]
pub struct AuthSession {
    api: Arc<dyn CommerceApi>,
    storage: Arc<dyn KeyValueStore>,
    bus: ChangeBus,
}

impl AuthSession {
    #[must_use]
    pub fn new(api: Arc<dyn CommerceApi>, storage: Arc<dyn KeyValueStore>, bus: ChangeBus) -> Self {
        Self { api, storage, bus }
    }

    /// Stored bearer token, if any.
    #[must_use]
    pub fn token(&self) -> Option<SecretString> {
        match self.storage.get(TOKEN_KEY) {
            Ok(Some(token)) if !token.trim().is_empty() => {
                Some(SecretString::from(token.trim().to_string()))
            }
            Ok(_) => None,
            Err(e) => {
                tracing::warn!(error = %e, "token storage unreadable");
                None
            }
        }
    }

    /// Stored email of the signed-in user.
    #[must_use]
    pub fn email(&self) -> Option<String> {
        self.storage
            .get(USER_EMAIL_KEY)
            .ok()
            .flatten()
            .filter(|email| !email.is_empty())
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.token().is_some()
    }

    /// The token, or `Unauthenticated` so the caller can redirect to login.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Unauthenticated` when no token is stored.
    pub fn require_token(&self) -> Result<SecretString> {
        self.token().ok_or(ClientError::Unauthenticated)
    }

    /// Create an account and sign in.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for a bad email or short password (nothing is
    /// sent), or the backend's rejection (e.g. email already registered).
    #[instrument(skip(self, password))]
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        name: Option<&str>,
    ) -> Result<UserProfile> {
        let email = validate_credentials(email, password, MIN_PASSWORD_LENGTH)?;
        let request = RegisterRequest {
            email: email.into_inner(),
            password: password.to_string(),
            name: name.map(str::trim).filter(|n| !n.is_empty()).map(str::to_string),
        };

        let payload = self
            .api
            .register(&request)
            .await
            .map_err(|e| credential_error(e, "Registration failed. Please try again."))?;
        self.remember(&payload.token, &payload.user.email)?;
        tracing::info!(user_id = %payload.user.id, "registered");
        Ok(payload.user)
    }

    /// Sign in with email and password.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for missing fields, `Rejected` with the
    /// backend's message for wrong credentials.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<UserProfile> {
        let email = validate_credentials(email, password, 1)?;
        let request = LoginRequest {
            email: email.into_inner(),
            password: password.to_string(),
        };

        let payload = self
            .api
            .login(&request)
            .await
            .map_err(|e| credential_error(e, "Login failed. Please try again."))?;
        self.remember(&payload.token, &payload.user.email)?;
        tracing::info!(user_id = %payload.user.id, "signed in");
        Ok(payload.user)
    }

    /// Forget the stored token and email.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if the keys cannot be removed.
    pub fn logout(&self) -> Result<()> {
        let was_signed_in = self.is_authenticated();
        self.storage.remove(TOKEN_KEY)?;
        self.storage.remove(USER_EMAIL_KEY)?;
        if was_signed_in {
            self.bus.publish(StoreEvent::AuthChanged { signed_in: false });
        }
        Ok(())
    }

    /// Current user's profile. A rejected token is forgotten.
    ///
    /// # Errors
    ///
    /// Returns `Unauthenticated` without a valid token.
    pub async fn profile(&self) -> Result<UserProfile> {
        let token = self.require_token()?;
        let result = self.api.profile(&token).await;
        self.settle(result, "Failed to load profile")
    }

    /// Update name and phone.
    ///
    /// # Errors
    ///
    /// Returns `Unauthenticated` without a valid token, or the backend's
    /// rejection.
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<UserProfile> {
        let token = self.require_token()?;
        let result = self.api.update_profile(&token, update).await;
        self.settle(result, "Failed to update profile")
    }

    fn settle(
        &self,
        result: std::result::Result<UserProfile, ApiError>,
        context: &'static str,
    ) -> Result<UserProfile> {
        result.map_err(|e| {
            let err = ClientError::from_api(e, context);
            if err.requires_login() {
                tracing::info!("stored token rejected, signing out");
                if let Err(e) = self.logout() {
                    tracing::warn!(error = %e, "failed to clear rejected token");
                }
            }
            err
        })
    }

    fn remember(&self, token: &str, email: &str) -> Result<()> {
        self.storage.set(TOKEN_KEY, token)?;
        self.storage.set(USER_EMAIL_KEY, email)?;
        self.bus.publish(StoreEvent::AuthChanged { signed_in: true });
        Ok(())
    }
}

fn validate_credentials(email: &str, password: &str, min_len: usize) -> Result<Email> {
    let mut errors = FieldErrors::new();

    let parsed = if email.trim().is_empty() {
        errors.insert(Field::Email, "Email is required");
        None
    } else {
        match Email::parse(email) {
            Ok(parsed) => Some(parsed),
            Err(_) => {
                errors.insert(Field::Email, "Invalid email address");
                None
            }
        }
    };

    if password.is_empty() {
        errors.insert(Field::Password, "Password is required");
    } else if password.chars().count() < min_len {
        errors.insert(
            Field::Password,
            format!("Password must be at least {min_len} characters"),
        );
    }

    match parsed {
        Some(email) if errors.is_empty() => Ok(email),
        _ => Err(ClientError::Validation(errors)),
    }
}

/// A 401 on login or register means wrong credentials, not an expired
/// session: keep the backend's message.
fn credential_error(err: ApiError, context: &'static str) -> ClientError {
    match err {
        ApiError::Unauthorized(message) => ClientError::Rejected {
            status: 401,
            message,
        },
        other => ClientError::from_api(other, context),
    }
}
