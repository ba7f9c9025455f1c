//! Saved shipping addresses.

use std::sync::Arc;

use tracing::instrument;

use nevyra_core::{Address, AddressId, AddressInput};

use crate::api::{ApiError, CommerceApi};
use crate::error::{ClientError, Result};
use crate::session::AuthSession;

/// CRUD over the signed-in user's addresses.
///
/// Every mutation validates locally first and returns the full updated
/// list from the backend.
#[derive(Clone)]
pub struct AddressManager {
    api: Arc<dyn CommerceApi>,
    session: AuthSession,
}

impl AddressManager {
    #[must_use]
    pub fn new(api: Arc<dyn CommerceApi>, session: AuthSession) -> Self {
        Self { api, session }
    }

    /// Saved addresses. A failed fetch is logged and reads as an empty
    /// list so the caller can fall back to the add form.
    ///
    /// # Errors
    ///
    /// Returns `Unauthenticated` when signed out or the token is rejected.
    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<Address>> {
        let token = self.session.require_token()?;
        match self.api.addresses(&token).await {
            Ok(addresses) => Ok(addresses),
            Err(ApiError::Unauthorized(_)) => Err(ClientError::Unauthenticated),
            Err(e) => {
                tracing::warn!(error = %e, "failed to fetch addresses");
                Ok(Vec::new())
            }
        }
    }

    /// Save a new address.
    ///
    /// # Errors
    ///
    /// Returns `Validation` with per-field messages (nothing is sent), or
    /// one form-level error from the backend.
    #[instrument(skip_all)]
    pub async fn add(&self, input: &AddressInput) -> Result<Vec<Address>> {
        let token = self.session.require_token()?;
        let input = input.validate().map_err(ClientError::Validation)?;
        self.api
            .add_address(&token, &input)
            .await
            .map_err(|e| ClientError::from_api(e, "Failed to add address"))
    }

    /// Replace the address with id `id`.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for bad input, or the backend's message (e.g.
    /// for an id that does not exist).
    #[instrument(skip(self, input))]
    pub async fn update(&self, id: AddressId, input: &AddressInput) -> Result<Vec<Address>> {
        let token = self.session.require_token()?;
        let input = input.validate().map_err(ClientError::Validation)?;
        self.api
            .update_address(&token, id, &input)
            .await
            .map_err(|e| ClientError::from_api(e, "Failed to update address"))
    }

    /// Delete an address.
    ///
    /// # Errors
    ///
    /// Returns the backend's message when the delete is rejected.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: AddressId) -> Result<Vec<Address>> {
        let token = self.session.require_token()?;
        self.api
            .delete_address(&token, id)
            .await
            .map_err(|e| ClientError::from_api(e, "Failed to delete address"))
    }

    /// Make one address the default.
    ///
    /// # Errors
    ///
    /// Returns the backend's message when the id is unknown.
    pub async fn set_default(&self, id: AddressId) -> Result<Vec<Address>> {
        let token = self.session.require_token()?;
        self.api
            .set_default_address(&token, id)
            .await
            .map_err(|e| ClientError::from_api(e, "Failed to update address"))
    }
}
