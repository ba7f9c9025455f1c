//! Address book repository.
//!
//! Every mutation returns the user's full list, as the API does.
//! Exactly one address is the default whenever the list is non-empty.

use nevyra_core::{Address, AddressId, AddressInput, UserId};

use super::{Database, RepositoryError};

pub struct AddressRepository<'a> {
    db: &'a Database,
}

impl<'a> AddressRepository<'a> {
    #[must_use]
    pub const fn new(db: &'a Database) -> Self {
        Self { db }
    }

    pub async fn list(&self, user_id: UserId) -> Vec<Address> {
        self.db
            .read()
            .await
            .addresses
            .get(&user_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Append an address. The first one becomes the default.
    pub async fn add(&self, user_id: UserId, details: AddressInput) -> Vec<Address> {
        let mut collections = self.db.write().await;
        let book = collections.addresses.entry(user_id).or_default();
        let mut address = Address::new(details);
        address.is_default = book.is_empty();
        book.push(address);
        book.clone()
    }

    /// Replace the details of address `id`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user has no such address.
    pub async fn update(
        &self,
        user_id: UserId,
        id: AddressId,
        details: AddressInput,
    ) -> Result<Vec<Address>, RepositoryError> {
        let mut collections = self.db.write().await;
        let book = collections.addresses.entry(user_id).or_default();
        let address = book
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or(RepositoryError::NotFound("Address"))?;
        address.details = details;
        Ok(book.clone())
    }

    /// Remove address `id`. If it was the default, the first remaining
    /// address takes over.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user has no such address.
    pub async fn delete(
        &self,
        user_id: UserId,
        id: AddressId,
    ) -> Result<Vec<Address>, RepositoryError> {
        let mut collections = self.db.write().await;
        let book = collections.addresses.entry(user_id).or_default();
        let position = book
            .iter()
            .position(|a| a.id == id)
            .ok_or(RepositoryError::NotFound("Address"))?;
        let removed = book.remove(position);

        if removed.is_default
            && let Some(first) = book.first_mut()
        {
            first.is_default = true;
        }
        Ok(book.clone())
    }

    /// Make address `id` the only default.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user has no such address.
    pub async fn set_default(
        &self,
        user_id: UserId,
        id: AddressId,
    ) -> Result<Vec<Address>, RepositoryError> {
        let mut collections = self.db.write().await;
        let book = collections.addresses.entry(user_id).or_default();
        if !book.iter().any(|a| a.id == id) {
            return Err(RepositoryError::NotFound("Address"));
        }
        for address in book.iter_mut() {
            address.is_default = address.id == id;
        }
        Ok(book.clone())
    }
}
