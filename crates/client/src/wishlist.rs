//! Persisted wishlist: product ids without duplicates.

use std::sync::Arc;

use parking_lot::Mutex;

use nevyra_core::ProductId;

use crate::events::{ChangeBus, StoreEvent};
use crate::storage::{KeyValueStore, StorageError, WISHLIST_KEY};

/// Handle to the shopper's wishlist.
#[derive(Clone)]
pub struct WishlistStore {
    storage: Arc<dyn KeyValueStore>,
    bus: ChangeBus,
    write_lock: Arc<Mutex<()>>,
}

impl WishlistStore {
    #[must_use]
    pub fn new(storage: Arc<dyn KeyValueStore>, bus: ChangeBus) -> Self {
        Self {
            storage,
            bus,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Saved ids in insertion order; empty on missing or malformed data.
    #[must_use]
    pub fn get(&self) -> Vec<ProductId> {
        let raw = match self.storage.get(WISHLIST_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                tracing::warn!(error = %e, "wishlist storage unreadable, treating as empty");
                return Vec::new();
            }
        };
        match serde_json::from_str::<Vec<ProductId>>(&raw) {
            Ok(ids) => dedup(ids),
            Err(e) => {
                tracing::warn!(error = %e, "stored wishlist is malformed, treating as empty");
                Vec::new()
            }
        }
    }

    #[must_use]
    pub fn contains(&self, id: &ProductId) -> bool {
        self.get().contains(id)
    }

    /// Replace the list.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the list cannot be written.
    pub fn set(&self, ids: Vec<ProductId>) -> Result<Vec<ProductId>, StorageError> {
        let _guard = self.write_lock.lock();
        let ids = dedup(ids);
        self.persist(&ids)?;
        Ok(ids)
    }

    /// Add an id if absent.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the list cannot be written.
    pub fn add(&self, id: impl Into<ProductId>) -> Result<Vec<ProductId>, StorageError> {
        let id = id.into();
        let _guard = self.write_lock.lock();
        let mut ids = self.get();
        if !ids.contains(&id) {
            ids.push(id);
            self.persist(&ids)?;
        }
        Ok(ids)
    }

    /// Remove an id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the list cannot be written.
    pub fn remove(&self, id: &ProductId) -> Result<Vec<ProductId>, StorageError> {
        let _guard = self.write_lock.lock();
        let mut ids = self.get();
        let before = ids.len();
        ids.retain(|existing| existing != id);
        if ids.len() != before {
            self.persist(&ids)?;
        }
        Ok(ids)
    }

    /// Add when absent, remove when present. Returns whether it is now saved.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the list cannot be written.
    pub fn toggle(&self, id: &ProductId) -> Result<bool, StorageError> {
        if self.contains(id) {
            self.remove(id)?;
            Ok(false)
        } else {
            self.add(id.clone())?;
            Ok(true)
        }
    }

    fn persist(&self, ids: &[ProductId]) -> Result<(), StorageError> {
        let json =
            serde_json::to_string(ids).map_err(|e| StorageError::Unavailable(e.to_string()))?;
        self.storage.set(WISHLIST_KEY, &json)?;
        self.bus
            .publish(StoreEvent::WishlistUpdated { count: ids.len() });
        Ok(())
    }
}

fn dedup(ids: Vec<ProductId>) -> Vec<ProductId> {
    let mut out: Vec<ProductId> = Vec::with_capacity(ids.len());
    for id in ids {
        if !out.contains(&id) {
            out.push(id);
        }
    }
    out
}
