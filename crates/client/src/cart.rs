//! Persisted cart store.
//!
//! The cart lives in client storage under the `cart` key as a JSON array of
//! `{ productId, quantity }`. Reads fail soft: missing, unreadable or
//! malformed data is an empty cart. Writes report their errors. Every
//! change publishes [`StoreEvent::CartUpdated`].

use std::sync::Arc;

use parking_lot::Mutex;
use serde::Deserialize;

use nevyra_core::{Cart, CartEntry, ProductId};

use crate::events::{ChangeBus, StoreEvent};
use crate::storage::{CART_KEY, KeyValueStore, StorageError};

/// Loose shape of a stored entry. Older data used `id` for the product.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredEntry {
    #[serde(alias = "id")]
    product_id: String,
    #[serde(default = "one")]
    quantity: i64,
}

const fn one() -> i64 {
    1
}

/// Handle to the shopper's cart. Clones share storage, lock and bus.
#[derive(Clone)]
pub struct CartStore {
    storage: Arc<dyn KeyValueStore>,
    bus: ChangeBus,
    /// Serialises read-modify-write within this process.
    write_lock: Arc<Mutex<()>>,
}

impl CartStore {
    #[must_use]
    pub fn new(storage: Arc<dyn KeyValueStore>, bus: ChangeBus) -> Self {
        Self {
            storage,
            bus,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Current cart. Never fails.
    #[must_use]
    pub fn get(&self) -> Cart {
        let raw = match self.storage.get(CART_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Cart::new(),
            Err(e) => {
                tracing::warn!(error = %e, "cart storage unreadable, treating as empty");
                return Cart::new();
            }
        };

        match serde_json::from_str::<Vec<StoredEntry>>(&raw) {
            Ok(stored) => Cart::normalized(stored.into_iter().map(|e| (e.product_id, e.quantity))),
            Err(e) => {
                tracing::warn!(error = %e, "stored cart is malformed, treating as empty");
                Cart::new()
            }
        }
    }

    /// Current entries in insertion order.
    #[must_use]
    pub fn entries(&self) -> Vec<CartEntry> {
        self.get().into_entries()
    }

    /// Sum of quantities, for badges.
    #[must_use]
    pub fn total_quantity(&self) -> u64 {
        self.get().total_quantity()
    }

    /// Replace the whole cart. Entries are normalised first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the cart cannot be written.
    pub fn set(&self, entries: Vec<CartEntry>) -> Result<Cart, StorageError> {
        let _guard = self.write_lock.lock();
        let cart: Cart = entries.into_iter().collect();
        self.persist(&cart)?;
        Ok(cart)
    }

    /// Add `quantity` of a product (increments an existing entry).
    /// Adding zero changes nothing.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the cart cannot be written.
    pub fn add(&self, product_id: impl Into<ProductId>, quantity: u32) -> Result<Cart, StorageError> {
        let product_id = product_id.into();
        self.mutate(|cart| cart.add(product_id, quantity))
    }

    /// Remove a product.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the cart cannot be written.
    pub fn remove(&self, product_id: &ProductId) -> Result<Cart, StorageError> {
        self.mutate(|cart| cart.remove(product_id))
    }

    /// Set a product's quantity; zero or below removes it, unknown products
    /// are ignored.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the cart cannot be written.
    pub fn update_quantity(
        &self,
        product_id: &ProductId,
        quantity: i64,
    ) -> Result<Cart, StorageError> {
        self.mutate(|cart| cart.update_quantity(product_id, quantity))
    }

    /// Empty the cart (after an order is placed).
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the cart cannot be written.
    pub fn clear(&self) -> Result<Cart, StorageError> {
        self.set(Vec::new())
    }

    fn mutate(&self, change: impl FnOnce(&mut Cart) -> bool) -> Result<Cart, StorageError> {
        let _guard = self.write_lock.lock();
        let mut cart = self.get();
        if change(&mut cart) {
            self.persist(&cart)?;
        }
        Ok(cart)
    }

    fn persist(&self, cart: &Cart) -> Result<(), StorageError> {
        let json = serde_json::to_string(cart)
            .map_err(|e| StorageError::Unavailable(e.to_string()))?;
        self.storage.set(CART_KEY, &json)?;

        tracing::debug!(entries = cart.len(), "cart saved");
        self.bus.publish(StoreEvent::CartUpdated {
            entries: cart.len(),
            total_quantity: cart.total_quantity(),
        });
        Ok(())
    }
}
