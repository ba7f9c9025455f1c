//! In-memory document store.
//!
//! All collections sit behind one `tokio::sync::RwLock`, so a repository
//! method that touches several of them (order creation consuming a
//! payment, for example) is atomic.
//!
//! ## Collections
//!
//! - `users` - accounts with Argon2id password hashes
//! - `sessions` - SHA-256 of bearer token -> user
//! - `addresses` - per-user address book, keyed by stable id
//! - `orders` - placed orders, oldest first
//! - `idempotency` - (user, `Idempotency-Key`) -> order
//! - `payments` - mock gateway orders by gateway order id
//! - `products` - the catalog

pub mod addresses;
pub mod orders;
pub mod payments;
pub mod products;
pub mod users;

use std::collections::HashMap;

use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use uuid::Uuid;

use nevyra_core::{Address, OrderId, Product, UserId};

use crate::models::{PaymentRecord, StoredOrder, User};

/// Errors returned by repositories.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// Requested entity was not found (or belongs to someone else).
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Constraint violation (e.g., unique email, payment already used).
    #[error("{0}")]
    Conflict(String),

    /// The write is refused because a precondition does not hold.
    #[error("{0}")]
    Precondition(String),
}

#[derive(Debug, Default)]
pub(crate) struct Collections {
    pub users: HashMap<UserId, User>,
    pub sessions: HashMap<String, UserId>,
    pub addresses: HashMap<UserId, Vec<Address>>,
    pub orders: Vec<StoredOrder>,
    pub idempotency: HashMap<(UserId, Uuid), OrderId>,
    pub payments: HashMap<String, PaymentRecord>,
    pub products: Vec<Product>,
}

/// The document store.
#[derive(Debug, Default)]
pub struct Database {
    collections: RwLock<Collections>,
}

impl Database {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A store preloaded with `products`.
    #[must_use]
    pub fn with_products(products: Vec<Product>) -> Self {
        Self {
            collections: RwLock::new(Collections {
                products,
                ..Collections::default()
            }),
        }
    }

    pub(crate) async fn read(&self) -> RwLockReadGuard<'_, Collections> {
        self.collections.read().await
    }

    pub(crate) async fn write(&self) -> RwLockWriteGuard<'_, Collections> {
        self.collections.write().await
    }
}
