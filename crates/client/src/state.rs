//! Client handle shared by every front end.

use std::sync::Arc;

use crate::admin::AdminConsole;
use crate::api::{ApiError, CommerceApi, HttpApi};
use crate::cart::CartStore;
use crate::catalog::Catalog;
use crate::checkout::{
    AddressManager, CheckoutSession, OrderHistory, OrderSubmitter, PaymentInitiator,
};
use crate::config::ClientConfig;
use crate::events::ChangeBus;
use crate::session::AuthSession;
use crate::storage::{FileStore, KeyValueStore, StorageError};
use crate::wishlist::WishlistStore;

/// Error opening the client.
#[derive(Debug, thiserror::Error)]
pub enum OpenError {
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("HTTP client error: {0}")]
    Api(#[from] ApiError),
}

/// Stores, session and API access over one storage root and one change
/// bus.
///
/// This struct is cheaply cloneable via `Arc`; clones share everything.
#[derive(Clone)]
pub struct NevyraClient {
    inner: Arc<NevyraClientInner>,
}

struct NevyraClientInner {
    config: ClientConfig,
    api: Arc<dyn CommerceApi>,
    bus: ChangeBus,
    session: AuthSession,
    cart: CartStore,
    wishlist: WishlistStore,
    catalog: Catalog,
}

impl NevyraClient {
    /// Open file storage under `config.data_dir` and an HTTP API client.
    ///
    /// # Errors
    ///
    /// Returns an error if the data directory cannot be created or the HTTP
    /// client fails to build.
    pub fn open(config: ClientConfig) -> Result<Self, OpenError> {
        let storage = Arc::new(FileStore::open(&config.data_dir)?);
        let api = Arc::new(HttpApi::new(&config.api_url, config.http_timeout)?);
        tracing::debug!(data_dir = %config.data_dir.display(), api = %config.api_url, "client opened");
        Ok(Self::with_parts(config, api, storage))
    }

    /// Assemble from explicit parts.
    #[must_use]
    pub fn with_parts(
        config: ClientConfig,
        api: Arc<dyn CommerceApi>,
        storage: Arc<dyn KeyValueStore>,
    ) -> Self {
        let bus = ChangeBus::new();
        let session = AuthSession::new(api.clone(), storage.clone(), bus.clone());
        let cart = CartStore::new(storage.clone(), bus.clone());
        let wishlist = WishlistStore::new(storage, bus.clone());
        let catalog = Catalog::new(api.clone(), config.catalog_ttl);

        Self {
            inner: Arc::new(NevyraClientInner {
                config,
                api,
                bus,
                session,
                cart,
                wishlist,
                catalog,
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// The change bus cart, wishlist and session publish on.
    #[must_use]
    pub fn events(&self) -> &ChangeBus {
        &self.inner.bus
    }

    #[must_use]
    pub fn session(&self) -> &AuthSession {
        &self.inner.session
    }

    #[must_use]
    pub fn cart(&self) -> &CartStore {
        &self.inner.cart
    }

    #[must_use]
    pub fn wishlist(&self) -> &WishlistStore {
        &self.inner.wishlist
    }

    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.inner.catalog
    }

    #[must_use]
    pub fn addresses(&self) -> AddressManager {
        AddressManager::new(self.inner.api.clone(), self.inner.session.clone())
    }

    #[must_use]
    pub fn orders(&self) -> OrderHistory {
        OrderHistory::new(self.inner.api.clone(), self.inner.session.clone())
    }

    #[must_use]
    pub fn admin(&self) -> AdminConsole {
        AdminConsole::new(self.inner.api.clone(), self.inner.session.clone())
    }

    /// Start a checkout. Each session has its own idempotency key and
    /// payment state.
    #[must_use]
    pub fn checkout(&self) -> CheckoutSession {
        let inner = &self.inner;
        CheckoutSession::new(
            self.addresses(),
            inner.catalog.clone(),
            inner.cart.clone(),
            OrderSubmitter::new(inner.api.clone(), inner.session.clone(), inner.cart.clone()),
            PaymentInitiator::new(
                inner.api.clone(),
                inner.session.clone(),
                inner.config.gateway_delay,
            ),
            inner.config.currency,
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::events::StoreEvent;
    use crate::storage::{CART_KEY, MemoryStore};
    use crate::testing::FakeApi;

    #[tokio::test]
    async fn test_one_bus_for_every_store() {
        let client = NevyraClient::with_parts(
            ClientConfig::with_data_dir("unused"),
            FakeApi::new(),
            Arc::new(MemoryStore::new()),
        );
        let mut rx = client.events().subscribe();

        client.cart().add("p1", 1).unwrap();
        client.wishlist().add("p1").unwrap();
        client.session().login("asha@example.com", "correct horse").await.unwrap();

        assert!(matches!(rx.recv().await.unwrap(), StoreEvent::CartUpdated { .. }));
        assert!(matches!(rx.recv().await.unwrap(), StoreEvent::WishlistUpdated { .. }));
        assert_eq!(
            rx.recv().await.unwrap(),
            StoreEvent::AuthChanged { signed_in: true }
        );
    }

    #[test]
    fn test_open_persists_under_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        let client = NevyraClient::open(ClientConfig::with_data_dir(dir.path())).unwrap();
        client.cart().add("p1", 3).unwrap();

        let reopened = NevyraClient::open(ClientConfig::with_data_dir(dir.path())).unwrap();
        assert_eq!(reopened.cart().total_quantity(), 3);
        assert!(dir.path().join(format!("{CART_KEY}.json")).exists());
    }
}
