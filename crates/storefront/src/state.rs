//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::StorefrontConfig;
use crate::db::Database;
use crate::seed;
use crate::services::PaymentSigner;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to the
/// document store, configuration and payment signer.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    db: Database,
    signer: PaymentSigner,
}

impl AppState {
    /// Create the state, loading the demo catalog when configured.
    #[must_use]
    pub fn new(config: StorefrontConfig) -> Self {
        let db = if config.seed_catalog {
            let products = seed::demo_catalog();
            tracing::info!(products = products.len(), "Demo catalog loaded");
            Database::with_products(products)
        } else {
            Database::new()
        };
        Self::with_database(config, db)
    }

    /// Create the state over an existing store.
    #[must_use]
    pub fn with_database(config: StorefrontConfig, db: Database) -> Self {
        let signer = PaymentSigner::new(config.payment_secret.clone());
        Self {
            inner: Arc::new(AppStateInner { config, db, signer }),
        }
    }

    /// Get a reference to the backend configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the document store.
    #[must_use]
    pub fn db(&self) -> &Database {
        &self.inner.db
    }

    /// Get a reference to the mock gateway signer.
    #[must_use]
    pub fn signer(&self) -> &PaymentSigner {
        &self.inner.signer
    }
}
