//! Read-only admin views.

use std::sync::Arc;

use nevyra_core::Product;
use nevyra_core::api::{AdminOrderRow, AnalyticsReport, CustomerSummary};

use crate::api::CommerceApi;
use crate::error::{ClientError, Result};
use crate::session::AuthSession;

/// Listings for users the backend recognises as admins. Everyone else gets
/// `Forbidden`.
#[derive(Clone)]
pub struct AdminConsole {
    api: Arc<dyn CommerceApi>,
    session: AuthSession,
}

impl AdminConsole {
    #[must_use]
    pub fn new(api: Arc<dyn CommerceApi>, session: AuthSession) -> Self {
        Self { api, session }
    }

    /// # Errors
    ///
    /// `Unauthenticated`, `Forbidden`, or the request failure.
    pub async fn orders(&self) -> Result<Vec<AdminOrderRow>> {
        let token = self.session.require_token()?;
        self.api
            .admin_orders(&token)
            .await
            .map_err(|e| ClientError::from_api(e, "Failed to load orders"))
    }

    /// # Errors
    ///
    /// `Unauthenticated`, `Forbidden`, or the request failure.
    pub async fn customers(&self) -> Result<Vec<CustomerSummary>> {
        let token = self.session.require_token()?;
        self.api
            .admin_customers(&token)
            .await
            .map_err(|e| ClientError::from_api(e, "Failed to load customers"))
    }

    /// # Errors
    ///
    /// `Unauthenticated`, `Forbidden`, or the request failure.
    pub async fn products(&self) -> Result<Vec<Product>> {
        let token = self.session.require_token()?;
        self.api
            .admin_products(&token)
            .await
            .map_err(|e| ClientError::from_api(e, "Failed to load products"))
    }

    /// # Errors
    ///
    /// `Unauthenticated`, `Forbidden`, or the request failure.
    pub async fn analytics(&self) -> Result<AnalyticsReport> {
        let token = self.session.require_token()?;
        self.api
            .admin_analytics(&token)
            .await
            .map_err(|e| ClientError::from_api(e, "Failed to load analytics"))
    }
}
