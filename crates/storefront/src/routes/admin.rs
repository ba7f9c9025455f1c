//! Admin listings. Every handler requires [`RequireAdmin`].

use axum::extract::State;

use nevyra_core::Product;
use nevyra_core::api::{AdminOrderRow, AnalyticsReport, CustomerSummary};

use super::{ApiResult, ok};
use crate::db::orders::OrderRepository;
use crate::db::products::ProductRepository;
use crate::db::users::UserRepository;
use crate::middleware::RequireAdmin;
use crate::services::reports;
use crate::state::AppState;

/// GET /api/admin/orders
pub async fn orders(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
) -> ApiResult<Vec<AdminOrderRow>> {
    let orders = OrderRepository::new(state.db()).list_all().await;
    let users = UserRepository::new(state.db()).list().await;
    Ok(ok(reports::order_rows(&orders, &users)))
}

/// GET /api/admin/customers
pub async fn customers(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
) -> ApiResult<Vec<CustomerSummary>> {
    let users = UserRepository::new(state.db()).list().await;
    let orders = OrderRepository::new(state.db()).list_all().await;
    Ok(ok(reports::customer_summaries(&users, &orders)))
}

/// GET /api/admin/products
pub async fn products(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
) -> ApiResult<Vec<Product>> {
    Ok(ok(ProductRepository::new(state.db()).list().await))
}

/// GET /api/admin/analytics
pub async fn analytics(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
) -> ApiResult<AnalyticsReport> {
    let orders = OrderRepository::new(state.db()).list_all().await;
    let products = ProductRepository::new(state.db()).list().await;
    Ok(ok(reports::analytics(&orders, &products)))
}
