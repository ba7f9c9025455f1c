//! HTTP route handlers.
//!
//! Mounted under `/api` by [`crate::app`].
//!
//! # Route Structure
//!
//! ```text
//! # Auth
//! POST /auth/register               - Create account, returns token + user
//! POST /auth/login                  - Sign in, returns token + user
//! GET  /auth/profile                - Current user (auth)
//! PUT  /auth/profile                - Update name / phone (auth)
//!
//! # Catalog
//! GET  /products/all                - Every product
//! GET  /products?page&limit         - One page of products
//! GET  /products/search?q=          - Text search
//! GET  /products/category/{name}    - Products in a category group
//! GET  /products/{id}               - One product
//! GET  /categories                  - Categories with product counts
//!
//! # Address book (auth)
//! GET    /users/addresses           - List
//! POST   /users/addresses           - Add
//! PUT    /users/addresses/{id}      - Update
//! DELETE /users/addresses/{id}      - Delete
//! PUT    /users/addresses/{id}/default - Make default
//!
//! # Orders (auth)
//! GET  /orders                      - Own orders, newest first
//! POST /orders                      - Place an order (Idempotency-Key aware)
//! GET  /orders/{id}                 - One order
//! PUT  /orders/{id}/cancel          - Cancel a pending or confirmed order
//!
//! # Mock gateway (auth)
//! POST /payments/create-mock-order  - Open a gateway order
//! POST /payments/verify-mock        - Verify a signed confirmation
//!
//! # Admin (admin)
//! GET  /admin/orders
//! GET  /admin/customers
//! GET  /admin/products
//! GET  /admin/analytics
//! ```

pub mod addresses;
pub mod admin;
pub mod auth;
pub mod orders;
pub mod payments;
pub mod products;

use axum::{
    Json, Router,
    routing::{get, post, put},
};

use nevyra_core::api::ApiResponse;

use crate::state::AppState;

/// Successful handler result.
pub type ApiResult<T> = crate::error::Result<Json<ApiResponse<T>>>;

/// Wrap `data` in a success envelope.
pub const fn ok<T>(data: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse::ok(data))
}

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/profile", get(auth::profile).put(auth::update_profile))
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/all", get(products::all))
        .route("/search", get(products::search))
        .route("/category/{category}", get(products::by_category))
        .route("/{id}", get(products::show))
}

/// Create the address book routes router.
pub fn address_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(addresses::index).post(addresses::create))
        .route(
            "/{id}",
            put(addresses::update).delete(addresses::delete),
        )
        .route("/{id}/default", put(addresses::set_default))
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::index).post(orders::create))
        .route("/{id}", get(orders::show))
        .route("/{id}/cancel", put(orders::cancel))
}

/// Create the mock gateway routes router.
pub fn payment_routes() -> Router<AppState> {
    Router::new()
        .route("/create-mock-order", post(payments::create_mock_order))
        .route("/verify-mock", post(payments::verify_mock))
}

/// Create the admin routes router.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/orders", get(admin::orders))
        .route("/customers", get(admin::customers))
        .route("/products", get(admin::products))
        .route("/analytics", get(admin::analytics))
}

/// Create all API routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth_routes())
        .nest("/products", product_routes())
        .route("/categories", get(products::categories))
        .nest("/users/addresses", address_routes())
        .nest("/orders", order_routes())
        .nest("/payments", payment_routes())
        .nest("/admin", admin_routes())
}
