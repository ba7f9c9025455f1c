//! Backend REST API access.
//!
//! [`CommerceApi`] is the seam between the client workflow and the
//! network. [`HttpApi`] implements it over `reqwest`.

mod http;

pub use http::HttpApi;

use async_trait::async_trait;
use secrecy::SecretString;
use thiserror::Error;
use uuid::Uuid;

use nevyra_core::api::{
    AdminOrderRow, AnalyticsReport, AuthPayload, CategorySummary, CreateOrderRequest,
    CreatePaymentRequest, CustomerSummary, GatewayConfirmation, GatewayOrder, LoginRequest,
    OrderRecord, PaymentReceipt, ProfileUpdate, RegisterRequest, UserProfile,
};
use nevyra_core::{Address, AddressId, AddressInput, OrderId, Product, ProductId};

pub use nevyra_core::api::IDEMPOTENCY_KEY_HEADER;

/// Errors that can occur when talking to the backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed (connection, timeout, TLS).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend rejected the token or none was sent.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The backend answered with an error; `message` is its own text.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Response body did not match the expected shape.
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Result alias for API calls.
pub type ApiResult<T> = Result<T, ApiError>;

/// Everything the client needs from the backend.
#[async_trait]
pub trait CommerceApi: Send + Sync {
    // Auth
    async fn register(&self, request: &RegisterRequest) -> ApiResult<AuthPayload>;
    async fn login(&self, request: &LoginRequest) -> ApiResult<AuthPayload>;
    async fn profile(&self, token: &SecretString) -> ApiResult<UserProfile>;
    async fn update_profile(
        &self,
        token: &SecretString,
        update: &ProfileUpdate,
    ) -> ApiResult<UserProfile>;

    // Catalog
    async fn products(&self) -> ApiResult<Vec<Product>>;
    async fn product(&self, id: &ProductId) -> ApiResult<Product>;
    async fn search_products(&self, query: &str) -> ApiResult<Vec<Product>>;
    async fn categories(&self) -> ApiResult<Vec<CategorySummary>>;

    // Addresses
    async fn addresses(&self, token: &SecretString) -> ApiResult<Vec<Address>>;
    async fn add_address(
        &self,
        token: &SecretString,
        address: &AddressInput,
    ) -> ApiResult<Vec<Address>>;
    async fn update_address(
        &self,
        token: &SecretString,
        id: AddressId,
        address: &AddressInput,
    ) -> ApiResult<Vec<Address>>;
    async fn delete_address(&self, token: &SecretString, id: AddressId)
    -> ApiResult<Vec<Address>>;
    async fn set_default_address(
        &self,
        token: &SecretString,
        id: AddressId,
    ) -> ApiResult<Vec<Address>>;

    // Orders
    async fn create_order(
        &self,
        token: &SecretString,
        request: &CreateOrderRequest,
        idempotency_key: Uuid,
    ) -> ApiResult<OrderRecord>;
    async fn orders(&self, token: &SecretString) -> ApiResult<Vec<OrderRecord>>;
    async fn order(&self, token: &SecretString, id: OrderId) -> ApiResult<OrderRecord>;
    async fn cancel_order(&self, token: &SecretString, id: OrderId) -> ApiResult<OrderRecord>;

    // Mock gateway
    async fn create_payment(
        &self,
        token: &SecretString,
        request: &CreatePaymentRequest,
    ) -> ApiResult<GatewayOrder>;
    async fn verify_payment(
        &self,
        token: &SecretString,
        confirmation: &GatewayConfirmation,
    ) -> ApiResult<PaymentReceipt>;

    // Admin
    async fn admin_orders(&self, token: &SecretString) -> ApiResult<Vec<AdminOrderRow>>;
    async fn admin_customers(&self, token: &SecretString) -> ApiResult<Vec<CustomerSummary>>;
    async fn admin_products(&self, token: &SecretString) -> ApiResult<Vec<Product>>;
    async fn admin_analytics(&self, token: &SecretString) -> ApiResult<AnalyticsReport>;
}
