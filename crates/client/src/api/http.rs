//! `reqwest` implementation of [`CommerceApi`].

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::instrument;
use url::Url;
use uuid::Uuid;

use nevyra_core::api::{
    AdminOrderRow, AnalyticsReport, ApiResponse, AuthPayload, CategorySummary, CreateOrderRequest,
    CreatePaymentRequest, CustomerSummary, GatewayConfirmation, GatewayOrder, LoginRequest,
    OrderRecord, PaymentReceipt, ProfileUpdate, RegisterRequest, UserProfile,
};
use nevyra_core::{Address, AddressId, AddressInput, OrderId, Product, ProductId};

use super::{ApiError, ApiResult, CommerceApi, IDEMPOTENCY_KEY_HEADER};

/// HTTP client for the storefront REST API.
///
/// Cheap to clone; clones share one connection pool.
#[derive(Clone)]
pub struct HttpApi {
    inner: Arc<HttpApiInner>,
}

struct HttpApiInner {
    client: reqwest::Client,
    /// API root, e.g. `http://localhost:8000/api`.
    base: String,
}

impl HttpApi {
    /// Create a client for the API rooted at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(base_url: &Url, timeout: Duration) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("nevyra-client/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            inner: Arc::new(HttpApiInner {
                client,
                base: base_url.as_str().trim_end_matches('/').to_string(),
            }),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.inner.base)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, token: Option<&SecretString>) -> ApiResult<T> {
        let mut request = self.inner.client.get(self.url(path));
        if let Some(token) = token {
            request = request.bearer_auth(token.expose_secret());
        }
        decode(request.send().await?).await
    }

    async fn send_json<B, T>(
        &self,
        method: reqwest::Method,
        path: &str,
        token: Option<&SecretString>,
        body: Option<&B>,
    ) -> ApiResult<T>
    where
        B: Serialize + Sync + ?Sized,
        T: DeserializeOwned,
    {
        let mut request = self.inner.client.request(method, self.url(path));
        if let Some(token) = token {
            request = request.bearer_auth(token.expose_secret());
        }
        if let Some(body) = body {
            request = request.json(body);
        }
        decode(request.send().await?).await
    }
}

/// Unwrap the `{ success, data, message }` envelope.
async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> ApiResult<T> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        let message = serde_json::from_str::<ApiResponse<serde_json::Value>>(&body)
            .ok()
            .and_then(|envelope| envelope.message)
            .unwrap_or_else(|| fallback_message(status));
        tracing::debug!(status = status.as_u16(), %message, "API request rejected");
        if status == StatusCode::UNAUTHORIZED {
            return Err(ApiError::Unauthorized(message));
        }
        return Err(ApiError::Api {
            status: status.as_u16(),
            message,
        });
    }

    let envelope: ApiResponse<T> =
        serde_json::from_str(&body).map_err(|e| ApiError::Parse(e.to_string()))?;

    if !envelope.success {
        return Err(ApiError::Api {
            status: status.as_u16(),
            message: envelope
                .message
                .unwrap_or_else(|| "Request failed".to_string()),
        });
    }

    envelope
        .data
        .ok_or_else(|| ApiError::Parse("response has no data".to_string()))
}

fn fallback_message(status: StatusCode) -> String {
    status
        .canonical_reason()
        .map_or_else(|| format!("HTTP {}", status.as_u16()), str::to_string)
}

const NO_BODY: Option<&()> = None;

#[async_trait]
impl CommerceApi for HttpApi {
    #[instrument(skip_all, fields(email = %request.email))]
    async fn register(&self, request: &RegisterRequest) -> ApiResult<AuthPayload> {
        self.send_json(reqwest::Method::POST, "/auth/register", None, Some(request))
            .await
    }

    #[instrument(skip_all, fields(email = %request.email))]
    async fn login(&self, request: &LoginRequest) -> ApiResult<AuthPayload> {
        self.send_json(reqwest::Method::POST, "/auth/login", None, Some(request))
            .await
    }

    async fn profile(&self, token: &SecretString) -> ApiResult<UserProfile> {
        self.get("/auth/profile", Some(token)).await
    }

    async fn update_profile(
        &self,
        token: &SecretString,
        update: &ProfileUpdate,
    ) -> ApiResult<UserProfile> {
        self.send_json(reqwest::Method::PUT, "/auth/profile", Some(token), Some(update))
            .await
    }

    #[instrument(skip(self))]
    async fn products(&self) -> ApiResult<Vec<Product>> {
        self.get("/products/all", None).await
    }

    async fn product(&self, id: &ProductId) -> ApiResult<Product> {
        let mut url = Url::parse(&self.url("/products/"))
            .map_err(|e| ApiError::Parse(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|()| ApiError::Parse("API base cannot hold a path".to_string()))?
            .pop_if_empty()
            .push(id.as_str());
        let response = self.inner.client.get(url).send().await?;
        decode(response).await
    }

    async fn search_products(&self, query: &str) -> ApiResult<Vec<Product>> {
        let mut url = Url::parse(&self.url("/products/search"))
            .map_err(|e| ApiError::Parse(e.to_string()))?;
        url.query_pairs_mut().append_pair("q", query);
        let response = self.inner.client.get(url).send().await?;
        decode(response).await
    }

    async fn categories(&self) -> ApiResult<Vec<CategorySummary>> {
        self.get("/categories", None).await
    }

    #[instrument(skip_all)]
    async fn addresses(&self, token: &SecretString) -> ApiResult<Vec<Address>> {
        self.get("/users/addresses", Some(token)).await
    }

    #[instrument(skip_all)]
    async fn add_address(
        &self,
        token: &SecretString,
        address: &AddressInput,
    ) -> ApiResult<Vec<Address>> {
        self.send_json(
            reqwest::Method::POST,
            "/users/addresses",
            Some(token),
            Some(address),
        )
        .await
    }

    #[instrument(skip(self, token, address))]
    async fn update_address(
        &self,
        token: &SecretString,
        id: AddressId,
        address: &AddressInput,
    ) -> ApiResult<Vec<Address>> {
        self.send_json(
            reqwest::Method::PUT,
            &format!("/users/addresses/{id}"),
            Some(token),
            Some(address),
        )
        .await
    }

    #[instrument(skip(self, token))]
    async fn delete_address(
        &self,
        token: &SecretString,
        id: AddressId,
    ) -> ApiResult<Vec<Address>> {
        self.send_json(
            reqwest::Method::DELETE,
            &format!("/users/addresses/{id}"),
            Some(token),
            NO_BODY,
        )
        .await
    }

    #[instrument(skip(self, token))]
    async fn set_default_address(
        &self,
        token: &SecretString,
        id: AddressId,
    ) -> ApiResult<Vec<Address>> {
        self.send_json(
            reqwest::Method::PUT,
            &format!("/users/addresses/{id}/default"),
            Some(token),
            NO_BODY,
        )
        .await
    }

    #[instrument(skip(self, token, request), fields(items = request.items.len(), method = %request.payment.method))]
    async fn create_order(
        &self,
        token: &SecretString,
        request: &CreateOrderRequest,
        idempotency_key: Uuid,
    ) -> ApiResult<OrderRecord> {
        let response = self
            .inner
            .client
            .post(self.url("/orders"))
            .bearer_auth(token.expose_secret())
            .header(IDEMPOTENCY_KEY_HEADER, idempotency_key.to_string())
            .json(request)
            .send()
            .await?;
        decode(response).await
    }

    async fn orders(&self, token: &SecretString) -> ApiResult<Vec<OrderRecord>> {
        self.get("/orders", Some(token)).await
    }

    async fn order(&self, token: &SecretString, id: OrderId) -> ApiResult<OrderRecord> {
        self.get(&format!("/orders/{id}"), Some(token)).await
    }

    #[instrument(skip(self, token))]
    async fn cancel_order(&self, token: &SecretString, id: OrderId) -> ApiResult<OrderRecord> {
        self.send_json(
            reqwest::Method::PUT,
            &format!("/orders/{id}/cancel"),
            Some(token),
            NO_BODY,
        )
        .await
    }

    #[instrument(skip(self, token, request), fields(amount = request.amount))]
    async fn create_payment(
        &self,
        token: &SecretString,
        request: &CreatePaymentRequest,
    ) -> ApiResult<GatewayOrder> {
        self.send_json(
            reqwest::Method::POST,
            "/payments/create-mock-order",
            Some(token),
            Some(request),
        )
        .await
    }

    #[instrument(skip(self, token, confirmation), fields(order_id = %confirmation.order_id))]
    async fn verify_payment(
        &self,
        token: &SecretString,
        confirmation: &GatewayConfirmation,
    ) -> ApiResult<PaymentReceipt> {
        self.send_json(
            reqwest::Method::POST,
            "/payments/verify-mock",
            Some(token),
            Some(confirmation),
        )
        .await
    }

    async fn admin_orders(&self, token: &SecretString) -> ApiResult<Vec<AdminOrderRow>> {
        self.get("/admin/orders", Some(token)).await
    }

    async fn admin_customers(&self, token: &SecretString) -> ApiResult<Vec<CustomerSummary>> {
        self.get("/admin/customers", Some(token)).await
    }

    async fn admin_products(&self, token: &SecretString) -> ApiResult<Vec<Product>> {
        self.get("/admin/products", Some(token)).await
    }

    async fn admin_analytics(&self, token: &SecretString) -> ApiResult<AnalyticsReport> {
        self.get("/admin/analytics", Some(token)).await
    }
}
