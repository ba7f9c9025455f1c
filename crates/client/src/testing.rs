//! In-memory [`CommerceApi`] for unit tests.

#![allow(clippy::unwrap_used)]

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use uuid::Uuid;

use nevyra_core::api::{
    AdminOrderRow, AnalyticsReport, AuthPayload, CategorySummary, CreateOrderRequest,
    CreatePaymentRequest, CustomerSummary, GatewayConfirmation, GatewayOrder, LoginRequest,
    OrderRecord, PaymentReceipt, ProfileUpdate, RegisterRequest, UserProfile,
};
use nevyra_core::{
    Address, AddressId, AddressInput, CurrencyCode, OrderId, OrderLine, OrderStatus, OrderTotals,
    PaymentStatus, Product, ProductId, UserId,
};

use crate::api::{ApiError, ApiResult, CommerceApi};
use crate::storage::MemoryStore;

pub const TOKEN: &str = "test-token";

/// Knobs and recorded calls.
#[derive(Default)]
pub struct FakeState {
    pub products: Vec<Product>,
    pub addresses: Vec<Address>,
    pub orders: Vec<OrderRecord>,
    pub idempotency: HashMap<Uuid, OrderId>,
    pub last_order_request: Option<CreateOrderRequest>,
    pub last_create_payment: Option<CreatePaymentRequest>,
    pub fail_addresses: bool,
    pub fail_products: bool,
    pub fail_create_payment: bool,
    pub fail_verify: bool,
    pub reject_orders: Option<String>,
    pub order_delay: Duration,
    pub verify_delay: Duration,
    pub admin: bool,
}

#[derive(Default)]
pub struct FakeApi {
    pub state: Mutex<FakeState>,
    pub product_calls: AtomicUsize,
    pub address_calls: AtomicUsize,
    pub order_calls: AtomicUsize,
    pub create_payment_calls: AtomicUsize,
    pub verify_calls: AtomicUsize,
}

pub fn product(id: &str, price: i64, category: &str) -> Product {
    Product {
        id: ProductId::new(id),
        title: format!("Product {id}"),
        description: String::new(),
        price: Decimal::from(price),
        category: category.to_string(),
        image: None,
        rating: 4.0,
        popularity: 0,
        in_stock: true,
        is_new: false,
    }
}

pub fn address_input() -> AddressInput {
    AddressInput {
        first_name: "Asha".to_string(),
        last_name: "Rao".to_string(),
        email: "asha@example.com".to_string(),
        phone: "9876543210".to_string(),
        address: "12 MG Road".to_string(),
        city: "Pune".to_string(),
        zip_code: "411001".to_string(),
    }
}

/// Memory storage with a token already saved.
pub fn signed_in_storage() -> Arc<MemoryStore> {
    use crate::storage::{KeyValueStore, TOKEN_KEY};
    let storage = Arc::new(MemoryStore::new());
    storage.set(TOKEN_KEY, TOKEN).unwrap();
    storage
}

impl FakeApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_products(products: Vec<Product>) -> Arc<Self> {
        let api = Self::default();
        api.state.lock().products = products;
        Arc::new(api)
    }

    pub fn calls(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }

    fn authorize(token: &SecretString) -> ApiResult<()> {
        if token.expose_secret() == TOKEN {
            Ok(())
        } else {
            Err(ApiError::Unauthorized("Invalid token".to_string()))
        }
    }

    fn not_found(what: &str) -> ApiError {
        ApiError::Api {
            status: 404,
            message: format!("{what} not found"),
        }
    }

    fn profile_for(email: &str, admin: bool) -> UserProfile {
        UserProfile {
            id: UserId::generate(),
            email: email.to_string(),
            name: None,
            phone: None,
            is_admin: admin,
        }
    }

    fn signature(order_id: &str, payment_id: &str) -> String {
        format!("sig:{order_id}|{payment_id}")
    }
}

#[async_trait]
impl CommerceApi for FakeApi {
    async fn register(&self, request: &RegisterRequest) -> ApiResult<AuthPayload> {
        Ok(AuthPayload {
            token: TOKEN.to_string(),
            user: Self::profile_for(&request.email, false),
        })
    }

    async fn login(&self, request: &LoginRequest) -> ApiResult<AuthPayload> {
        if request.password != "correct horse" {
            return Err(ApiError::Unauthorized(
                "Invalid email or password".to_string(),
            ));
        }
        Ok(AuthPayload {
            token: TOKEN.to_string(),
            user: Self::profile_for(&request.email, self.state.lock().admin),
        })
    }

    async fn profile(&self, token: &SecretString) -> ApiResult<UserProfile> {
        Self::authorize(token)?;
        Ok(Self::profile_for("asha@example.com", self.state.lock().admin))
    }

    async fn update_profile(
        &self,
        token: &SecretString,
        update: &ProfileUpdate,
    ) -> ApiResult<UserProfile> {
        Self::authorize(token)?;
        let mut profile = Self::profile_for("asha@example.com", false);
        profile.name.clone_from(&update.name);
        profile.phone.clone_from(&update.phone);
        Ok(profile)
    }

    async fn products(&self) -> ApiResult<Vec<Product>> {
        self.product_calls.fetch_add(1, Ordering::SeqCst);
        let state = self.state.lock();
        if state.fail_products {
            return Err(ApiError::Parse("connection reset".to_string()));
        }
        Ok(state.products.clone())
    }

    async fn product(&self, id: &ProductId) -> ApiResult<Product> {
        self.state
            .lock()
            .products
            .iter()
            .find(|p| &p.id == id)
            .cloned()
            .ok_or_else(|| Self::not_found("Product"))
    }

    async fn search_products(&self, query: &str) -> ApiResult<Vec<Product>> {
        Ok(self
            .state
            .lock()
            .products
            .iter()
            .filter(|p| p.matches_text(query))
            .cloned()
            .collect())
    }

    async fn categories(&self) -> ApiResult<Vec<CategorySummary>> {
        let mut counts: Vec<CategorySummary> = Vec::new();
        for product in &self.state.lock().products {
            match counts.iter_mut().find(|c| c.name == product.category) {
                Some(c) => c.product_count += 1,
                None => counts.push(CategorySummary {
                    name: product.category.clone(),
                    product_count: 1,
                }),
            }
        }
        Ok(counts)
    }

    async fn addresses(&self, token: &SecretString) -> ApiResult<Vec<Address>> {
        self.address_calls.fetch_add(1, Ordering::SeqCst);
        Self::authorize(token)?;
        let state = self.state.lock();
        if state.fail_addresses {
            return Err(ApiError::Api {
                status: 500,
                message: "Internal server error".to_string(),
            });
        }
        Ok(state.addresses.clone())
    }

    async fn add_address(
        &self,
        token: &SecretString,
        address: &AddressInput,
    ) -> ApiResult<Vec<Address>> {
        self.address_calls.fetch_add(1, Ordering::SeqCst);
        Self::authorize(token)?;
        let mut state = self.state.lock();
        let mut created = Address::new(address.clone());
        created.is_default = state.addresses.is_empty();
        state.addresses.push(created);
        Ok(state.addresses.clone())
    }

    async fn update_address(
        &self,
        token: &SecretString,
        id: AddressId,
        address: &AddressInput,
    ) -> ApiResult<Vec<Address>> {
        self.address_calls.fetch_add(1, Ordering::SeqCst);
        Self::authorize(token)?;
        let mut state = self.state.lock();
        let existing = state
            .addresses
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| Self::not_found("Address"))?;
        existing.details = address.clone();
        Ok(state.addresses.clone())
    }

    async fn delete_address(
        &self,
        token: &SecretString,
        id: AddressId,
    ) -> ApiResult<Vec<Address>> {
        self.address_calls.fetch_add(1, Ordering::SeqCst);
        Self::authorize(token)?;
        let mut state = self.state.lock();
        let before = state.addresses.len();
        state.addresses.retain(|a| a.id != id);
        if state.addresses.len() == before {
            return Err(Self::not_found("Address"));
        }
        Ok(state.addresses.clone())
    }

    async fn set_default_address(
        &self,
        token: &SecretString,
        id: AddressId,
    ) -> ApiResult<Vec<Address>> {
        Self::authorize(token)?;
        let mut state = self.state.lock();
        if !state.addresses.iter().any(|a| a.id == id) {
            return Err(Self::not_found("Address"));
        }
        for address in &mut state.addresses {
            address.is_default = address.id == id;
        }
        Ok(state.addresses.clone())
    }

    async fn create_order(
        &self,
        token: &SecretString,
        request: &CreateOrderRequest,
        idempotency_key: Uuid,
    ) -> ApiResult<OrderRecord> {
        self.order_calls.fetch_add(1, Ordering::SeqCst);
        Self::authorize(token)?;

        let delay = self.state.lock().order_delay;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state.lock();
        state.last_order_request = Some(request.clone());
        if let Some(message) = state.reject_orders.clone() {
            return Err(ApiError::Api {
                status: 400,
                message,
            });
        }
        if let Some(existing) = state.idempotency.get(&idempotency_key).copied() {
            return state
                .orders
                .iter()
                .find(|o| o.id == existing)
                .cloned()
                .ok_or_else(|| Self::not_found("Order"));
        }

        let lines: Vec<OrderLine> = request
            .items
            .iter()
            .map(|entry| {
                let product = state.products.iter().find(|p| p.id == entry.product_id);
                OrderLine {
                    product_id: entry.product_id.clone(),
                    title: product.map_or_else(String::new, |p| p.title.clone()),
                    unit_price: product.map_or(Decimal::ZERO, |p| p.price),
                    quantity: entry.quantity,
                }
            })
            .collect();
        let record = OrderRecord {
            id: OrderId::generate(),
            status: OrderStatus::Pending,
            payment: request.payment.clone(),
            shipping: request.shipping.clone(),
            totals: OrderTotals::compute(&lines, CurrencyCode::INR),
            lines,
            created_at: Utc::now(),
        };
        state.idempotency.insert(idempotency_key, record.id);
        state.orders.push(record.clone());
        Ok(record)
    }

    async fn orders(&self, token: &SecretString) -> ApiResult<Vec<OrderRecord>> {
        Self::authorize(token)?;
        Ok(self.state.lock().orders.clone())
    }

    async fn order(&self, token: &SecretString, id: OrderId) -> ApiResult<OrderRecord> {
        Self::authorize(token)?;
        self.state
            .lock()
            .orders
            .iter()
            .find(|o| o.id == id)
            .cloned()
            .ok_or_else(|| Self::not_found("Order"))
    }

    async fn cancel_order(&self, token: &SecretString, id: OrderId) -> ApiResult<OrderRecord> {
        Self::authorize(token)?;
        let mut state = self.state.lock();
        let order = state
            .orders
            .iter_mut()
            .find(|o| o.id == id)
            .ok_or_else(|| Self::not_found("Order"))?;
        if !order.status.is_cancellable() {
            return Err(ApiError::Api {
                status: 409,
                message: "Order can no longer be cancelled".to_string(),
            });
        }
        order.status = OrderStatus::Cancelled;
        Ok(order.clone())
    }

    async fn create_payment(
        &self,
        token: &SecretString,
        request: &CreatePaymentRequest,
    ) -> ApiResult<GatewayOrder> {
        self.create_payment_calls.fetch_add(1, Ordering::SeqCst);
        Self::authorize(token)?;
        let mut state = self.state.lock();
        state.last_create_payment = Some(request.clone());
        if state.fail_create_payment {
            return Err(ApiError::Api {
                status: 502,
                message: "Payment provider unavailable".to_string(),
            });
        }
        drop(state);
        let order_id = "order_1".to_string();
        let payment_id = "pay_1".to_string();
        Ok(GatewayOrder {
            amount: request.amount,
            currency: request.currency,
            receipt: request.receipt.clone().unwrap_or_default(),
            status: PaymentStatus::Created,
            confirmation: GatewayConfirmation {
                signature: Self::signature(&order_id, &payment_id),
                order_id: order_id.clone(),
                payment_id,
            },
            order_id,
        })
    }

    async fn verify_payment(
        &self,
        token: &SecretString,
        confirmation: &GatewayConfirmation,
    ) -> ApiResult<PaymentReceipt> {
        self.verify_calls.fetch_add(1, Ordering::SeqCst);
        Self::authorize(token)?;
        let delay = self.state.lock().verify_delay;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        let expected = Self::signature(&confirmation.order_id, &confirmation.payment_id);
        if self.state.lock().fail_verify || confirmation.signature != expected {
            return Err(ApiError::Api {
                status: 400,
                message: "Payment verification failed".to_string(),
            });
        }
        Ok(PaymentReceipt {
            order_id: confirmation.order_id.clone(),
            payment_id: confirmation.payment_id.clone(),
            amount: 0,
            currency: CurrencyCode::INR,
            status: PaymentStatus::Verified,
        })
    }

    async fn admin_orders(&self, token: &SecretString) -> ApiResult<Vec<AdminOrderRow>> {
        self.require_admin(token)?;
        Ok(Vec::new())
    }

    async fn admin_customers(&self, token: &SecretString) -> ApiResult<Vec<CustomerSummary>> {
        self.require_admin(token)?;
        Ok(Vec::new())
    }

    async fn admin_products(&self, token: &SecretString) -> ApiResult<Vec<Product>> {
        self.require_admin(token)?;
        Ok(self.state.lock().products.clone())
    }

    async fn admin_analytics(&self, token: &SecretString) -> ApiResult<AnalyticsReport> {
        self.require_admin(token)?;
        Ok(AnalyticsReport {
            total_revenue: Decimal::ZERO,
            order_count: 0,
            customer_count: 0,
            average_order_value: Decimal::ZERO,
            revenue_by_month: Vec::new(),
            orders_by_weekday: Vec::new(),
            category_share: Vec::new(),
        })
    }
}

impl FakeApi {
    fn require_admin(&self, token: &SecretString) -> ApiResult<()> {
        Self::authorize(token)?;
        if self.state.lock().admin {
            Ok(())
        } else {
            Err(ApiError::Api {
                status: 403,
                message: "Admin access required".to_string(),
            })
        }
    }
}
