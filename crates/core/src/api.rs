//! Request and response bodies of the REST API.
//!
//! Every response is wrapped in [`ApiResponse`]: `{ success, data, message }`.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::address::AddressInput;
use crate::cart::CartEntry;
use crate::order::{OrderLine, OrderTotals};
use crate::payment::{CouponCode, PaymentMethod};
use crate::types::{CurrencyCode, OrderId, OrderStatus, PaymentStatus, UserId};

/// Header carrying the per-checkout key the backend deduplicates order
/// creation on.
pub const IDEMPOTENCY_KEY_HEADER: &str = "idempotency-key";

/// Response envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    #[must_use]
    pub const fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    #[must_use]
    pub fn ok_with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: Some(message.into()),
        }
    }

    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message.into()),
        }
    }
}

// =============================================================================
// Auth
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// The signed-in account as the API shows it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: UserId,
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub is_admin: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

/// Login/registration result.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthPayload {
    pub token: String,
    pub user: UserProfile,
}

// =============================================================================
// Orders
// =============================================================================

/// Payment part of an order request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentDetails {
    pub method: PaymentMethod,
    #[serde(default)]
    pub coupon: Option<CouponCode>,
    /// Verified gateway payment id; required for gateway orders.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
}

/// `POST /api/orders` body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub payment: PaymentDetails,
    pub shipping: AddressInput,
    pub items: Vec<CartEntry>,
}

/// A stored order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRecord {
    pub id: OrderId,
    pub status: OrderStatus,
    pub payment: PaymentDetails,
    pub shipping: AddressInput,
    pub lines: Vec<OrderLine>,
    pub totals: OrderTotals,
    pub created_at: DateTime<Utc>,
}

impl OrderRecord {
    /// Number of units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.lines.iter().map(|l| u64::from(l.quantity)).sum()
    }
}

// =============================================================================
// Mock gateway
// =============================================================================

/// `POST /api/payments/create-mock-order` body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentRequest {
    /// Amount in minor units (paise).
    pub amount: i64,
    pub currency: CurrencyCode,
    #[serde(default)]
    pub receipt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer: Option<PayerDetails>,
}

/// Who is paying, used to prefill the gateway form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayerDetails {
    pub name: String,
    pub email: String,
    pub phone: String,
}

impl From<&AddressInput> for PayerDetails {
    fn from(address: &AddressInput) -> Self {
        Self {
            name: address.full_name(),
            email: address.email.clone(),
            phone: address.phone.clone(),
        }
    }
}

/// What the simulated gateway hands back once the shopper "pays".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayConfirmation {
    pub order_id: String,
    pub payment_id: String,
    pub signature: String,
}

/// A pending gateway order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayOrder {
    pub order_id: String,
    /// Amount in minor units.
    pub amount: i64,
    pub currency: CurrencyCode,
    pub receipt: String,
    pub status: PaymentStatus,
    /// Released by the simulated gateway after its confirmation delay.
    pub confirmation: GatewayConfirmation,
}

/// `POST /api/payments/verify-mock` result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentReceipt {
    pub order_id: String,
    pub payment_id: String,
    pub amount: i64,
    pub currency: CurrencyCode,
    pub status: PaymentStatus,
}

// =============================================================================
// Catalog & admin
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorySummary {
    pub name: String,
    pub product_count: usize,
}

/// One row of the admin orders table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminOrderRow {
    pub id: OrderId,
    pub customer_email: String,
    pub customer_name: String,
    pub item_count: u64,
    pub total: Decimal,
    pub payment_method: PaymentMethod,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

/// One row of the admin customers table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerSummary {
    pub id: UserId,
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    pub order_count: usize,
    pub total_spent: Decimal,
    pub joined_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyRevenue {
    /// `YYYY-MM`.
    pub month: String,
    pub revenue: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekdayOrders {
    /// `Mon` .. `Sun`.
    pub day: String,
    pub orders: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryShare {
    pub category: String,
    pub revenue: Decimal,
    /// Percentage of total revenue, two decimal places.
    pub share: Decimal,
}

/// Dashboard figures computed from live orders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsReport {
    pub total_revenue: Decimal,
    pub order_count: usize,
    pub customer_count: usize,
    pub average_order_value: Decimal,
    pub revenue_by_month: Vec<MonthlyRevenue>,
    pub orders_by_weekday: Vec<WeekdayOrders>,
    pub category_share: Vec<CategoryShare>,
}
