//! Order submission and history.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use tracing::instrument;
use uuid::Uuid;

use nevyra_core::api::{CreateOrderRequest, OrderRecord, PaymentDetails};
use nevyra_core::{AddressInput, CouponCode, Money, OrderId, OrderStatus, PaymentMethod};

use crate::api::CommerceApi;
use crate::cart::CartStore;
use crate::error::{ClientError, Result};
use crate::session::AuthSession;

const ORDER_FAILED: &str = "Order failed. Please try again.";

/// What the shopper chose on the payment step.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaymentSelection {
    pub method: Option<PaymentMethod>,
    pub coupon: Option<CouponCode>,
    /// Gateway payment id backing the order.
    pub reference: Option<String>,
}

/// Returned after an order is placed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderConfirmation {
    pub order_id: OrderId,
    pub total: Money,
    pub payment_reference: Option<String>,
    pub status: OrderStatus,
}

impl From<&OrderRecord> for OrderConfirmation {
    fn from(record: &OrderRecord) -> Self {
        Self {
            order_id: record.id,
            total: record.totals.total_money(),
            payment_reference: record.payment.reference.clone(),
            status: record.status,
        }
    }
}

/// Sends the cart as an order.
///
/// One submitter belongs to one checkout: it holds the idempotency key
/// sent with every attempt and the in-flight flag that rejects a second
/// concurrent submit. The key rotates once an order is created.
#[derive(Clone)]
pub struct OrderSubmitter {
    api: Arc<dyn CommerceApi>,
    session: AuthSession,
    cart: CartStore,
    in_flight: Arc<AtomicBool>,
    idempotency_key: Arc<Mutex<Uuid>>,
}

/// Clears the in-flight flag when the submission ends, however it ends.
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl OrderSubmitter {
    #[must_use]
    pub fn new(api: Arc<dyn CommerceApi>, session: AuthSession, cart: CartStore) -> Self {
        Self {
            api,
            session,
            cart,
            in_flight: Arc::new(AtomicBool::new(false)),
            idempotency_key: Arc::new(Mutex::new(Uuid::new_v4())),
        }
    }

    /// Whether a submission is running.
    #[must_use]
    pub fn is_submitting(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Place an order for the current cart.
    ///
    /// On success the cart is cleared. On any failure the cart and the
    /// caller's form state are left as they were.
    ///
    /// # Errors
    ///
    /// Checked in order, all before any request: `Unauthenticated`,
    /// `Validation` (shipping), `MissingPaymentMethod`, `EmptyCart`,
    /// `SubmissionInProgress`. Then the backend's message verbatim, or
    /// `"Order failed. Please try again."` when no answer arrived.
    #[instrument(skip_all, fields(method = tracing::field::Empty))]
    pub async fn submit(
        &self,
        shipping: &AddressInput,
        payment: &PaymentSelection,
    ) -> Result<OrderConfirmation> {
        let token = self.session.require_token()?;
        let shipping = shipping.validate().map_err(ClientError::Validation)?;
        let method = payment.method.ok_or(ClientError::MissingPaymentMethod)?;
        tracing::Span::current().record("method", tracing::field::display(method));

        let cart = self.cart.get();
        if cart.is_empty() {
            return Err(ClientError::EmptyCart);
        }

        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(ClientError::SubmissionInProgress);
        }
        let _in_flight = InFlight(&self.in_flight);

        let key = *self.idempotency_key.lock();
        let request = CreateOrderRequest {
            payment: PaymentDetails {
                method,
                coupon: payment.coupon.clone(),
                reference: payment.reference.clone(),
            },
            shipping,
            items: cart.into_entries(),
        };

        let record = self
            .api
            .create_order(&token, &request, key)
            .await
            .map_err(|e| ClientError::from_api(e, ORDER_FAILED))?;

        *self.idempotency_key.lock() = Uuid::new_v4();
        if let Err(e) = self.cart.clear() {
            tracing::warn!(error = %e, order_id = %record.id, "order placed but cart not cleared");
        }

        tracing::info!(order_id = %record.id, total = %record.totals.total, "order placed");
        Ok(OrderConfirmation::from(&record))
    }
}

/// The signed-in user's past orders.
#[derive(Clone)]
pub struct OrderHistory {
    api: Arc<dyn CommerceApi>,
    session: AuthSession,
}

impl OrderHistory {
    #[must_use]
    pub fn new(api: Arc<dyn CommerceApi>, session: AuthSession) -> Self {
        Self { api, session }
    }

    /// # Errors
    ///
    /// Returns `Unauthenticated` when signed out, or the request failure.
    pub async fn list(&self) -> Result<Vec<OrderRecord>> {
        let token = self.session.require_token()?;
        self.api
            .orders(&token)
            .await
            .map_err(|e| ClientError::from_api(e, "Failed to load orders"))
    }

    /// # Errors
    ///
    /// Returns the backend's message for an unknown order.
    pub async fn get(&self, id: OrderId) -> Result<OrderRecord> {
        let token = self.session.require_token()?;
        self.api
            .order(&token, id)
            .await
            .map_err(|e| ClientError::from_api(e, "Failed to load order"))
    }

    /// Cancel a pending or confirmed order.
    ///
    /// # Errors
    ///
    /// Returns the backend's message when the order can no longer be
    /// cancelled.
    #[instrument(skip(self))]
    pub async fn cancel(&self, id: OrderId) -> Result<OrderRecord> {
        let token = self.session.require_token()?;
        self.api
            .cancel_order(&token, id)
            .await
            .map_err(|e| ClientError::from_api(e, "Failed to cancel order"))
    }
}
