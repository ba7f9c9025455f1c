//! Payment step: coupon, method, and the simulated gateway flow.
//!
//! A gateway payment runs as a spawned task:
//!
//! 1. create a pending gateway order on the backend (`order_created`)
//! 2. wait for the gateway's confirmation (`awaiting_confirmation`); the
//!    simulated gateway releases it after a fixed delay
//! 3. verify the confirmation with the backend (`verified`)
//!
//! The caller holds a [`GatewayPayment`] to watch progress, dismiss it
//! while the confirmation is pending, and await the [`PaymentOutcome`].
//! Dismissing stops the wait, so a late confirmation is never verified.
//! Once verification has started the payment can no longer be dismissed.

use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Duration;

use secrecy::SecretString;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::Instrument;

use nevyra_core::api::{CreatePaymentRequest, PayerDetails, PaymentReceipt};
use nevyra_core::{
    AddressInput, CouponCode, Field, FieldErrors, Money, PaymentMethod, PaymentState,
};

use super::order::{OrderConfirmation, OrderSubmitter, PaymentSelection};
use crate::api::CommerceApi;
use crate::error::{ClientError, Result};
use crate::session::AuthSession;

const EMPTY_COUPON: &str = "Please enter a coupon code";
const PAYMENT_FAILED: &str = "Payment failed. Please try again.";

/// Shared, observable payment state. Only legal transitions are applied.
#[derive(Clone, Debug)]
pub struct PaymentTracker {
    tx: Arc<watch::Sender<PaymentState>>,
}

impl Default for PaymentTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl PaymentTracker {
    #[must_use]
    pub fn new() -> Self {
        let (tx, _) = watch::channel(PaymentState::Idle);
        Self { tx: Arc::new(tx) }
    }

    #[must_use]
    pub fn state(&self) -> PaymentState {
        *self.tx.borrow()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<PaymentState> {
        self.tx.subscribe()
    }

    /// Move to `next` if the transition is allowed. Returns whether it was.
    pub fn advance(&self, next: PaymentState) -> bool {
        let mut from = PaymentState::Idle;
        let moved = self.tx.send_if_modified(|state| {
            from = *state;
            if state.can_transition_to(next) {
                *state = next;
                true
            } else {
                false
            }
        });
        if moved {
            tracing::debug!(%from, to = %next, "payment state");
        } else {
            tracing::debug!(%from, to = %next, "ignored payment transition");
        }
        moved
    }
}

/// Decides, exactly once, whether the shopper's dismissal or the start of
/// verification wins the confirmation.
#[derive(Debug, Default)]
struct ConfirmationGate(AtomicU8);

impl ConfirmationGate {
    const OPEN: u8 = 0;
    const DISMISSED: u8 = 1;
    const CLOSED: u8 = 2;

    fn dismiss(&self) -> bool {
        self.claim(Self::DISMISSED)
    }

    /// Close the gate for verification (or a failed creation). Returns
    /// `false` if the payment was dismissed first.
    fn close(&self) -> bool {
        self.claim(Self::CLOSED)
    }

    fn claim(&self, to: u8) -> bool {
        self.0
            .compare_exchange(Self::OPEN, to, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

/// How a gateway payment ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentOutcome {
    Verified(PaymentReceipt),
    /// User-facing failure message.
    Failed(String),
    Dismissed,
}

impl PaymentOutcome {
    /// The receipt, or the matching error.
    ///
    /// # Errors
    ///
    /// `Payment` for a failure, `PaymentDismissed` for a dismissal.
    pub fn into_result(self) -> Result<PaymentReceipt> {
        match self {
            Self::Verified(receipt) => Ok(receipt),
            Self::Failed(message) => Err(ClientError::Payment(message)),
            Self::Dismissed => Err(ClientError::PaymentDismissed),
        }
    }
}

/// Handle to a running gateway payment.
#[derive(Debug)]
pub struct GatewayPayment {
    tracker: PaymentTracker,
    gate: Arc<ConfirmationGate>,
    dismiss: watch::Sender<bool>,
    task: JoinHandle<PaymentOutcome>,
}

impl GatewayPayment {
    #[must_use]
    pub fn state(&self) -> PaymentState {
        self.tracker.state()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<PaymentState> {
        self.tracker.subscribe()
    }

    #[must_use]
    pub const fn tracker(&self) -> &PaymentTracker {
        &self.tracker
    }

    /// Close the payment before it is confirmed.
    ///
    /// Returns `true` when the dismissal took effect: the confirmation will
    /// never be verified. Returns `false` once verification has started or
    /// the payment has ended.
    pub fn dismiss(&self) -> bool {
        if !self.gate.dismiss() {
            return false;
        }
        self.dismiss.send_replace(true);
        true
    }

    /// Wait for the payment to finish.
    pub async fn outcome(self) -> PaymentOutcome {
        match self.task.await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!(error = %e, "gateway payment task failed");
                self.tracker.advance(PaymentState::Failed);
                PaymentOutcome::Failed(PAYMENT_FAILED.to_string())
            }
        }
    }
}

/// Coupon, method and payment progress for one checkout.
pub struct PaymentInitiator {
    api: Arc<dyn CommerceApi>,
    session: AuthSession,
    confirmation_delay: Duration,
    applied_coupon: Option<CouponCode>,
    method: Option<PaymentMethod>,
    errors: FieldErrors,
    tracker: PaymentTracker,
}

impl PaymentInitiator {
    #[must_use]
    pub fn new(api: Arc<dyn CommerceApi>, session: AuthSession, confirmation_delay: Duration) -> Self {
        Self {
            api,
            session,
            confirmation_delay,
            applied_coupon: None,
            method: None,
            errors: FieldErrors::new(),
            tracker: PaymentTracker::new(),
        }
    }

    /// Apply a coupon code. Once one is applied, further codes are ignored
    /// until [`clear_coupon`](Self::clear_coupon).
    ///
    /// # Errors
    ///
    /// Returns `Validation` for a blank code; the applied coupon is kept.
    pub fn apply_coupon(&mut self, code: &str) -> Result<CouponCode> {
        let Some(parsed) = CouponCode::parse(code) else {
            self.errors.insert(Field::Coupon, EMPTY_COUPON);
            return Err(ClientError::Validation(FieldErrors::single(
                Field::Coupon,
                EMPTY_COUPON,
            )));
        };
        self.errors.remove(Field::Coupon);
        if let Some(applied) = &self.applied_coupon {
            return Ok(applied.clone());
        }
        tracing::debug!(coupon = %parsed, "coupon applied");
        self.applied_coupon = Some(parsed.clone());
        Ok(parsed)
    }

    pub fn clear_coupon(&mut self) {
        self.applied_coupon = None;
        self.errors.remove(Field::Coupon);
    }

    #[must_use]
    pub const fn applied_coupon(&self) -> Option<&CouponCode> {
        self.applied_coupon.as_ref()
    }

    pub fn select_method(&mut self, method: PaymentMethod) {
        self.method = Some(method);
        self.errors.remove(Field::PaymentMethod);
    }

    #[must_use]
    pub const fn method(&self) -> Option<PaymentMethod> {
        self.method
    }

    /// Field errors from the last coupon or method check.
    #[must_use]
    pub const fn field_errors(&self) -> &FieldErrors {
        &self.errors
    }

    /// Selection to send with the order.
    #[must_use]
    pub fn selection(&self) -> PaymentSelection {
        PaymentSelection {
            method: self.method,
            coupon: self.applied_coupon.clone(),
            reference: None,
        }
    }

    /// State of the current (or last) payment attempt.
    #[must_use]
    pub fn state(&self) -> PaymentState {
        self.tracker.state()
    }

    /// Watch the current attempt.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<PaymentState> {
        self.tracker.subscribe()
    }

    /// Record that a method is required.
    pub(crate) fn require_method(&mut self) -> Result<PaymentMethod> {
        self.method.ok_or_else(|| {
            self.errors
                .insert(Field::PaymentMethod, "Please select a payment method");
            ClientError::MissingPaymentMethod
        })
    }

    /// Start a gateway payment for `amount`.
    ///
    /// # Errors
    ///
    /// Returns `Unauthenticated` when signed out, `SubmissionInProgress`
    /// while another attempt is running, or `Payment` for an amount that
    /// cannot be charged.
    pub fn initiate_gateway_payment(
        &mut self,
        amount: Money,
        payer: PayerDetails,
        receipt: Option<String>,
    ) -> Result<GatewayPayment> {
        let token = self.session.require_token()?;
        let minor = amount
            .minor_units()
            .filter(|units| *units > 0)
            .ok_or_else(|| ClientError::Payment("Invalid payment amount".to_string()))?;
        let tracker = self.begin_attempt()?;

        let request = CreatePaymentRequest {
            amount: minor,
            currency: amount.currency,
            receipt,
            customer: Some(payer),
        };
        let gate = Arc::new(ConfirmationGate::default());
        let (dismiss, dismissed) = watch::channel(false);
        let span = tracing::info_span!("gateway_payment", amount = minor, currency = %amount.currency);
        let task = tokio::spawn(
            run_gateway(
                self.api.clone(),
                token,
                request,
                self.confirmation_delay,
                tracker.clone(),
                gate.clone(),
                dismissed,
            )
            .instrument(span),
        );

        Ok(GatewayPayment {
            tracker,
            gate,
            dismiss,
            task,
        })
    }

    /// Place a cash-on-delivery order: `idle -> settled` in one request.
    ///
    /// # Errors
    ///
    /// Whatever [`OrderSubmitter::submit`] returns. Checks that fail before
    /// the request leave the payment `idle`.
    pub async fn initiate_cod_order(
        &mut self,
        submitter: &OrderSubmitter,
        shipping: &AddressInput,
    ) -> Result<OrderConfirmation> {
        let tracker = self.begin_attempt()?;
        let selection = PaymentSelection {
            method: Some(PaymentMethod::Cod),
            coupon: self.applied_coupon.clone(),
            reference: None,
        };
        let result = submitter.submit(shipping, &selection).await;
        settle(&tracker, &result);
        result
    }

    /// Place the order backed by a verified gateway payment.
    ///
    /// # Errors
    ///
    /// `Payment` if the current attempt is not verified, otherwise whatever
    /// [`OrderSubmitter::submit`] returns.
    pub async fn complete_gateway_order(
        &mut self,
        submitter: &OrderSubmitter,
        shipping: &AddressInput,
        receipt: &PaymentReceipt,
    ) -> Result<OrderConfirmation> {
        if self.tracker.state() != PaymentState::Verified {
            return Err(ClientError::Payment(
                "Payment has not been verified".to_string(),
            ));
        }
        let selection = PaymentSelection {
            method: Some(PaymentMethod::Gateway),
            coupon: self.applied_coupon.clone(),
            reference: Some(receipt.payment_id.clone()),
        };
        let result = submitter.submit(shipping, &selection).await;
        settle(&self.tracker, &result);
        result
    }

    /// A fresh tracker for a new attempt, unless one is still running.
    fn begin_attempt(&mut self) -> Result<PaymentTracker> {
        let state = self.tracker.state();
        if state != PaymentState::Idle && !state.is_terminal() {
            return Err(ClientError::SubmissionInProgress);
        }
        self.tracker = PaymentTracker::new();
        Ok(self.tracker.clone())
    }
}

fn settle(tracker: &PaymentTracker, result: &Result<OrderConfirmation>) {
    match result {
        Ok(_) => {
            tracker.advance(PaymentState::Settled);
        }
        Err(ClientError::Rejected { .. } | ClientError::Request { .. } | ClientError::Forbidden(_)) => {
            tracker.advance(PaymentState::Failed);
        }
        Err(_) => {}
    }
}

async fn run_gateway(
    api: Arc<dyn CommerceApi>,
    token: SecretString,
    request: CreatePaymentRequest,
    delay: Duration,
    tracker: PaymentTracker,
    gate: Arc<ConfirmationGate>,
    mut dismissed: watch::Receiver<bool>,
) -> PaymentOutcome {
    let order = match api.create_payment(&token, &request).await {
        Ok(order) => order,
        Err(e) => {
            gate.close();
            tracing::warn!(error = %e, "gateway order creation failed");
            tracker.advance(PaymentState::Failed);
            return PaymentOutcome::Failed(
                ClientError::from_api(e, "Failed to create payment order").to_string(),
            );
        }
    };
    tracker.advance(PaymentState::OrderCreated);
    tracing::info!(gateway_order = %order.order_id, "gateway order created");

    tracker.advance(PaymentState::AwaitingConfirmation);
    let confirmation = tokio::select! {
        biased;
        () = wait_dismissed(&mut dismissed) => {
            tracker.advance(PaymentState::Dismissed);
            tracing::info!(gateway_order = %order.order_id, "payment dismissed");
            return PaymentOutcome::Dismissed;
        }
        () = tokio::time::sleep(delay) => order.confirmation,
    };
    if !gate.close() {
        tracker.advance(PaymentState::Dismissed);
        tracing::info!(gateway_order = %order.order_id, "payment dismissed at confirmation");
        return PaymentOutcome::Dismissed;
    }

    match api.verify_payment(&token, &confirmation).await {
        Ok(receipt) => {
            tracker.advance(PaymentState::Verified);
            tracing::info!(payment_id = %receipt.payment_id, "payment verified");
            PaymentOutcome::Verified(receipt)
        }
        Err(e) => {
            tracing::warn!(error = %e, "payment verification failed");
            tracker.advance(PaymentState::Failed);
            PaymentOutcome::Failed(ClientError::from_api(e, PAYMENT_FAILED).to_string())
        }
    }
}

/// Resolves once dismissal is signalled. Never resolves if the handle is
/// dropped without dismissing.
async fn wait_dismissed(dismissed: &mut watch::Receiver<bool>) {
    if dismissed.wait_for(|d| *d).await.is_err() {
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use nevyra_core::CurrencyCode;

    use super::*;
    use crate::cart::CartStore;
    use crate::events::ChangeBus;
    use crate::storage::{KeyValueStore, MemoryStore};
    use crate::testing::{FakeApi, address_input, product, signed_in_storage};

    const DELAY: Duration = Duration::from_secs(3);

    fn initiator(api: &Arc<FakeApi>, storage: Arc<dyn KeyValueStore>) -> PaymentInitiator {
        let session = AuthSession::new(api.clone(), storage, ChangeBus::new());
        PaymentInitiator::new(api.clone(), session, DELAY)
    }

    fn amount() -> Money {
        Money::new(Decimal::from(231), CurrencyCode::INR)
    }

    fn payer() -> PayerDetails {
        PayerDetails::from(&address_input())
    }

    #[test]
    fn test_blank_coupon_is_a_field_error() {
        let api = FakeApi::new();
        let mut payment = initiator(&api, Arc::new(MemoryStore::new()));

        let err = payment.apply_coupon("   ").unwrap_err();

        assert_eq!(
            err.field_errors().unwrap().get(Field::Coupon),
            Some(EMPTY_COUPON)
        );
        assert_eq!(payment.field_errors().get(Field::Coupon), Some(EMPTY_COUPON));
        assert!(payment.applied_coupon().is_none());
    }

    #[test]
    fn test_coupon_is_idempotent() {
        let api = FakeApi::new();
        let mut payment = initiator(&api, Arc::new(MemoryStore::new()));

        payment.apply_coupon(" SAVE10 ").unwrap();
        let second = payment.apply_coupon("OTHER").unwrap();

        assert_eq!(second.as_str(), "SAVE10");
        assert_eq!(payment.applied_coupon().unwrap().as_str(), "SAVE10");

        payment.clear_coupon();
        assert!(payment.applied_coupon().is_none());
    }

    #[test]
    fn test_select_method_clears_error() {
        let api = FakeApi::new();
        let mut payment = initiator(&api, Arc::new(MemoryStore::new()));
        assert!(payment.require_method().is_err());
        assert!(payment.field_errors().get(Field::PaymentMethod).is_some());

        payment.select_method(PaymentMethod::Gateway);
        assert_eq!(payment.require_method().unwrap(), PaymentMethod::Gateway);
        assert!(payment.field_errors().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_gateway_success_after_create_and_verify() {
        let api = FakeApi::new();
        let mut payment = initiator(&api, signed_in_storage());

        let handle = payment
            .initiate_gateway_payment(amount(), payer(), None)
            .unwrap();
        let mut states = handle.subscribe();
        let outcome = handle.outcome().await;

        let PaymentOutcome::Verified(receipt) = outcome else {
            panic!("expected verified, got {outcome:?}");
        };
        assert_eq!(receipt.payment_id, "pay_1");
        assert_eq!(FakeApi::calls(&api.create_payment_calls), 1);
        assert_eq!(FakeApi::calls(&api.verify_calls), 1);
        assert_eq!(*states.borrow_and_update(), PaymentState::Verified);
        assert_eq!(payment.state(), PaymentState::Verified);
    }

    #[tokio::test(start_paused = true)]
    async fn test_confirmation_waits_for_delay() {
        let api = FakeApi::new();
        let mut payment = initiator(&api, signed_in_storage());

        let handle = payment
            .initiate_gateway_payment(amount(), payer(), None)
            .unwrap();
        let mut states = handle.subscribe();
        states
            .wait_for(|s| *s == PaymentState::AwaitingConfirmation)
            .await
            .unwrap();

        tokio::time::sleep(DELAY - Duration::from_millis(1)).await;
        assert_eq!(FakeApi::calls(&api.verify_calls), 0);

        assert!(matches!(handle.outcome().await, PaymentOutcome::Verified(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_forced_verification_failure() {
        let api = FakeApi::new();
        api.state.lock().fail_verify = true;
        let mut payment = initiator(&api, signed_in_storage());

        let handle = payment
            .initiate_gateway_payment(amount(), payer(), None)
            .unwrap();
        let outcome = handle.outcome().await;

        assert_eq!(
            outcome,
            PaymentOutcome::Failed("Payment verification failed".to_string())
        );
        assert_eq!(payment.state(), PaymentState::Failed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_creation_failure_fails_without_verify() {
        let api = FakeApi::new();
        api.state.lock().fail_create_payment = true;
        let mut payment = initiator(&api, signed_in_storage());

        let outcome = payment
            .initiate_gateway_payment(amount(), payer(), None)
            .unwrap()
            .outcome()
            .await;

        assert_eq!(
            outcome,
            PaymentOutcome::Failed("Payment provider unavailable".to_string())
        );
        assert_eq!(FakeApi::calls(&api.verify_calls), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dismiss_during_wait() {
        let api = FakeApi::new();
        let mut payment = initiator(&api, signed_in_storage());

        let handle = payment
            .initiate_gateway_payment(amount(), payer(), None)
            .unwrap();
        handle
            .subscribe()
            .wait_for(|s| *s == PaymentState::AwaitingConfirmation)
            .await
            .unwrap();

        assert!(handle.dismiss());
        let tracker = handle.tracker().clone();
        assert_eq!(handle.outcome().await, PaymentOutcome::Dismissed);

        tokio::time::sleep(DELAY * 2).await;
        assert_eq!(FakeApi::calls(&api.verify_calls), 0);
        assert_eq!(tracker.state(), PaymentState::Dismissed);
        assert!(!tracker.advance(PaymentState::Verified));
    }

    #[tokio::test(start_paused = true)]
    async fn test_dismiss_refused_once_verification_started() {
        let api = FakeApi::new();
        api.state.lock().verify_delay = Duration::from_secs(1);
        let mut payment = initiator(&api, signed_in_storage());

        let handle = payment
            .initiate_gateway_payment(amount(), payer(), None)
            .unwrap();
        handle
            .subscribe()
            .wait_for(|s| *s == PaymentState::AwaitingConfirmation)
            .await
            .unwrap();
        tokio::time::sleep(DELAY + Duration::from_millis(10)).await;
        assert_eq!(FakeApi::calls(&api.verify_calls), 1);

        assert!(!handle.dismiss());
        assert!(matches!(handle.outcome().await, PaymentOutcome::Verified(_)));
        assert_eq!(payment.state(), PaymentState::Verified);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dismiss_after_failure_is_refused() {
        let api = FakeApi::new();
        api.state.lock().fail_create_payment = true;
        let mut payment = initiator(&api, signed_in_storage());

        let handle = payment
            .initiate_gateway_payment(amount(), payer(), None)
            .unwrap();
        handle
            .subscribe()
            .wait_for(|s| *s == PaymentState::Failed)
            .await
            .unwrap();

        assert!(!handle.dismiss());
        assert!(matches!(handle.outcome().await, PaymentOutcome::Failed(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_attempt_while_running_is_rejected() {
        let api = FakeApi::new();
        let mut payment = initiator(&api, signed_in_storage());

        let handle = payment
            .initiate_gateway_payment(amount(), payer(), None)
            .unwrap();
        handle
            .subscribe()
            .wait_for(|s| *s == PaymentState::AwaitingConfirmation)
            .await
            .unwrap();

        assert!(matches!(
            payment.initiate_gateway_payment(amount(), payer(), None),
            Err(ClientError::SubmissionInProgress)
        ));
        handle.outcome().await;
    }

    #[tokio::test]
    async fn test_gateway_requires_login_and_positive_amount() {
        let api = FakeApi::new();
        let mut signed_out = initiator(&api, Arc::new(MemoryStore::new()));
        assert!(
            signed_out
                .initiate_gateway_payment(amount(), payer(), None)
                .unwrap_err()
                .requires_login()
        );

        let mut payment = initiator(&api, signed_in_storage());
        let err = payment
            .initiate_gateway_payment(Money::zero(CurrencyCode::INR), payer(), None)
            .unwrap_err();
        assert!(matches!(err, ClientError::Payment(_)));
        assert_eq!(FakeApi::calls(&api.create_payment_calls), 0);
    }

    #[tokio::test]
    async fn test_cod_settles_in_one_request() {
        let api = FakeApi::with_products(vec![product("p1", 100, "medical")]);
        let storage = signed_in_storage();
        let bus = ChangeBus::new();
        let session = AuthSession::new(api.clone(), storage.clone(), bus.clone());
        let cart = CartStore::new(storage.clone(), bus);
        cart.add("p1", 2).unwrap();
        let submitter = OrderSubmitter::new(api.clone(), session, cart.clone());
        let mut payment = initiator(&api, storage);
        payment.apply_coupon("WELCOME").unwrap();

        let confirmation = payment
            .initiate_cod_order(&submitter, &address_input())
            .await
            .unwrap();

        assert_eq!(confirmation.total.amount, Decimal::from(231));
        assert_eq!(payment.state(), PaymentState::Settled);
        assert!(cart.get().is_empty());
        let sent = api.state.lock().last_order_request.clone().unwrap();
        assert_eq!(sent.payment.coupon.unwrap().as_str(), "WELCOME");
        assert_eq!(FakeApi::calls(&api.create_payment_calls), 0);
    }
}
