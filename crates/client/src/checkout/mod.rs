//! Checkout: address, summary, payment.
//!
//! [`CheckoutSession`] drives the three steps over the stores:
//!
//! ```text
//! Cart -> Address -> Summary -> Payment -> Order -> Cart (cleared)
//! ```
//!
//! - [`AddressManager`] - saved shipping addresses
//! - [`PaymentInitiator`] - coupon, method and the gateway flow
//! - [`OrderSubmitter`] - the order request itself

mod address;
mod order;
mod payment;

pub use address::AddressManager;
pub use order::{OrderConfirmation, OrderHistory, OrderSubmitter, PaymentSelection};
pub use payment::{GatewayPayment, PaymentInitiator, PaymentOutcome, PaymentTracker};

use rust_decimal::Decimal;

use nevyra_core::api::{PayerDetails, PaymentReceipt};
use nevyra_core::{
    Address, AddressId, AddressInput, CouponCode, CurrencyCode, Money, OrderLine, OrderTotals,
    PaymentMethod,
};

use crate::cart::CartStore;
use crate::catalog::Catalog;
use crate::error::{ClientError, Result};

/// Where the shopper is in checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CheckoutStep {
    #[default]
    Address,
    Summary,
    Payment,
}

/// Priced cart for the summary step.
///
/// `totals.total` is what the order costs. The coupon discount only changes
/// what is displayed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderSummary {
    pub lines: Vec<OrderLine>,
    pub totals: OrderTotals,
    pub coupon: Option<CouponCode>,
    pub coupon_discount: Decimal,
}

impl OrderSummary {
    #[must_use]
    pub fn new(lines: Vec<OrderLine>, totals: OrderTotals, coupon: Option<CouponCode>) -> Self {
        let coupon_discount = if coupon.is_some() {
            totals.coupon_discount()
        } else {
            Decimal::ZERO
        };
        Self {
            lines,
            totals,
            coupon,
            coupon_discount,
        }
    }

    /// Total shown to the shopper, after the coupon discount.
    #[must_use]
    pub fn display_total(&self) -> Money {
        Money::new(self.totals.total - self.coupon_discount, self.totals.currency)
    }
}

/// One pass through checkout.
pub struct CheckoutSession {
    step: CheckoutStep,
    currency: CurrencyCode,
    addresses: AddressManager,
    catalog: Catalog,
    cart: CartStore,
    submitter: OrderSubmitter,
    payment: PaymentInitiator,
    saved: Vec<Address>,
    selected: Option<AddressId>,
}

impl CheckoutSession {
    #[must_use]
    pub fn new(
        addresses: AddressManager,
        catalog: Catalog,
        cart: CartStore,
        submitter: OrderSubmitter,
        payment: PaymentInitiator,
        currency: CurrencyCode,
    ) -> Self {
        Self {
            step: CheckoutStep::Address,
            currency,
            addresses,
            catalog,
            cart,
            submitter,
            payment,
            saved: Vec::new(),
            selected: None,
        }
    }

    #[must_use]
    pub const fn step(&self) -> CheckoutStep {
        self.step
    }

    // -------------------------------------------------------------------------
    // Address step
    // -------------------------------------------------------------------------

    /// Fetch saved addresses and preselect the default (or the first).
    ///
    /// # Errors
    ///
    /// Returns `Unauthenticated` when signed out.
    pub async fn load_addresses(&mut self) -> Result<&[Address]> {
        let list = self.addresses.list().await?;
        self.replace_saved(list);
        Ok(&self.saved)
    }

    #[must_use]
    pub fn addresses(&self) -> &[Address] {
        &self.saved
    }

    /// # Errors
    ///
    /// Returns `MissingAddress` for an id that is not in the loaded list.
    pub fn select_address(&mut self, id: AddressId) -> Result<()> {
        if !self.saved.iter().any(|a| a.id == id) {
            return Err(ClientError::MissingAddress);
        }
        self.selected = Some(id);
        Ok(())
    }

    #[must_use]
    pub fn selected_address(&self) -> Option<&Address> {
        let id = self.selected?;
        self.saved.iter().find(|a| a.id == id)
    }

    /// Save a new address and select it.
    ///
    /// # Errors
    ///
    /// See [`AddressManager::add`].
    pub async fn add_address(&mut self, input: &AddressInput) -> Result<&Address> {
        let previous: Vec<AddressId> = self.saved.iter().map(|a| a.id).collect();
        let list = self.addresses.add(input).await?;
        let created = list.iter().find(|a| !previous.contains(&a.id)).map(|a| a.id);
        self.replace_saved(list);
        if created.is_some() {
            self.selected = created;
        }
        self.selected_address().ok_or(ClientError::MissingAddress)
    }

    /// # Errors
    ///
    /// See [`AddressManager::update`].
    pub async fn update_address(&mut self, id: AddressId, input: &AddressInput) -> Result<()> {
        let list = self.addresses.update(id, input).await?;
        self.replace_saved(list);
        Ok(())
    }

    /// # Errors
    ///
    /// See [`AddressManager::delete`].
    pub async fn delete_address(&mut self, id: AddressId) -> Result<()> {
        let list = self.addresses.delete(id).await?;
        if self.selected == Some(id) {
            self.selected = None;
        }
        self.replace_saved(list);
        Ok(())
    }

    /// # Errors
    ///
    /// See [`AddressManager::set_default`].
    pub async fn set_default_address(&mut self, id: AddressId) -> Result<()> {
        let list = self.addresses.set_default(id).await?;
        self.replace_saved(list);
        Ok(())
    }

    fn replace_saved(&mut self, list: Vec<Address>) {
        self.saved = list;
        let still_there = self
            .selected
            .is_some_and(|id| self.saved.iter().any(|a| a.id == id));
        if !still_there {
            self.selected = self
                .saved
                .iter()
                .find(|a| a.is_default)
                .or_else(|| self.saved.first())
                .map(|a| a.id);
        }
    }

    /// Move to the summary.
    ///
    /// # Errors
    ///
    /// Returns `MissingAddress` when no address is selected.
    pub fn continue_to_summary(&mut self) -> Result<()> {
        if self.selected_address().is_none() {
            return Err(ClientError::MissingAddress);
        }
        self.step = CheckoutStep::Summary;
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Summary step
    // -------------------------------------------------------------------------

    /// Price the current cart, with the discount for the applied coupon.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` if the catalog cannot be fetched.
    pub async fn summary(&self) -> Result<OrderSummary> {
        let entries = self.cart.entries();
        let lines = self.catalog.price_lines(&entries).await?;
        let totals = OrderTotals::compute(&lines, self.currency);
        Ok(OrderSummary::new(
            lines,
            totals,
            self.payment.applied_coupon().cloned(),
        ))
    }

    /// Move to payment.
    ///
    /// # Errors
    ///
    /// Returns `MissingAddress` or `EmptyCart`.
    pub fn continue_to_payment(&mut self) -> Result<()> {
        if self.selected_address().is_none() {
            return Err(ClientError::MissingAddress);
        }
        if self.cart.get().is_empty() {
            return Err(ClientError::EmptyCart);
        }
        self.step = CheckoutStep::Payment;
        Ok(())
    }

    /// Go back one step.
    pub fn back(&mut self) {
        self.step = match self.step {
            CheckoutStep::Address | CheckoutStep::Summary => CheckoutStep::Address,
            CheckoutStep::Payment => CheckoutStep::Summary,
        };
    }

    // -------------------------------------------------------------------------
    // Payment step
    // -------------------------------------------------------------------------

    #[must_use]
    pub const fn payment(&self) -> &PaymentInitiator {
        &self.payment
    }

    pub const fn payment_mut(&mut self) -> &mut PaymentInitiator {
        &mut self.payment
    }

    /// Whether an order request is running.
    #[must_use]
    pub fn is_submitting(&self) -> bool {
        self.submitter.is_submitting()
    }

    /// Place the order with the selected method. For the gateway this runs
    /// the whole payment, waiting out the confirmation.
    ///
    /// # Errors
    ///
    /// `MissingAddress`, `MissingPaymentMethod`, payment failures, or the
    /// submitter's errors. The cart is untouched on every failure.
    pub async fn place_order(&mut self) -> Result<OrderConfirmation> {
        let shipping = self.shipping()?;
        match self.payment.require_method()? {
            PaymentMethod::Cod => {
                self.payment
                    .initiate_cod_order(&self.submitter, &shipping)
                    .await
            }
            PaymentMethod::Gateway => {
                let receipt = self.start_gateway_payment().await?.outcome().await.into_result()?;
                self.complete_gateway_payment(&receipt).await
            }
        }
    }

    /// Start the gateway payment for the summary total and hand back the
    /// handle.
    ///
    /// # Errors
    ///
    /// `MissingAddress`, `EmptyCart`, `Unauthenticated`, or
    /// `SubmissionInProgress` while another attempt runs.
    pub async fn start_gateway_payment(&mut self) -> Result<GatewayPayment> {
        let shipping = self.shipping()?;
        if self.cart.get().is_empty() {
            return Err(ClientError::EmptyCart);
        }
        let summary = self.summary().await?;
        self.payment.select_method(PaymentMethod::Gateway);
        self.payment.initiate_gateway_payment(
            summary.totals.total_money(),
            PayerDetails::from(&shipping),
            Some(format!("rcpt_{}", uuid::Uuid::new_v4().simple())),
        )
    }

    /// Submit the order for a verified gateway payment.
    ///
    /// # Errors
    ///
    /// See [`PaymentInitiator::complete_gateway_order`].
    pub async fn complete_gateway_payment(
        &mut self,
        receipt: &PaymentReceipt,
    ) -> Result<OrderConfirmation> {
        let shipping = self.shipping()?;
        self.payment
            .complete_gateway_order(&self.submitter, &shipping, receipt)
            .await
    }

    fn shipping(&self) -> Result<AddressInput> {
        self.selected_address()
            .map(|a| a.details.clone())
            .ok_or(ClientError::MissingAddress)
    }
}
