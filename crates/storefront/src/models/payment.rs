//! Mock gateway payment records.

use chrono::{DateTime, Utc};

use nevyra_core::api::PaymentReceipt;
use nevyra_core::{CurrencyCode, PaymentStatus, UserId};

/// A gateway order created by `create-mock-order`.
///
/// Moves `created -> verified -> consumed`; a consumed payment backs
/// exactly one order.
#[derive(Debug, Clone)]
pub struct PaymentRecord {
    pub order_id: String,
    pub payment_id: String,
    pub user_id: UserId,
    /// Minor units.
    pub amount: i64,
    pub currency: CurrencyCode,
    pub receipt: String,
    pub status: PaymentStatus,
    pub created_at: DateTime<Utc>,
}

impl PaymentRecord {
    #[must_use]
    pub fn receipt(&self) -> PaymentReceipt {
        PaymentReceipt {
            order_id: self.order_id.clone(),
            payment_id: self.payment_id.clone(),
            amount: self.amount,
            currency: self.currency,
            status: self.status,
        }
    }
}
