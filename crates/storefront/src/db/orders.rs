//! Order repository.

use uuid::Uuid;

use nevyra_core::api::OrderRecord;
use nevyra_core::{OrderId, OrderStatus, PaymentMethod, PaymentStatus, UserId};

use super::{Collections, Database, RepositoryError};
use crate::models::StoredOrder;

/// Result of [`OrderRepository::place`].
#[derive(Debug, Clone)]
pub enum Placement {
    /// A new order was stored.
    Created(OrderRecord),
    /// The idempotency key was seen before; this is the earlier order.
    Replayed(OrderRecord),
}

impl Placement {
    #[must_use]
    pub fn into_record(self) -> OrderRecord {
        match self {
            Self::Created(record) | Self::Replayed(record) => record,
        }
    }
}

pub struct OrderRepository<'a> {
    db: &'a Database,
}

impl<'a> OrderRepository<'a> {
    #[must_use]
    pub const fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Store a priced order.
    ///
    /// With an idempotency key already used by this user, the earlier order
    /// is returned and nothing is written. Gateway orders consume the
    /// verified payment named by `payment.reference`, whose amount must
    /// equal the order total.
    ///
    /// # Errors
    ///
    /// - `NotFound("Payment")` for an unknown payment reference
    /// - `Precondition` for a missing reference, an unverified payment or an
    ///   amount mismatch
    /// - `Conflict` if the payment already backs another order
    pub async fn place(
        &self,
        user_id: UserId,
        idempotency_key: Option<Uuid>,
        record: OrderRecord,
    ) -> Result<Placement, RepositoryError> {
        let mut collections = self.db.write().await;

        if let Some(key) = idempotency_key
            && let Some(existing) = collections
                .idempotency
                .get(&(user_id, key))
                .and_then(|id| find(&collections, user_id, *id))
        {
            return Ok(Placement::Replayed(existing.record.clone()));
        }

        if record.payment.method == PaymentMethod::Gateway {
            consume_payment(&mut collections, user_id, &record)?;
        }

        if let Some(key) = idempotency_key {
            collections.idempotency.insert((user_id, key), record.id);
        }
        collections.orders.push(StoredOrder {
            user_id,
            record: record.clone(),
        });
        Ok(Placement::Created(record))
    }

    /// The user's orders, newest first.
    pub async fn list_for_user(&self, user_id: UserId) -> Vec<OrderRecord> {
        self.db
            .read()
            .await
            .orders
            .iter()
            .rev()
            .filter(|o| o.user_id == user_id)
            .map(|o| o.record.clone())
            .collect()
    }

    /// Every order, newest first.
    pub async fn list_all(&self) -> Vec<StoredOrder> {
        self.db.read().await.orders.iter().rev().cloned().collect()
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user has no such order.
    pub async fn get(&self, user_id: UserId, id: OrderId) -> Result<OrderRecord, RepositoryError> {
        find(&*self.db.read().await, user_id, id)
            .map(|o| o.record.clone())
            .ok_or(RepositoryError::NotFound("Order"))
    }

    /// Cancel a pending or confirmed order.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown order and `Conflict` once it has
    /// shipped, been delivered or already been cancelled.
    pub async fn cancel(
        &self,
        user_id: UserId,
        id: OrderId,
    ) -> Result<OrderRecord, RepositoryError> {
        let mut collections = self.db.write().await;
        let order = collections
            .orders
            .iter_mut()
            .find(|o| o.user_id == user_id && o.record.id == id)
            .ok_or(RepositoryError::NotFound("Order"))?;

        if !order.record.status.is_cancellable() {
            return Err(RepositoryError::Conflict(
                "Order can no longer be cancelled".to_string(),
            ));
        }
        order.record.status = OrderStatus::Cancelled;
        Ok(order.record.clone())
    }
}

fn find(collections: &Collections, user_id: UserId, id: OrderId) -> Option<&StoredOrder> {
    collections
        .orders
        .iter()
        .find(|o| o.user_id == user_id && o.record.id == id)
}

fn consume_payment(
    collections: &mut Collections,
    user_id: UserId,
    record: &OrderRecord,
) -> Result<(), RepositoryError> {
    let reference = record
        .payment
        .reference
        .as_deref()
        .ok_or_else(|| RepositoryError::Precondition("Payment reference is required".into()))?;

    let payment = collections
        .payments
        .values_mut()
        .find(|p| p.payment_id == reference && p.user_id == user_id)
        .ok_or(RepositoryError::NotFound("Payment"))?;

    match payment.status {
        PaymentStatus::Created => {
            return Err(RepositoryError::Precondition(
                "Payment has not been verified".into(),
            ));
        }
        PaymentStatus::Consumed => {
            return Err(RepositoryError::Conflict(
                "Payment has already been used".into(),
            ));
        }
        PaymentStatus::Verified => {}
    }

    if payment.currency != record.totals.currency {
        return Err(RepositoryError::Precondition(
            "Payment currency does not match order currency".into(),
        ));
    }
    if record.totals.total_money().minor_units() != Some(payment.amount) {
        return Err(RepositoryError::Precondition(
            "Payment amount does not match order total".into(),
        ));
    }

    payment.status = PaymentStatus::Consumed;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use rust_decimal::Decimal;

    use nevyra_core::api::PaymentDetails;
    use nevyra_core::{AddressInput, CurrencyCode, OrderLine, OrderTotals, ProductId};

    use super::*;
    use crate::db::payments::PaymentRepository;
    use crate::models::PaymentRecord;

    fn order(method: PaymentMethod, reference: Option<&str>) -> OrderRecord {
        let lines = vec![OrderLine {
            product_id: ProductId::new("p1"),
            title: "P1".into(),
            unit_price: Decimal::from(100),
            quantity: 2,
        }];
        OrderRecord {
            id: OrderId::generate(),
            status: OrderStatus::Pending,
            payment: PaymentDetails {
                method,
                coupon: None,
                reference: reference.map(str::to_string),
            },
            shipping: AddressInput::default(),
            totals: OrderTotals::compute(&lines, CurrencyCode::INR),
            lines,
            created_at: Utc::now(),
        }
    }

    async fn verified_payment(db: &Database, user_id: UserId, amount: i64, currency: CurrencyCode) {
        let payments = PaymentRepository::new(db);
        payments
            .insert(PaymentRecord {
                order_id: "order_1".into(),
                payment_id: "pay_1".into(),
                user_id,
                amount,
                currency,
                receipt: "rcpt_1".into(),
                status: PaymentStatus::Created,
                created_at: Utc::now(),
            })
            .await;
        payments.mark_verified(user_id, "order_1").await.unwrap();
    }

    #[tokio::test]
    async fn test_idempotent_replay() {
        let db = Database::new();
        let repo = OrderRepository::new(&db);
        let user = UserId::generate();
        let key = Uuid::new_v4();

        let first = repo
            .place(user, Some(key), order(PaymentMethod::Cod, None))
            .await
            .unwrap();
        let second = repo
            .place(user, Some(key), order(PaymentMethod::Cod, None))
            .await
            .unwrap();

        assert!(matches!(first, Placement::Created(_)));
        assert!(matches!(second, Placement::Replayed(_)));
        assert_eq!(first.into_record().id, second.into_record().id);
        assert_eq!(repo.list_for_user(user).await.len(), 1);
    }

    #[tokio::test]
    async fn test_gateway_consumes_verified_payment_once() {
        let db = Database::new();
        let repo = OrderRepository::new(&db);
        let user = UserId::generate();
        verified_payment(&db, user, 23_100, CurrencyCode::INR).await;

        repo.place(user, None, order(PaymentMethod::Gateway, Some("pay_1")))
            .await
            .unwrap();
        let err = repo
            .place(user, None, order(PaymentMethod::Gateway, Some("pay_1")))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_gateway_amount_must_match() {
        let db = Database::new();
        let repo = OrderRepository::new(&db);
        let user = UserId::generate();
        verified_payment(&db, user, 100, CurrencyCode::INR).await;

        let err = repo
            .place(user, None, order(PaymentMethod::Gateway, Some("pay_1")))
            .await
            .unwrap_err();
        assert!(
            matches!(err, RepositoryError::Precondition(ref m) if m.contains("does not match"))
        );
        assert!(repo.list_for_user(user).await.is_empty());
    }

    #[tokio::test]
    async fn test_gateway_currency_must_match() {
        let db = Database::new();
        let repo = OrderRepository::new(&db);
        let user = UserId::generate();
        verified_payment(&db, user, 23_100, CurrencyCode::USD).await;

        let err = repo
            .place(user, None, order(PaymentMethod::Gateway, Some("pay_1")))
            .await
            .unwrap_err();
        assert!(
            matches!(err, RepositoryError::Precondition(ref m) if m.contains("currency"))
        );
        assert!(repo.list_for_user(user).await.is_empty());
    }

    #[tokio::test]
    async fn test_gateway_without_reference() {
        let db = Database::new();
        let err = OrderRepository::new(&db)
            .place(UserId::generate(), None, order(PaymentMethod::Gateway, None))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Precondition(_)));
    }

    #[tokio::test]
    async fn test_cancel_twice_conflicts() {
        let db = Database::new();
        let repo = OrderRepository::new(&db);
        let user = UserId::generate();
        let placed = repo
            .place(user, None, order(PaymentMethod::Cod, None))
            .await
            .unwrap()
            .into_record();

        let cancelled = repo.cancel(user, placed.id).await.unwrap();
        assert_eq!(cancelled.status, OrderStatus::Cancelled);
        assert!(matches!(
            repo.cancel(user, placed.id).await.unwrap_err(),
            RepositoryError::Conflict(_)
        ));
        assert!(matches!(
            repo.get(UserId::generate(), placed.id).await.unwrap_err(),
            RepositoryError::NotFound("Order")
        ));
    }
}
