//! Mock gateway payment repository.

use nevyra_core::{PaymentStatus, UserId};

use super::{Database, RepositoryError};
use crate::models::PaymentRecord;

pub struct PaymentRepository<'a> {
    db: &'a Database,
}

impl<'a> PaymentRepository<'a> {
    #[must_use]
    pub const fn new(db: &'a Database) -> Self {
        Self { db }
    }

    pub async fn insert(&self, record: PaymentRecord) {
        self.db
            .write()
            .await
            .payments
            .insert(record.order_id.clone(), record);
    }

    /// A gateway order owned by `user_id`.
    pub async fn get(&self, user_id: UserId, order_id: &str) -> Option<PaymentRecord> {
        self.db
            .read()
            .await
            .payments
            .get(order_id)
            .filter(|p| p.user_id == user_id)
            .cloned()
    }

    /// Move a created payment to `verified`. Verified and consumed payments
    /// are returned unchanged.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user has no such payment.
    pub async fn mark_verified(
        &self,
        user_id: UserId,
        order_id: &str,
    ) -> Result<PaymentRecord, RepositoryError> {
        let mut collections = self.db.write().await;
        let payment = collections
            .payments
            .get_mut(order_id)
            .filter(|p| p.user_id == user_id)
            .ok_or(RepositoryError::NotFound("Payment"))?;

        if payment.status == PaymentStatus::Created {
            payment.status = PaymentStatus::Verified;
        }
        Ok(payment.clone())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use nevyra_core::CurrencyCode;

    use super::*;

    fn record(user_id: UserId) -> PaymentRecord {
        PaymentRecord {
            order_id: "order_1".into(),
            payment_id: "pay_1".into(),
            user_id,
            amount: 23_100,
            currency: CurrencyCode::INR,
            receipt: "rcpt_1".into(),
            status: PaymentStatus::Created,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_verify_is_owner_scoped() {
        let db = Database::new();
        let repo = PaymentRepository::new(&db);
        let owner = UserId::generate();
        repo.insert(record(owner)).await;

        assert!(repo.get(UserId::generate(), "order_1").await.is_none());
        let err = repo
            .mark_verified(UserId::generate(), "order_1")
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound("Payment")));

        let verified = repo.mark_verified(owner, "order_1").await.unwrap();
        assert_eq!(verified.status, PaymentStatus::Verified);
    }
}
