//! Simulated payment gateway.
//!
//! `create` opens a gateway order and hands back the confirmation a real
//! provider would deliver after checkout: ids signed with
//! HMAC-SHA256 over `"{order_id}|{payment_id}"`. `verify` checks that
//! signature and marks the payment verified, after which one order may
//! consume it.

use chrono::Utc;
use hmac::{Hmac, Mac};
use rand::Rng;
use rand::distr::Alphanumeric;
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use thiserror::Error;

use nevyra_core::api::{CreatePaymentRequest, GatewayConfirmation, GatewayOrder, PaymentReceipt};
use nevyra_core::{PaymentStatus, UserId};

use crate::db::payments::PaymentRepository;
use crate::db::{Database, RepositoryError};
use crate::models::PaymentRecord;

type HmacSha256 = Hmac<Sha256>;

/// Errors from the mock gateway.
#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("Amount must be greater than zero")]
    InvalidAmount,

    #[error("Payment verification failed")]
    VerificationFailed,

    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Signs and checks gateway confirmations.
#[derive(Clone)]
pub struct PaymentSigner {
    key: SecretString,
}

impl PaymentSigner {
    #[must_use]
    pub const fn new(key: SecretString) -> Self {
        Self { key }
    }

    fn mac(&self, order_id: &str, payment_id: &str) -> HmacSha256 {
        let mut mac = HmacSha256::new_from_slice(self.key.expose_secret().as_bytes())
            .expect("HMAC accepts keys of any length");
        mac.update(order_id.as_bytes());
        mac.update(b"|");
        mac.update(payment_id.as_bytes());
        mac
    }

    /// Hex signature of a gateway order / payment pair.
    #[must_use]
    pub fn sign(&self, order_id: &str, payment_id: &str) -> String {
        hex::encode(self.mac(order_id, payment_id).finalize().into_bytes())
    }

    /// Constant-time check of a confirmation's signature.
    #[must_use]
    pub fn verify(&self, confirmation: &GatewayConfirmation) -> bool {
        let Ok(signature) = hex::decode(confirmation.signature.trim()) else {
            return false;
        };
        self.mac(&confirmation.order_id, &confirmation.payment_id)
            .verify_slice(&signature)
            .is_ok()
    }
}

impl std::fmt::Debug for PaymentSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentSigner")
            .field("key", &"[REDACTED]")
            .finish()
    }
}

/// The gateway over the payment collection.
pub struct MockGateway<'a> {
    payments: PaymentRepository<'a>,
    signer: &'a PaymentSigner,
}

impl<'a> MockGateway<'a> {
    #[must_use]
    pub const fn new(db: &'a Database, signer: &'a PaymentSigner) -> Self {
        Self {
            payments: PaymentRepository::new(db),
            signer,
        }
    }

    /// Open a gateway order for `request.amount` minor units.
    ///
    /// # Errors
    ///
    /// Returns `PaymentError::InvalidAmount` for non-positive amounts.
    pub async fn create(
        &self,
        user_id: UserId,
        request: &CreatePaymentRequest,
    ) -> Result<GatewayOrder, PaymentError> {
        if request.amount <= 0 {
            return Err(PaymentError::InvalidAmount);
        }

        let order_id = format!(
            "order_{}_{}",
            Utc::now().timestamp_millis(),
            random_suffix(9)
        );
        let payment_id = format!("pay_{}", random_suffix(14));
        let receipt = request
            .receipt
            .clone()
            .filter(|r| !r.trim().is_empty())
            .unwrap_or_else(|| format!("receipt_{}", Utc::now().timestamp_millis()));
        let signature = self.signer.sign(&order_id, &payment_id);

        let record = PaymentRecord {
            order_id: order_id.clone(),
            payment_id: payment_id.clone(),
            user_id,
            amount: request.amount,
            currency: request.currency,
            receipt: receipt.clone(),
            status: PaymentStatus::Created,
            created_at: Utc::now(),
        };
        self.payments.insert(record).await;
        tracing::info!(%order_id, amount = request.amount, "Mock gateway order created");

        Ok(GatewayOrder {
            order_id: order_id.clone(),
            amount: request.amount,
            currency: request.currency,
            receipt,
            status: PaymentStatus::Created,
            confirmation: GatewayConfirmation {
                order_id,
                payment_id,
                signature,
            },
        })
    }

    /// Check a confirmation and mark its payment verified.
    ///
    /// # Errors
    ///
    /// Returns `PaymentError::VerificationFailed` if the signature is wrong,
    /// the payment id does not belong to the gateway order, or the user has
    /// no such gateway order.
    pub async fn verify(
        &self,
        user_id: UserId,
        confirmation: &GatewayConfirmation,
    ) -> Result<PaymentReceipt, PaymentError> {
        if !self.signer.verify(confirmation) {
            tracing::warn!(order_id = %confirmation.order_id, "Payment signature mismatch");
            return Err(PaymentError::VerificationFailed);
        }

        let payment = self
            .payments
            .get(user_id, &confirmation.order_id)
            .await
            .filter(|p| p.payment_id == confirmation.payment_id)
            .ok_or(PaymentError::VerificationFailed)?;

        let payment = self.payments.mark_verified(user_id, &payment.order_id).await?;
        tracing::info!(order_id = %payment.order_id, "Mock payment verified");
        Ok(payment.receipt())
    }
}

fn random_suffix(len: usize) -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use nevyra_core::CurrencyCode;

    use super::*;

    fn signer() -> PaymentSigner {
        PaymentSigner::new(SecretString::from("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6%"))
    }

    fn request(amount: i64) -> CreatePaymentRequest {
        CreatePaymentRequest {
            amount,
            currency: CurrencyCode::INR,
            receipt: Some("rcpt_1".to_string()),
            customer: None,
        }
    }

    #[test]
    fn test_signature_binds_both_ids() {
        let signer = signer();
        let signature = signer.sign("order_1", "pay_1");
        assert_eq!(signature.len(), 64);

        let good = GatewayConfirmation {
            order_id: "order_1".into(),
            payment_id: "pay_1".into(),
            signature: signature.clone(),
        };
        assert!(signer.verify(&good));

        let swapped = GatewayConfirmation {
            payment_id: "pay_2".into(),
            ..good.clone()
        };
        assert!(!signer.verify(&swapped));

        let garbage = GatewayConfirmation {
            signature: "not hex".into(),
            ..good
        };
        assert!(!signer.verify(&garbage));
    }

    #[test]
    fn test_debug_redacts_key() {
        assert!(!format!("{:?}", signer()).contains("aB3$"));
    }

    #[tokio::test]
    async fn test_create_then_verify() {
        let db = Database::new();
        let signer = signer();
        let gateway = MockGateway::new(&db, &signer);
        let user = UserId::generate();

        let order = gateway.create(user, &request(23_100)).await.unwrap();
        assert!(order.order_id.starts_with("order_"));
        assert!(order.confirmation.payment_id.starts_with("pay_"));
        assert_eq!(order.receipt, "rcpt_1");

        let receipt = gateway.verify(user, &order.confirmation).await.unwrap();
        assert_eq!(receipt.status, PaymentStatus::Verified);
        assert_eq!(receipt.amount, 23_100);
    }

    #[tokio::test]
    async fn test_rejections() {
        let db = Database::new();
        let signer = signer();
        let gateway = MockGateway::new(&db, &signer);
        let user = UserId::generate();

        assert!(matches!(
            gateway.create(user, &request(0)).await,
            Err(PaymentError::InvalidAmount)
        ));

        let order = gateway.create(user, &request(500)).await.unwrap();
        let mut tampered = order.confirmation.clone();
        tampered.signature = signer.sign(&tampered.order_id, "pay_other");
        assert!(matches!(
            gateway.verify(user, &tampered).await,
            Err(PaymentError::VerificationFailed)
        ));

        assert!(matches!(
            gateway.verify(UserId::generate(), &order.confirmation).await,
            Err(PaymentError::VerificationFailed)
        ));
    }
}
