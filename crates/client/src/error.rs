//! Client error type.
//!
//! Validation problems are caught locally and never reach the network.
//! Server rejections keep the backend's own message so it can be shown
//! verbatim; transport failures collapse into one user-facing message per
//! action. Nothing here is retried automatically.

use nevyra_core::FieldErrors;
use thiserror::Error;

use crate::api::ApiError;
use crate::storage::StorageError;

/// Errors surfaced by client stores and the checkout workflow.
#[derive(Debug, Error)]
pub enum ClientError {
    /// One or more form fields are invalid.
    #[error("{0}")]
    Validation(FieldErrors),

    /// No token is stored, or the backend rejected it. Callers send the
    /// user to login.
    #[error("Please log in to continue")]
    Unauthenticated,

    /// The backend answered with an error message.
    #[error("{message}")]
    Rejected { status: u16, message: String },

    /// The request never produced an answer (network, timeout, bad body).
    #[error("{context}")]
    Request {
        context: &'static str,
        #[source]
        source: ApiError,
    },

    /// Local storage could not be written.
    #[error("Could not save local data: {0}")]
    Storage(#[from] StorageError),

    #[error("Your cart is empty")]
    EmptyCart,

    #[error("Please select a shipping address")]
    MissingAddress,

    #[error("Please select a payment method")]
    MissingPaymentMethod,

    /// An order submission is already in flight for this checkout.
    #[error("Your order is already being placed")]
    SubmissionInProgress,

    /// The gateway payment failed; the message is user-facing.
    #[error("{0}")]
    Payment(String),

    /// The shopper closed the payment before it was confirmed.
    #[error("Payment was cancelled")]
    PaymentDismissed,

    /// Not permitted for this account.
    #[error("{0}")]
    Forbidden(String),
}

impl ClientError {
    /// Classify an API failure for a user action described by `context`.
    pub(crate) fn from_api(err: ApiError, context: &'static str) -> Self {
        match err {
            ApiError::Unauthorized(_) => Self::Unauthenticated,
            ApiError::Api { status: 403, message } => Self::Forbidden(message),
            ApiError::Api { status, message } => Self::Rejected { status, message },
            source => Self::Request { context, source },
        }
    }

    /// Whether the caller should send the user to the login screen.
    #[must_use]
    pub const fn requires_login(&self) -> bool {
        matches!(self, Self::Unauthenticated)
    }

    /// Per-field errors, when this is a validation failure.
    #[must_use]
    pub const fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            Self::Validation(errors) => Some(errors),
            _ => None,
        }
    }
}

/// Result type alias for `ClientError`.
pub type Result<T> = std::result::Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;
    use nevyra_core::Field;

    #[test]
    fn test_server_message_is_kept_verbatim() {
        let err = ClientError::from_api(
            ApiError::Api {
                status: 404,
                message: "Address not found".to_string(),
            },
            "Failed to update address",
        );
        assert_eq!(err.to_string(), "Address not found");
    }

    #[test]
    fn test_transport_failure_uses_context() {
        let err = ClientError::from_api(
            ApiError::Parse("eof".to_string()),
            "Order failed. Please try again.",
        );
        assert_eq!(err.to_string(), "Order failed. Please try again.");
    }

    #[test]
    fn test_unauthorized_requires_login() {
        let err = ClientError::from_api(ApiError::Unauthorized("expired".to_string()), "x");
        assert!(err.requires_login());
    }

    #[test]
    fn test_field_errors_accessor() {
        let err = ClientError::Validation(FieldErrors::single(Field::City, "City is required"));
        assert_eq!(
            err.field_errors().and_then(|e| e.get(Field::City)),
            Some("City is required")
        );
        assert!(ClientError::EmptyCart.field_errors().is_none());
    }
}
