//! Payment methods, coupons, and the client payment state machine.
//!
//! ```text
//! idle ──► order_created ──► awaiting_confirmation ──► verified ──► settled
//!   │            │                    │                    │
//!   │            ├──► dismissed ◄─────┤                    │
//!   │            │                    │                    │
//!   ├────────────┴──────► failed ◄────┴────────────────────┘
//!   │
//!   └──► settled        (cash on delivery)
//! ```
//!
//! `settled`, `failed` and `dismissed` are terminal.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// How the shopper pays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Simulated third-party gateway with an asynchronous confirmation.
    Gateway,
    /// Cash on delivery.
    Cod,
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gateway => write!(f, "gateway"),
            Self::Cod => write!(f, "cod"),
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gateway" | "online" | "card" => Ok(Self::Gateway),
            "cod" | "cash" => Ok(Self::Cod),
            other => Err(format!("invalid payment method: {other}")),
        }
    }
}

/// A non-blank, trimmed coupon code.
///
/// The code is recorded on the order and earns a displayed discount (see
/// [`OrderTotals::coupon_discount`](crate::OrderTotals::coupon_discount)).
/// What is charged stays with the backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CouponCode(String);

impl CouponCode {
    /// Trim and accept any non-blank code.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let code = raw.trim();
        (!code.is_empty()).then(|| Self(code.to_owned()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CouponCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where a checkout payment currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentState {
    #[default]
    Idle,
    /// The backend created a pending gateway order.
    OrderCreated,
    /// Waiting for the gateway's confirmation.
    AwaitingConfirmation,
    /// The backend accepted the gateway's signature.
    Verified,
    /// An order exists for this payment.
    Settled,
    Failed,
    /// The shopper closed the payment before it was confirmed.
    Dismissed,
}

impl PaymentState {
    /// Whether no further transition is possible.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Settled | Self::Failed | Self::Dismissed)
    }

    /// Transition table.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        use PaymentState::{
            AwaitingConfirmation, Dismissed, Failed, Idle, OrderCreated, Settled, Verified,
        };
        matches!(
            (self, next),
            (Idle, OrderCreated | Settled | Failed)
                | (OrderCreated, AwaitingConfirmation | Failed | Dismissed)
                | (AwaitingConfirmation, Verified | Failed | Dismissed)
                | (Verified, Settled | Failed)
        )
    }
}

impl fmt::Display for PaymentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::OrderCreated => "order_created",
            Self::AwaitingConfirmation => "awaiting_confirmation",
            Self::Verified => "verified",
            Self::Settled => "settled",
            Self::Failed => "failed",
            Self::Dismissed => "dismissed",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const ALL: [PaymentState; 7] = [
        PaymentState::Idle,
        PaymentState::OrderCreated,
        PaymentState::AwaitingConfirmation,
        PaymentState::Verified,
        PaymentState::Settled,
        PaymentState::Failed,
        PaymentState::Dismissed,
    ];

    #[test]
    fn test_gateway_happy_path_is_allowed() {
        let path = [
            PaymentState::Idle,
            PaymentState::OrderCreated,
            PaymentState::AwaitingConfirmation,
            PaymentState::Verified,
            PaymentState::Settled,
        ];
        for pair in path.windows(2) {
            assert!(pair[0].can_transition_to(pair[1]), "{pair:?}");
        }
    }

    #[test]
    fn test_cod_settles_directly() {
        assert!(PaymentState::Idle.can_transition_to(PaymentState::Settled));
    }

    #[test]
    fn test_terminal_states_have_no_exits() {
        for from in ALL.into_iter().filter(|s| s.is_terminal()) {
            for to in ALL {
                assert!(!from.can_transition_to(to), "{from} -> {to}");
            }
        }
    }

    #[test]
    fn test_dismiss_only_before_confirmation() {
        assert!(PaymentState::AwaitingConfirmation.can_transition_to(PaymentState::Dismissed));
        assert!(!PaymentState::Verified.can_transition_to(PaymentState::Dismissed));
        assert!(!PaymentState::Idle.can_transition_to(PaymentState::Dismissed));
    }

    #[test]
    fn test_coupon_parse() {
        assert!(CouponCode::parse("").is_none());
        assert!(CouponCode::parse("   ").is_none());
        assert_eq!(CouponCode::parse(" SAVE10 ").unwrap().as_str(), "SAVE10");
    }

    #[test]
    fn test_method_wire_names() {
        assert_eq!(serde_json::to_string(&PaymentMethod::Cod).unwrap(), "\"cod\"");
        assert_eq!("gateway".parse::<PaymentMethod>().unwrap(), PaymentMethod::Gateway);
        assert!("cheque".parse::<PaymentMethod>().is_err());
    }
}
