//! Business logic services for the backend.
//!
//! # Services
//!
//! - `auth` - Password accounts and bearer sessions
//! - `payments` - The simulated payment gateway and its signatures
//! - `reports` - Admin listings and dashboard figures

pub mod auth;
pub mod payments;
pub mod reports;

pub use auth::{AuthError, AuthService};
pub use payments::{MockGateway, PaymentError, PaymentSigner};
