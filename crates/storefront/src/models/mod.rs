//! Records kept by the document store.
//!
//! API bodies live in `nevyra_core::api`; these types add the server-only
//! fields (password hashes, owners, payment bookkeeping).

pub mod order;
pub mod payment;
pub mod user;

pub use order::StoredOrder;
pub use payment::PaymentRecord;
pub use user::User;
