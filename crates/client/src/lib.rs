//! Nevyra client library.
//!
//! Client-side state and the checkout workflow, independent of any UI:
//!
//! - [`cart`], [`wishlist`] - persisted stores with change notifications
//! - [`session`] - bearer token and sign-in
//! - [`catalog`] - cached product catalog and in-memory queries
//! - [`checkout`] - addresses, payment (COD or the simulated gateway) and
//!   order submission
//! - [`admin`] - admin listings
//! - [`api`] - the REST API seam and its HTTP implementation
//!
//! [`NevyraClient`] wires them over one storage root and one change bus.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod admin;
pub mod api;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod config;
pub mod error;
pub mod events;
pub mod session;
pub mod state;
pub mod storage;
pub mod wishlist;

#[cfg(test)]
mod testing;

pub use config::ClientConfig;
pub use error::{ClientError, Result};
pub use events::{ChangeBus, StoreEvent};
pub use state::{NevyraClient, OpenError};
