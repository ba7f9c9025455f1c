//! Nevyra Core - Shared domain types and rules.
//!
//! This crate provides the types used across all Nevyra components:
//! - `storefront` - REST backend (auth, catalog, addresses, orders, mock payments, admin)
//! - `client` - Client-side stores and the checkout workflow
//! - `cli` - Command-line front end
//!
//! # Architecture
//!
//! The core crate contains only types and pure rules - no I/O, no storage,
//! no HTTP clients. Both the backend and the client validate and price
//! through the same functions, so their answers agree.
//!
//! # Modules
//!
//! - [`api`] - REST request and response bodies
//! - [`types`] - Newtype wrappers for ids, money, emails, and statuses
//! - [`cart`] - Cart entries and their normalisation
//! - [`address`] - Shipping addresses and field validation
//! - [`payment`] - Payment methods, coupons, and the payment state machine
//! - [`validation`] - Per-field form errors
//! - [`order`] - Order line items and totals
//! - [`catalog`] - Products and in-memory catalog queries

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod address;
pub mod api;
pub mod cart;
pub mod catalog;
pub mod order;
pub mod payment;
pub mod types;
pub mod validation;

pub use address::{Address, AddressInput};
pub use cart::{Cart, CartEntry};
pub use catalog::{CatalogQuery, CategoryFilter, Page, Product, SortOrder};
pub use order::{OrderLine, OrderTotals};
pub use payment::{CouponCode, PaymentMethod, PaymentState};
pub use types::*;
pub use validation::{Field, FieldErrors};
