//! HTTP middleware and extractors.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. `TraceLayer` (request spans)
//! 3. Request ID (add unique ID to each request)
//! 4. CORS

pub mod auth;
pub mod request_id;

pub use auth::{RequireAdmin, RequireAuth};
pub use request_id::request_id_middleware;
