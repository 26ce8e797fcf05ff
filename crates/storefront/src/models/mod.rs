//! Request-scoped models for storefront.

pub mod session;

pub use session::keys as session_keys;
