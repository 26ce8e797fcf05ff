//! Session-related types.
//!
//! The cookie session only carries the shopper id. Cart, identity and any
//! pending action live in the [`ShopperRegistry`](crate::shoppers::ShopperRegistry).

/// Session keys.
pub mod keys {
    /// Key for the shopper id that selects this browser's cart session.
    pub const SHOPPER_ID: &str = "shopper_id";
}
