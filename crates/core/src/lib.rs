//! Atelier Core - cart and inventory reconciliation engine.
//!
//! This crate holds the decision logic behind the storefront cart:
//! which quantity of which product variant may enter a shopper's cart, and
//! how that decision composes with sign-in.
//!
//! # Architecture
//!
//! The core crate contains only types, traits and pure state transitions - no
//! I/O, no HTTP, no persistence. Stock levels, notifications and navigation
//! are collaborators passed in per call, so everything here runs the same
//! inside the storefront, the CLI and tests.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for ids, prices, e-mails, sizes and variant keys
//! - [`inventory`] - Read contract for per-size stock
//! - [`cart`] - Cart lines, merge-by-variant and the oversell guard
//! - [`pending`] - Single-slot queue for an intent blocked on sign-in
//! - [`identity`] - The identity gate and signed-in customers
//! - [`notice`] - Outcome messages and navigation hints
//! - [`session`] - Per-shopper composition of all of the above

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod identity;
pub mod inventory;
pub mod notice;
pub mod pending;
pub mod session;
pub mod types;

pub use cart::{Added, Cart, CartError, CartItem, CartLine, QuantityChange, Reconciliation};
pub use identity::{Customer, Identity, IdentityGate};
pub use inventory::{InventorySnapshot, InventoryVariant, StockLevels};
pub use notice::{Effects, Navigator, Notice, NoticeKind, NotificationSink, RouteIntent};
pub use pending::{CartIntent, PendingAction, PendingActionSlot};
pub use session::{GuardOutcome, OrderError, PlacedOrder, ShopperSession};
pub use types::*;
