//! Single-slot queue for a cart intent blocked on sign-in.
//!
//! # State machine
//!
//! ```text
//! Empty ──hold(i)──▶ Holding(i)
//! Holding(i) ──hold(j)──▶ Holding(j)      i is discarded, never run
//! Holding(i) ──take()──▶ Empty            caller runs i exactly once
//! Empty ──take()──▶ Empty
//! ```
//!
//! There is no expiry: a held intent stays until it is replaced or taken.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cart::CartItem;

/// A cart mutation the shopper asked for, captured as data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CartIntent {
    /// Add `quantity` of `item` to the cart.
    AddToCart { item: CartItem, quantity: u32 },
    /// Empty the cart, add `quantity` of `item`, then go to checkout.
    BuyNow { item: CartItem, quantity: u32 },
}

impl CartIntent {
    /// Short label for logs.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::AddToCart { .. } => "add_to_cart",
            Self::BuyNow { .. } => "buy_now",
        }
    }

    /// The item the intent is about.
    #[must_use]
    pub const fn item(&self) -> &CartItem {
        match self {
            Self::AddToCart { item, .. } | Self::BuyNow { item, .. } => item,
        }
    }
}

/// A held intent plus when it was blocked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingAction {
    pub intent: CartIntent,
    pub registered_at: DateTime<Utc>,
}

impl PendingAction {
    #[must_use]
    pub fn new(intent: CartIntent) -> Self {
        Self {
            intent,
            registered_at: Utc::now(),
        }
    }
}

/// Holds at most one [`PendingAction`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PendingActionSlot {
    #[default]
    Empty,
    Holding(PendingAction),
}

impl PendingActionSlot {
    /// Store `intent`, returning whatever was held before.
    ///
    /// The displaced action is dropped by the caller without running.
    pub fn hold(&mut self, intent: CartIntent) -> Option<PendingAction> {
        match std::mem::replace(self, Self::Holding(PendingAction::new(intent))) {
            Self::Empty => None,
            Self::Holding(previous) => Some(previous),
        }
    }

    /// Remove and return the held action, leaving the slot empty.
    pub fn take(&mut self) -> Option<PendingAction> {
        match std::mem::take(self) {
            Self::Empty => None,
            Self::Holding(action) => Some(action),
        }
    }

    /// The held action, if any, without consuming it.
    #[must_use]
    pub const fn peek(&self) -> Option<&PendingAction> {
        match self {
            Self::Empty => None,
            Self::Holding(action) => Some(action),
        }
    }

    /// Replace the held item with a fresh descriptor, keeping the intent
    /// kind, quantity and registration time.
    ///
    /// Returns true if the item was replaced.
    pub fn refresh_item<F>(&mut self, fresh: F) -> bool
    where
        F: FnOnce(&CartItem) -> Option<CartItem>,
    {
        let Self::Holding(action) = self else {
            return false;
        };
        let (CartIntent::AddToCart { item, .. } | CartIntent::BuyNow { item, .. }) =
            &mut action.intent;
        match fresh(item) {
            Some(updated) => {
                *item = updated;
                true
            }
            None => false,
        }
    }

    #[must_use]
    pub const fn is_holding(&self) -> bool {
        matches!(self, Self::Holding(_))
    }
}
