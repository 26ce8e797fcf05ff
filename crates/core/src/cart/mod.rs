//! Cart store: add/merge, quantity updates, removal and the oversell guard.
//!
//! # Invariants
//!
//! - At most one [`CartLine`] per [`VariantKey`].
//! - Every stored line has `quantity >= 1`.
//! - An add never leaves a line above the stock reported by the
//!   [`InventorySnapshot`] at the time of the call. Adds are all-or-nothing:
//!   if the combined quantity would exceed stock, nothing changes.
//!
//! Every operation here is synchronous and takes `&mut self`, so callers that
//! share a cart across tasks must hold a lock for the whole call (the
//! read-check-write of a line's quantity is not split).

mod line;

pub use line::{CartItem, CartLine};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::inventory::InventorySnapshot;
use crate::types::{Price, VariantKey};

/// Expected, recoverable rejections from cart operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartError {
    /// The product/size combination is not in the inventory snapshot.
    #[error("variant {0} not found")]
    VariantNotFound(VariantKey),

    /// The requested or resulting quantity exceeds the stock for that size.
    #[error("insufficient stock for {key}: {available} available")]
    InsufficientStock {
        key: VariantKey,
        available: u32,
    },

    /// No line for this variant is in the cart.
    #[error("no cart line for {0}")]
    LineNotFound(VariantKey),

    /// Adds must request at least one unit.
    #[error("quantity must be at least 1")]
    InvalidQuantity,
}

/// Result of a successful [`Cart::add_or_merge`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Added {
    pub key: VariantKey,
    /// Quantity of the line after the add.
    pub quantity: u32,
    /// Whether an existing line absorbed the add.
    pub merged: bool,
}

/// Result of [`Cart::update_quantity`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuantityChange {
    /// The line now holds the requested quantity.
    Updated { quantity: u32 },
    /// More than the stock was requested; the line now holds `available`.
    Clamped { requested: u32, available: u32 },
    /// The line left the cart, either because a quantity `<= 0` was requested
    /// or because the size is sold out (`sold_out`).
    Removed { line: CartLine, sold_out: bool },
}

/// A correction applied by [`Cart::reconcile`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reconciliation {
    /// The line was above current stock and was lowered.
    Lowered { line: CartLine, from: u32 },
    /// The variant vanished or sold out and the line was removed.
    Dropped(CartLine),
}

/// An ordered collection of cart lines.
///
/// Insertion order is kept for display only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    /// An empty cart.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Lines in insertion order.
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// The line for a variant, if present.
    #[must_use]
    pub fn line(&self, key: &VariantKey) -> Option<&CartLine> {
        self.lines.iter().find(|line| &line.variant_key == key)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Sum of quantities across all lines.
    ///
    /// Computed on every call, never cached.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.lines.iter().map(|line| u64::from(line.quantity)).sum()
    }

    /// Sum of line totals.
    ///
    /// `None` for an empty cart, mixed currencies, or an amount too large
    /// for a decimal.
    #[must_use]
    pub fn subtotal(&self) -> Option<Price> {
        let mut lines = self.lines.iter();
        let first = lines.next()?.line_total()?;
        lines.try_fold(first, |acc, line| acc.checked_add(&line.line_total()?))
    }

    fn position(&self, key: &VariantKey) -> Option<usize> {
        self.lines.iter().position(|line| &line.variant_key == key)
    }

    /// Add `quantity` units of `item`, merging into an existing line for the
    /// same variant.
    ///
    /// This accumulates: repeating the call adds the same delta again.
    ///
    /// # Errors
    ///
    /// - [`CartError::InvalidQuantity`] if `quantity` is zero.
    /// - [`CartError::VariantNotFound`] if the snapshot has no such variant.
    /// - [`CartError::InsufficientStock`] if the line would exceed stock. The
    ///   cart is left untouched; there is no partial add.
    pub fn add_or_merge<I>(
        &mut self,
        inventory: &I,
        item: &CartItem,
        quantity: u32,
    ) -> Result<Added, CartError>
    where
        I: InventorySnapshot + ?Sized,
    {
        if quantity == 0 {
            return Err(CartError::InvalidQuantity);
        }

        let key = item.key();
        let available = inventory
            .stock_for(&item.product_id, &item.size)
            .ok_or_else(|| CartError::VariantNotFound(key.clone()))?;

        let position = self.position(&key);
        let current = position
            .and_then(|idx| self.lines.get(idx))
            .map_or(0, |line| line.quantity);

        let total = match current.checked_add(quantity) {
            Some(total) if total <= available => total,
            _ => {
                debug!(variant = %key, current, quantity, available, "add rejected");
                return Err(CartError::InsufficientStock { key, available });
            }
        };

        let merged = match position.and_then(|idx| self.lines.get_mut(idx)) {
            Some(line) => {
                line.quantity = total;
                true
            }
            None => {
                self.lines.push(CartLine::from_item(item, quantity));
                false
            }
        };

        debug!(variant = %key, quantity = total, merged, "line added");
        Ok(Added {
            key,
            quantity: total,
            merged,
        })
    }

    /// Set a line's quantity.
    ///
    /// A quantity `<= 0` removes the line. A quantity above stock is not
    /// rejected outright: the line is clamped down to the available stock
    /// (and removed if that stock is zero).
    ///
    /// # Errors
    ///
    /// - [`CartError::LineNotFound`] if the cart has no line for `key`.
    /// - [`CartError::VariantNotFound`] if the line's variant has left the
    ///   snapshot; the line is left as it was.
    pub fn update_quantity<I>(
        &mut self,
        inventory: &I,
        key: &VariantKey,
        new_quantity: i64,
    ) -> Result<QuantityChange, CartError>
    where
        I: InventorySnapshot + ?Sized,
    {
        let idx = self
            .position(key)
            .ok_or_else(|| CartError::LineNotFound(key.clone()))?;

        if new_quantity <= 0 {
            let line = self.lines.remove(idx);
            debug!(variant = %key, "line removed by zero quantity");
            return Ok(QuantityChange::Removed {
                line,
                sold_out: false,
            });
        }

        let available = inventory
            .stock_for_key(key)
            .ok_or_else(|| CartError::VariantNotFound(key.clone()))?;
        let requested = u32::try_from(new_quantity).unwrap_or(u32::MAX);

        if requested > available {
            debug!(variant = %key, requested, available, "quantity clamped to stock");
            if available == 0 {
                let line = self.lines.remove(idx);
                return Ok(QuantityChange::Removed {
                    line,
                    sold_out: true,
                });
            }
            if let Some(line) = self.lines.get_mut(idx) {
                line.quantity = available;
            }
            return Ok(QuantityChange::Clamped {
                requested,
                available,
            });
        }

        if let Some(line) = self.lines.get_mut(idx) {
            line.quantity = requested;
        }
        Ok(QuantityChange::Updated {
            quantity: requested,
        })
    }

    /// Remove the line for `key`, returning it if it was present.
    pub fn remove_line(&mut self, key: &VariantKey) -> Option<CartLine> {
        let idx = self.position(key)?;
        Some(self.lines.remove(idx))
    }

    /// Remove every line.
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Bring every line back within current stock.
    ///
    /// Lines whose variant vanished or sold out are dropped; lines above
    /// stock are lowered to it. Returns one entry per corrected line, in cart
    /// order.
    pub fn reconcile<I>(&mut self, inventory: &I) -> Vec<Reconciliation>
    where
        I: InventorySnapshot + ?Sized,
    {
        let mut corrections = Vec::new();
        self.lines.retain_mut(|line| {
            match inventory.stock_for_key(&line.variant_key) {
                None | Some(0) => {
                    corrections.push(Reconciliation::Dropped(line.clone()));
                    false
                }
                Some(available) if line.quantity > available => {
                    let from = line.quantity;
                    line.quantity = available;
                    corrections.push(Reconciliation::Lowered {
                        line: line.clone(),
                        from,
                    });
                    true
                }
                Some(_) => true,
            }
        });
        if !corrections.is_empty() {
            debug!(count = corrections.len(), "cart reconciled against stock");
        }
        corrections
    }
}
