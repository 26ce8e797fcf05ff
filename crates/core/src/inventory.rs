//! Inventory snapshot read contract.
//!
//! The cart engine never mutates stock. It asks an [`InventorySnapshot`] how
//! many units of a variant are available right before each guard check and
//! treats the answer as current for that call.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::types::{ProductId, Size, VariantKey};

/// Read-only view of per-size stock levels.
pub trait InventorySnapshot {
    /// Units available for `(product_id, size)`, or `None` if the variant
    /// does not exist.
    fn stock_for(&self, product_id: &ProductId, size: &Size) -> Option<u32>;

    /// Whether the variant exists at all (stock may still be zero).
    fn variant_exists(&self, product_id: &ProductId, size: &Size) -> bool {
        self.stock_for(product_id, size).is_some()
    }

    /// Convenience lookup by composite key.
    fn stock_for_key(&self, key: &VariantKey) -> Option<u32> {
        self.stock_for(&key.product_id, &key.size)
    }
}

impl<T: InventorySnapshot + ?Sized> InventorySnapshot for &T {
    fn stock_for(&self, product_id: &ProductId, size: &Size) -> Option<u32> {
        (**self).stock_for(product_id, size)
    }
}

/// One stock record as supplied by the inventory provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryVariant {
    pub product_id: ProductId,
    pub size: Size,
    pub available_stock: u32,
}

/// In-memory stock table keyed by variant.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StockLevels {
    levels: HashMap<VariantKey, u32>,
}

impl StockLevels {
    /// An empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the stock for a variant, replacing any previous value.
    pub fn set(&mut self, product_id: ProductId, size: Size, available_stock: u32) {
        self.levels
            .insert(VariantKey::new(product_id, size), available_stock);
    }

    /// Number of variants tracked.
    #[must_use]
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    /// Whether no variants are tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Iterate over all tracked variants.
    pub fn iter(&self) -> impl Iterator<Item = (&VariantKey, u32)> {
        self.levels.iter().map(|(key, stock)| (key, *stock))
    }
}

impl FromIterator<InventoryVariant> for StockLevels {
    fn from_iter<I: IntoIterator<Item = InventoryVariant>>(iter: I) -> Self {
        let mut levels = Self::new();
        for variant in iter {
            levels.set(variant.product_id, variant.size, variant.available_stock);
        }
        levels
    }
}

impl InventorySnapshot for StockLevels {
    fn stock_for(&self, product_id: &ProductId, size: &Size) -> Option<u32> {
        // Keys are owned; build a probe rather than storing borrowed keys.
        self.levels
            .get(&VariantKey::new(*product_id, size.clone()))
            .copied()
    }
}
