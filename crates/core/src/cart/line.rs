//! Cart line records.

use serde::{Deserialize, Serialize};

use crate::types::{Price, ProductId, Size, VariantKey};

/// What the shopper picked on a product page: one product in one size.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub product_id: ProductId,
    pub name: String,
    pub price: Price,
    #[serde(default)]
    pub image_refs: Vec<String>,
    pub size: Size,
}

impl CartItem {
    /// The variant this item refers to.
    #[must_use]
    pub fn key(&self) -> VariantKey {
        VariantKey::new(self.product_id, self.size.clone())
    }
}

/// One line of a cart.
///
/// `quantity` is always at least 1; a line that would drop to zero is removed
/// from the cart instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: ProductId,
    pub name: String,
    pub price: Price,
    pub image_refs: Vec<String>,
    pub size: Size,
    pub quantity: u32,
    pub variant_key: VariantKey,
}

impl CartLine {
    pub(crate) fn from_item(item: &CartItem, quantity: u32) -> Self {
        Self {
            product_id: item.product_id,
            name: item.name.clone(),
            price: item.price,
            image_refs: item.image_refs.clone(),
            size: item.size.clone(),
            quantity,
            variant_key: item.key(),
        }
    }

    /// Unit price times quantity, or `None` if the amount overflows.
    #[must_use]
    pub fn line_total(&self) -> Option<Price> {
        self.price.times(self.quantity)
    }
}
