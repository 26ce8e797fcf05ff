//! Product catalog and per-size stock loaded from a JSON file.
//!
//! The catalog is the storefront's inventory snapshot provider. It is loaded
//! at startup and can be reloaded in the background; each request works
//! against one immutable [`Catalog`] snapshot.
//!
//! # File format
//!
//! ```json
//! {
//!   "currency": "EUR",
//!   "products": [
//!     {
//!       "id": 1,
//!       "name": "Cashmere Overcoat",
//!       "price": "1250.00",
//!       "images": ["/images/overcoat-front.jpg"],
//!       "sizes": [{ "size": "M", "stock": 3 }]
//!     }
//!   ]
//! }
//! ```

use std::collections::{HashMap, HashSet};
use std::path::Path;

use atelier_core::{
    CartItem, CurrencyCode, InventorySnapshot, InventoryVariant, Price, ProductId, Size,
    StockLevels,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Highest unit price a catalog may list. Keeps line totals and subtotals
/// well inside decimal range for any stock level.
pub const MAX_PRICE: Decimal = Decimal::from_parts(1_000_000_000, 0, 0, false, 0);

/// Errors loading or validating a catalog file.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog {path}: {message}")]
    Io { path: String, message: String },

    #[error("invalid catalog JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("duplicate product id {0}")]
    DuplicateProduct(ProductId),

    #[error("product {0} has an empty name")]
    EmptyName(ProductId),

    #[error("product {0} has a negative price")]
    NegativePrice(ProductId),

    #[error("product {0} has a price above 1000000000")]
    PriceTooHigh(ProductId),

    #[error("product {id} lists size {size} more than once")]
    DuplicateSize { id: ProductId, size: Size },

    #[error("product {0} has no sizes")]
    NoSizes(ProductId),
}

/// On-disk catalog layout.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CatalogFile {
    pub currency: CurrencyCode,
    pub products: Vec<ProductRecord>,
}

/// One product as written in the catalog file.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProductRecord {
    pub id: ProductId,
    pub name: String,
    pub price: Decimal,
    #[serde(default)]
    pub images: Vec<String>,
    pub sizes: Vec<SizeStock>,
}

/// Stock for one size of a product.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SizeStock {
    pub size: Size,
    pub stock: u32,
}

/// A validated product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub price: Price,
    pub images: Vec<String>,
    pub sizes: Vec<SizeStock>,
}

impl Product {
    /// Total units across all sizes.
    #[must_use]
    pub fn total_stock(&self) -> u64 {
        self.sizes.iter().map(|s| u64::from(s.stock)).sum()
    }
}

/// An immutable, validated catalog snapshot.
#[derive(Debug, Clone)]
pub struct Catalog {
    currency: CurrencyCode,
    products: Vec<Product>,
    index: HashMap<ProductId, usize>,
    stock: StockLevels,
}

impl Catalog {
    /// Validate a parsed catalog file.
    ///
    /// # Errors
    ///
    /// Returns the first validation problem found, in file order.
    pub fn from_file(file: CatalogFile) -> Result<Self, CatalogError> {
        let mut products = Vec::with_capacity(file.products.len());
        let mut index = HashMap::with_capacity(file.products.len());

        for record in file.products {
            if index.contains_key(&record.id) {
                return Err(CatalogError::DuplicateProduct(record.id));
            }
            let name = record.name.trim();
            if name.is_empty() {
                return Err(CatalogError::EmptyName(record.id));
            }
            if record.price.is_sign_negative() {
                return Err(CatalogError::NegativePrice(record.id));
            }
            if record.price > MAX_PRICE {
                return Err(CatalogError::PriceTooHigh(record.id));
            }
            if record.sizes.is_empty() {
                return Err(CatalogError::NoSizes(record.id));
            }
            let mut seen = HashSet::new();
            for entry in &record.sizes {
                if !seen.insert(&entry.size) {
                    return Err(CatalogError::DuplicateSize {
                        id: record.id,
                        size: entry.size.clone(),
                    });
                }
            }

            index.insert(record.id, products.len());
            products.push(Product {
                id: record.id,
                name: name.to_owned(),
                price: Price::new(record.price, file.currency),
                images: record.images,
                sizes: record.sizes,
            });
        }

        let stock = products
            .iter()
            .flat_map(|product| {
                product.sizes.iter().map(|entry| InventoryVariant {
                    product_id: product.id,
                    size: entry.size.clone(),
                    available_stock: entry.stock,
                })
            })
            .collect();

        Ok(Self {
            currency: file.currency,
            products,
            index,
            stock,
        })
    }

    /// Parse and validate catalog JSON.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Parse`] for malformed JSON, or a validation error.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        Self::from_file(serde_json::from_str(json)?)
    }

    /// Load and validate a catalog file from disk.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Io`] if the file cannot be read, or any parse
    /// or validation error.
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let json = std::fs::read_to_string(path).map_err(|e| CatalogError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_json(&json)
    }

    /// Catalog currency; every price is in it.
    #[must_use]
    pub const fn currency(&self) -> CurrencyCode {
        self.currency
    }

    /// All products in file order.
    #[must_use]
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    /// Look up a product by id.
    #[must_use]
    pub fn product(&self, id: ProductId) -> Option<&Product> {
        self.index.get(&id).and_then(|&idx| self.products.get(idx))
    }

    /// Build the cart descriptor for a product in a given size.
    ///
    /// Returns `None` only when the product is unknown. An unknown size still
    /// yields an item so the cart engine can report the missing variant.
    #[must_use]
    pub fn cart_item(&self, id: ProductId, size: Size) -> Option<CartItem> {
        self.product(id).map(|product| CartItem {
            product_id: product.id,
            name: product.name.clone(),
            price: product.price,
            image_refs: product.images.clone(),
            size,
        })
    }

    /// A stand-in item for a product this snapshot does not list.
    ///
    /// Used to hold an anonymous shopper's request until sign-in, when the
    /// held item is looked up again. Carries a zero price and is never
    /// stocked here, so the engine refuses it if it is still unlisted.
    #[must_use]
    pub fn unlisted_item(&self, id: ProductId, size: Size) -> CartItem {
        CartItem {
            product_id: id,
            name: format!("Product {id}"),
            price: Price::zero(self.currency),
            image_refs: Vec::new(),
            size,
        }
    }

    /// Fresh descriptor for a held item, if its product is listed.
    #[must_use]
    pub fn refresh_item(&self, held: &CartItem) -> Option<CartItem> {
        self.cart_item(held.product_id, held.size.clone())
    }
}

impl InventorySnapshot for Catalog {
    fn stock_for(&self, product_id: &ProductId, size: &Size) -> Option<u32> {
        self.stock.stock_for(product_id, size)
    }
}
