//! Catalog validation and stock reports.

use std::path::Path;

use atelier_core::ProductId;
use atelier_storefront::catalog::{Catalog, Product};
use tracing::{info, warn};

/// Read and validate a catalog file.
async fn load(path: &Path) -> Result<Catalog, Box<dyn std::error::Error>> {
    if !path.exists() {
        return Err(format!("File not found: {}", path.display()).into());
    }

    info!(path = %path.display(), "Loading catalog");
    let content = tokio::fs::read_to_string(path).await?;
    Ok(Catalog::from_json(&content)?)
}

/// Validate a catalog file and summarize it.
///
/// # Errors
///
/// Returns an error if the file cannot be read or fails validation.
pub async fn check(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let catalog = load(path).await?;

    let variants: usize = catalog.products().iter().map(|p| p.sizes.len()).sum();
    let sold_out = catalog
        .products()
        .iter()
        .flat_map(|p| p.sizes.iter())
        .filter(|s| s.stock == 0)
        .count();

    info!(
        currency = ?catalog.currency(),
        products = catalog.products().len(),
        variants,
        sold_out,
        "Catalog is valid"
    );
    Ok(())
}

/// Report stock per size, for every product or just one.
///
/// # Errors
///
/// Returns an error if the catalog is invalid or the product does not exist.
pub async fn stock(path: &Path, product: Option<i32>) -> Result<(), Box<dyn std::error::Error>> {
    let catalog = load(path).await?;

    let products: Vec<&Product> = match product {
        Some(id) => vec![
            catalog
                .product(ProductId::new(id))
                .ok_or_else(|| format!("Product {id} not found"))?,
        ],
        None => catalog.products().iter().collect(),
    };

    for product in products {
        info!(
            product = %product.id,
            name = %product.name,
            price = %product.price,
            total = product.total_stock(),
            "Product"
        );
        for entry in &product.sizes {
            if entry.stock == 0 {
                warn!(product = %product.id, size = %entry.size, "Sold out");
            } else {
                info!(product = %product.id, size = %entry.size, stock = entry.stock, "In stock");
            }
        }
    }
    Ok(())
}
