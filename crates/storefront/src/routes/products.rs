//! Product route handlers.

use atelier_core::{CurrencyCode, ProductId};
use axum::{
    Json,
    extract::{Path, State},
};
use serde::Serialize;
use tracing::instrument;

use crate::catalog::Product;
use crate::error::{AppError, Result};
use crate::state::AppState;

/// Product listing response.
#[derive(Debug, Serialize)]
pub struct ProductList {
    pub currency: CurrencyCode,
    pub products: Vec<Product>,
}

/// List every product with its per-size stock.
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> Json<ProductList> {
    let catalog = state.catalog();
    Json(ProductList {
        currency: catalog.currency(),
        products: catalog.products().to_vec(),
    })
}

/// Show one product.
#[instrument(skip(state))]
pub async fn show(State(state): State<AppState>, Path(id): Path<i32>) -> Result<Json<Product>> {
    state
        .catalog()
        .product(ProductId::new(id))
        .cloned()
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::StatusCode;

    use crate::routes::test_support::Browser;

    #[tokio::test]
    async fn test_index_lists_stock_per_size() {
        let mut browser = Browser::new();

        let (status, body) = browser.get("/api/products").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["currency"], "EUR");
        let products = body["products"].as_array().unwrap();
        assert_eq!(products.len(), 2);
        assert_eq!(products[0]["sizes"][0]["size"], "M");
        assert_eq!(products[0]["sizes"][0]["stock"], 3);
        assert_eq!(products[0]["price"]["amount"], "1250.00");
    }

    #[tokio::test]
    async fn test_show_product_or_not_found() {
        let mut browser = Browser::new();

        let (status, body) = browser.get("/api/products/2").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "Silk Scarf");

        let (status, _) = browser.get("/api/products/99").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
