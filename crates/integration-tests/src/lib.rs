//! Integration tests for Atelier.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p atelier-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `cart_properties` - Cart engine invariants through the public core API
//! - `storefront_flows` - Multi-request shopper journeys through the router
//!
//! This crate is test support only; helpers panic on setup failures.

#![cfg_attr(not(test), forbid(unsafe_code))]
#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::path::PathBuf;

use atelier_core::{CartItem, CurrencyCode, Customer, Email, Price, ProductId, Size, StockLevels};
use atelier_storefront::catalog::{Catalog, CatalogFile, ProductRecord, SizeStock};
use atelier_storefront::config::StorefrontConfig;
use atelier_storefront::state::AppState;
use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use http_body_util::BodyExt;
use rust_decimal::Decimal;
use serde_json::Value;
use tower::ServiceExt;

/// Catalog used by the storefront flows.
///
/// Product 1 has three units in M and none in L; product 2 has five units.
pub const CATALOG: &str = r#"{
    "currency": "EUR",
    "products": [
        {
            "id": 1,
            "name": "Cashmere Overcoat",
            "price": "1250.00",
            "images": ["/images/overcoat.jpg"],
            "sizes": [{ "size": "M", "stock": 3 }, { "size": "L", "stock": 0 }]
        },
        {
            "id": 2,
            "name": "Silk Scarf",
            "price": "320.00",
            "sizes": [{ "size": "One Size", "stock": 5 }]
        }
    ]
}"#;

/// A cart item priced in EUR.
#[must_use]
pub fn item(id: i32, size: &str) -> CartItem {
    CartItem {
        product_id: ProductId::new(id),
        name: format!("Product {id}"),
        price: Price::new(Decimal::new(100, 0), CurrencyCode::EUR),
        image_refs: Vec::new(),
        size: Size::parse(size).unwrap(),
    }
}

/// Stock levels with one variant set.
#[must_use]
pub fn stock(id: i32, size: &str, available: u32) -> StockLevels {
    let mut levels = StockLevels::new();
    levels.set(ProductId::new(id), Size::parse(size).unwrap(), available);
    levels
}

/// A signed-in customer.
#[must_use]
pub fn customer(email: &str) -> Customer {
    Customer::new(Email::parse(email).unwrap())
}

/// Drives the storefront router in-process, carrying the session cookie
/// between requests like a browser.
pub struct TestStorefront {
    app: Router,
    state: AppState,
    cookie: Option<String>,
}

impl TestStorefront {
    /// A storefront over [`CATALOG`].
    #[must_use]
    pub fn new() -> Self {
        let config = StorefrontConfig::for_local(PathBuf::from("catalog.json")).unwrap();
        let state = AppState::new(config, Catalog::from_json(CATALOG).unwrap());
        Self {
            app: atelier_storefront::app(state.clone()),
            state,
            cookie: None,
        }
    }

    /// Another browser on the same server, with no cookie yet.
    #[must_use]
    pub fn new_browser(&self) -> Self {
        Self {
            app: self.app.clone(),
            state: self.state.clone(),
            cookie: None,
        }
    }

    /// The same browser again, sharing its cookie. Used to issue
    /// concurrent requests from one session.
    #[must_use]
    pub fn same_browser(&self) -> Self {
        Self {
            app: self.app.clone(),
            state: self.state.clone(),
            cookie: self.cookie.clone(),
        }
    }

    /// Change one variant's stock, swapping the catalog as a background
    /// reload would.
    pub fn set_stock(&self, product: i32, size: &str, available: u32) {
        let current = self.state.catalog();
        let size = Size::parse(size).unwrap();
        let products = current
            .products()
            .iter()
            .map(|p| ProductRecord {
                id: p.id,
                name: p.name.clone(),
                price: p.price.amount,
                images: p.images.clone(),
                sizes: p
                    .sizes
                    .iter()
                    .map(|entry| SizeStock {
                        size: entry.size.clone(),
                        stock: if p.id == ProductId::new(product) && entry.size == size {
                            available
                        } else {
                            entry.stock
                        },
                    })
                    .collect(),
            })
            .collect();

        let file = CatalogFile {
            currency: current.currency(),
            products,
        };
        self.state
            .replace_catalog(Catalog::from_file(file).unwrap());
    }

    pub async fn get(&mut self, uri: &str) -> (StatusCode, Value) {
        self.send(Method::GET, uri, None).await
    }

    pub async fn post(&mut self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, Some(body)).await
    }

    async fn send(&mut self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(cookie) = &self.cookie {
            request = request.header(header::COOKIE, cookie);
        }
        let request = match body {
            Some(json) => request
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => request.body(Body::empty()),
        }
        .unwrap();

        let response = self.app.clone().oneshot(request).await.unwrap();

        if let Some(set_cookie) = response.headers().get(header::SET_COOKIE) {
            let pair = set_cookie.to_str().unwrap().split(';').next().unwrap();
            self.cookie = Some(pair.to_string());
        }

        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }
}

impl Default for TestStorefront {
    fn default() -> Self {
        Self::new()
    }
}

/// Messages of the notices in a response body.
#[must_use]
pub fn messages(body: &Value) -> Vec<String> {
    body["notices"]
        .as_array()
        .map(|notices| {
            notices
                .iter()
                .filter_map(|n| n["message"].as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}
