//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Health check
//!
//! # Catalog
//! GET  /api/products           - Product listing with per-size stock
//! GET  /api/products/{id}      - Product detail
//!
//! # Cart
//! GET  /api/cart               - Current cart
//! GET  /api/cart/count         - Total units in the cart
//! POST /api/cart/add           - Add to cart (requires sign-in, else deferred)
//! POST /api/cart/buy-now       - Replace cart and go to checkout (requires sign-in, else deferred)
//! POST /api/cart/update        - Set a line quantity
//! POST /api/cart/remove        - Remove a line
//! POST /api/cart/clear         - Empty the cart
//!
//! # Auth
//! POST /api/auth/login         - Sign in, replaying any deferred cart action
//! POST /api/auth/logout        - Sign out
//!
//! # Orders
//! POST /api/orders             - Place an order for the current cart
//! ```

pub mod auth;
pub mod cart;
pub mod orders;
pub mod products;

use axum::{
    Json, Router,
    extract::rejection::JsonRejection,
    routing::{get, post},
};

use crate::error::AppError;
use crate::state::AppState;

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/{id}", get(products::show))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/count", get(cart::count))
        .route("/add", post(cart::add))
        .route("/buy-now", post(cart::buy_now))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
        .route("/clear", post(cart::clear))
}

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/api/products", product_routes())
        .nest("/api/cart", cart_routes())
        .nest("/api/auth", auth_routes())
        .route("/api/orders", post(orders::place))
}

/// Unwrap a JSON body, turning any rejection into a 400.
pub(crate) fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| AppError::BadRequest(rejection.body_text()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod test_support {
    //! Drives the router the way a browser would, carrying the session cookie.

    use std::path::PathBuf;

    use axum::{
        Router,
        body::Body,
        http::{Method, Request, StatusCode, header},
    };
    use http_body_util::BodyExt;
    use serde_json::Value;
    use tower::ServiceExt;

    use crate::catalog::{Catalog, tests::SAMPLE};
    use crate::config::StorefrontConfig;
    use crate::middleware::create_session_layer;
    use crate::state::AppState;

    pub(crate) struct Browser {
        pub(crate) app: Router,
        pub(crate) state: AppState,
        cookie: Option<String>,
    }

    impl Browser {
        pub(crate) fn new() -> Self {
            let config = StorefrontConfig::for_local(PathBuf::from("catalog.json")).unwrap();
            let state = AppState::new(config, Catalog::from_json(SAMPLE).unwrap());
            let app = super::routes()
                .layer(create_session_layer(state.config()))
                .with_state(state.clone());
            Self {
                app,
                state,
                cookie: None,
            }
        }

        /// A second browser against the same server, without this one's cookie.
        pub(crate) fn stranger(&self) -> Self {
            Self {
                app: self.app.clone(),
                state: self.state.clone(),
                cookie: None,
            }
        }

        /// This browser again, sharing its cookie.
        pub(crate) fn same_browser(&self) -> Self {
            Self {
                app: self.app.clone(),
                state: self.state.clone(),
                cookie: self.cookie.clone(),
            }
        }

        pub(crate) async fn get(&mut self, uri: &str) -> (StatusCode, Value) {
            self.send(Method::GET, uri, None).await
        }

        pub(crate) async fn post(&mut self, uri: &str, body: Value) -> (StatusCode, Value) {
            self.send(Method::POST, uri, Some(body)).await
        }

        pub(crate) async fn send(
            &mut self,
            method: Method,
            uri: &str,
            body: Option<Value>,
        ) -> (StatusCode, Value) {
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
            let json = if bytes.is_empty() {
                Value::Null
            } else {
                serde_json::from_slice(&bytes).unwrap()
            };
            (status, json)
        }
    }

    /// Messages of the notices in a cart response.
    pub(crate) fn messages(body: &Value) -> Vec<String> {
        body["notices"]
            .as_array()
            .unwrap()
            .iter()
            .map(|n| n["message"].as_str().unwrap().to_string())
            .collect()
    }
}
