//! Order placement.

use atelier_core::{Effects, Notice, OrderError, PlacedOrder};
use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::middleware::CurrentShopper;
use crate::routes::cart::CartResponse;
use crate::state::AppState;

/// Successful order response.
#[derive(Debug, Serialize)]
pub struct OrderResponse {
    pub order: PlacedOrder,
    pub notices: Vec<Notice>,
}

/// Place an order for the current cart.
///
/// Lines are checked against the current catalog first. If stock moved, the
/// cart is corrected and returned with `409` so the shopper can review it.
#[instrument(skip_all, fields(shopper_id = %shopper.id))]
pub async fn place(State(state): State<AppState>, shopper: CurrentShopper) -> Result<Response> {
    let mut session = shopper.session.lock().await;
    let catalog = state.catalog();
    let mut effects = Effects::new();

    let status = match session.complete_order(&*catalog, &mut effects) {
        Ok(order) => {
            let response = OrderResponse {
                order,
                notices: effects.notices,
            };
            return Ok((StatusCode::CREATED, Json(response)).into_response());
        }
        Err(OrderError::NotAuthenticated) => StatusCode::UNAUTHORIZED,
        Err(OrderError::EmptyCart) => StatusCode::BAD_REQUEST,
        Err(OrderError::StockChanged(_)) => StatusCode::CONFLICT,
        Err(e @ OrderError::Unpriceable) => return Err(AppError::Internal(e.to_string())),
    };

    Ok((status, Json(CartResponse::new(&session, effects))).into_response())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::catalog::{Catalog, tests::SAMPLE};
    use crate::routes::test_support::{Browser, messages};

    async fn signed_in() -> Browser {
        let mut browser = Browser::new();
        browser
            .post("/api/auth/login", json!({ "email": "client@atelier.example" }))
            .await;
        browser
    }

    #[tokio::test]
    async fn test_anonymous_order_is_unauthorized() {
        let mut browser = Browser::new();

        let (status, body) = browser.post("/api/orders", json!({})).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["navigate"], "/auth/login");
    }

    #[tokio::test]
    async fn test_empty_cart_order_is_bad_request() {
        let mut browser = signed_in().await;

        let (status, body) = browser.post("/api/orders", json!({})).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(messages(&body), vec!["Your cart is empty"]);
    }

    #[tokio::test]
    async fn test_order_places_and_clears_cart() {
        let mut browser = signed_in().await;
        browser
            .post("/api/cart/add", json!({ "product_id": 1, "size": "M", "quantity": 2 }))
            .await;
        browser
            .post("/api/cart/add", json!({ "product_id": 2, "size": "One Size" }))
            .await;

        let (status, body) = browser.post("/api/orders", json!({})).await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["order"]["customer"], "client@atelier.example");
        assert_eq!(body["order"]["lines"].as_array().unwrap().len(), 2);
        assert_eq!(body["order"]["subtotal"]["amount"], "2820.00");

        let (_, body) = browser.get("/api/cart").await;
        assert_eq!(body["cart"]["item_count"], 0);
    }

    #[tokio::test]
    async fn test_order_refused_when_stock_moved() {
        let mut browser = signed_in().await;
        browser
            .post("/api/cart/add", json!({ "product_id": 1, "size": "M", "quantity": 3 }))
            .await;

        let sold_down = SAMPLE.replace(r#""stock": 3"#, r#""stock": 2"#);
        browser
            .state
            .replace_catalog(Catalog::from_json(&sold_down).unwrap());

        let (status, body) = browser.post("/api/orders", json!({})).await;

        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["cart"]["lines"][0]["quantity"], 2);
        assert_eq!(
            messages(&body),
            vec!["Only 2 left in stock for Cashmere Overcoat (size M); quantity adjusted"]
        );

        let (status, _) = browser.post("/api/orders", json!({})).await;
        assert_eq!(status, StatusCode::CREATED);
    }
}
