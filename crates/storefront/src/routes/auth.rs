//! Sign-in and sign-out.
//!
//! Credential checks are out of scope here; any well-formed e-mail signs in.
//! What matters is the ordering: the identity is committed first, then the
//! action that was waiting on sign-in runs once against the current catalog,
//! with its item looked up again there.

use atelier_core::{Customer, Effects, Email};
use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use serde::Deserialize;
use tracing::instrument;

use crate::error::{AppError, Result, clear_sentry_user, set_sentry_user};
use crate::middleware::CurrentShopper;
use crate::routes::cart::CartResponse;
use crate::routes::json_body;
use crate::state::AppState;

/// Login body.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
}

/// Sign in and replay any held cart action.
#[instrument(skip_all, fields(shopper_id = %shopper.id))]
pub async fn login(
    State(state): State<AppState>,
    shopper: CurrentShopper,
    payload: std::result::Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<CartResponse>> {
    let request = json_body(payload)?;
    let email = Email::parse(&request.email).map_err(|e| AppError::BadRequest(e.to_string()))?;

    let mut session = shopper.session.lock().await;
    let catalog = state.catalog();
    let mut effects = Effects::new();

    set_sentry_user(email.as_str());
    session.refresh_pending_item(|held| catalog.refresh_item(held));
    if let Some(replayed) = session.sign_in(&*catalog, &mut effects, Customer::new(email)) {
        tracing::info!(succeeded = replayed.is_ok(), "pending cart action replayed");
    }

    Ok(Json(CartResponse::new(&session, effects)))
}

/// Sign out. The cart stays with the browser session.
#[instrument(skip_all, fields(shopper_id = %shopper.id))]
pub async fn logout(shopper: CurrentShopper) -> Json<CartResponse> {
    let mut session = shopper.session.lock().await;
    session.sign_out();
    clear_sentry_user();

    Json(CartResponse::new(&session, Effects::new()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::routes::test_support::{Browser, messages};

    #[tokio::test]
    async fn test_login_rejects_invalid_email() {
        let mut browser = Browser::new();

        let (status, _) = browser
            .post("/api/auth/login", json!({ "email": "not-an-email" }))
            .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_login_replays_held_add() {
        let mut browser = Browser::new();
        browser
            .post("/api/cart/add", json!({ "product_id": 2, "size": "One Size", "quantity": 2 }))
            .await;

        let (status, body) = browser
            .post("/api/auth/login", json!({ "email": "Client@Atelier.example" }))
            .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["customer"], "client@atelier.example");
        assert!(body["pending"].is_null());
        assert_eq!(body["cart"]["lines"][0]["quantity"], 2);
        assert_eq!(messages(&body), vec!["Silk Scarf added to cart"]);
    }

    #[tokio::test]
    async fn test_only_latest_held_action_runs() {
        let mut browser = Browser::new();
        browser
            .post("/api/cart/add", json!({ "product_id": 2, "size": "One Size" }))
            .await;
        browser
            .post("/api/cart/buy-now", json!({ "product_id": 1, "size": "M" }))
            .await;

        let (_, body) = browser
            .post("/api/auth/login", json!({ "email": "client@atelier.example" }))
            .await;

        let lines = body["cart"]["lines"].as_array().unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0]["product_id"], 1);
        assert_eq!(body["navigate"], "/checkout");
    }

    #[tokio::test]
    async fn test_replay_checks_stock_at_sign_in() {
        let mut browser = Browser::new();
        browser
            .post("/api/cart/add", json!({ "product_id": 1, "size": "M", "quantity": 3 }))
            .await;

        let sold_down = crate::catalog::tests::SAMPLE.replace(r#""stock": 3"#, r#""stock": 1"#);
        browser
            .state
            .replace_catalog(crate::catalog::Catalog::from_json(&sold_down).unwrap());

        let (_, body) = browser
            .post("/api/auth/login", json!({ "email": "client@atelier.example" }))
            .await;

        assert_eq!(body["cart"]["item_count"], 0);
        assert_eq!(
            messages(&body),
            vec!["Only 1 left in stock for Cashmere Overcoat (size M)"]
        );
    }

    #[tokio::test]
    async fn test_unlisted_product_is_held_then_refused() {
        let mut browser = Browser::new();

        let (status, body) = browser
            .post("/api/cart/add", json!({ "product_id": 99, "size": "M" }))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["pending"], "add_to_cart");
        assert_eq!(body["navigate"], "/auth/login");

        let (_, body) = browser
            .post("/api/auth/login", json!({ "email": "client@atelier.example" }))
            .await;
        assert!(body["pending"].is_null());
        assert_eq!(body["cart"]["item_count"], 0);
        assert_eq!(messages(&body), vec!["This item is no longer available"]);
    }

    #[tokio::test]
    async fn test_replay_uses_catalog_at_sign_in() {
        let mut browser = Browser::new();
        browser
            .post("/api/cart/add", json!({ "product_id": 3, "size": "S" }))
            .await;

        let restocked = crate::catalog::tests::SAMPLE.replace(
            r#""sizes": [{ "size": "One Size", "stock": 5 }]"#,
            r#""sizes": [{ "size": "One Size", "stock": 5 }]
            },
            {
                "id": 3,
                "name": "Wool Trousers",
                "price": "540.00",
                "sizes": [{ "size": "S", "stock": 2 }]"#,
        );
        browser
            .state
            .replace_catalog(crate::catalog::Catalog::from_json(&restocked).unwrap());

        let (_, body) = browser
            .post("/api/auth/login", json!({ "email": "client@atelier.example" }))
            .await;

        assert_eq!(body["cart"]["lines"][0]["name"], "Wool Trousers");
        assert_eq!(body["cart"]["lines"][0]["unit_price"]["amount"], "540.00");
        assert_eq!(messages(&body), vec!["Wool Trousers added to cart"]);
    }

    #[tokio::test]
    async fn test_logout_keeps_cart() {
        let mut browser = Browser::new();
        browser
            .post("/api/auth/login", json!({ "email": "client@atelier.example" }))
            .await;
        browser
            .post("/api/cart/add", json!({ "product_id": 1, "size": "M" }))
            .await;

        let (_, body) = browser.post("/api/auth/logout", json!({})).await;

        assert!(body["customer"].is_null());
        assert_eq!(body["cart"]["item_count"], 1);

        let (_, body) = browser
            .post("/api/cart/add", json!({ "product_id": 1, "size": "M" }))
            .await;
        assert_eq!(body["pending"], "add_to_cart");
        assert_eq!(body["cart"]["item_count"], 1);
    }
}
