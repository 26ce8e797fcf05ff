//! Shopper extractor.
//!
//! Resolves the browser's cookie session to its [`ShopperSession`] in the
//! registry, minting a shopper id on the first request.
//!
//! [`ShopperSession`]: atelier_core::ShopperSession

use axum::{extract::FromRequestParts, http::request::Parts};
use tower_sessions::Session;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::session_keys;
use crate::shoppers::SharedShopper;
use crate::state::AppState;

/// The current shopper.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(shopper: CurrentShopper) -> impl IntoResponse {
///     let session = shopper.session.lock().await;
///     session.cart().item_count().to_string()
/// }
/// ```
pub struct CurrentShopper {
    /// Stable id stored in the cookie session.
    pub id: Uuid,
    /// The shopper's cart, identity and pending action.
    pub session: SharedShopper,
}

impl FromRequestParts<AppState> for CurrentShopper {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        // Set by SessionManagerLayer
        let session = parts
            .extensions
            .get::<Session>()
            .cloned()
            .ok_or_else(|| AppError::Internal("session layer missing".to_string()))?;

        let id = shopper_id(&session).await?;
        let shopper = state.shoppers().get_or_create(id).await;

        Ok(Self {
            id,
            session: shopper,
        })
    }
}

/// Read the shopper id from the session, creating one if absent.
async fn shopper_id(session: &Session) -> Result<Uuid, AppError> {
    if let Some(id) = session.get::<Uuid>(session_keys::SHOPPER_ID).await? {
        return Ok(id);
    }

    let id = Uuid::new_v4();
    session.insert(session_keys::SHOPPER_ID, id).await?;
    tracing::debug!(shopper_id = %id, "new shopper");
    Ok(id)
}
