//! Cart route handlers.
//!
//! Every mutation locks the shopper's session for its whole duration and
//! works against a single catalog snapshot. Outcomes come back as notices
//! alongside the updated cart; a refused add is still a `200`.

use atelier_core::{
    Cart, CartItem, CartLine, Effects, Email, IdentityGate, Notice, NotificationSink, Price,
    ProductId, ShopperSession, Size, VariantKey,
};
use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::catalog::Catalog;
use crate::error::{Result, add_breadcrumb};
use crate::middleware::CurrentShopper;
use crate::routes::json_body;
use crate::state::AppState;

// =============================================================================
// Views
// =============================================================================

/// One cart line as returned to the client.
#[derive(Debug, Clone, Serialize)]
pub struct CartLineView {
    pub product_id: ProductId,
    pub name: String,
    pub size: Size,
    pub quantity: u32,
    pub unit_price: Price,
    /// Absent if the amount cannot be represented.
    pub line_total: Option<Price>,
    pub image: Option<String>,
}

impl From<&CartLine> for CartLineView {
    fn from(line: &CartLine) -> Self {
        Self {
            product_id: line.product_id,
            name: line.name.clone(),
            size: line.size.clone(),
            quantity: line.quantity,
            unit_price: line.price,
            line_total: line.line_total(),
            image: line.image_refs.first().cloned(),
        }
    }
}

/// The cart as returned to the client.
#[derive(Debug, Clone, Serialize)]
pub struct CartView {
    pub lines: Vec<CartLineView>,
    pub item_count: u64,
    /// Absent when the cart is empty or the total cannot be represented.
    pub subtotal: Option<Price>,
}

impl From<&Cart> for CartView {
    fn from(cart: &Cart) -> Self {
        Self {
            lines: cart.lines().iter().map(CartLineView::from).collect(),
            item_count: cart.item_count(),
            subtotal: cart.subtotal(),
        }
    }
}

/// Response to every cart and auth call.
#[derive(Debug, Clone, Serialize)]
pub struct CartResponse {
    pub cart: CartView,
    /// Signed-in customer, if any.
    pub customer: Option<Email>,
    /// Label of the intent held until sign-in, if any.
    pub pending: Option<&'static str>,
    pub notices: Vec<Notice>,
    /// Where the client should go next, if anywhere.
    pub navigate: Option<&'static str>,
}

impl CartResponse {
    /// Snapshot a session together with the effects of the call.
    #[must_use]
    pub fn new(session: &ShopperSession, effects: Effects) -> Self {
        Self {
            cart: CartView::from(session.cart()),
            customer: session.identity().customer().map(|c| c.email.clone()),
            pending: session.pending().peek().map(|action| action.intent.label()),
            notices: effects.notices,
            navigate: effects.navigation.map(|route| route.path()),
        }
    }
}

/// Cart count response.
#[derive(Debug, Serialize)]
pub struct CountResponse {
    pub count: u64,
}

// =============================================================================
// Requests
// =============================================================================

const fn default_quantity() -> u32 {
    1
}

/// Add-to-cart and buy-now body.
#[derive(Debug, Deserialize)]
pub struct AddRequest {
    pub product_id: ProductId,
    pub size: Size,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

/// Quantity update body. Zero or negative removes the line.
#[derive(Debug, Deserialize)]
pub struct UpdateRequest {
    pub product_id: ProductId,
    pub size: Size,
    pub quantity: i64,
}

/// Line removal body.
#[derive(Debug, Deserialize)]
pub struct RemoveRequest {
    pub product_id: ProductId,
    pub size: Size,
}

// =============================================================================
// Handlers
// =============================================================================

/// Show the current cart.
#[instrument(skip_all, fields(shopper_id = %shopper.id))]
pub async fn show(shopper: CurrentShopper) -> Json<CartResponse> {
    let session = shopper.session.lock().await;
    Json(CartResponse::new(&session, Effects::new()))
}

/// Total units in the cart.
#[instrument(skip_all, fields(shopper_id = %shopper.id))]
pub async fn count(shopper: CurrentShopper) -> Json<CountResponse> {
    let session = shopper.session.lock().await;
    Json(CountResponse {
        count: session.cart().item_count(),
    })
}

/// The catalog item a shopper asked for.
///
/// An unlisted product is refused outright for a signed-in shopper. An
/// anonymous shopper gets a stand-in so the request still goes through the
/// sign-in gate; it is looked up again when replayed.
fn requested_item(
    catalog: &Catalog,
    session: &ShopperSession,
    effects: &mut Effects,
    request: AddRequest,
) -> Option<CartItem> {
    if let Some(item) = catalog.cart_item(request.product_id, request.size.clone()) {
        return Some(item);
    }
    if session.identity().is_authenticated() {
        effects.notify(Notice::variant_not_found());
        return None;
    }
    Some(catalog.unlisted_item(request.product_id, request.size))
}

/// Add an item, or hold the request until the shopper signs in.
#[instrument(skip_all, fields(shopper_id = %shopper.id))]
pub async fn add(
    State(state): State<AppState>,
    shopper: CurrentShopper,
    payload: std::result::Result<Json<AddRequest>, JsonRejection>,
) -> Result<Json<CartResponse>> {
    let request = json_body(payload)?;
    let quantity = request.quantity;
    let mut session = shopper.session.lock().await;
    let catalog = state.catalog();
    let mut effects = Effects::new();

    if let Some(item) = requested_item(&catalog, &session, &mut effects, request) {
        let variant = item.key().to_string();
        add_breadcrumb("cart", "Add to cart", Some(&[("variant", variant.as_str())]));
        session.add_to_cart(&*catalog, &mut effects, item, quantity);
    }

    Ok(Json(CartResponse::new(&session, effects)))
}

/// Replace the cart with one item and head to checkout, or hold the request
/// until the shopper signs in.
#[instrument(skip_all, fields(shopper_id = %shopper.id))]
pub async fn buy_now(
    State(state): State<AppState>,
    shopper: CurrentShopper,
    payload: std::result::Result<Json<AddRequest>, JsonRejection>,
) -> Result<Json<CartResponse>> {
    let request = json_body(payload)?;
    let quantity = request.quantity;
    let mut session = shopper.session.lock().await;
    let catalog = state.catalog();
    let mut effects = Effects::new();

    if let Some(item) = requested_item(&catalog, &session, &mut effects, request) {
        let variant = item.key().to_string();
        add_breadcrumb("cart", "Buy now", Some(&[("variant", variant.as_str())]));
        session.buy_now(&*catalog, &mut effects, item, quantity);
    }

    Ok(Json(CartResponse::new(&session, effects)))
}

/// Set the quantity of a line.
#[instrument(skip_all, fields(shopper_id = %shopper.id))]
pub async fn update(
    State(state): State<AppState>,
    shopper: CurrentShopper,
    payload: std::result::Result<Json<UpdateRequest>, JsonRejection>,
) -> Result<Json<CartResponse>> {
    let request = json_body(payload)?;
    let key = VariantKey::new(request.product_id, request.size);
    let mut session = shopper.session.lock().await;
    let catalog = state.catalog();
    let mut effects = Effects::new();

    if let Err(e) = session.update_quantity(&*catalog, &mut effects, &key, request.quantity) {
        tracing::debug!(variant = %key, error = %e, "quantity update refused");
    }

    Ok(Json(CartResponse::new(&session, effects)))
}

/// Remove a line.
#[instrument(skip_all, fields(shopper_id = %shopper.id))]
pub async fn remove(
    shopper: CurrentShopper,
    payload: std::result::Result<Json<RemoveRequest>, JsonRejection>,
) -> Result<Json<CartResponse>> {
    let request = json_body(payload)?;
    let key = VariantKey::new(request.product_id, request.size);
    let mut session = shopper.session.lock().await;
    let mut effects = Effects::new();

    session.remove_line(&mut effects, &key);

    Ok(Json(CartResponse::new(&session, effects)))
}

/// Empty the cart.
#[instrument(skip_all, fields(shopper_id = %shopper.id))]
pub async fn clear(shopper: CurrentShopper) -> Json<CartResponse> {
    let mut session = shopper.session.lock().await;
    let mut effects = Effects::new();

    session.clear_cart(&mut effects);

    Json(CartResponse::new(&session, effects))
}
