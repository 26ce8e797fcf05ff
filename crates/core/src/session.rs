//! Per-shopper composition of cart, identity and the pending-action slot.
//!
//! [`ShopperSession`] is the mutation API the storefront calls. Adds and
//! buy-now go through the identity gate; quantity changes, removal and
//! clearing do not, since lines can only have entered the cart through a
//! guarded add.
//!
//! Collaborators are passed per call: an [`InventorySnapshot`] for stock and
//! an effects receiver implementing [`NotificationSink`] + [`Navigator`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::cart::{Added, Cart, CartError, CartItem, CartLine, QuantityChange, Reconciliation};
use crate::identity::{Customer, Identity, IdentityGate};
use crate::inventory::InventorySnapshot;
use crate::notice::{Navigator, Notice, NotificationSink, RouteIntent};
use crate::pending::{CartIntent, PendingActionSlot};
use crate::types::{Email, Price, VariantKey};

/// What happened to a guarded mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardOutcome {
    /// The shopper was signed in and the intent ran.
    Applied(Result<Added, CartError>),
    /// The shopper was anonymous; the intent is now the pending action.
    /// `replaced` is true when an earlier held intent was discarded.
    Deferred { replaced: bool },
}

/// Why an order could not be placed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderError {
    #[error("sign-in required to place an order")]
    NotAuthenticated,

    #[error("cart is empty")]
    EmptyCart,

    /// Stock moved since the lines were added; the cart has been corrected
    /// and the shopper must review it.
    #[error("cart adjusted to current stock ({} line(s))", .0.len())]
    StockChanged(Vec<Reconciliation>),

    /// Lines are in more than one currency, or the total overflows.
    #[error("cart total cannot be computed")]
    Unpriceable,
}

/// A successfully placed order. Payment and stock decrement happen elsewhere.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacedOrder {
    pub order_id: Uuid,
    pub customer: Email,
    pub lines: Vec<CartLine>,
    pub subtotal: Price,
    pub placed_at: DateTime<Utc>,
}

/// Everything one shopper's browser session owns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShopperSession {
    cart: Cart,
    identity: Identity,
    pending: PendingActionSlot,
}

impl ShopperSession {
    /// An anonymous session with an empty cart.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn cart(&self) -> &Cart {
        &self.cart
    }

    #[must_use]
    pub const fn identity(&self) -> &Identity {
        &self.identity
    }

    #[must_use]
    pub const fn pending(&self) -> &PendingActionSlot {
        &self.pending
    }

    /// Add to cart, or defer until sign-in.
    #[instrument(skip_all, fields(variant = %item.key(), quantity = quantity))]
    pub fn add_to_cart<I, E>(
        &mut self,
        inventory: &I,
        effects: &mut E,
        item: CartItem,
        quantity: u32,
    ) -> GuardOutcome
    where
        I: InventorySnapshot + ?Sized,
        E: NotificationSink + Navigator + ?Sized,
    {
        self.guarded(inventory, effects, CartIntent::AddToCart { item, quantity })
    }

    /// Replace the cart with one item and head to checkout, or defer the
    /// whole sequence until sign-in.
    #[instrument(skip_all, fields(variant = %item.key(), quantity = quantity))]
    pub fn buy_now<I, E>(
        &mut self,
        inventory: &I,
        effects: &mut E,
        item: CartItem,
        quantity: u32,
    ) -> GuardOutcome
    where
        I: InventorySnapshot + ?Sized,
        E: NotificationSink + Navigator + ?Sized,
    {
        self.guarded(inventory, effects, CartIntent::BuyNow { item, quantity })
    }

    fn guarded<I, E>(&mut self, inventory: &I, effects: &mut E, intent: CartIntent) -> GuardOutcome
    where
        I: InventorySnapshot + ?Sized,
        E: NotificationSink + Navigator + ?Sized,
    {
        if self.identity.is_authenticated() {
            return GuardOutcome::Applied(self.execute(inventory, effects, intent));
        }

        effects.notify(Notice::sign_in_required());
        let label = intent.label();
        let replaced = self.pending.hold(intent);
        if let Some(previous) = &replaced {
            info!(
                intent = label,
                discarded = previous.intent.label(),
                "pending action replaced"
            );
        } else {
            info!(intent = label, "pending action held until sign-in");
        }
        effects.request_navigation(RouteIntent::Login);

        GuardOutcome::Deferred {
            replaced: replaced.is_some(),
        }
    }

    fn execute<I, E>(
        &mut self,
        inventory: &I,
        effects: &mut E,
        intent: CartIntent,
    ) -> Result<Added, CartError>
    where
        I: InventorySnapshot + ?Sized,
        E: NotificationSink + Navigator + ?Sized,
    {
        match intent {
            CartIntent::AddToCart { item, quantity } => {
                let result = self.cart.add_or_merge(inventory, &item, quantity);
                report_add(effects, &item, &result);
                result
            }
            CartIntent::BuyNow { item, quantity } => {
                self.cart.clear();
                let result = self.cart.add_or_merge(inventory, &item, quantity);
                report_add(effects, &item, &result);
                if result.is_ok() {
                    effects.request_navigation(RouteIntent::Checkout);
                }
                result
            }
        }
    }

    /// Set the quantity of a line. Not guarded.
    ///
    /// # Errors
    ///
    /// Passes through [`Cart::update_quantity`] errors after notifying. A
    /// missing line is reported silently.
    #[instrument(skip_all, fields(variant = %key, quantity = quantity))]
    pub fn update_quantity<I, E>(
        &mut self,
        inventory: &I,
        effects: &mut E,
        key: &VariantKey,
        quantity: i64,
    ) -> Result<QuantityChange, CartError>
    where
        I: InventorySnapshot + ?Sized,
        E: NotificationSink + ?Sized,
    {
        let (name, size) = match self.cart.line(key) {
            Some(line) => (line.name.clone(), line.size.clone()),
            None => return Err(CartError::LineNotFound(key.clone())),
        };

        let result = self.cart.update_quantity(inventory, key, quantity);
        match &result {
            Ok(QuantityChange::Updated { .. }) => effects.notify(Notice::updated()),
            Ok(QuantityChange::Clamped { available, .. }) => {
                effects.notify(Notice::insufficient_stock(&name, &size, *available));
            }
            Ok(QuantityChange::Removed { sold_out: true, .. }) => {
                effects.notify(Notice::insufficient_stock(&name, &size, 0));
            }
            Ok(QuantityChange::Removed { line, .. }) => {
                effects.notify(Notice::removed(&line.name));
            }
            Err(CartError::VariantNotFound(_)) => effects.notify(Notice::variant_not_found()),
            Err(_) => {}
        }
        result
    }

    /// Remove a line. Not guarded; silent when the line is absent.
    pub fn remove_line<E>(&mut self, effects: &mut E, key: &VariantKey) -> Option<CartLine>
    where
        E: NotificationSink + ?Sized,
    {
        let removed = self.cart.remove_line(key);
        if let Some(line) = &removed {
            effects.notify(Notice::removed(&line.name));
        }
        removed
    }

    /// Empty the cart. Not guarded.
    pub fn clear_cart<E>(&mut self, effects: &mut E)
    where
        E: NotificationSink + ?Sized,
    {
        self.cart.clear();
        effects.notify(Notice::cleared());
    }

    /// Update the held intent's item from the current catalog before replay,
    /// so it runs with today's name and price rather than those seen when it
    /// was held.
    pub fn refresh_pending_item<F>(&mut self, fresh: F) -> bool
    where
        F: FnOnce(&CartItem) -> Option<CartItem>,
    {
        self.pending.refresh_item(fresh)
    }

    /// Commit a successful sign-in, then run the held intent exactly once.
    ///
    /// Returns the replayed intent's result, or `None` if nothing was held.
    #[instrument(skip_all, fields(customer = %customer.email))]
    pub fn sign_in<I, E>(
        &mut self,
        inventory: &I,
        effects: &mut E,
        customer: Customer,
    ) -> Option<Result<Added, CartError>>
    where
        I: InventorySnapshot + ?Sized,
        E: NotificationSink + Navigator + ?Sized,
    {
        self.identity = Identity::Authenticated(customer);

        let action = self.pending.take()?;
        info!(intent = action.intent.label(), "replaying pending action");
        Some(self.execute(inventory, effects, action.intent))
    }

    /// Drop the identity. The cart and any held intent are kept.
    pub fn sign_out(&mut self) {
        if self.pending.is_holding() {
            warn!("signing out with a pending action still held");
        }
        self.identity = Identity::Anonymous;
    }

    /// Place an order for the current cart and clear it.
    ///
    /// Lines are re-checked against `inventory` first; if any had to be
    /// corrected the order is refused and the corrected cart is kept.
    ///
    /// # Errors
    ///
    /// See [`OrderError`]. Each error is also reported to `effects`.
    #[instrument(skip_all)]
    pub fn complete_order<I, E>(
        &mut self,
        inventory: &I,
        effects: &mut E,
    ) -> Result<PlacedOrder, OrderError>
    where
        I: InventorySnapshot + ?Sized,
        E: NotificationSink + Navigator + ?Sized,
    {
        let Some(customer) = self.identity.customer().map(|c| c.email.clone()) else {
            effects.notify(Notice::sign_in_required());
            effects.request_navigation(RouteIntent::Login);
            return Err(OrderError::NotAuthenticated);
        };

        if self.cart.is_empty() {
            effects.notify(Notice::empty_cart());
            return Err(OrderError::EmptyCart);
        }

        let corrections = self.cart.reconcile(inventory);
        if !corrections.is_empty() {
            for correction in &corrections {
                effects.notify(match correction {
                    Reconciliation::Lowered { line, .. } => {
                        Notice::stock_adjusted(&line.name, &line.size, line.quantity)
                    }
                    Reconciliation::Dropped(line) => {
                        Notice::no_longer_available(&line.name, &line.size)
                    }
                });
            }
            warn!(corrections = corrections.len(), "order refused, cart adjusted");
            return Err(OrderError::StockChanged(corrections));
        }

        let subtotal = self.cart.subtotal().ok_or(OrderError::Unpriceable)?;
        let order = PlacedOrder {
            order_id: Uuid::new_v4(),
            customer,
            lines: self.cart.lines().to_vec(),
            subtotal,
            placed_at: Utc::now(),
        };
        self.cart.clear();

        info!(order_id = %order.order_id, subtotal = %order.subtotal, "order placed");
        effects.notify(Notice::order_placed());
        Ok(order)
    }
}

fn report_add<E>(effects: &mut E, item: &CartItem, result: &Result<Added, CartError>)
where
    E: NotificationSink + ?Sized,
{
    effects.notify(match result {
        Ok(_) => Notice::added(&item.name),
        Err(CartError::InsufficientStock { available, .. }) => {
            Notice::insufficient_stock(&item.name, &item.size, *available)
        }
        Err(CartError::InvalidQuantity) => Notice::invalid_quantity(),
        Err(CartError::VariantNotFound(_) | CartError::LineNotFound(_)) => {
            Notice::variant_not_found()
        }
    });
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;
    use crate::inventory::StockLevels;
    use crate::notice::{Effects, NoticeKind};
    use crate::types::{CurrencyCode, ProductId, Size};

    fn item(id: i32, size: &str) -> CartItem {
        CartItem {
            product_id: ProductId::new(id),
            name: format!("Look {id}"),
            price: Price::new(Decimal::new(1200, 0), CurrencyCode::EUR),
            image_refs: Vec::new(),
            size: Size::parse(size).unwrap(),
        }
    }

    fn inventory() -> StockLevels {
        let mut levels = StockLevels::new();
        levels.set(ProductId::new(1), Size::parse("M").unwrap(), 3);
        levels.set(ProductId::new(2), Size::parse("S").unwrap(), 2);
        levels
    }

    fn customer() -> Customer {
        Customer::new(Email::parse("client@atelier.example").unwrap())
    }

    fn signed_in() -> ShopperSession {
        let mut session = ShopperSession::new();
        session.sign_in(&inventory(), &mut Effects::new(), customer());
        session
    }

    #[test]
    fn test_anonymous_add_is_deferred() {
        let mut session = ShopperSession::new();
        let mut effects = Effects::new();

        let outcome = session.add_to_cart(&inventory(), &mut effects, item(1, "M"), 1);

        assert_eq!(outcome, GuardOutcome::Deferred { replaced: false });
        assert!(session.cart().is_empty());
        assert!(session.pending().is_holding());
        assert_eq!(effects.notices, vec![Notice::sign_in_required()]);
        assert_eq!(effects.navigation, Some(RouteIntent::Login));
    }

    #[test]
    fn test_sign_in_replays_pending_once() {
        let stock = inventory();
        let mut session = ShopperSession::new();
        session.add_to_cart(&stock, &mut Effects::new(), item(1, "M"), 1);

        let mut effects = Effects::new();
        let replayed = session.sign_in(&stock, &mut effects, customer());

        assert!(matches!(replayed, Some(Ok(_))));
        assert_eq!(session.cart().item_count(), 1);
        assert_eq!(effects.notices, vec![Notice::added("Look 1")]);
        assert!(!session.pending().is_holding());

        session.sign_out();
        let again = session.sign_in(&stock, &mut Effects::new(), customer());
        assert!(again.is_none());
        assert_eq!(session.cart().item_count(), 1);
    }

    #[test]
    fn test_later_intent_replaces_earlier() {
        let stock = inventory();
        let mut session = ShopperSession::new();
        session.add_to_cart(&stock, &mut Effects::new(), item(1, "M"), 1);
        let outcome = session.add_to_cart(&stock, &mut Effects::new(), item(2, "S"), 1);
        assert_eq!(outcome, GuardOutcome::Deferred { replaced: true });

        session.sign_in(&stock, &mut Effects::new(), customer());

        assert!(session.cart().line(&item(1, "M").key()).is_none());
        assert_eq!(session.cart().line(&item(2, "S").key()).unwrap().quantity, 1);
    }

    #[test]
    fn test_authenticated_add_reports_stock_shortfall() {
        let stock = inventory();
        let mut session = signed_in();
        let mut effects = Effects::new();

        session.add_to_cart(&stock, &mut effects, item(1, "M"), 2);
        let outcome = session.add_to_cart(&stock, &mut effects, item(1, "M"), 2);

        assert!(matches!(
            outcome,
            GuardOutcome::Applied(Err(CartError::InsufficientStock { available: 3, .. }))
        ));
        assert_eq!(session.cart().item_count(), 2);
        assert_eq!(effects.kinds(), vec![NoticeKind::Success, NoticeKind::Error]);
        assert_eq!(
            effects.notices[1].message,
            "Only 3 left in stock for Look 1 (size M)"
        );
    }

    #[test]
    fn test_buy_now_replaces_cart_and_navigates() {
        let stock = inventory();
        let mut session = signed_in();
        session.add_to_cart(&stock, &mut Effects::new(), item(2, "S"), 2);

        let mut effects = Effects::new();
        session.buy_now(&stock, &mut effects, item(1, "M"), 1);

        assert_eq!(session.cart().lines().len(), 1);
        assert_eq!(session.cart().lines()[0].product_id, ProductId::new(1));
        assert_eq!(effects.navigation, Some(RouteIntent::Checkout));
    }

    #[test]
    fn test_deferred_buy_now_runs_whole_sequence_on_sign_in() {
        let stock = inventory();
        let mut session = signed_in();
        session.add_to_cart(&stock, &mut Effects::new(), item(2, "S"), 1);
        session.sign_out();

        let outcome = session.buy_now(&stock, &mut Effects::new(), item(1, "M"), 2);
        assert_eq!(outcome, GuardOutcome::Deferred { replaced: false });
        assert_eq!(session.cart().item_count(), 1);

        let mut effects = Effects::new();
        session.sign_in(&stock, &mut effects, customer());

        assert_eq!(session.cart().lines().len(), 1);
        assert_eq!(session.cart().line(&item(1, "M").key()).unwrap().quantity, 2);
        assert_eq!(effects.navigation, Some(RouteIntent::Checkout));
    }

    #[test]
    fn test_buy_now_failure_does_not_navigate() {
        let stock = inventory();
        let mut session = signed_in();
        let mut effects = Effects::new();

        session.buy_now(&stock, &mut effects, item(1, "M"), 9);

        assert!(session.cart().is_empty());
        assert_eq!(effects.navigation, None);
    }

    #[test]
    fn test_unguarded_operations_work_when_signed_out() {
        let stock = inventory();
        let mut session = signed_in();
        session.add_to_cart(&stock, &mut Effects::new(), item(1, "M"), 1);
        session.add_to_cart(&stock, &mut Effects::new(), item(2, "S"), 1);
        session.sign_out();

        let mut effects = Effects::new();
        let change = session
            .update_quantity(&stock, &mut effects, &item(1, "M").key(), 10)
            .unwrap();
        assert_eq!(
            change,
            QuantityChange::Clamped {
                requested: 10,
                available: 3
            }
        );
        assert!(session.remove_line(&mut effects, &item(2, "S").key()).is_some());
        assert_eq!(session.cart().item_count(), 3);

        session.clear_cart(&mut effects);
        assert!(session.cart().is_empty());
        assert_eq!(
            effects.kinds(),
            vec![NoticeKind::Error, NoticeKind::Success, NoticeKind::Info]
        );
    }

    #[test]
    fn test_update_missing_line_is_silent() {
        let mut session = signed_in();
        let mut effects = Effects::new();

        let result = session.update_quantity(&inventory(), &mut effects, &item(1, "M").key(), 2);

        assert!(matches!(result, Err(CartError::LineNotFound(_))));
        assert!(effects.notices.is_empty());
        assert!(session.remove_line(&mut effects, &item(1, "M").key()).is_none());
        assert!(effects.notices.is_empty());
    }

    #[test]
    fn test_sign_out_keeps_pending_action() {
        let stock = inventory();
        let mut session = ShopperSession::new();
        session.add_to_cart(&stock, &mut Effects::new(), item(1, "M"), 1);
        session.sign_out();
        assert!(session.pending().is_holding());
    }

    #[test]
    fn test_complete_order_clears_cart() {
        let stock = inventory();
        let mut session = signed_in();
        session.add_to_cart(&stock, &mut Effects::new(), item(1, "M"), 2);

        let mut effects = Effects::new();
        let order = session.complete_order(&stock, &mut effects).unwrap();

        assert_eq!(order.lines.len(), 1);
        assert_eq!(order.subtotal.amount, Decimal::new(2400, 0));
        assert_eq!(order.customer.as_str(), "client@atelier.example");
        assert!(session.cart().is_empty());
        assert_eq!(effects.notices, vec![Notice::order_placed()]);
    }

    #[test]
    fn test_complete_order_refuses_when_stock_moved() {
        let mut stock = inventory();
        let mut session = signed_in();
        session.add_to_cart(&stock, &mut Effects::new(), item(1, "M"), 3);
        stock.set(ProductId::new(1), Size::parse("M").unwrap(), 1);

        let mut effects = Effects::new();
        let err = session.complete_order(&stock, &mut effects).unwrap_err();

        assert!(matches!(err, OrderError::StockChanged(ref c) if c.len() == 1));
        assert_eq!(session.cart().item_count(), 1);
        assert_eq!(
            effects.notices[0].message,
            "Only 1 left in stock for Look 1 (size M); quantity adjusted"
        );
    }

    #[test]
    fn test_complete_order_requires_sign_in_and_items() {
        let stock = inventory();
        let mut anonymous = ShopperSession::new();
        let mut effects = Effects::new();
        assert_eq!(
            anonymous.complete_order(&stock, &mut effects),
            Err(OrderError::NotAuthenticated)
        );
        assert_eq!(effects.navigation, Some(RouteIntent::Login));
        assert!(!anonymous.pending().is_holding());

        let mut session = signed_in();
        assert_eq!(
            session.complete_order(&stock, &mut Effects::new()),
            Err(OrderError::EmptyCart)
        );
    }
}
