//! Outcome messages and navigation hints produced by cart operations.
//!
//! The engine decides what to say; a [`NotificationSink`] decides how to show
//! it. Navigation works the same way through [`Navigator`].

use serde::{Deserialize, Serialize};

use crate::types::Size;

/// Severity of a [`Notice`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    Success,
    Error,
    Info,
}

/// A human-readable outcome message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub message: String,
    pub kind: NoticeKind,
}

impl Notice {
    fn success(message: String) -> Self {
        Self {
            message,
            kind: NoticeKind::Success,
        }
    }

    fn error(message: String) -> Self {
        Self {
            message,
            kind: NoticeKind::Error,
        }
    }

    fn info(message: String) -> Self {
        Self {
            message,
            kind: NoticeKind::Info,
        }
    }

    /// An item was added (or merged) into the cart.
    #[must_use]
    pub fn added(name: &str) -> Self {
        Self::success(format!("{name} added to cart"))
    }

    /// The request would exceed the stock of one size.
    #[must_use]
    pub fn insufficient_stock(name: &str, size: &Size, available: u32) -> Self {
        Self::error(format!(
            "Only {available} left in stock for {name} (size {size})"
        ))
    }

    /// The requested product/size is not in the catalog.
    #[must_use]
    pub fn variant_not_found() -> Self {
        Self::error("This item is no longer available".to_owned())
    }

    /// A zero or negative quantity was requested for an add.
    #[must_use]
    pub fn invalid_quantity() -> Self {
        Self::error("Quantity must be at least 1".to_owned())
    }

    /// A line quantity was changed.
    #[must_use]
    pub fn updated() -> Self {
        Self::success("Cart updated".to_owned())
    }

    /// A line was removed.
    #[must_use]
    pub fn removed(name: &str) -> Self {
        Self::success(format!("{name} removed from cart"))
    }

    /// The whole cart was emptied.
    #[must_use]
    pub fn cleared() -> Self {
        Self::info("Cart cleared".to_owned())
    }

    /// A guarded mutation was deferred until sign-in.
    #[must_use]
    pub fn sign_in_required() -> Self {
        Self::info("Please sign in to continue".to_owned())
    }

    /// Checkout found a line above current stock and lowered it.
    #[must_use]
    pub fn stock_adjusted(name: &str, size: &Size, available: u32) -> Self {
        Self::error(format!(
            "Only {available} left in stock for {name} (size {size}); quantity adjusted"
        ))
    }

    /// Checkout found a line that can no longer be bought.
    #[must_use]
    pub fn no_longer_available(name: &str, size: &Size) -> Self {
        Self::error(format!(
            "{name} (size {size}) is no longer available and was removed"
        ))
    }

    /// Checkout was attempted on an empty cart.
    #[must_use]
    pub fn empty_cart() -> Self {
        Self::error("Your cart is empty".to_owned())
    }

    /// An order was placed.
    #[must_use]
    pub fn order_placed() -> Self {
        Self::success("Thank you, your order has been placed".to_owned())
    }
}

/// Receiver of [`Notice`]s. Fire-and-forget.
pub trait NotificationSink {
    fn notify(&mut self, notice: Notice);
}

impl NotificationSink for Vec<Notice> {
    fn notify(&mut self, notice: Notice) {
        self.push(notice);
    }
}

/// Where the shopper should be sent next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteIntent {
    Login,
    Checkout,
}

impl RouteIntent {
    /// The storefront path for this intent.
    #[must_use]
    pub const fn path(&self) -> &'static str {
        match self {
            Self::Login => "/auth/login",
            Self::Checkout => "/checkout",
        }
    }
}

/// Receiver of navigation hints. Fire-and-forget.
pub trait Navigator {
    fn request_navigation(&mut self, intent: RouteIntent);
}

/// Collects everything one operation wants to tell the caller.
///
/// Only the most recent navigation request is kept.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Effects {
    pub notices: Vec<Notice>,
    pub navigation: Option<RouteIntent>,
}

impl Effects {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The kinds of all collected notices, in order.
    #[must_use]
    pub fn kinds(&self) -> Vec<NoticeKind> {
        self.notices.iter().map(|n| n.kind).collect()
    }
}

impl NotificationSink for Effects {
    fn notify(&mut self, notice: Notice) {
        tracing::debug!(kind = ?notice.kind, message = %notice.message, "cart notice");
        self.notices.push(notice);
    }
}

impl Navigator for Effects {
    fn request_navigation(&mut self, intent: RouteIntent) {
        self.navigation = Some(intent);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_stock_cites_available_units() {
        let notice = Notice::insufficient_stock("Cashmere Coat", &Size::parse("M").unwrap(), 3);
        assert_eq!(notice.kind, NoticeKind::Error);
        assert_eq!(
            notice.message,
            "Only 3 left in stock for Cashmere Coat (size M)"
        );
    }

    #[test]
    fn test_messages_name_the_product() {
        assert_eq!(Notice::added("Silk Scarf").message, "Silk Scarf added to cart");
        assert_eq!(
            Notice::removed("Silk Scarf").message,
            "Silk Scarf removed from cart"
        );
        assert_eq!(Notice::sign_in_required().kind, NoticeKind::Info);
    }

    #[test]
    fn test_effects_keep_last_navigation() {
        let mut effects = Effects::new();
        effects.request_navigation(RouteIntent::Login);
        effects.request_navigation(RouteIntent::Checkout);
        effects.notify(Notice::updated());
        assert_eq!(effects.navigation, Some(RouteIntent::Checkout));
        assert_eq!(effects.kinds(), vec![NoticeKind::Success]);
    }

    #[test]
    fn test_notice_serializes_kind_in_snake_case() {
        let json = serde_json::to_value(Notice::cleared()).unwrap();
        assert_eq!(json["kind"], "info");
        assert_eq!(RouteIntent::Checkout.path(), "/checkout");
    }
}
