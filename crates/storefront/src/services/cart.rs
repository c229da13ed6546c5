//! Cart handle used by the front-end.

use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::instrument;

use capstone_core::{Cart, CartChange, CartItem, Product, ProductId};

use crate::error::add_breadcrumb;
use crate::notify::{self, Notifier};
use crate::sync::SyncController;

/// The live cart: mutations go through the sync controller, confirmations
/// go to the notifier.
///
/// Cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct CartHandle {
    controller: Arc<SyncController<Cart>>,
    notifier: Arc<dyn Notifier>,
}

impl CartHandle {
    #[must_use]
    pub fn new(controller: Arc<SyncController<Cart>>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            controller,
            notifier,
        }
    }

    /// Add `quantity` of a product, merging into an existing line.
    #[instrument(skip(self, product), fields(product_id = %product.id))]
    pub fn add(&self, product: Product, quantity: u32) -> Option<CartChange> {
        let product_id = product.id.clone();
        let change = self.controller.apply(|cart| cart.add(product, quantity))?;
        self.confirm(&change, &product_id);
        Some(change)
    }

    /// Remove a line. No-op if the product is not in the cart.
    #[instrument(skip(self))]
    pub fn remove(&self, product_id: &ProductId) -> Option<CartChange> {
        let change = self.controller.apply(|cart| cart.remove(product_id))?;
        self.confirm(&change, product_id);
        Some(change)
    }

    /// Set a line's quantity; below 1 removes the line.
    #[instrument(skip(self))]
    pub fn update_quantity(&self, product_id: &ProductId, quantity: i64) -> Option<CartChange> {
        let change = self
            .controller
            .apply(|cart| cart.update_quantity(product_id, quantity))?;
        self.confirm(&change, product_id);
        Some(change)
    }

    /// Empty the cart.
    #[instrument(skip(self))]
    pub fn clear(&self) {
        let change = self
            .controller
            .apply(|cart| Some(cart.clear()))
            .unwrap_or(CartChange::Cleared);
        add_breadcrumb("cart", "Cart cleared", None);
        if let Some(notification) = notify::for_cart(&change) {
            self.notifier.notify(notification);
        }
    }

    #[must_use]
    pub fn contains(&self, product_id: &ProductId) -> bool {
        self.controller.with(|cart| cart.contains(product_id))
    }

    /// Sum of price × quantity, rounded to cents.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.controller.with(Cart::total)
    }

    /// Sum of quantities.
    #[must_use]
    pub fn count(&self) -> u32 {
        self.controller.with(Cart::count)
    }

    #[must_use]
    pub fn items(&self) -> Vec<CartItem> {
        self.controller.with(|cart| cart.items().to_vec())
    }

    #[must_use]
    pub fn snapshot(&self) -> Cart {
        self.controller.snapshot()
    }

    fn confirm(&self, change: &CartChange, product_id: &ProductId) {
        let message = match change {
            CartChange::Added { .. } => "Added to cart",
            CartChange::Merged { .. } | CartChange::QuantityUpdated { .. } => "Cart quantity changed",
            CartChange::Removed { .. } => "Removed from cart",
            CartChange::Cleared => "Cart cleared",
        };
        add_breadcrumb("cart", message, Some(&[("product_id", product_id.as_str())]));

        if let Some(notification) = notify::for_cart(change) {
            self.notifier.notify(notification);
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use capstone_core::Price;

    use super::*;
    use crate::backend::MemoryRecords;
    use crate::identity::{AuthEvent, SessionChange};
    use crate::notify::RecordingNotifier;
    use crate::storage::MemoryStore;

    fn product(id: &str, cents: i64) -> Product {
        Product::new(id, format!("Cap {id}"), "Lifestyle", Price::from_cents(cents))
    }

    async fn handle() -> (CartHandle, Arc<RecordingNotifier>) {
        let controller = Arc::new(SyncController::new(
            Arc::new(MemoryStore::new()),
            Arc::new(MemoryRecords::new()),
        ));
        controller
            .observe(&SessionChange {
                event: AuthEvent::InitialSession,
                session: None,
            })
            .await;
        let notifier = Arc::new(RecordingNotifier::new());
        (CartHandle::new(controller, notifier.clone()), notifier)
    }

    #[tokio::test]
    async fn test_confirmations() {
        let (cart, notifier) = handle().await;

        cart.add(product("1", 1000), 1);
        cart.add(product("1", 1000), 2);
        cart.update_quantity(&ProductId::new("1"), 7);
        cart.remove(&ProductId::new("missing"));
        cart.remove(&ProductId::new("1"));
        cart.clear();

        assert_eq!(
            notifier.titles(),
            vec![
                "Added to cart",
                "Cart updated",
                "Removed from cart",
                "Cart cleared"
            ]
        );
    }

    #[tokio::test]
    async fn test_totals() {
        let (cart, _notifier) = handle().await;
        cart.add(product("1", 1000), 3);
        cart.add(product("2", 550), 1);

        assert_eq!(cart.total(), Decimal::new(3550, 2));
        assert_eq!(cart.count(), 4);
        assert!(cart.contains(&ProductId::new("2")));
        assert_eq!(cart.items().len(), 2);
    }

    #[tokio::test]
    async fn test_zero_quantity_removes() {
        let (cart, notifier) = handle().await;
        cart.add(product("1", 1000), 2);
        cart.update_quantity(&ProductId::new("1"), 0);

        assert!(cart.snapshot().items().is_empty());
        assert_eq!(notifier.titles().last().map(String::as_str), Some("Removed from cart"));
    }
}
