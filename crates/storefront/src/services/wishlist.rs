//! Wishlist handle used by the front-end.

use std::sync::Arc;

use tracing::instrument;

use capstone_core::{Product, ProductId, Wishlist, WishlistChange};

use crate::error::add_breadcrumb;
use crate::notify::{self, Notifier};
use crate::sync::SyncController;

/// The live wishlist.
#[derive(Clone)]
pub struct WishlistHandle {
    controller: Arc<SyncController<Wishlist>>,
    notifier: Arc<dyn Notifier>,
}

impl WishlistHandle {
    #[must_use]
    pub fn new(controller: Arc<SyncController<Wishlist>>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            controller,
            notifier,
        }
    }

    /// Add a product; already-wishlisted products are left alone.
    #[instrument(skip(self, product), fields(product_id = %product.id))]
    pub fn add(&self, product: Product) -> Option<WishlistChange> {
        let product_id = product.id.clone();
        let change = self.controller.apply(|list| list.add(product))?;
        self.confirm(&change, Some(&product_id));
        Some(change)
    }

    #[instrument(skip(self))]
    pub fn remove(&self, product_id: &ProductId) -> Option<WishlistChange> {
        let change = self.controller.apply(|list| list.remove(product_id))?;
        self.confirm(&change, Some(product_id));
        Some(change)
    }

    /// Add if absent, remove if present.
    pub fn toggle(&self, product: Product) -> Option<WishlistChange> {
        if self.contains(&product.id) {
            self.remove(&product.id)
        } else {
            self.add(product)
        }
    }

    #[instrument(skip(self))]
    pub fn clear(&self) {
        let change = self
            .controller
            .apply(|list| Some(list.clear()))
            .unwrap_or(WishlistChange::Cleared);
        self.confirm(&change, None);
    }

    #[must_use]
    pub fn contains(&self, product_id: &ProductId) -> bool {
        self.controller.with(|list| list.contains(product_id))
    }

    #[must_use]
    pub fn products(&self) -> Vec<Product> {
        self.controller.with(|list| list.products().to_vec())
    }

    fn confirm(&self, change: &WishlistChange, product_id: Option<&ProductId>) {
        let notification = notify::for_wishlist(change);
        match product_id {
            Some(id) => add_breadcrumb("wishlist", &notification.title, Some(&[("product_id", id.as_str())])),
            None => add_breadcrumb("wishlist", &notification.title, None),
        }
        self.notifier.notify(notification);
    }
}
