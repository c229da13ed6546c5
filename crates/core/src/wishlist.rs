//! Wishlist entries and their transitions.

use serde::{Deserialize, Serialize};

use crate::collection::{Collection, CollectionKind};
use crate::types::{Product, ProductId};

/// What a wishlist transition did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WishlistChange {
    Added { name: String },
    Removed { name: String },
    Cleared,
}

/// Saved products, unique by id, in the order they were saved.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Wishlist {
    products: Vec<Product>,
}

impl Wishlist {
    /// Build a wishlist, keeping the first occurrence of each id.
    #[must_use]
    pub fn from_products(products: Vec<Product>) -> Self {
        let mut wishlist = Self::default();
        for product in products {
            wishlist.add(product);
        }
        wishlist
    }

    #[must_use]
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    #[must_use]
    pub fn contains(&self, product_id: &ProductId) -> bool {
        self.products.iter().any(|p| &p.id == product_id)
    }

    /// Save a product. Idempotent: already-saved products are a no-op.
    pub fn add(&mut self, product: Product) -> Option<WishlistChange> {
        if self.contains(&product.id) {
            return None;
        }
        let name = product.name.clone();
        self.products.push(product);
        Some(WishlistChange::Added { name })
    }

    /// Forget a product. No-op if absent.
    pub fn remove(&mut self, product_id: &ProductId) -> Option<WishlistChange> {
        let idx = self.products.iter().position(|p| &p.id == product_id)?;
        let product = self.products.remove(idx);
        Some(WishlistChange::Removed { name: product.name })
    }

    /// Empty the wishlist unconditionally.
    pub fn clear(&mut self) -> WishlistChange {
        self.products.clear();
        WishlistChange::Cleared
    }
}

impl Collection for Wishlist {
    type Change = WishlistChange;

    const KIND: CollectionKind = CollectionKind::Wishlist;

    fn len(&self) -> usize {
        self.products.len()
    }

    fn normalized(self) -> Self {
        Self::from_products(self.products)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::Price;

    fn product(id: &str) -> Product {
        Product::new(id, format!("Cap {id}"), "Vintage", Price::from_cents(4999))
    }

    #[test]
    fn test_add_twice_keeps_one_entry() {
        let mut wishlist = Wishlist::default();
        assert!(wishlist.add(product("4")).is_some());
        assert_eq!(wishlist.add(product("4")), None);
        assert_eq!(wishlist.len(), 1);
    }

    #[test]
    fn test_remove() {
        let mut wishlist = Wishlist::from_products(vec![product("1"), product("2")]);
        assert_eq!(
            wishlist.remove(&ProductId::new("1")),
            Some(WishlistChange::Removed {
                name: "Cap 1".into()
            })
        );
        assert_eq!(wishlist.remove(&ProductId::new("1")), None);
        assert!(wishlist.contains(&ProductId::new("2")));
    }

    #[test]
    fn test_from_products_dedups() {
        let wishlist = Wishlist::from_products(vec![product("1"), product("1"), product("3")]);
        let ids: Vec<_> = wishlist.products().iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, ["1", "3"]);
    }

    #[test]
    fn test_serializes_as_product_array() {
        let wishlist = Wishlist::from_products(vec![product("1")]);
        let value = serde_json::to_value(&wishlist).unwrap();
        assert!(value.is_array());
        assert_eq!(value[0]["id"], "1");
        assert!(value[0].get("quantity").is_none());
    }

    #[test]
    fn test_clear() {
        let mut wishlist = Wishlist::from_products(vec![product("1")]);
        assert_eq!(wishlist.clear(), WishlistChange::Cleared);
        assert!(wishlist.is_empty());
    }
}
