//! Cart lines and their transitions.
//!
//! Every mutating method applies one transition and reports what happened as
//! a [`CartChange`]. `None` means the call was a no-op, so callers neither
//! persist nor confirm anything.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::collection::{Collection, CollectionKind};
use crate::types::price::round_money;
use crate::types::{Product, ProductId};

/// A product in the cart with its quantity.
///
/// Serialized flat: the product fields plus `quantity` in one object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    #[serde(flatten)]
    pub product: Product,
    pub quantity: u32,
}

impl CartItem {
    /// Create a line.
    #[must_use]
    pub const fn new(product: Product, quantity: u32) -> Self {
        Self { product, quantity }
    }

    /// Product id of the line.
    #[must_use]
    pub const fn id(&self) -> &ProductId {
        &self.product.id
    }

    /// Unrounded line total.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.product.price.times(self.quantity)
    }
}

/// What a cart transition did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartChange {
    /// A new line was appended.
    Added { name: String, quantity: u32 },
    /// Adding a product already in the cart raised its quantity.
    Merged { name: String, quantity: u32 },
    /// A line's quantity was set explicitly.
    QuantityUpdated { name: String, quantity: u32 },
    /// A line was removed.
    Removed { name: String },
    /// The cart was emptied.
    Cleared,
}

/// The shopper's cart. Line ids are unique.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    /// Build a cart from lines, merging duplicate ids and dropping empty lines.
    #[must_use]
    pub fn from_items(items: Vec<CartItem>) -> Self {
        let mut cart = Self::default();
        for item in items {
            if item.quantity == 0 {
                continue;
            }
            match cart.position(item.id()) {
                Some(idx) => {
                    if let Some(line) = cart.items.get_mut(idx) {
                        line.quantity = line.quantity.saturating_add(item.quantity);
                    }
                }
                None => cart.items.push(item),
            }
        }
        cart
    }

    /// Lines in insertion order.
    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// Line for a product, if present.
    #[must_use]
    pub fn get(&self, product_id: &ProductId) -> Option<&CartItem> {
        self.items.iter().find(|item| item.id() == product_id)
    }

    /// Whether the product has a line in the cart.
    #[must_use]
    pub fn contains(&self, product_id: &ProductId) -> bool {
        self.get(product_id).is_some()
    }

    fn position(&self, product_id: &ProductId) -> Option<usize> {
        self.items.iter().position(|item| item.id() == product_id)
    }

    /// Add `quantity` of a product.
    ///
    /// An existing line goes through the quantity-update path with the summed
    /// quantity; otherwise a new line is appended. Adding zero is a no-op.
    pub fn add(&mut self, product: Product, quantity: u32) -> Option<CartChange> {
        if quantity == 0 {
            return None;
        }
        if let Some(existing) = self.get(&product.id) {
            let merged = existing.quantity.saturating_add(quantity);
            return match self.update_quantity(&product.id, i64::from(merged))? {
                CartChange::QuantityUpdated { name, quantity } => {
                    Some(CartChange::Merged { name, quantity })
                }
                other => Some(other),
            };
        }

        let name = product.name.clone();
        self.items.push(CartItem::new(product, quantity));
        Some(CartChange::Added { name, quantity })
    }

    /// Remove a product's line. No-op if absent.
    pub fn remove(&mut self, product_id: &ProductId) -> Option<CartChange> {
        let idx = self.position(product_id)?;
        let item = self.items.remove(idx);
        Some(CartChange::Removed {
            name: item.product.name,
        })
    }

    /// Set a line's quantity. Below one removes the line; no-op if absent.
    pub fn update_quantity(&mut self, product_id: &ProductId, quantity: i64) -> Option<CartChange> {
        if quantity < 1 {
            return self.remove(product_id);
        }
        let quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
        let idx = self.position(product_id)?;
        let line = self.items.get_mut(idx)?;
        line.quantity = quantity;
        Some(CartChange::QuantityUpdated {
            name: line.product.name.clone(),
            quantity,
        })
    }

    /// Empty the cart unconditionally.
    pub fn clear(&mut self) -> CartChange {
        self.items.clear();
        CartChange::Cleared
    }

    /// Sum of price times quantity, rounded to cents.
    #[must_use]
    pub fn total(&self) -> Decimal {
        round_money(self.items.iter().map(CartItem::subtotal).sum())
    }

    /// Sum of quantities.
    #[must_use]
    pub fn count(&self) -> u32 {
        self.items
            .iter()
            .fold(0_u32, |acc, item| acc.saturating_add(item.quantity))
    }
}

impl Collection for Cart {
    type Change = CartChange;

    const KIND: CollectionKind = CollectionKind::Cart;

    fn len(&self) -> usize {
        self.items.len()
    }

    fn normalized(self) -> Self {
        Self::from_items(self.items)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::Price;

    fn product(id: &str, cents: i64) -> Product {
        Product::new(id, format!("Cap {id}"), "Lifestyle", Price::from_cents(cents))
    }

    #[test]
    fn test_add_appends_new_line() {
        let mut cart = Cart::default();
        let change = cart.add(product("1", 3999), 1);
        assert_eq!(
            change,
            Some(CartChange::Added {
                name: "Cap 1".into(),
                quantity: 1
            })
        );
        assert_eq!(cart.len(), 1);
    }

    #[test]
    fn test_add_merges_by_id() {
        let mut cart = Cart::default();
        cart.add(product("1", 3999), 2);
        let change = cart.add(product("1", 3999), 3);

        assert_eq!(cart.len(), 1);
        assert_eq!(cart.get(&ProductId::new("1")).unwrap().quantity, 5);
        assert!(matches!(change, Some(CartChange::Merged { quantity: 5, .. })));
    }

    #[test]
    fn test_add_zero_is_noop() {
        let mut cart = Cart::default();
        assert_eq!(cart.add(product("1", 100), 0), None);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let mut cart = Cart::default();
        cart.add(product("1", 100), 1);
        let before = cart.clone();

        assert_eq!(cart.remove(&ProductId::new("9")), None);
        assert_eq!(cart, before);
    }

    #[test]
    fn test_update_quantity_floor_removes() {
        let mut with_update = Cart::default();
        with_update.add(product("1", 100), 2);
        with_update.add(product("2", 200), 1);
        let mut with_remove = with_update.clone();

        let a = with_update.update_quantity(&ProductId::new("1"), 0);
        let b = with_remove.remove(&ProductId::new("1"));
        assert_eq!(a, b);
        assert_eq!(with_update, with_remove);

        assert!(with_update.update_quantity(&ProductId::new("2"), -3).is_some());
        assert!(with_update.is_empty());
    }

    #[test]
    fn test_update_quantity_absent_is_noop() {
        let mut cart = Cart::default();
        assert_eq!(cart.update_quantity(&ProductId::new("1"), 4), None);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_update_quantity_sets_value() {
        let mut cart = Cart::default();
        cart.add(product("1", 100), 2);
        let change = cart.update_quantity(&ProductId::new("1"), 7);
        assert!(matches!(
            change,
            Some(CartChange::QuantityUpdated { quantity: 7, .. })
        ));
        assert_eq!(cart.count(), 7);
    }

    #[test]
    fn test_clear_is_unconditional() {
        let mut cart = Cart::default();
        assert_eq!(cart.clear(), CartChange::Cleared);
        cart.add(product("1", 100), 2);
        cart.clear();
        assert!(cart.is_empty());
    }

    #[test]
    fn test_total_and_count() {
        let mut cart = Cart::default();
        cart.add(product("a", 1000), 3);
        cart.add(product("b", 550), 1);

        assert_eq!(cart.total(), Decimal::new(3550, 2));
        assert_eq!(cart.count(), 4);
    }

    #[test]
    fn test_total_rounds_to_cents() {
        let mut cart = Cart::default();
        cart.add(product("1", 3999), 3);
        cart.add(product("2", 4599), 1);
        assert_eq!(cart.total(), Decimal::new(16596, 2));
    }

    #[test]
    fn test_snapshot_round_trip() {
        let json = r#"[{"id":"1","name":"Classic Black Cap","category":"Lifestyle","price":39.99,"image":"a.jpg","quantity":2}]"#;
        let cart: Cart = serde_json::from_str(json).unwrap();
        let item = cart.items().first().unwrap();
        assert_eq!(item.id().as_str(), "1");
        assert_eq!(item.product.price, Price::from_cents(3999));
        assert_eq!(item.quantity, 2);

        let reparsed: Cart = serde_json::from_str(&serde_json::to_string(&cart).unwrap()).unwrap();
        assert_eq!(reparsed, cart);
    }

    #[test]
    fn test_normalized_merges_duplicates_and_drops_empty_lines() {
        let cart = Cart {
            items: vec![
                CartItem::new(product("1", 100), 1),
                CartItem::new(product("2", 100), 0),
                CartItem::new(product("1", 100), 2),
            ],
        }
        .normalized();

        assert_eq!(cart.len(), 1);
        assert_eq!(cart.count(), 3);
    }
}
