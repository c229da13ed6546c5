//! Display data for front-ends.
//!
//! Plain structs with prices already formatted, so renderers need no money
//! logic of their own.

use capstone_core::{Cart, CartItem, Price, Product};

/// Cart line display data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartItemView {
    pub id: String,
    pub name: String,
    pub category: String,
    pub quantity: u32,
    pub price: String,
    pub line_price: String,
}

/// Cart display data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub subtotal: String,
    pub shipping: String,
    pub tax: String,
    pub total: String,
    pub item_count: u32,
}

impl CartView {
    /// Whether there is nothing to show.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl From<&CartItem> for CartItemView {
    fn from(item: &CartItem) -> Self {
        Self {
            id: item.id().to_string(),
            name: item.product.name.clone(),
            category: item.product.category.clone(),
            quantity: item.quantity,
            price: item.product.price.to_string(),
            line_price: Price::new(item.subtotal()).to_string(),
        }
    }
}

impl From<&Cart> for CartView {
    fn from(cart: &Cart) -> Self {
        let total = Price::new(cart.total()).to_string();
        Self {
            items: cart.items().iter().map(CartItemView::from).collect(),
            subtotal: total.clone(),
            // Shipping and tax are not charged
            shipping: Price::ZERO.to_string(),
            tax: Price::ZERO.to_string(),
            total,
            item_count: cart.count(),
        }
    }
}

/// Product card display data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductCardView {
    pub id: String,
    pub name: String,
    pub category: String,
    pub price: String,
    pub original_price: Option<String>,
    pub badge: Option<&'static str>,
    pub discount: Option<String>,
}

impl From<&Product> for ProductCardView {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.to_string(),
            name: product.name.clone(),
            category: product.category.clone(),
            price: product.price.to_string(),
            original_price: product.original_price.map(|p| p.to_string()),
            badge: product.badge().map(capstone_core::Badge::label),
            discount: product.discount_percent().map(|d| format!("-{d}%")),
        }
    }
}
