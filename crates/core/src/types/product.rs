//! Catalog product type.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use super::{Price, ProductId};

/// A product as listed in the catalog and carried inside cart/wishlist
/// snapshots.
///
/// Field names follow the storefront's JSON shape (`originalPrice`,
/// `isNew`, ...) so snapshots written by earlier clients still load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub category: String,
    pub price: Price,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_price: Option<Price>,
    pub image: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub features: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub materials: Vec<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_new: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_trending: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_sale: bool,
}

#[allow(clippy::trivially_copy_pass_by_ref)] // serde's skip_serializing_if passes a reference
const fn is_false(value: &bool) -> bool {
    !*value
}

/// The single badge shown on a product card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Badge {
    New,
    Trending,
    Sale,
}

impl Badge {
    /// Label printed on the badge.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::New => "New",
            Self::Trending => "Trending",
            Self::Sale => "Sale",
        }
    }
}

impl Product {
    /// Create a product with the required fields and no flags.
    #[must_use]
    pub fn new(
        id: impl Into<ProductId>,
        name: impl Into<String>,
        category: impl Into<String>,
        price: Price,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            category: category.into(),
            price,
            original_price: None,
            image: String::new(),
            images: Vec::new(),
            description: None,
            features: Vec::new(),
            materials: Vec::new(),
            is_new: false,
            is_trending: false,
            is_sale: false,
        }
    }

    /// Badge precedence is New, then Trending, then Sale.
    #[must_use]
    pub const fn badge(&self) -> Option<Badge> {
        if self.is_new {
            Some(Badge::New)
        } else if self.is_trending {
            Some(Badge::Trending)
        } else if self.is_sale {
            Some(Badge::Sale)
        } else {
            None
        }
    }

    /// Whole-percent markdown from the original price, rounded half up.
    ///
    /// `None` when there is no original price or it is not above the current
    /// price.
    #[must_use]
    pub fn discount_percent(&self) -> Option<u32> {
        let original = self.original_price?.amount();
        if original <= self.price.amount() {
            return None;
        }
        let percent = (original - self.price.amount()) / original * Decimal::ONE_HUNDRED;
        percent
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .to_u32()
    }

    /// Case-insensitive category comparison.
    #[must_use]
    pub fn in_category(&self, category: &str) -> bool {
        self.category.eq_ignore_ascii_case(category)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn cap() -> Product {
        Product::new("2", "Urban Explorer Cap", "Street", Price::from_cents(4599))
    }

    #[test]
    fn test_badge_precedence() {
        let mut product = cap();
        assert_eq!(product.badge(), None);

        product.is_sale = true;
        assert_eq!(product.badge(), Some(Badge::Sale));

        product.is_trending = true;
        assert_eq!(product.badge(), Some(Badge::Trending));

        product.is_new = true;
        assert_eq!(product.badge().map(Badge::label), Some("New"));
    }

    #[test]
    fn test_discount_percent() {
        let mut product = cap();
        assert_eq!(product.discount_percent(), None);

        // (59.99 - 45.99) / 59.99 = 23.34%
        product.original_price = Some(Price::from_cents(5999));
        assert_eq!(product.discount_percent(), Some(23));

        product.original_price = Some(Price::from_cents(4599));
        assert_eq!(product.discount_percent(), None);
    }

    #[test]
    fn test_in_category_ignores_case() {
        assert!(cap().in_category("street"));
        assert!(cap().in_category("STREET"));
        assert!(!cap().in_category("vintage"));
    }

    #[test]
    fn test_json_shape() {
        let json = r#"{
            "id": "2",
            "name": "Urban Explorer Cap",
            "category": "Street",
            "price": 45.99,
            "originalPrice": 59.99,
            "image": "cap.jpg",
            "isSale": true
        }"#;
        let product: Product = serde_json::from_str(json).unwrap();
        assert_eq!(product.original_price, Some(Price::from_cents(5999)));
        assert!(product.is_sale);
        assert!(product.images.is_empty());

        let value = serde_json::to_value(&product).unwrap();
        assert_eq!(value["originalPrice"], serde_json::json!(59.99));
        assert_eq!(value["isSale"], serde_json::json!(true));
        assert!(value.get("isNew").is_none());
    }
}
