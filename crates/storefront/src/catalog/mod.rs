//! Static product and review catalog.
//!
//! The catalog ships inside the binary as JSON (`content/products.json`,
//! `content/reviews.json`) and is validated once at startup.

mod review;

pub use review::Review;

use std::cmp::Ordering;
use std::collections::HashSet;

use thiserror::Error;

use capstone_core::{Product, ProductId};

const PRODUCTS_JSON: &str = include_str!("../../content/products.json");
const REVIEWS_JSON: &str = include_str!("../../content/reviews.json");

/// Errors loading or querying the catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog JSON error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("duplicate product id: {0}")]
    DuplicateProduct(ProductId),
    #[error("review {id} has rating {rating}, expected 1-5")]
    InvalidRating { id: String, rating: u8 },
    #[error("no product with id {0}")]
    UnknownProduct(String),
}

/// A category filter choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryOption {
    pub value: &'static str,
    pub label: &'static str,
}

/// Filter value meaning "no category filter".
pub const ALL_CATEGORIES: &str = "all";

/// Category filters in display order.
pub const CATEGORIES: &[CategoryOption] = &[
    CategoryOption {
        value: ALL_CATEGORIES,
        label: "All Categories",
    },
    CategoryOption {
        value: "lifestyle",
        label: "Lifestyle",
    },
    CategoryOption {
        value: "street",
        label: "Street",
    },
    CategoryOption {
        value: "vintage",
        label: "Vintage",
    },
    CategoryOption {
        value: "sports",
        label: "Sports",
    },
    CategoryOption {
        value: "outdoor",
        label: "Outdoor",
    },
];

/// Label for a category filter value. Unknown values read as "All Categories".
#[must_use]
pub fn category_label(value: &str) -> &'static str {
    CATEGORIES
        .iter()
        .find(|c| c.value.eq_ignore_ascii_case(value))
        .map_or("All Categories", |c| c.label)
}

/// Product listing order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    /// Catalog order.
    #[default]
    Newest,
    PriceLow,
    PriceHigh,
    NameAsc,
    NameDesc,
}

impl SortOrder {
    pub const ALL: [Self; 5] = [
        Self::Newest,
        Self::PriceLow,
        Self::PriceHigh,
        Self::NameAsc,
        Self::NameDesc,
    ];

    /// Parse a sort key; unknown keys fall back to [`SortOrder::Newest`].
    #[must_use]
    pub fn parse(key: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|order| order.as_str() == key.trim())
            .unwrap_or_default()
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Newest => "newest",
            Self::PriceLow => "price-low",
            Self::PriceHigh => "price-high",
            Self::NameAsc => "name-asc",
            Self::NameDesc => "name-desc",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Newest => "Newest",
            Self::PriceLow => "Price: Low to High",
            Self::PriceHigh => "Price: High to Low",
            Self::NameAsc => "Name: A to Z",
            Self::NameDesc => "Name: Z to A",
        }
    }

    fn compare(self, a: &Product, b: &Product) -> Ordering {
        match self {
            Self::Newest => Ordering::Equal,
            Self::PriceLow => a.price.cmp(&b.price),
            Self::PriceHigh => b.price.cmp(&a.price),
            Self::NameAsc => compare_names(&a.name, &b.name),
            Self::NameDesc => compare_names(&b.name, &a.name),
        }
    }
}

/// Case-insensitive name order, ties broken by the raw strings.
fn compare_names(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

/// The product and review catalog.
#[derive(Debug, Clone)]
pub struct Catalog {
    products: Vec<Product>,
    reviews: Vec<Review>,
}

impl Catalog {
    /// Load the catalog compiled into the binary.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` if the embedded JSON is invalid.
    pub fn embedded() -> Result<Self, CatalogError> {
        Self::from_json(PRODUCTS_JSON, REVIEWS_JSON)
    }

    /// Parse and validate a catalog.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` on malformed JSON, duplicate product ids, or
    /// ratings outside 1-5.
    pub fn from_json(products: &str, reviews: &str) -> Result<Self, CatalogError> {
        let products: Vec<Product> = serde_json::from_str(products)?;
        let reviews: Vec<Review> = serde_json::from_str(reviews)?;

        let mut seen = HashSet::new();
        for product in &products {
            if !seen.insert(&product.id) {
                return Err(CatalogError::DuplicateProduct(product.id.clone()));
            }
        }
        if let Some(review) = reviews.iter().find(|r| !(1..=5).contains(&r.rating)) {
            return Err(CatalogError::InvalidRating {
                id: review.id.to_string(),
                rating: review.rating,
            });
        }

        tracing::debug!(products = products.len(), reviews = reviews.len(), "catalog loaded");
        Ok(Self { products, reviews })
    }

    /// All products in catalog order.
    #[must_use]
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    #[must_use]
    pub fn get(&self, id: &ProductId) -> Option<&Product> {
        self.products.iter().find(|p| &p.id == id)
    }

    /// Look up a product by its raw id.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::UnknownProduct` if there is no such product.
    pub fn require(&self, id: &str) -> Result<&Product, CatalogError> {
        self.get(&ProductId::new(id))
            .ok_or_else(|| CatalogError::UnknownProduct(id.to_string()))
    }

    #[must_use]
    pub fn new_arrivals(&self) -> Vec<&Product> {
        self.products.iter().filter(|p| p.is_new).collect()
    }

    #[must_use]
    pub fn trending(&self) -> Vec<&Product> {
        self.products.iter().filter(|p| p.is_trending).collect()
    }

    #[must_use]
    pub fn on_sale(&self) -> Vec<&Product> {
        self.products.iter().filter(|p| p.is_sale).collect()
    }

    /// Products in `category` (or all of them for `"all"`), in `order`.
    #[must_use]
    pub fn browse(&self, category: &str, order: SortOrder) -> Vec<&Product> {
        let category = category.trim();
        let mut listed: Vec<&Product> = self
            .products
            .iter()
            .filter(|p| category.eq_ignore_ascii_case(ALL_CATEGORIES) || p.in_category(category))
            .collect();
        listed.sort_by(|a, b| order.compare(a, b));
        listed
    }

    #[must_use]
    pub fn reviews(&self) -> &[Review] {
        &self.reviews
    }

    /// The first `n` reviews.
    #[must_use]
    pub fn featured_reviews(&self, n: usize) -> &[Review] {
        self.reviews.get(..n).unwrap_or(&self.reviews)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use capstone_core::Badge;

    use super::*;

    fn ids(products: &[&Product]) -> Vec<String> {
        products.iter().map(|p| p.id.to_string()).collect()
    }

    #[test]
    fn test_embedded_catalog_loads() {
        let catalog = Catalog::embedded().unwrap();
        assert_eq!(catalog.products().len(), 8);
        assert_eq!(catalog.reviews().len(), 5);
        assert_eq!(
            catalog.get(&ProductId::new("1")).unwrap().name,
            "Classic Black Cap"
        );
    }

    #[test]
    fn test_flag_queries() {
        let catalog = Catalog::embedded().unwrap();
        assert_eq!(ids(&catalog.new_arrivals()), vec!["3", "6"]);
        assert_eq!(ids(&catalog.trending()), vec!["1", "4"]);
        assert_eq!(ids(&catalog.on_sale()), vec!["2", "5"]);
    }

    #[test]
    fn test_browse_filters_case_insensitively() {
        let catalog = Catalog::embedded().unwrap();
        assert_eq!(
            ids(&catalog.browse("lifestyle", SortOrder::Newest)),
            vec!["1", "3", "7", "8"]
        );
        assert_eq!(catalog.browse("ALL", SortOrder::Newest).len(), 8);
        assert!(catalog.browse("hats", SortOrder::Newest).is_empty());
    }

    #[test]
    fn test_browse_sorts_stably() {
        let catalog = Catalog::embedded().unwrap();
        // 1 and 7 share a price and keep catalog order
        assert_eq!(
            ids(&catalog.browse("all", SortOrder::PriceLow)),
            vec!["5", "1", "7", "3", "8", "2", "4", "6"]
        );
        assert_eq!(
            ids(&catalog.browse("all", SortOrder::PriceHigh)),
            vec!["6", "4", "2", "8", "3", "1", "7", "5"]
        );
        assert_eq!(
            ids(&catalog.browse("lifestyle", SortOrder::NameAsc)),
            vec!["1", "7", "8", "3"]
        );
        assert_eq!(
            ids(&catalog.browse("lifestyle", SortOrder::NameDesc)),
            vec!["3", "8", "7", "1"]
        );
    }

    #[test]
    fn test_sort_order_parse_falls_back() {
        assert_eq!(SortOrder::parse("price-high"), SortOrder::PriceHigh);
        assert_eq!(SortOrder::parse("cheapest"), SortOrder::Newest);
        assert_eq!(SortOrder::NameAsc.label(), "Name: A to Z");
    }

    #[test]
    fn test_category_labels() {
        assert_eq!(category_label("Vintage"), "Vintage");
        assert_eq!(category_label("nope"), "All Categories");
    }

    #[test]
    fn test_sale_products_show_discount() {
        let catalog = Catalog::embedded().unwrap();
        let urban = catalog.require("2").unwrap();
        assert_eq!(urban.badge(), Some(Badge::Sale));
        assert_eq!(urban.discount_percent(), Some(23));
        assert!(matches!(
            catalog.require("99"),
            Err(CatalogError::UnknownProduct(_))
        ));
    }

    #[test]
    fn test_featured_reviews_clamps() {
        let catalog = Catalog::embedded().unwrap();
        assert_eq!(catalog.featured_reviews(3).len(), 3);
        assert_eq!(catalog.featured_reviews(50).len(), 5);
    }

    #[test]
    fn test_rejects_duplicate_ids() {
        let products = r#"[
            {"id":"1","name":"A","category":"Street","price":1,"image":"a"},
            {"id":"1","name":"B","category":"Street","price":2,"image":"b"}
        ]"#;
        assert!(matches!(
            Catalog::from_json(products, "[]"),
            Err(CatalogError::DuplicateProduct(_))
        ));
    }
}
