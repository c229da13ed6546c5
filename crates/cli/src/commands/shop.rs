//! Catalog browsing commands.

use capstone_storefront::catalog::{SortOrder, category_label};
use capstone_storefront::error::AppError;
use capstone_storefront::state::AppState;
use capstone_storefront::views::ProductCardView;

use crate::console;

/// List products in a category.
pub fn list(state: &AppState, category: &str, sort: &str) {
    let order = SortOrder::parse(sort);
    let products = state.catalog().browse(category, order);

    console::line(&format!(
        "{} ({}), {} products",
        category_label(category),
        order.label(),
        products.len()
    ));
    for product in products {
        let saved = if state.wishlist().contains(&product.id) {
            " *"
        } else {
            ""
        };
        console::line(&format!("  {}{saved}", card_line(&ProductCardView::from(product))));
    }
}

/// Show one product in detail.
///
/// # Errors
///
/// Returns an error if there is no product with that id.
pub fn show(state: &AppState, id: &str) -> Result<(), AppError> {
    let product = state.catalog().require(id)?;
    let card = ProductCardView::from(product);

    console::line(&card_line(&card));
    if let Some(description) = &product.description {
        console::line(description);
    }
    for feature in &product.features {
        console::line(&format!("  - {feature}"));
    }
    if !product.materials.is_empty() {
        console::line(&format!("Materials: {}", product.materials.join(", ")));
    }
    if let Some(item) = state.cart().items().iter().find(|i| i.id() == &product.id) {
        console::line(&format!("In cart: {}", item.quantity));
    }
    if state.wishlist().contains(&product.id) {
        console::line("Saved to wishlist");
    }
    Ok(())
}

/// Show the first `count` reviews.
pub fn reviews(state: &AppState, count: usize) {
    for review in state.catalog().featured_reviews(count) {
        console::line(&format!("{} {} ({})", review.stars(), review.name, review.date));
        console::line(&format!("  {}", review.content));
    }
}

fn card_line(card: &ProductCardView) -> String {
    let mut parts = vec![format!("#{} {} [{}] {}", card.id, card.name, card.category, card.price)];
    if let Some(original) = &card.original_price {
        parts.push(format!("(was {original})"));
    }
    if let Some(discount) = &card.discount {
        parts.push(discount.clone());
    }
    if let Some(badge) = card.badge {
        parts.push(format!("<{badge}>"));
    }
    parts.join(" ")
}
