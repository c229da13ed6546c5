//! Wishlist commands.

use capstone_core::ProductId;
use capstone_storefront::error::AppError;
use capstone_storefront::state::AppState;
use capstone_storefront::views::ProductCardView;

use crate::console;

pub fn list(state: &AppState) {
    let products = state.wishlist().products();
    if products.is_empty() {
        console::line("Your wishlist is empty.");
        return;
    }
    for product in &products {
        let card = ProductCardView::from(product);
        console::line(&format!("#{} {} {}", card.id, card.name, card.price));
    }
}

/// Save a catalog product.
///
/// # Errors
///
/// Returns an error if there is no product with that id.
pub fn add(state: &AppState, id: &str) -> Result<(), AppError> {
    let product = state.catalog().require(id)?.clone();
    if state.wishlist().add(product).is_none() {
        console::line(&format!("Product {id} is already in your wishlist."));
    }
    Ok(())
}

pub fn remove(state: &AppState, id: &str) {
    if state.wishlist().remove(&ProductId::new(id)).is_none() {
        console::line(&format!("Product {id} is not in your wishlist."));
    }
}

/// Save or unsave a catalog product.
///
/// # Errors
///
/// Returns an error if there is no product with that id.
pub fn toggle(state: &AppState, id: &str) -> Result<(), AppError> {
    let product = state.catalog().require(id)?.clone();
    state.wishlist().toggle(product);
    Ok(())
}
