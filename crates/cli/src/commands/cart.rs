//! Cart commands.

use capstone_core::ProductId;
use capstone_storefront::error::AppError;
use capstone_storefront::state::AppState;
use capstone_storefront::views::CartView;

use crate::console;

/// Show the cart with totals.
pub fn list(state: &AppState) {
    let view = CartView::from(&state.cart().snapshot());
    if view.is_empty() {
        console::line("Your cart is empty.");
        return;
    }

    for item in &view.items {
        console::line(&format!(
            "#{} {} x{} @ {} = {}",
            item.id, item.name, item.quantity, item.price, item.line_price
        ));
    }
    console::line(&format!("Items:    {}", view.item_count));
    console::line(&format!("Subtotal: {}", view.subtotal));
    console::line(&format!("Shipping: {}", view.shipping));
    console::line(&format!("Tax:      {}", view.tax));
    console::line(&format!("Total:    {}", view.total));
}

/// Add a catalog product to the cart.
///
/// # Errors
///
/// Returns an error if there is no product with that id.
pub fn add(state: &AppState, id: &str, quantity: u32) -> Result<(), AppError> {
    let product = state.catalog().require(id)?.clone();
    if state.cart().add(product, quantity).is_none() {
        console::line("Nothing to add.");
    }
    Ok(())
}

pub fn remove(state: &AppState, id: &str) {
    if state.cart().remove(&ProductId::new(id)).is_none() {
        console::line(&format!("Product {id} is not in your cart."));
    }
}

pub fn update(state: &AppState, id: &str, quantity: i64) {
    if state
        .cart()
        .update_quantity(&ProductId::new(id), quantity)
        .is_none()
    {
        console::line(&format!("Product {id} is not in your cart."));
    }
}
