//! Command implementations.

pub mod account;
pub mod cart;
pub mod shop;
pub mod wishlist;
