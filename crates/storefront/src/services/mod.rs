//! Shopper-facing services.
//!
//! # Services
//!
//! - `auth` - Login, signup, logout and session restore
//! - `cart` - Cart mutations with confirmations
//! - `wishlist` - Wishlist mutations with confirmations

pub mod auth;
pub mod cart;
pub mod wishlist;
