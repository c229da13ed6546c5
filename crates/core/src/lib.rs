//! Capstone Core - Shared types and pure shopping-state transitions.
//!
//! This crate provides the types used across all Capstone components:
//! - `storefront` - Client state layer (sync, auth, catalog)
//! - `cli` - Terminal front-end over the storefront state
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no
//! storage, no HTTP clients. Cart and wishlist mutations are expressed as
//! transitions (list in, list plus change event out) so they can be tested
//! without any persistence or notification harness.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for ids, prices, emails, products and identities
//! - [`cart`] - Cart lines and their transitions
//! - [`wishlist`] - Wishlist entries and their transitions
//! - [`collection`] - The contract shared by every mirrored list

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod collection;
pub mod types;
pub mod wishlist;

pub use cart::{Cart, CartChange, CartItem};
pub use collection::{Collection, CollectionKind};
pub use types::*;
pub use wishlist::{Wishlist, WishlistChange};
