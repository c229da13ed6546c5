//! Capstone storefront library.
//!
//! Client-side storefront state: the product catalog, cart and wishlist
//! collections kept in sync with local storage and the backend, and the
//! account flows that drive that sync. Front-ends (the `capstone` CLI, tests)
//! build an [`state::AppState`] and act through it.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod backend;
pub mod catalog;
pub mod config;
pub mod error;
pub mod identity;
pub mod notify;
pub mod services;
pub mod state;
pub mod storage;
pub mod sync;
pub mod views;
