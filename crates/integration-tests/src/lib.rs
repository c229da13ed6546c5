//! Integration tests for Capstone.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p capstone-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `sync_scenarios` - cart/wishlist reconciliation across sign-in, sign-out
//!   and backend failures
//! - `auth_flows` - login, signup, logout and session restore
//! - `catalog_browse` - catalog queries through the app state
//!
//! Everything runs against in-memory collaborators wired through
//! [`Harness`]; no network or database is needed.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use capstone_core::{Cart, CollectionKind, Email, Product, UserId, Wishlist};
use capstone_storefront::backend::MemoryRecords;
use capstone_storefront::catalog::Catalog;
use capstone_storefront::config::StorefrontConfig;
use capstone_storefront::identity::MemoryIdentityProvider;
use capstone_storefront::notify::RecordingNotifier;
use capstone_storefront::state::{AppState, Parts};
use capstone_storefront::storage::{LocalStore, MemoryStore};

/// Demo account credentials.
pub const DEMO_EMAIL: &str = "user@example.com";
pub const DEMO_PASSWORD: &str = "password123";

/// Second account for user-switch scenarios.
pub const OTHER_EMAIL: &str = "other@example.com";
pub const OTHER_PASSWORD: &str = "hunter2hunter2";

/// An app state wired to in-memory collaborators the test can inspect.
pub struct Harness {
    pub state: AppState,
    pub store: Arc<MemoryStore>,
    pub records: Arc<MemoryRecords>,
    pub provider: Arc<MemoryIdentityProvider>,
    pub notifier: Arc<RecordingNotifier>,
}

impl Harness {
    /// Fresh state with an empty local mirror. Must run inside a Tokio runtime.
    #[must_use]
    pub fn new() -> Self {
        Self::with_store(MemoryStore::new())
    }

    /// State over an existing local mirror.
    #[must_use]
    pub fn with_store(store: MemoryStore) -> Self {
        let provider = Arc::new(MemoryIdentityProvider::with_demo_account());
        provider.add_account(
            other_user(),
            "Other Shopper",
            Email::parse(OTHER_EMAIL).unwrap(),
            OTHER_PASSWORD,
        );
        Self::assemble(
            Arc::new(store),
            Arc::new(MemoryRecords::new()),
            provider,
        )
    }

    /// A second state sharing this one's mirror, backend and accounts, as a
    /// later run of the same client would.
    #[must_use]
    pub fn restart(&self) -> Self {
        Self::assemble(
            Arc::clone(&self.store),
            Arc::clone(&self.records),
            Arc::clone(&self.provider),
        )
    }

    fn assemble(
        store: Arc<MemoryStore>,
        records: Arc<MemoryRecords>,
        provider: Arc<MemoryIdentityProvider>,
    ) -> Self {
        let notifier = Arc::new(RecordingNotifier::new());
        let state = AppState::with_parts(
            StorefrontConfig::demo(std::env::temp_dir()),
            Parts {
                store: store.clone(),
                records: records.clone(),
                provider: provider.clone(),
                notifier: notifier.clone(),
            },
        )
        .unwrap();
        Self {
            state,
            store,
            records,
            provider,
            notifier,
        }
    }

    /// Sign in as the demo account.
    pub async fn login(&self) {
        self.state
            .auth()
            .login(DEMO_EMAIL, DEMO_PASSWORD)
            .await
            .unwrap();
    }

    /// Remote cart row of a user, decoded.
    #[must_use]
    pub fn remote_cart(&self, user: &UserId) -> Option<Cart> {
        self.records
            .row(CollectionKind::Cart, user)
            .map(|row| serde_json::from_value(row).unwrap())
    }

    /// Remote wishlist row of a user, decoded.
    #[must_use]
    pub fn remote_wishlist(&self, user: &UserId) -> Option<Wishlist> {
        self.records
            .row(CollectionKind::Wishlist, user)
            .map(|row| serde_json::from_value(row).unwrap())
    }

    /// Cart held in the local mirror, decoded.
    #[must_use]
    pub fn local_cart(&self) -> Option<Cart> {
        self.store
            .get(CollectionKind::Cart.local_key())
            .unwrap()
            .map(|raw| serde_json::from_str(&raw).unwrap())
    }
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}

/// Product from the embedded catalog.
#[must_use]
pub fn product(id: &str) -> Product {
    Catalog::embedded().unwrap().require(id).unwrap().clone()
}

/// Id of the demo account.
#[must_use]
pub fn demo_user() -> UserId {
    UserId::new("1")
}

/// Id of the second account.
#[must_use]
pub fn other_user() -> UserId {
    UserId::new("2")
}

/// Ids of the lines in a cart, in order.
#[must_use]
pub fn cart_ids(cart: &Cart) -> Vec<String> {
    cart.items().iter().map(|i| i.id().to_string()).collect()
}

/// JSON text of a cart holding `lines`.
#[must_use]
pub fn cart_json(lines: &[(Product, u32)]) -> String {
    let mut cart = Cart::default();
    for (product, quantity) in lines {
        cart.add(product.clone(), *quantity);
    }
    serde_json::to_string(&cart).unwrap()
}
