//! Application state shared across front-end actions.

use std::sync::Arc;

use capstone_core::{Cart, Identity, Wishlist};

use crate::backend::{BackendClient, GoTrueProvider, MemoryRecords, RemoteRecords, RestRecords};
use crate::catalog::Catalog;
use crate::config::StorefrontConfig;
use crate::error::AppError;
use crate::identity::{IdentityProvider, MemoryIdentityProvider, SessionHub};
use crate::notify::Notifier;
use crate::services::auth::AuthService;
use crate::services::cart::CartHandle;
use crate::services::wishlist::WishlistHandle;
use crate::storage::{FileStore, LocalStore};
use crate::sync::SyncController;

/// External collaborators the state is wired to.
pub struct Parts {
    pub store: Arc<dyn LocalStore>,
    pub records: Arc<dyn RemoteRecords>,
    pub provider: Arc<dyn IdentityProvider>,
    pub notifier: Arc<dyn Notifier>,
}

/// Application state.
///
/// This struct is cheaply cloneable via `Arc` and is constructed once per
/// process, then passed to whatever needs it.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    catalog: Catalog,
    sessions: Arc<SessionHub>,
    auth: AuthService,
    cart: CartHandle,
    wishlist: WishlistHandle,
    cart_sync: Arc<SyncController<Cart>>,
    wishlist_sync: Arc<SyncController<Wishlist>>,
}

impl AppState {
    /// Create the application state from configuration.
    ///
    /// Uses the configured backend, or in-memory stand-ins in demo mode.
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built or the embedded
    /// catalog is invalid.
    pub fn new(config: StorefrontConfig, notifier: Arc<dyn Notifier>) -> Result<Self, AppError> {
        let store: Arc<dyn LocalStore> = Arc::new(FileStore::new(&config.data_dir));

        let records: Arc<dyn RemoteRecords>;
        let provider: Arc<dyn IdentityProvider>;
        if let Some(backend) = &config.backend {
            let client = BackendClient::new(backend)?;
            tracing::info!(url = %backend.url, "using remote backend");
            records = Arc::new(RestRecords::new(client.clone()));
            provider = Arc::new(GoTrueProvider::new(client));
        } else {
            tracing::info!("no backend configured; running in demo mode");
            records = Arc::new(MemoryRecords::new());
            provider = Arc::new(MemoryIdentityProvider::with_demo_account());
        }

        Self::with_parts(
            config,
            Parts {
                store,
                records,
                provider,
                notifier,
            },
        )
    }

    /// Create the application state from explicit collaborators.
    ///
    /// # Errors
    ///
    /// Returns an error if the embedded catalog is invalid.
    pub fn with_parts(config: StorefrontConfig, parts: Parts) -> Result<Self, AppError> {
        let catalog = Catalog::embedded()?;
        let sessions = Arc::new(SessionHub::new());

        let cart_sync = Arc::new(SyncController::<Cart>::new(
            Arc::clone(&parts.store),
            Arc::clone(&parts.records),
        ));
        let wishlist_sync = Arc::new(SyncController::<Wishlist>::new(
            Arc::clone(&parts.store),
            Arc::clone(&parts.records),
        ));
        sessions.register(cart_sync.clone());
        sessions.register(wishlist_sync.clone());

        let auth = AuthService::new(
            parts.provider,
            Arc::clone(&sessions),
            parts.store,
            Arc::clone(&parts.notifier),
        );
        let cart = CartHandle::new(Arc::clone(&cart_sync), Arc::clone(&parts.notifier));
        let wishlist = WishlistHandle::new(Arc::clone(&wishlist_sync), parts.notifier);

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                catalog,
                sessions,
                auth,
                cart,
                wishlist,
                cart_sync,
                wishlist_sync,
            }),
        })
    }

    /// Restore the previous session and load the cart and wishlist for it.
    pub async fn start(&self) -> Option<Identity> {
        self.inner.auth.restore().await
    }

    /// Wait until pending remote writes have drained.
    pub async fn flush(&self) {
        tokio::join!(self.inner.cart_sync.flush(), self.inner.wishlist_sync.flush());
    }

    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.inner.catalog
    }

    #[must_use]
    pub fn sessions(&self) -> &SessionHub {
        &self.inner.sessions
    }

    #[must_use]
    pub fn auth(&self) -> &AuthService {
        &self.inner.auth
    }

    #[must_use]
    pub fn cart(&self) -> &CartHandle {
        &self.inner.cart
    }

    #[must_use]
    pub fn wishlist(&self) -> &WishlistHandle {
        &self.inner.wishlist
    }

    /// Whether accounts and remote rows are in-memory stand-ins.
    #[must_use]
    pub fn is_demo(&self) -> bool {
        self.inner.config.backend.is_none()
    }
}
