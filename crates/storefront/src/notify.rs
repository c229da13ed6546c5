//! Shopper-facing confirmations ("toasts").
//!
//! Transitions in `capstone-core` only report what changed; the handles turn
//! those changes into [`Notification`]s and hand them to a [`Notifier`].

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use capstone_core::{CartChange, WishlistChange};

/// How long cart, wishlist and logout confirmations stay up.
pub const SHORT: Duration = Duration::from_millis(2000);
/// How long login and signup results stay up.
pub const LONG: Duration = Duration::from_millis(3000);

/// A transient confirmation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub description: String,
    pub duration: Duration,
}

impl Notification {
    #[must_use]
    pub fn new(title: impl Into<String>, description: impl Into<String>, duration: Duration) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            duration,
        }
    }
}

/// Displays notifications.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Writes notifications to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notification: Notification) {
        tracing::info!(
            title = %notification.title,
            duration_ms = u64::try_from(notification.duration.as_millis()).unwrap_or(u64::MAX),
            "{}",
            notification.description
        );
    }
}

/// Keeps every notification for later inspection.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    seen: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Drain the recorded notifications.
    pub fn take(&self) -> Vec<Notification> {
        std::mem::take(&mut *self.seen.lock().unwrap_or_else(PoisonError::into_inner))
    }

    /// Titles recorded so far, oldest first.
    #[must_use]
    pub fn titles(&self) -> Vec<String> {
        self.seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|n| n.title.clone())
            .collect()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: Notification) {
        self.seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(notification);
    }
}

/// Confirmation for a cart change. Merging into an existing line is silent.
#[must_use]
pub fn for_cart(change: &CartChange) -> Option<Notification> {
    let (title, description) = match change {
        CartChange::Added { name, .. } => (
            "Added to cart",
            format!("{name} has been added to your cart."),
        ),
        CartChange::Merged { .. } => return None,
        CartChange::QuantityUpdated { name, quantity } => (
            "Cart updated",
            format!("{name} quantity updated to {quantity}."),
        ),
        CartChange::Removed { name } => (
            "Removed from cart",
            format!("{name} has been removed from your cart."),
        ),
        CartChange::Cleared => (
            "Cart cleared",
            "All items have been removed from your cart.".to_string(),
        ),
    };
    Some(Notification::new(title, description, SHORT))
}

/// Confirmation for a wishlist change.
#[must_use]
pub fn for_wishlist(change: &WishlistChange) -> Notification {
    let (title, description) = match change {
        WishlistChange::Added { name } => (
            "Added to wishlist",
            format!("{name} has been added to your wishlist."),
        ),
        WishlistChange::Removed { name } => (
            "Removed from wishlist",
            format!("{name} has been removed from your wishlist."),
        ),
        WishlistChange::Cleared => (
            "Wishlist cleared",
            "All items have been removed from your wishlist.".to_string(),
        ),
    };
    Notification::new(title, description, SHORT)
}
