//! Terminal output.

use capstone_storefront::notify::{Notification, Notifier};

/// Prints storefront confirmations as they happen.
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    #[allow(clippy::print_stdout)]
    fn notify(&self, notification: Notification) {
        println!("[{}] {}", notification.title, notification.description);
    }
}

/// Print command output.
#[allow(clippy::print_stdout)]
pub fn line(text: &str) {
    println!("{text}");
}

/// Print a failure for the shopper.
#[allow(clippy::print_stderr)]
pub fn error(message: &str) {
    eprintln!("error: {message}");
}
