//! User-facing notifications.

use tracing::warn;

/// Informational message box, shown by the host.
pub trait Notifier: Send + Sync {
    fn information(&self, title: &str, message: &str);
}

/// Notifier for headless runs: writes the message to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn information(&self, title: &str, message: &str) {
        warn!("{} {}", title, message.replace('\n', " "));
    }
}
