//! Navigation seam for login/logout redirects.
//!
//! The original design performs full-page browser navigations; hosts supply a
//! [`Navigator`] so the manager stays testable and UI-agnostic.

/// Performs a "full-page" navigation to a provider URL.
pub trait Navigator: Send + Sync {
    /// Navigate the user to `url`.
    fn navigate(&self, url: &str);
}

/// Opens URLs in the system default browser.
pub struct SystemNavigator;

impl Navigator for SystemNavigator {
    fn navigate(&self, url: &str) {
        if let Err(e) = open::that(url) {
            tracing::warn!("failed to open browser: {e}");
        }
    }
}

/// Navigator that only logs, for headless hosts.
pub struct LoggingNavigator;

impl Navigator for LoggingNavigator {
    fn navigate(&self, url: &str) {
        tracing::info!(%url, "navigation requested");
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
