//! The seam between workflow core and presentation layer
//!
//! Workflows never touch the DOM equivalent directly; they report transient
//! notices and ask for confirmations through this trait, so the core stays
//! testable headlessly.

/// Notification categories, mirrored by the toast styling in the UI
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

/// Thin adapter implemented by the presentation layer
pub trait UiAdapter: Send + Sync {
    /// Shows a transient, self-dismissing notice
    fn notify(&self, severity: Severity, message: &str);

    /// Asks the user to confirm a destructive action
    fn confirm(&self, message: &str) -> bool;
}

/// Adapter that routes notices to the log, for headless use
pub struct LogUi {
    /// Answer given to every confirmation prompt
    pub assume_yes: bool,
}

impl UiAdapter for LogUi {
    fn notify(&self, severity: Severity, message: &str) {
        match severity {
            Severity::Info | Severity::Success => log::info!("{}", message),
            Severity::Warning => log::warn!("{}", message),
            Severity::Error => log::error!("{}", message),
        }
    }

    fn confirm(&self, message: &str) -> bool {
        log::info!("Confirm [{}]: {}", self.assume_yes, message);
        self.assume_yes
    }
}
