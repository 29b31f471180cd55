//! User Notification Abstraction
//!
//! Transient, auto-dismissing messages shown to the user (toasts).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Notification severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Success,
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Severity::Success => "success",
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        f.write_str(name)
    }
}

/// Notification channel trait
///
/// Fire-and-forget: implementations must not block and must not fail the
/// caller. Display and dismissal timing are the implementation's concern.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::notify::{NotificationSink, Severity};
///
/// fn warn_user(sink: &dyn NotificationSink) {
///     sink.notify(Severity::Error, "Server unavailable. Check your connection.");
/// }
/// ```
pub trait NotificationSink: Send + Sync {
    /// Show a message to the user
    fn notify(&self, severity: Severity, message: &str);
}
