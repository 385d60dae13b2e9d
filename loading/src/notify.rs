//! User-facing notification policy.
//!
//! Operations report outcomes through a [`Notifier`] (the toast context in
//! the UI). Every failure is reported, with text from a per-operation
//! override or a generic fallback; raw error text only ever goes to the
//! logs. Successes are reported only when a success message is set.

use crate::NormalizedError;

pub const GENERIC_FAILURE_MESSAGE: &str =
    "Something went wrong. Please try again.";
pub const NETWORK_FAILURE_MESSAGE: &str =
    "Network error. Please check your connection.";

/// Sink for user-visible messages.
pub trait Notifier {
    fn success(&self, message: &str);
    fn failure(&self, message: &str);
}

/// Which notifications an operation emits and with what text.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Notifications {
    /// Emitted on every success when set.
    pub success: Option<String>,
    /// Replaces the generic failure text.
    pub failure: Option<String>,
}

impl Notifications {
    pub fn failure_text(&self, error: &NormalizedError) -> &str {
        match &self.failure {
            Some(message) => message,
            None if error.is_transport() => NETWORK_FAILURE_MESSAGE,
            None => GENERIC_FAILURE_MESSAGE,
        }
    }

    pub(crate) fn on_success(&self, notifier: Option<&dyn Notifier>) {
        if let (Some(notifier), Some(message)) = (notifier, &self.success) {
            notifier.success(message);
        }
    }

    pub(crate) fn on_failure(
        &self,
        notifier: Option<&dyn Notifier>,
        error: &NormalizedError,
    ) {
        if let Some(notifier) = notifier {
            notifier.failure(self.failure_text(error));
        }
    }
}
