use std::fmt::Display;

/// Shown when a backend reports failure without saying why.
pub const DEFAULT_BUSINESS_MESSAGE: &str = "The request was not successful.";

/// Where a failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
pub enum ErrorKind {
    /// The request itself failed: network, timeout, undecodable response.
    #[display("transport")]
    Transport,
    /// The backend answered with `success: false`.
    #[display("business")]
    Business,
}

/// The single failure shape handed to UI code, whatever went wrong.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} error: {message}")]
pub struct NormalizedError {
    pub kind: ErrorKind,
    pub message: String,
}

impl NormalizedError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Wrap whatever the request failed with. Anything printable works, so
    /// a bare `String` or `&str` is as good as a real error type.
    pub fn transport(error: impl Display) -> Self {
        Self::new(ErrorKind::Transport, error.to_string())
    }

    pub fn business(message: Option<String>) -> Self {
        let message = message
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BUSINESS_MESSAGE.to_string());
        Self::new(ErrorKind::Business, message)
    }

    pub fn is_transport(&self) -> bool {
        self.kind == ErrorKind::Transport
    }

    pub fn is_business(&self) -> bool {
        self.kind == ErrorKind::Business
    }
}

/// Misuse of an [`AsyncOperation`](crate::AsyncOperation).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OperationError {
    #[error("cannot reset an operation while its request is in flight")]
    ResetWhilePending,
}
