//! Wire types shared between the backend and the storefront UI.

pub mod api_client;

pub use api_client::{APIClient, ClientError};

use serde::{Deserialize, Serialize};

/// The wrapper every backend endpoint responds with.
///
/// `success: false` is a business failure (validation, expired plan, ...)
/// and usually carries a human readable `message`. Transport failures never
/// produce an envelope at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> Envelope<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(data),
        }
    }

    /// A successful response without a body, e.g. from a delete endpoint.
    pub fn ok_empty() -> Self {
        Self {
            success: true,
            message: None,
            data: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            data: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}
