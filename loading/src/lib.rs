//! Loading coordination for the storefront UI.
//!
//! [`LoadingRegistry`] counts in-flight operations across unrelated call
//! sites and fans the count out to subscribers such as the busy overlay.
//! [`AsyncOperation`] wraps one request returning an
//! [`Envelope`](payloads::Envelope), keeps the registry balanced around it,
//! and folds transport and business failures into one [`NormalizedError`].

mod error;
mod notify;
mod operation;
mod registry;

pub use error::{
    DEFAULT_BUSINESS_MESSAGE, ErrorKind, NormalizedError, OperationError,
};
pub use notify::{
    GENERIC_FAILURE_MESSAGE, NETWORK_FAILURE_MESSAGE, Notifications, Notifier,
};
pub use operation::{
    AsyncOperation, OperationFuture, OperationOptions, OperationResult,
    Snapshot, Status,
};
pub use registry::{LoadingRegistry, Subscription, Token};
