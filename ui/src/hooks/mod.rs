//! Operation hooks.
//!
//! Every call site that talks to the backend goes through
//! [`use_operation`] (user-triggered) or [`use_fetch`] (on mount), so each
//! domain hook is a single instantiation with its own options.

mod use_api;
mod use_fetch;
mod use_operation;

pub use use_api::{use_api_get, use_api_post};
pub use use_fetch::use_fetch;
pub use use_operation::{
    OperationHandle, describe, use_operation, use_operation_with,
};
