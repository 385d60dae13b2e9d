use std::fmt::Display;
use std::future::Future;

use loading::OperationOptions;
use payloads::Envelope;
use yew::prelude::*;

use super::{OperationHandle, use_operation_with};

/// Fetch on mount and again whenever `deps` change.
///
/// The fetch function captures its inputs from the closure; `deps` only
/// decides when the operation is rebuilt and refetched. Fetches are quiet
/// about success and toast on failure like any other operation.
///
/// ```rust,ignore
/// #[hook]
/// pub fn use_news(page: u32) -> OperationHandle<(), Vec<NewsItem>> {
///     use_fetch(
///         page,
///         OperationOptions::new("news").default_on_missing(),
///         move || async move {
///             get_api_client().get(&format!("news?page={page}")).await
///         },
///     )
/// }
/// ```
#[hook]
pub fn use_fetch<T, D, F, Fut, E>(
    deps: D,
    options: OperationOptions<T>,
    fetch_fn: F,
) -> OperationHandle<(), T>
where
    T: Clone + 'static,
    D: PartialEq + Clone + 'static,
    F: Fn() -> Fut + 'static,
    Fut: Future<Output = Result<Envelope<T>, E>> + 'static,
    E: Display + 'static,
{
    let handle = use_operation_with(deps.clone(), options, move |()| fetch_fn());

    {
        let trigger = handle.trigger.clone();
        use_effect_with(deps, move |_| trigger.emit(()));
    }

    handle
}
