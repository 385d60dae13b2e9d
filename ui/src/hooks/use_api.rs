use loading::OperationOptions;
use serde::{Serialize, de::DeserializeOwned};
use yew::prelude::*;

use super::{OperationHandle, use_fetch, use_operation_with};
use crate::get_api_client;

/// GET `path` on mount and whenever it changes.
#[hook]
pub fn use_api_get<T>(
    path: AttrValue,
    options: OperationOptions<T>,
) -> OperationHandle<(), T>
where
    T: DeserializeOwned + Clone + 'static,
{
    use_fetch(path.clone(), options, move || {
        let path = path.clone();
        async move { get_api_client().get::<T>(&path).await }
    })
}

/// POST the trigger argument to `path`.
#[hook]
pub fn use_api_post<B, T>(
    path: AttrValue,
    options: OperationOptions<T>,
) -> OperationHandle<B, T>
where
    B: Serialize + Clone + 'static,
    T: DeserializeOwned + Clone + 'static,
{
    use_operation_with(path.clone(), options, move |body: B| {
        let path = path.clone();
        async move { get_api_client().post::<B, T>(&path, &body).await }
    })
}
