use std::fmt::Display;
use std::future::Future;
use std::rc::Rc;

use loading::{
    AsyncOperation, ErrorKind, NETWORK_FAILURE_MESSAGE,
    NormalizedError, OperationFuture, OperationOptions, Status,
};
use payloads::Envelope;
use yew::prelude::*;

use crate::contexts::{use_loading_registry, use_toast};

/// What every operation hook hands back to components.
pub struct OperationHandle<A: 'static, T: 'static> {
    pub data: Option<T>,
    pub is_loading: bool,
    pub error: Option<NormalizedError>,
    pub status: Status,
    /// Fire and forget. Results land in the fields above on the next render.
    pub trigger: Callback<A>,
    /// Re-run with the last arguments; does nothing before the first trigger.
    pub refetch: Callback<()>,
    pub reset: Callback<()>,
    operation: Rc<AsyncOperation<A, T>>,
}

impl<A, T> OperationHandle<A, T>
where
    A: Clone + 'static,
    T: Clone + 'static,
{
    /// Trigger and get the outcome back, for flows like "create, then
    /// navigate only on success". The handle's own state is already updated
    /// when the future resolves; dropping it unawaited cancels the request.
    pub fn run(&self, args: A) -> OperationFuture<T> {
        self.operation.trigger(args)
    }

    /// True while the first request is in flight and nothing has been shown
    /// yet.
    pub fn is_initial_loading(&self) -> bool {
        self.is_loading && self.data.is_none() && self.error.is_none()
    }

    /// Render based on operation state with contextual loading/error
    /// messages.
    ///
    /// - No data + loading: "Loading {context}..."
    /// - No data + error: "Error loading {context}: ..."
    /// - Has data: `render_fn(data, is_loading, error)`, where `error` comes
    ///   from a failed refetch and the previous data is still shown.
    ///
    /// ```rust,ignore
    /// plans.render("plans", |plans, is_loading, _| html! {
    ///     <PlanTable plans={plans.clone()} refreshing={is_loading} />
    /// })
    /// ```
    pub fn render<F>(&self, context: &str, render_fn: F) -> Html
    where
        F: Fn(&T, bool, Option<&NormalizedError>) -> Html,
    {
        if let Some(data) = &self.data {
            return render_fn(data, self.is_loading, self.error.as_ref());
        }

        if self.is_loading {
            html! {
                <div class="text-center py-12">
                    <p class="text-neutral-600 dark:text-neutral-400">
                        {format!("Loading {context}...")}
                    </p>
                </div>
            }
        } else if let Some(error) = &self.error {
            html! {
                <div class="p-4 rounded-md bg-red-50 \
                           dark:bg-red-900/20 border \
                           border-red-200 dark:border-red-800">
                    <p class="text-sm text-red-700 dark:text-red-400">
                        {format!("Error loading {context}: {}", describe(error))}
                    </p>
                </div>
            }
        } else {
            html! {}
        }
    }
}

/// Text safe to show inline. Backend business messages are written for
/// users; transport failures get the network line.
pub fn describe(error: &NormalizedError) -> &str {
    match error.kind {
        ErrorKind::Business => &error.message,
        ErrorKind::Transport => NETWORK_FAILURE_MESSAGE,
    }
}

fn drive<T: Clone + 'static>(pending: OperationFuture<T>) {
    yew::platform::spawn_local(async move {
        // Outcome is already recorded on the operation.
        let _ = pending.await;
    });
}

/// Generic operation hook.
///
/// Wraps `request` in an [`AsyncOperation`] registered with the app's
/// loading registry and reporting through the toast stack (unless `options`
/// brings its own notifier). The operation is rebuilt whenever
/// `deps` change, so `request` may capture values from the component.
///
/// ```rust,ignore
/// #[hook]
/// pub fn use_cancel_order() -> OperationHandle<OrderId, ()> {
///     use_operation(
///         OperationOptions::new("cancel order")
///             .success_message("Order cancelled")
///             .failure_message("Could not cancel the order"),
///         |id: OrderId| async move {
///             get_api_client().post("orders/cancel", &id).await
///         },
///     )
/// }
/// ```
#[hook]
pub fn use_operation_with<D, A, T, F, Fut, E>(
    deps: D,
    options: OperationOptions<T>,
    request: F,
) -> OperationHandle<A, T>
where
    D: PartialEq + 'static,
    A: Clone + 'static,
    T: Clone + 'static,
    F: Fn(A) -> Fut + 'static,
    Fut: Future<Output = Result<Envelope<T>, E>> + 'static,
    E: Display + 'static,
{
    let registry = use_loading_registry();
    let toasts = use_toast();
    let rerender = use_force_update();

    let operation = use_memo(deps, move |_| {
        let options = if options.has_notifier() {
            options
        } else {
            options.notifier(Rc::new(toasts))
        };
        let operation = AsyncOperation::new(&registry, options, request);
        operation.set_listener(move || rerender.force_update());
        operation
    });

    // Results that arrive after unmount (or after deps changed) must not
    // touch this component.
    use_effect_with(operation.clone(), |operation| {
        let operation = operation.clone();
        move || operation.clear_listener()
    });

    let trigger = use_callback(operation.clone(), |args: A, operation| {
        drive(operation.trigger(args));
    });

    let refetch = use_callback(operation.clone(), |(), operation| {
        if let Some(pending) = operation.refetch() {
            drive(pending);
        }
    });

    let reset = use_callback(operation.clone(), |(), operation| {
        if let Err(error) = operation.reset() {
            tracing::warn!(operation = operation.label(), %error, "reset ignored");
        }
    });

    let snapshot = operation.snapshot();
    OperationHandle {
        is_loading: snapshot.is_loading(),
        status: snapshot.status,
        data: snapshot.data,
        error: snapshot.error,
        trigger,
        refetch,
        reset,
        operation,
    }
}

/// [`use_operation_with`] for requests that capture nothing that changes.
#[hook]
pub fn use_operation<A, T, F, Fut, E>(
    options: OperationOptions<T>,
    request: F,
) -> OperationHandle<A, T>
where
    A: Clone + 'static,
    T: Clone + 'static,
    F: Fn(A) -> Fut + 'static,
    Fut: Future<Output = Result<Envelope<T>, E>> + 'static,
    E: Display + 'static,
{
    use_operation_with((), options, request)
}
