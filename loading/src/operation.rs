//! One asynchronous request with a stable, observable result.
//!
//! ```text
//! Idle ──trigger──▶ Pending ──success envelope──▶ Succeeded
//!                      │
//!                      └──failure envelope / error──▶ Failed
//! Succeeded | Failed ──trigger──▶ Pending
//! Succeeded | Failed ──reset──▶ Idle
//! ```
//!
//! Triggering while Pending does not start a second request; the caller gets
//! the in-flight future back. `data` survives a later failure and is only
//! replaced by a success or cleared by [`AsyncOperation::reset`]. A success
//! envelope without data still succeeds, with `data` empty unless the
//! options supply a fallback.
//!
//! The operation does not keep its own request alive. Dropping every clone of
//! the future returned by [`AsyncOperation::trigger`] before it settles ends
//! the registry token and puts the operation back in the state it had before
//! the trigger.

use std::borrow::Cow;
use std::cell::RefCell;
use std::fmt::Display;
use std::future::Future;
use std::rc::{Rc, Weak};

use futures::future::{FutureExt, LocalBoxFuture, Shared, WeakShared};
use payloads::Envelope;

use crate::{
    LoadingRegistry, NormalizedError, Notifications, Notifier, OperationError,
    Token,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, derive_more::Display)]
pub enum Status {
    #[default]
    Idle,
    Pending,
    Succeeded,
    Failed,
}

/// Point-in-time copy of an operation's state.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot<T> {
    pub status: Status,
    pub data: Option<T>,
    pub error: Option<NormalizedError>,
}

impl<T> Default for Snapshot<T> {
    fn default() -> Self {
        Self {
            status: Status::Idle,
            data: None,
            error: None,
        }
    }
}

impl<T> Snapshot<T> {
    pub fn is_loading(&self) -> bool {
        self.status == Status::Pending
    }
}

/// `Ok(None)` is a success envelope that carried no data.
pub type OperationResult<T> = Result<Option<T>, NormalizedError>;

/// Future returned by [`AsyncOperation::trigger`]. Every caller that
/// triggers during the same Pending period gets a clone of it.
pub type OperationFuture<T> = Shared<LocalBoxFuture<'static, OperationResult<T>>>;

type InFlight<T> = WeakShared<LocalBoxFuture<'static, OperationResult<T>>>;

type Request<A, T> =
    Box<dyn Fn(A) -> LocalBoxFuture<'static, Result<Envelope<T>, NormalizedError>>>;

/// Per call site configuration of an [`AsyncOperation`].
pub struct OperationOptions<T> {
    /// Name used in logs.
    pub label: Cow<'static, str>,
    pub notifications: Notifications,
    notifier: Option<Rc<dyn Notifier>>,
    /// Stands in for `data` when a success envelope has none.
    fallback: Option<Rc<dyn Fn() -> T>>,
}

impl<T> Default for OperationOptions<T> {
    fn default() -> Self {
        Self {
            label: Cow::Borrowed("operation"),
            notifications: Notifications::default(),
            notifier: None,
            fallback: None,
        }
    }
}

impl<T> Clone for OperationOptions<T> {
    fn clone(&self) -> Self {
        Self {
            label: self.label.clone(),
            notifications: self.notifications.clone(),
            notifier: self.notifier.clone(),
            fallback: self.fallback.clone(),
        }
    }
}

impl<T> OperationOptions<T> {
    pub fn new(label: impl Into<Cow<'static, str>>) -> Self {
        Self {
            label: label.into(),
            ..Self::default()
        }
    }

    pub fn success_message(mut self, message: impl Into<String>) -> Self {
        self.notifications.success = Some(message.into());
        self
    }

    pub fn failure_message(mut self, message: impl Into<String>) -> Self {
        self.notifications.failure = Some(message.into());
        self
    }

    pub fn notifier(mut self, notifier: Rc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn has_notifier(&self) -> bool {
        self.notifier.is_some()
    }

    fn classify(
        &self,
        outcome: Result<Envelope<T>, NormalizedError>,
    ) -> OperationResult<T> {
        let envelope = outcome?;
        if !envelope.success {
            return Err(NormalizedError::business(envelope.message));
        }
        Ok(envelope
            .data
            .or_else(|| self.fallback.as_ref().map(|fallback| fallback())))
    }
}

impl<T: Default + 'static> OperationOptions<T> {
    /// Treat a success envelope without data as `T::default()`, e.g. an empty
    /// list for list endpoints.
    pub fn default_on_missing(mut self) -> Self {
        self.fallback = Some(Rc::new(T::default));
        self
    }
}

struct Config<A, T> {
    registry: LoadingRegistry,
    options: OperationOptions<T>,
    request: Request<A, T>,
}

struct State<A, T> {
    status: Status,
    data: Option<T>,
    error: Option<NormalizedError>,
    in_flight: Option<InFlight<T>>,
    last_args: Option<A>,
    listener: Option<Rc<dyn Fn()>>,
}

/// A reusable wrapper around one kind of request.
///
/// `A` is what [`trigger`](Self::trigger) takes (`()` for plain refetches),
/// `T` is the payload. Clones share state.
pub struct AsyncOperation<A, T> {
    config: Rc<Config<A, T>>,
    state: Rc<RefCell<State<A, T>>>,
}

impl<A, T> Clone for AsyncOperation<A, T> {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            state: self.state.clone(),
        }
    }
}

/// Identity: two handles are equal when they share state.
impl<A, T> PartialEq for AsyncOperation<A, T> {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.state, &other.state)
    }
}

impl<A, T> AsyncOperation<A, T>
where
    A: Clone + 'static,
    T: Clone + 'static,
{
    pub fn new<F, Fut, E>(
        registry: &LoadingRegistry,
        options: OperationOptions<T>,
        request: F,
    ) -> Self
    where
        F: Fn(A) -> Fut + 'static,
        Fut: Future<Output = Result<Envelope<T>, E>> + 'static,
        E: Display + 'static,
    {
        let request: Request<A, T> = Box::new(move |args| {
            let pending = request(args);
            async move { pending.await.map_err(NormalizedError::transport) }
                .boxed_local()
        });

        Self {
            config: Rc::new(Config {
                registry: registry.clone(),
                options,
                request,
            }),
            state: Rc::new(RefCell::new(State {
                status: Status::Idle,
                data: None,
                error: None,
                in_flight: None,
                last_args: None,
                listener: None,
            })),
        }
    }

    /// Start the request with `args`.
    ///
    /// The operation becomes Pending and takes a registry token before this
    /// returns; the request itself runs when the returned future is polled.
    /// Dropping every clone unpolled (or mid-request) releases the token and
    /// undoes the transition. If a request is already in flight its future
    /// is returned instead and `args` is ignored.
    ///
    /// The future resolves after the operation's own state has been updated,
    /// so an `Err` here always matches a Failed status.
    pub fn trigger(&self, args: A) -> OperationFuture<T> {
        let in_flight = self
            .state
            .borrow()
            .in_flight
            .as_ref()
            .and_then(WeakShared::upgrade);
        if let Some(in_flight) = in_flight {
            tracing::debug!(
                operation = %self.config.options.label,
                "request already in flight, reusing it"
            );
            return in_flight;
        }

        let guard = {
            let mut state = self.state.borrow_mut();
            let guard = Unsettled {
                state: Rc::downgrade(&self.state),
                label: self.config.options.label.clone(),
                status: state.status,
                error: state.error.take(),
                armed: true,
            };
            state.status = Status::Pending;
            state.last_args = Some(args.clone());
            guard
        };
        let token = self.config.registry.begin();
        tracing::debug!(operation = %self.config.options.label, "operation started");

        let future = settle(guard, self.config.clone(), token, args)
            .boxed_local()
            .shared();
        self.state.borrow_mut().in_flight = future.downgrade();
        self.notify_listener();
        future
    }

    /// Trigger again with the arguments of the previous trigger.
    pub fn refetch(&self) -> Option<OperationFuture<T>> {
        let args = self.state.borrow().last_args.clone()?;
        Some(self.trigger(args))
    }

    /// Return to Idle, dropping data and error. The registry is not touched.
    pub fn reset(&self) -> Result<(), OperationError> {
        {
            let mut state = self.state.borrow_mut();
            if state.status == Status::Pending {
                return Err(OperationError::ResetWhilePending);
            }
            state.status = Status::Idle;
            state.data = None;
            state.error = None;
        }
        self.notify_listener();
        Ok(())
    }

    pub fn snapshot(&self) -> Snapshot<T> {
        let state = self.state.borrow();
        Snapshot {
            status: state.status,
            data: state.data.clone(),
            error: state.error.clone(),
        }
    }

    pub fn data(&self) -> Option<T> {
        self.state.borrow().data.clone()
    }
}

impl<A, T> AsyncOperation<A, T> {
    pub fn status(&self) -> Status {
        self.state.borrow().status
    }

    pub fn is_loading(&self) -> bool {
        self.status() == Status::Pending
    }

    pub fn error(&self) -> Option<NormalizedError> {
        self.state.borrow().error.clone()
    }

    pub fn label(&self) -> &str {
        &self.config.options.label
    }

    pub fn registry(&self) -> &LoadingRegistry {
        &self.config.registry
    }

    /// Call `listener` after every state transition. Replaces any previous
    /// listener.
    pub fn set_listener(&self, listener: impl Fn() + 'static) {
        self.state.borrow_mut().listener = Some(Rc::new(listener));
    }

    pub fn clear_listener(&self) {
        self.state.borrow_mut().listener = None;
    }

    fn notify_listener(&self) {
        let listener = self.state.borrow().listener.clone();
        if let Some(listener) = listener {
            listener();
        }
    }
}

impl<T> AsyncOperation<(), T>
where
    T: Clone + 'static,
{
    pub fn run(&self) -> OperationFuture<T> {
        self.trigger(())
    }
}

/// Held by a request future until it settles. Dropped while still armed, it
/// restores the status and error the operation had before the trigger.
struct Unsettled<A, T> {
    state: Weak<RefCell<State<A, T>>>,
    label: Cow<'static, str>,
    status: Status,
    error: Option<NormalizedError>,
    armed: bool,
}

impl<A, T> Drop for Unsettled<A, T> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let Some(state) = self.state.upgrade() else {
            return;
        };
        let listener = {
            let Ok(mut state) = state.try_borrow_mut() else {
                tracing::warn!(
                    operation = %self.label,
                    "state busy, request dropped while pending"
                );
                return;
            };
            state.status = self.status;
            state.error = self.error.take();
            state.in_flight = None;
            state.listener.clone()
        };
        tracing::debug!(operation = %self.label, "request dropped before settling");
        if let Some(listener) = listener {
            listener();
        }
    }
}

async fn settle<A, T>(
    mut guard: Unsettled<A, T>,
    config: Rc<Config<A, T>>,
    token: Token,
    args: A,
) -> OperationResult<T>
where
    T: Clone + 'static,
{
    let outcome = (config.request)(args).await;
    guard.armed = false;
    config.registry.end(&token);
    drop(token);

    let options = &config.options;
    let result = options.classify(outcome);

    let Some(state) = guard.state.upgrade() else {
        tracing::debug!(
            operation = %options.label,
            "operation dropped while in flight, discarding result"
        );
        return result;
    };

    let listener = {
        let mut state = state.borrow_mut();
        state.in_flight = None;
        match &result {
            Ok(data) => {
                state.status = Status::Succeeded;
                state.data = data.clone();
                state.error = None;
            }
            Err(error) => {
                state.status = Status::Failed;
                state.error = Some(error.clone());
            }
        }
        state.listener.clone()
    };

    let notifier = options.notifier.as_deref();
    match &result {
        Ok(_) => {
            tracing::debug!(operation = %options.label, "operation succeeded");
            options.notifications.on_success(notifier);
        }
        Err(error) => {
            tracing::warn!(
                operation = %options.label,
                kind = %error.kind,
                error = %error.message,
                "operation failed"
            );
            options.notifications.on_failure(notifier, error);
        }
    }

    if let Some(listener) = listener {
        listener();
    }
    result
}
