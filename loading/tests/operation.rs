use std::cell::{Cell, RefCell};
use std::future::Future;
use std::rc::Rc;

use futures::channel::oneshot;
use loading::{
    AsyncOperation, DEFAULT_BUSINESS_MESSAGE, ErrorKind, GENERIC_FAILURE_MESSAGE,
    LoadingRegistry, NETWORK_FAILURE_MESSAGE, Notifier, OperationError,
    OperationOptions, Status,
};
use payloads::Envelope;

type Reply<T> = Result<Envelope<T>, String>;

/// Request that answers immediately with a fixed reply and counts calls.
fn immediate<A, T: Clone + 'static>(
    reply: Reply<T>,
) -> (Rc<Cell<usize>>, impl Fn(A) -> futures::future::Ready<Reply<T>>) {
    let calls = Rc::new(Cell::new(0));
    let counter = calls.clone();
    let request = move |_: A| {
        counter.set(counter.get() + 1);
        futures::future::ready(reply.clone())
    };
    (calls, request)
}

/// Request whose single reply is released by the returned sender.
fn gated<T: 'static>() -> (
    oneshot::Sender<Reply<T>>,
    impl Fn(()) -> std::pin::Pin<Box<dyn Future<Output = Reply<T>>>>,
) {
    let (tx, rx) = oneshot::channel();
    let slot = RefCell::new(Some(rx));
    let request = move |()| {
        let rx = slot.borrow_mut().take();
        Box::pin(async move {
            match rx {
                Some(rx) => rx.await.unwrap_or_else(|_| Err("sender dropped".into())),
                None => Err("request already used".into()),
            }
        }) as std::pin::Pin<Box<dyn Future<Output = Reply<T>>>>
    };
    (tx, request)
}

#[derive(Default)]
struct RecordingNotifier {
    successes: RefCell<Vec<String>>,
    failures: RefCell<Vec<String>>,
}

impl Notifier for RecordingNotifier {
    fn success(&self, message: &str) {
        self.successes.borrow_mut().push(message.to_string());
    }

    fn failure(&self, message: &str) {
        self.failures.borrow_mut().push(message.to_string());
    }
}

fn with_recorder<T>(
    options: OperationOptions<T>,
) -> (Rc<RecordingNotifier>, OperationOptions<T>) {
    let notifier = Rc::new(RecordingNotifier::default());
    let options = options.notifier(notifier.clone());
    (notifier, options)
}

#[tokio::test]
async fn test_success_envelope() {
    let registry = LoadingRegistry::new();
    let (_, request) = immediate::<(), _>(Ok(Envelope::ok(vec!["basic", "pro"])));
    let operation = AsyncOperation::new(&registry, OperationOptions::new("plans"), request);
    assert_eq!(operation.status(), Status::Idle);

    let plans = operation.run().await.unwrap();
    assert_eq!(plans, Some(vec!["basic", "pro"]));

    let snapshot = operation.snapshot();
    assert_eq!(snapshot.status, Status::Succeeded);
    assert_eq!(snapshot.data, Some(vec!["basic", "pro"]));
    assert_eq!(snapshot.error, None);
    assert_eq!(registry.active_count(), 0);
}

#[tokio::test]
async fn test_business_failure_envelope() {
    let registry = LoadingRegistry::new();
    let (_, request) = immediate::<(), u32>(Ok(Envelope::failure("m")));
    let operation = AsyncOperation::new(&registry, OperationOptions::default(), request);

    let error = operation.run().await.unwrap_err();
    assert_eq!(error.kind, ErrorKind::Business);
    assert_eq!(error.message, "m");

    let snapshot = operation.snapshot();
    assert_eq!(snapshot.status, Status::Failed);
    assert_eq!(snapshot.error.map(|e| e.message), Some("m".to_string()));
    assert_eq!(registry.active_count(), 0);
}

#[tokio::test]
async fn test_business_failure_without_message_uses_default() {
    let registry = LoadingRegistry::new();
    let envelope = Envelope::<u32> {
        success: false,
        message: None,
        data: None,
    };
    let (_, request) = immediate::<(), u32>(Ok(envelope));
    let operation = AsyncOperation::new(&registry, OperationOptions::default(), request);

    let error = operation.run().await.unwrap_err();
    assert_eq!(error.message, DEFAULT_BUSINESS_MESSAGE);
}

#[tokio::test]
async fn test_plain_string_rejection_becomes_transport_error() {
    let registry = LoadingRegistry::new();
    let (_, request) = immediate::<(), u32>(Err("boom".to_string()));
    let operation = AsyncOperation::new(&registry, OperationOptions::default(), request);

    let error = operation.run().await.unwrap_err();
    assert_eq!(error.kind, ErrorKind::Transport);
    assert_eq!(error.message, "boom");
    assert_eq!(operation.status(), Status::Failed);
    assert_eq!(operation.error(), Some(error));
    assert_eq!(registry.active_count(), 0);
}

#[tokio::test]
async fn test_registry_held_while_pending() {
    let registry = LoadingRegistry::new();
    let (tx, request) = gated::<u32>();
    let operation = AsyncOperation::new(&registry, OperationOptions::default(), request);

    let pending = operation.run();
    assert_eq!(operation.status(), Status::Pending);
    assert!(operation.is_loading());
    assert_eq!(registry.active_count(), 1);

    tx.send(Ok(Envelope::ok(7))).unwrap();
    assert_eq!(pending.await, Ok(Some(7)));
    assert_eq!(registry.active_count(), 0);
    assert!(!operation.is_loading());
}

#[tokio::test]
async fn test_overlapping_operations_keep_overlay_busy() {
    let registry = LoadingRegistry::new();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let _overlay = {
        let seen = seen.clone();
        registry.subscribe(move |count| seen.borrow_mut().push(count))
    };

    let (tx_a, request_a) = gated::<&str>();
    let (tx_b, request_b) = gated::<&str>();
    let a = AsyncOperation::new(&registry, OperationOptions::new("blog"), request_a);
    let b = AsyncOperation::new(&registry, OperationOptions::new("news"), request_b);

    let pending_a = a.run();
    let pending_b = b.run();
    assert_eq!(registry.active_count(), 2);

    tx_a.send(Ok(Envelope::ok("posts"))).unwrap();
    assert_eq!(pending_a.await, Ok(Some("posts")));
    assert_eq!(registry.active_count(), 1);
    assert!(registry.is_busy());
    assert_eq!(b.status(), Status::Pending);

    tx_b.send(Ok(Envelope::ok("headlines"))).unwrap();
    assert_eq!(pending_b.await, Ok(Some("headlines")));
    assert_eq!(registry.active_count(), 0);

    assert_eq!(*seen.borrow(), vec![0, 1, 2, 1, 0]);
}

#[tokio::test]
async fn test_trigger_while_pending_reuses_in_flight_request() {
    let registry = LoadingRegistry::new();
    let (tx, request) = gated::<u32>();
    let calls = Rc::new(Cell::new(0));
    let request = {
        let calls = calls.clone();
        move |args: ()| {
            calls.set(calls.get() + 1);
            request(args)
        }
    };
    let (notifier, options) = with_recorder(OperationOptions::default());
    let operation = AsyncOperation::new(&registry, options, request);

    let first = operation.run();
    let second = operation.run();
    assert_eq!(registry.active_count(), 1);

    tx.send(Err("timeout".to_string())).unwrap();
    let (first, second) = futures::join!(first, second);
    assert_eq!(first, second);
    assert!(first.is_err());
    assert_eq!(calls.get(), 1);
    assert_eq!(notifier.failures.borrow().len(), 1);
    assert_eq!(registry.active_count(), 0);
}

#[tokio::test]
async fn test_reset_after_success() {
    let registry = LoadingRegistry::new();
    let _unrelated = registry.begin();
    let (_, request) = immediate::<(), _>(Ok(Envelope::ok(3)));
    let operation = AsyncOperation::new(&registry, OperationOptions::default(), request);

    operation.run().await.unwrap();
    assert_eq!(registry.active_count(), 1);

    operation.reset().unwrap();
    let snapshot = operation.snapshot();
    assert_eq!(snapshot.status, Status::Idle);
    assert_eq!(snapshot.data, None);
    assert_eq!(snapshot.error, None);
    assert_eq!(registry.active_count(), 1);
}

#[tokio::test]
async fn test_reset_rejected_while_pending() {
    let registry = LoadingRegistry::new();
    let (tx, request) = gated::<u32>();
    let operation = AsyncOperation::new(&registry, OperationOptions::default(), request);

    let pending = operation.run();
    assert_eq!(operation.reset(), Err(OperationError::ResetWhilePending));
    assert_eq!(operation.status(), Status::Pending);
    assert_eq!(registry.active_count(), 1);

    tx.send(Ok(Envelope::ok(1))).unwrap();
    pending.await.unwrap();
    assert_eq!(operation.reset(), Ok(()));
}

#[tokio::test]
async fn test_failure_notification_uses_override_once() {
    let registry = LoadingRegistry::new();
    let (_, request) = immediate::<(), u32>(Ok(Envelope::failure("duplicate key")));
    let (notifier, options) = with_recorder(
        OperationOptions::new("create blog").failure_message("Could not publish the post"),
    );
    let operation = AsyncOperation::new(&registry, options, request);

    let _ = operation.run().await;
    assert_eq!(*notifier.failures.borrow(), vec!["Could not publish the post"]);
    assert!(notifier.successes.borrow().is_empty());

    let _ = operation.run().await;
    assert_eq!(notifier.failures.borrow().len(), 2);
}

#[tokio::test]
async fn test_failure_notification_fallbacks_hide_raw_text() {
    let registry = LoadingRegistry::new();

    let (_, request) = immediate::<(), u32>(Ok(Envelope::failure("sql: constraint")));
    let (notifier, options) = with_recorder(OperationOptions::default());
    let operation = AsyncOperation::new(&registry, options, request);
    let _ = operation.run().await;
    assert_eq!(*notifier.failures.borrow(), vec![GENERIC_FAILURE_MESSAGE]);

    let (_, request) = immediate::<(), u32>(Err("dns error: no such host".to_string()));
    let (notifier, options) = with_recorder(OperationOptions::default());
    let operation = AsyncOperation::new(&registry, options, request);
    let _ = operation.run().await;
    assert_eq!(*notifier.failures.borrow(), vec![NETWORK_FAILURE_MESSAGE]);
}

#[tokio::test]
async fn test_success_notification_only_when_configured() {
    let registry = LoadingRegistry::new();

    let (_, request) = immediate::<(), _>(Ok(Envelope::ok(1)));
    let (notifier, options) = with_recorder(OperationOptions::default());
    AsyncOperation::new(&registry, options, request).run().await.unwrap();
    assert!(notifier.successes.borrow().is_empty());

    let (_, request) = immediate::<(), _>(Ok(Envelope::ok(1)));
    let (notifier, options) =
        with_recorder(OperationOptions::default().success_message("Plan updated"));
    AsyncOperation::new(&registry, options, request).run().await.unwrap();
    assert_eq!(*notifier.successes.borrow(), vec!["Plan updated"]);
}

#[tokio::test]
async fn test_every_failure_is_notified() {
    let registry = LoadingRegistry::new();
    let replies = Rc::new(RefCell::new(vec![
        Ok(Envelope::ok(2)),
        Err("offline".to_string()),
        Ok(Envelope::ok(1)),
    ]));
    let request = {
        let replies = replies.clone();
        move |()| {
            let reply = replies.borrow_mut().pop().unwrap_or(Err("exhausted".into()));
            futures::future::ready(reply)
        }
    };
    let (notifier, options) = with_recorder(OperationOptions::new("balance"));
    let operation = AsyncOperation::new(&registry, options, request);

    operation.run().await.unwrap();
    assert!(operation.run().await.is_err());
    operation.run().await.unwrap();

    assert_eq!(*notifier.failures.borrow(), vec![NETWORK_FAILURE_MESSAGE]);
    assert!(notifier.successes.borrow().is_empty());
}

#[tokio::test]
async fn test_success_without_data_still_succeeds() {
    let registry = LoadingRegistry::new();
    let (_, request) = immediate::<(), u32>(Ok(Envelope::ok_empty()));
    let (notifier, options) =
        with_recorder(OperationOptions::new("delete").success_message("Deleted"));
    let operation = AsyncOperation::new(&registry, options, request);

    assert_eq!(operation.run().await, Ok(None));
    let snapshot = operation.snapshot();
    assert_eq!(snapshot.status, Status::Succeeded);
    assert_eq!(snapshot.data, None);
    assert_eq!(snapshot.error, None);
    assert!(notifier.failures.borrow().is_empty());
    assert_eq!(*notifier.successes.borrow(), vec!["Deleted"]);
}

#[tokio::test]
async fn test_list_fallback_on_missing_data() {
    let registry = LoadingRegistry::new();
    let replies: Rc<RefCell<Vec<Reply<Vec<i32>>>>> = Rc::new(RefCell::new(vec![
        Ok(Envelope::ok_empty()),
        Ok(Envelope::ok(vec![4, 5])),
    ]));
    let request = {
        let replies = replies.clone();
        move |()| {
            let reply = replies.borrow_mut().pop().unwrap_or(Err("exhausted".into()));
            futures::future::ready(reply)
        }
    };
    let operation = AsyncOperation::new(
        &registry,
        OperationOptions::new("orders").default_on_missing(),
        request,
    );

    assert_eq!(operation.run().await, Ok(Some(vec![4, 5])));
    assert_eq!(operation.run().await, Ok(Some(Vec::new())));
    let snapshot = operation.snapshot();
    assert_eq!(snapshot.status, Status::Succeeded);
    assert_eq!(snapshot.data, Some(Vec::new()));
}

#[tokio::test]
async fn test_data_retained_across_failed_refetch() {
    let registry = LoadingRegistry::new();
    let replies = Rc::new(RefCell::new(vec![
        Err("gateway timeout".to_string()),
        Ok(Envelope::ok(vec![1, 2])),
    ]));
    let request = {
        let replies = replies.clone();
        move |()| {
            let reply = replies.borrow_mut().pop().unwrap_or(Err("exhausted".into()));
            futures::future::ready(reply)
        }
    };
    let operation = AsyncOperation::new(&registry, OperationOptions::default(), request);

    operation.run().await.unwrap();
    let pending = operation.run();
    assert_eq!(operation.snapshot().data, Some(vec![1, 2]));
    assert!(pending.await.is_err());

    let snapshot = operation.snapshot();
    assert_eq!(snapshot.status, Status::Failed);
    assert_eq!(snapshot.data, Some(vec![1, 2]));
    assert!(snapshot.error.is_some());
}

#[tokio::test]
async fn test_new_trigger_clears_previous_error() {
    let registry = LoadingRegistry::new();
    let (tx, request) = gated::<u32>();
    let fail_first = Rc::new(Cell::new(true));
    let request = {
        let fail_first = fail_first.clone();
        move |args: ()| {
            if fail_first.replace(false) {
                Box::pin(futures::future::ready(Err("refused".to_string())))
                    as std::pin::Pin<Box<dyn Future<Output = Reply<u32>>>>
            } else {
                request(args)
            }
        }
    };
    let operation = AsyncOperation::new(&registry, OperationOptions::default(), request);

    assert!(operation.run().await.is_err());
    assert!(operation.error().is_some());

    let pending = operation.run();
    assert_eq!(operation.error(), None);
    assert_eq!(operation.status(), Status::Pending);

    tx.send(Ok(Envelope::ok(9))).unwrap();
    assert_eq!(pending.await, Ok(Some(9)));
}

#[tokio::test]
async fn test_refetch_replays_last_arguments() {
    let registry = LoadingRegistry::new();
    let seen_args = Rc::new(RefCell::new(Vec::new()));
    let request = {
        let seen_args = seen_args.clone();
        move |page: u32| {
            seen_args.borrow_mut().push(page);
            futures::future::ready(Ok::<_, String>(Envelope::ok(page * 10)))
        }
    };
    let operation = AsyncOperation::new(&registry, OperationOptions::default(), request);

    assert!(operation.refetch().is_none());
    assert_eq!(operation.trigger(3).await, Ok(Some(30)));
    assert_eq!(operation.refetch().unwrap().await, Ok(Some(30)));
    assert_eq!(*seen_args.borrow(), vec![3, 3]);
}

#[tokio::test]
async fn test_dropped_operation_still_releases_registry() {
    let registry = LoadingRegistry::new();
    let (tx, request) = gated::<u32>();
    let (notifier, options) = with_recorder(OperationOptions::default());
    let operation = AsyncOperation::new(&registry, options, request);

    let pending = operation.run();
    drop(operation);
    assert_eq!(registry.active_count(), 1);

    tx.send(Ok(Envelope::failure("late"))).unwrap();
    assert!(pending.await.is_err());
    assert_eq!(registry.active_count(), 0);
    assert!(notifier.failures.borrow().is_empty());
}

#[tokio::test]
async fn test_abandoned_request_releases_registry() {
    let registry = LoadingRegistry::new();
    let (_tx, request) = gated::<u32>();
    let operation = AsyncOperation::new(&registry, OperationOptions::default(), request);

    let pending = operation.run();
    assert_eq!(registry.active_count(), 1);

    drop(pending);
    drop(operation);
    assert_eq!(registry.active_count(), 0);
}

#[tokio::test]
async fn test_dropped_future_restores_operation() {
    let registry = LoadingRegistry::new();
    let (_tx, request) = gated::<u32>();
    let operation = AsyncOperation::new(&registry, OperationOptions::default(), request);

    let pending = operation.run();
    assert_eq!(operation.status(), Status::Pending);
    assert_eq!(registry.active_count(), 1);

    drop(pending);
    assert_eq!(registry.active_count(), 0);
    assert_eq!(operation.status(), Status::Idle);
    assert!(!operation.is_loading());
    assert_eq!(operation.reset(), Ok(()));
}

#[tokio::test]
async fn test_dropped_future_keeps_previous_failure() {
    let registry = LoadingRegistry::new();
    let (_, request) = immediate::<(), u32>(Err("refused".to_string()));
    let operation = AsyncOperation::new(&registry, OperationOptions::default(), request);

    let error = operation.run().await.unwrap_err();
    drop(operation.run());

    assert_eq!(operation.status(), Status::Failed);
    assert_eq!(operation.error(), Some(error));
    assert_eq!(registry.active_count(), 0);
}

#[tokio::test]
async fn test_trigger_after_dropped_future_starts_new_request() {
    let registry = LoadingRegistry::new();
    let (calls, request) = immediate::<(), _>(Ok(Envelope::ok(11)));
    let operation = AsyncOperation::new(&registry, OperationOptions::default(), request);

    drop(operation.run());
    assert_eq!(calls.get(), 0);

    let pending = operation.run();
    assert_eq!(registry.active_count(), 1);
    assert_eq!(pending.await, Ok(Some(11)));
    assert_eq!(calls.get(), 1);
    assert_eq!(operation.status(), Status::Succeeded);
    assert_eq!(registry.active_count(), 0);
}

#[tokio::test]
async fn test_listener_sees_each_transition() {
    let registry = LoadingRegistry::new();
    let (_, request) = immediate::<(), _>(Ok(Envelope::ok(5)));
    let operation = AsyncOperation::new(&registry, OperationOptions::default(), request);

    let statuses = Rc::new(RefCell::new(Vec::new()));
    {
        let statuses = statuses.clone();
        let observed = operation.clone();
        operation.set_listener(move || statuses.borrow_mut().push(observed.status()));
    }

    operation.run().await.unwrap();
    operation.reset().unwrap();
    operation.clear_listener();
    operation.run().await.unwrap();

    assert_eq!(
        *statuses.borrow(),
        vec![Status::Pending, Status::Succeeded, Status::Idle]
    );
}
