//! Process-wide count of in-flight operations.
//!
//! Every operation takes a [`Token`] from [`LoadingRegistry::begin`] and hands
//! it back through [`LoadingRegistry::end`] (or simply drops it). The count is
//! the number of live tokens, so it cannot drift or go negative no matter how
//! often a caller ends the same token.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashSet, VecDeque};
use std::fmt;
use std::rc::{Rc, Weak};

type Callback = Rc<dyn Fn(usize)>;

#[derive(Default)]
struct Inner {
    next_token: u64,
    live: HashSet<u64>,
    next_subscriber: u64,
    subscribers: BTreeMap<u64, Callback>,
    /// Counts waiting to be fanned out, each paired with the first
    /// subscriber id that registered after the mutation and must not see it.
    queue: VecDeque<(usize, u64)>,
    draining: bool,
}

impl Inner {
    fn enqueue(&mut self) -> usize {
        let count = self.live.len();
        let watermark = self.next_subscriber;
        self.queue.push_back((count, watermark));
        count
    }
}

/// Shared handle to a loading registry.
///
/// Clones point at the same registry; equality is identity. Create one at the
/// composition root and pass it to every consumer. Tests build a fresh one
/// each.
#[derive(Clone, Default)]
pub struct LoadingRegistry {
    inner: Rc<RefCell<Inner>>,
}

impl LoadingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register one in-flight operation.
    pub fn begin(&self) -> Token {
        let id = {
            let mut inner = self.inner.borrow_mut();
            let id = inner.next_token;
            inner.next_token += 1;
            inner.live.insert(id);
            let active = inner.enqueue();
            tracing::trace!(token = id, active, "loading begin");
            id
        };
        let token = Token {
            id,
            ended: Cell::new(false),
            registry: Rc::downgrade(&self.inner),
        };
        drain(&self.inner);
        token
    }

    /// End the operation tracked by `token`.
    ///
    /// Ending a token twice, or ending a token issued by a different
    /// registry, does nothing.
    pub fn end(&self, token: &Token) {
        if !token.issued_by(&self.inner) {
            tracing::debug!(token = token.id, "ignoring token from another registry");
            return;
        }
        if token.ended.replace(true) {
            tracing::debug!(token = token.id, "loading token already ended");
            return;
        }
        release(&self.inner, token.id);
    }

    pub fn active_count(&self) -> usize {
        self.inner.borrow().live.len()
    }

    pub fn is_busy(&self) -> bool {
        self.active_count() > 0
    }

    /// Subscribe to count changes.
    ///
    /// `callback` is called right away with the current count and then after
    /// every `begin` and effective `end`, synchronously. Callbacks may call
    /// back into the registry; notifications raised meanwhile are queued and
    /// delivered in order.
    pub fn subscribe(&self, callback: impl Fn(usize) + 'static) -> Subscription {
        let callback: Callback = Rc::new(callback);
        let (id, count) = {
            let mut inner = self.inner.borrow_mut();
            let id = inner.next_subscriber;
            inner.next_subscriber += 1;
            inner.subscribers.insert(id, callback.clone());
            (id, inner.live.len())
        };
        callback(count);
        Subscription {
            id,
            registry: Rc::downgrade(&self.inner),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.borrow().subscribers.len()
    }
}

impl PartialEq for LoadingRegistry {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for LoadingRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("LoadingRegistry")
            .field("active", &inner.live.len())
            .field("subscribers", &inner.subscribers.len())
            .finish()
    }
}

fn release(inner: &Rc<RefCell<Inner>>, id: u64) {
    {
        let mut state = inner.borrow_mut();
        if !state.live.remove(&id) {
            return;
        }
        let active = state.enqueue();
        tracing::trace!(token = id, active, "loading end");
    }
    drain(inner);
}

/// Deliver queued counts. Only the outermost call drains; nested mutations
/// made from inside a callback just extend the queue.
fn drain(inner: &Rc<RefCell<Inner>>) {
    {
        let mut state = inner.borrow_mut();
        if state.draining {
            return;
        }
        state.draining = true;
    }
    let _guard = DrainGuard(inner);

    loop {
        let Some((count, watermark)) = inner.borrow_mut().queue.pop_front()
        else {
            break;
        };
        let ids: Vec<u64> = inner
            .borrow()
            .subscribers
            .range(..watermark)
            .map(|(id, _)| *id)
            .collect();
        for id in ids {
            let callback = inner.borrow().subscribers.get(&id).cloned();
            if let Some(callback) = callback {
                callback(count);
            }
        }
    }
}

struct DrainGuard<'a>(&'a Rc<RefCell<Inner>>);

impl Drop for DrainGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.0.borrow_mut();
        state.draining = false;
        state.queue.clear();
    }
}

/// Proof that one operation is in flight.
///
/// Dropping a token that was never ended ends it, so an abandoned or
/// panicking operation still releases its slot.
#[must_use = "dropping a token immediately ends the operation it tracks"]
pub struct Token {
    id: u64,
    ended: Cell<bool>,
    registry: Weak<RefCell<Inner>>,
}

impl Token {
    fn issued_by(&self, inner: &Rc<RefCell<Inner>>) -> bool {
        std::ptr::eq(self.registry.as_ptr(), Rc::as_ptr(inner))
    }

    pub fn is_ended(&self) -> bool {
        self.ended.get()
    }
}

impl Drop for Token {
    fn drop(&mut self) {
        if self.ended.replace(true) {
            return;
        }
        if let Some(inner) = self.registry.upgrade() {
            release(&inner, self.id);
        }
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Token")
            .field("id", &self.id)
            .field("ended", &self.ended.get())
            .finish()
    }
}

/// Handle returned by [`LoadingRegistry::subscribe`].
#[must_use = "dropping a subscription unsubscribes it"]
pub struct Subscription {
    id: u64,
    registry: Weak<RefCell<Inner>>,
}

impl Subscription {
    /// Stop receiving counts. Safe to call repeatedly, including from inside
    /// the subscribed callback.
    pub fn unsubscribe(&self) {
        if let Some(inner) = self.registry.upgrade() {
            inner.borrow_mut().subscribers.remove(&self.id);
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}
