//! Completion signal for out-of-band async work.
//!
//! A counter of outstanding operations plus one continuation slot. Nodes that
//! answer synchronously never touch it, so a run that hits only cached data
//! completes without allocating a future per node.

use parking_lot::Mutex;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::task::{Context, Poll, Waker};

/// What runs when the counter reaches zero.
pub enum Continuation {
    /// A one-shot callback.
    Callback(Box<dyn FnOnce() + Send>),
    /// Wake an awaiting task.
    Waker(Waker),
}

impl Continuation {
    /// Wrap a closure.
    pub fn callback(f: impl FnOnce() + Send + 'static) -> Self {
        Self::Callback(Box::new(f))
    }

    fn fire(self) {
        match self {
            Self::Callback(f) => f(),
            Self::Waker(waker) => waker.wake(),
        }
    }
}

/// Outstanding-operation counter with a single-shot continuation.
///
/// Every `add` must be matched by exactly one `remove`. The continuation
/// runs inline on the thread performing the decrement that reaches zero, or
/// immediately on registration when nothing is outstanding.
#[derive(Default)]
pub struct Waiters {
    pending: AtomicUsize,
    continuation: Mutex<Option<Continuation>>,
}

impl Waiters {
    /// Create an idle counter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Announce one operation about to start.
    pub fn add(&self) {
        self.pending.fetch_add(1, Ordering::AcqRel);
    }

    /// Mark one operation as finished.
    pub fn remove(&self) {
        let previous = self.pending.fetch_sub(1, Ordering::AcqRel);
        debug_assert!(previous > 0, "waiter count underflow");
        if previous == 1 {
            let continuation = self.continuation.lock().take();
            if let Some(continuation) = continuation {
                continuation.fire();
            }
        }
    }

    /// Register what runs once nothing is outstanding.
    ///
    /// Registering while another continuation is stored replaces it; callers
    /// other than [`Completed`] must register at most once.
    pub fn register(&self, continuation: Continuation) {
        let mut slot = self.continuation.lock();
        if self.pending.load(Ordering::Acquire) == 0 {
            drop(slot);
            continuation.fire();
        } else {
            *slot = Some(continuation);
        }
    }

    /// Number of outstanding operations.
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::Acquire)
    }

    /// Future resolving once nothing is outstanding.
    pub fn completed(&self) -> Completed<'_> {
        Completed { waiters: self }
    }
}

/// Future returned by [`Waiters::completed`].
pub struct Completed<'a> {
    waiters: &'a Waiters,
}

impl Future for Completed<'_> {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if self.waiters.pending() == 0 {
            return Poll::Ready(());
        }
        self.waiters
            .register(Continuation::Waker(cx.waker().clone()));
        if self.waiters.pending() == 0 {
            Poll::Ready(())
        } else {
            Poll::Pending
        }
    }
}

/// Decrements a [`Waiters`] counter when dropped.
///
/// Keeps the count balanced on every completion path, including unwinding
/// and futures dropped before their first poll.
pub struct WaiterGuard {
    waiters: Arc<Waiters>,
}

impl WaiterGuard {
    /// Wrap an already added waiter.
    pub fn new(waiters: Arc<Waiters>) -> Self {
        Self { waiters }
    }
}

impl Drop for WaiterGuard {
    fn drop(&mut self) {
        self.waiters.remove();
    }
}
