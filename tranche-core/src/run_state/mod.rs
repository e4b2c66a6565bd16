//! Per-run state.
//!
//! A [`RunState`] holds the slots compiled nodes write into, the request the
//! run serves and the completion signal for asynchronous node work. Slots are
//! laid out once per program by the codegen context; run states are reset and
//! recycled between runs.

mod pool;
mod waiters;

pub use pool::BufferPool;
pub use waiters::{Completed, Continuation, WaiterGuard, Waiters};

use crate::codegen::RunLayout;
use crate::error::{Result, TrancheError};
use crate::traits::Fetch;
use crate::types::{RunId, SlotId, WriterSlotId};
use crate::value::Value;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::runtime::Handle;

/// Caller context of a run, handed to the data-access layer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestContext {
    /// Authenticated user, if any.
    pub user_id: Option<String>,
    /// Free-form request attributes (locale, preview flags, ...).
    pub attributes: BTreeMap<String, Value>,
}

impl RequestContext {
    /// Context of an anonymous request.
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Context of a signed-in user.
    pub fn for_user(user_id: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id.into()),
            attributes: BTreeMap::new(),
        }
    }

    /// Set an attribute.
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }
}

/// Input of one run.
#[derive(Debug, Clone, Default)]
pub struct RunRequest {
    /// Caller context.
    pub context: RequestContext,
    /// The page's primary entity, read by `Content` nodes without an id.
    pub primary: Option<Value>,
}

impl RunRequest {
    /// A request with the given context and no primary entity.
    pub fn new(context: RequestContext) -> Self {
        Self {
            context,
            primary: None,
        }
    }

    /// Set the primary entity.
    pub fn with_primary(mut self, primary: impl Into<Value>) -> Self {
        self.primary = Some(primary.into());
        self
    }
}

/// State of one execution of a compiled program.
pub struct RunState {
    run_id: RunId,
    request: RunRequest,
    values: Box<[Mutex<Value>]>,
    writers: Box<[Mutex<Option<Vec<u8>>>]>,
    waiters: Arc<Waiters>,
    failure: Mutex<Option<TrancheError>>,
    runtime: Option<Handle>,
    buffers: Arc<BufferPool>,
}

impl std::fmt::Debug for RunState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunState")
            .field("run_id", &self.run_id)
            .field("values", &self.values.len())
            .field("writers", &self.writers.len())
            .field("pending", &self.waiters.pending())
            .finish()
    }
}

impl RunState {
    /// Allocate a run state for `layout`.
    ///
    /// Picks up the current tokio runtime, if any, to drive pending fetches.
    pub fn new(layout: &RunLayout, buffers: Arc<BufferPool>) -> Self {
        Self {
            run_id: RunId::new(),
            request: RunRequest::default(),
            values: (0..layout.value_count())
                .map(|_| Mutex::new(Value::null()))
                .collect(),
            writers: (0..layout.writer_count()).map(|_| Mutex::new(None)).collect(),
            waiters: Arc::new(Waiters::new()),
            failure: Mutex::new(None),
            runtime: Handle::try_current().ok(),
            buffers,
        }
    }

    /// Prepare for a new run.
    ///
    /// Expects [`cleanup`](Self::cleanup) to have run after the previous one.
    /// Picks up the current runtime, so a recycled state follows the caller.
    pub fn reset(&mut self, request: RunRequest) {
        self.run_id = RunId::new();
        self.request = request;
        for value in self.values.iter_mut() {
            *value.get_mut() = Value::null();
        }
        *self.failure.get_mut() = None;
        if let Ok(handle) = Handle::try_current() {
            self.runtime = Some(handle);
        }
    }

    /// Id of the current run.
    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    /// Caller context.
    pub fn context(&self) -> &RequestContext {
        &self.request.context
    }

    /// The primary entity, if the request has one.
    pub fn primary(&self) -> Option<&Value> {
        self.request.primary.as_ref()
    }

    // ------------------------------------------------------------------
    // Completion
    // ------------------------------------------------------------------

    /// Announce async work about to start.
    pub fn add_waiter(&self) {
        self.waiters.add();
    }

    /// Mark announced async work as finished.
    pub fn remove_waiter(&self) {
        self.waiters.remove();
    }

    /// Run `f` once no async work is outstanding.
    pub fn register_continuation(&self, f: impl FnOnce() + Send + 'static) {
        self.waiters.register(Continuation::callback(f));
    }

    /// Outstanding async operations.
    pub fn pending(&self) -> usize {
        self.waiters.pending()
    }

    /// Future resolving once no async work is outstanding.
    pub fn completed(&self) -> Completed<'_> {
        self.waiters.completed()
    }

    /// Consume a fetch result, inline when ready and on the runtime otherwise.
    ///
    /// Pending fetches are spawned on the caller's runtime, falling back to
    /// the one captured at reset, and hold one waiter until `complete` has
    /// run or the task is dropped. Failures are recorded with
    /// [`fail`](Self::fail) and surface when the run awaits completion; a task
    /// dropped unfinished records [`TrancheError::Cancelled`].
    pub fn settle<T, F>(self: &Arc<Self>, fetch: Fetch<T>, complete: F) -> Result<()>
    where
        T: Send + 'static,
        F: FnOnce(&RunState, T) -> Result<()> + Send + 'static,
    {
        match fetch {
            Fetch::Ready(result) => complete(&**self, result?),
            Fetch::Pending(future) => {
                let runtime = Handle::try_current()
                    .ok()
                    .or_else(|| self.runtime.clone())
                    .ok_or(TrancheError::NoRuntime)?;
                let work = PendingWork::start(self);
                runtime.spawn(async move {
                    let outcome = match future.await {
                        Ok(value) => complete(&*work.state, value),
                        Err(err) => Err(err),
                    };
                    work.finish(outcome);
                });
                Ok(())
            }
        }
    }

    /// Record a runtime failure; the first one wins.
    pub fn fail(&self, err: TrancheError) {
        tracing::warn!(run_id = %self.run_id, code = err.code(), error = %err, "Run failed");
        let mut failure = self.failure.lock();
        if failure.is_none() {
            *failure = Some(err);
        }
    }

    /// Take the recorded failure.
    pub fn take_failure(&self) -> Option<TrancheError> {
        self.failure.lock().take()
    }

    // ------------------------------------------------------------------
    // Slots
    // ------------------------------------------------------------------

    /// Store a value.
    pub fn store(&self, slot: SlotId, value: Value) {
        if let Some(cell) = self.values.get(slot.index()) {
            *cell.lock() = value;
        }
    }

    /// Clone a stored value.
    pub fn load(&self, slot: SlotId) -> Value {
        self.values
            .get(slot.index())
            .map(|cell| cell.lock().clone())
            .unwrap_or_default()
    }

    /// Borrow a stored value.
    pub fn with_value<R>(&self, slot: SlotId, f: impl FnOnce(&Value) -> R) -> R {
        match self.values.get(slot.index()) {
            Some(cell) => f(&cell.lock()),
            None => f(&Value::null()),
        }
    }

    /// Take a buffer from the pool for a writer slot.
    pub fn acquire_buffer(&self) -> Vec<u8> {
        self.buffers.acquire()
    }

    /// Store a pooled buffer; a buffer already in the slot goes back to the
    /// pool.
    pub fn put_writer(&self, slot: WriterSlotId, buffer: Vec<u8>) {
        match self.writers.get(slot.index()) {
            Some(cell) => {
                if let Some(previous) = cell.lock().replace(buffer) {
                    self.buffers.release(previous);
                }
            }
            None => self.buffers.release(buffer),
        }
    }

    /// Borrow the contents of a writer slot, `None` when unset.
    pub fn with_writer<R>(&self, slot: WriterSlotId, f: impl FnOnce(Option<&[u8]>) -> R) -> R {
        match self.writers.get(slot.index()) {
            Some(cell) => f(cell.lock().as_deref()),
            None => f(None),
        }
    }

    /// Release every set writer slot to the pool exactly once.
    ///
    /// Returns the number of buffers released.
    pub fn cleanup(&self) -> usize {
        let mut released = 0;
        for cell in self.writers.iter() {
            let buffer = cell.lock().take();
            if let Some(buffer) = buffer {
                self.buffers.release(buffer);
                released += 1;
            }
        }
        released
    }
}

/// One spawned continuation of [`RunState::settle`].
///
/// Fields drop in order: the state reference goes before the waiter, so the
/// run sees a unique state once completion fires.
struct PendingWork {
    state: Arc<RunState>,
    _waiter: WaiterGuard,
    finished: bool,
}

impl PendingWork {
    fn start(state: &Arc<RunState>) -> Self {
        state.waiters.add();
        Self {
            state: Arc::clone(state),
            _waiter: WaiterGuard::new(Arc::clone(&state.waiters)),
            finished: false,
        }
    }

    fn finish(mut self, outcome: Result<()>) {
        if let Err(err) = outcome {
            self.state.fail(err);
        }
        self.finished = true;
    }
}

impl Drop for PendingWork {
    fn drop(&mut self) {
        if !self.finished {
            self.state.fail(TrancheError::Cancelled);
        }
    }
}
