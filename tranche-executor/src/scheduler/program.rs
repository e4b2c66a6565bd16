//! Program - the compiled, reusable artifact of a loader.

use super::config::ProgramConfig;
use super::tranche::CompiledTranche;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{Instrument, debug, info_span};
use tranche_core::codegen::RunLayout;
use tranche_core::error::Result;
use tranche_core::run_state::{BufferPool, RunRequest, RunState};

/// Compiled tranches plus the layout of their run state.
///
/// A program is read-only after compilation and can serve many concurrent
/// runs; each run gets its own [`RunState`] from an internal pool.
pub struct Program {
    tranches: Vec<CompiledTranche>,
    layout: RunLayout,
    buffers: Arc<BufferPool>,
    idle: Mutex<Vec<RunState>>,
    config: ProgramConfig,
}

impl Program {
    /// Assemble a program from compiled tranches.
    pub fn new(tranches: Vec<CompiledTranche>, layout: RunLayout, config: ProgramConfig) -> Self {
        Self {
            tranches,
            layout,
            buffers: Arc::new(BufferPool::new(config.buffer_pool_size, config.buffer_capacity)),
            idle: Mutex::new(Vec::new()),
            config,
        }
    }

    /// The compiled tranches, by order.
    pub fn tranches(&self) -> &[CompiledTranche] {
        &self.tranches
    }

    /// The run-state layout.
    pub fn layout(&self) -> &RunLayout {
        &self.layout
    }

    /// The writer buffer pool.
    pub fn buffers(&self) -> &Arc<BufferPool> {
        &self.buffers
    }

    /// Idle run states ready for reuse.
    pub fn idle_run_states(&self) -> usize {
        self.idle.lock().len()
    }

    /// Run the program once, appending the data-map entries to `out`.
    ///
    /// Every tranche's Execute runs and its async work completes before the
    /// next tranche starts. Output runs only after all of them. On failure
    /// nothing is appended to `out`. Writer buffers go back to the pool in
    /// every case.
    pub async fn run(&self, request: RunRequest, out: &mut Vec<u8>) -> Result<()> {
        let mut state = self.acquire();
        state.reset(request);
        let state = Arc::new(state);
        let span = info_span!("run", run_id = %state.run_id());

        let start = out.len();
        let result = self.drive(&state, out).instrument(span.clone()).await;
        if result.is_err() {
            out.truncate(start);
        }

        let released = state.cleanup();
        span.in_scope(|| {
            debug!(
                released,
                bytes = out.len() - start,
                ok = result.is_ok(),
                "Run finished"
            );
        });
        self.recycle(state);
        result
    }

    async fn drive(&self, state: &Arc<RunState>, out: &mut Vec<u8>) -> Result<()> {
        debug!("Run started");
        for tranche in &self.tranches {
            let executed = tranche.execute(state);
            // Async work started before a failure still holds the state.
            state.completed().await;
            executed?;
            if let Some(err) = state.take_failure() {
                return Err(err);
            }
        }
        for tranche in &self.tranches {
            tranche.output(state, out)?;
        }
        Ok(())
    }

    fn acquire(&self) -> RunState {
        match self.idle.lock().pop() {
            Some(state) => state,
            None => RunState::new(&self.layout, Arc::clone(&self.buffers)),
        }
    }

    fn recycle(&self, state: Arc<RunState>) {
        // Only reusable once no spawned task still holds a reference.
        if let Ok(state) = Arc::try_unwrap(state) {
            let mut idle = self.idle.lock();
            if idle.len() < self.config.run_pool_size {
                idle.push(state);
            }
        }
    }
}

impl std::fmt::Debug for Program {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Program")
            .field("tranches", &self.tranches)
            .field("layout", &self.layout)
            .field("config", &self.config)
            .finish()
    }
}
