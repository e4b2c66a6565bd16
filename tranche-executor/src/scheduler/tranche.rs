//! Tranches and their compiled form.

use std::sync::Arc;
use tracing::debug;
use tranche_core::codegen::{Codegen, ExecFn, JsonFn};
use tranche_core::error::Result;
use tranche_core::run_state::RunState;
use tranche_core::types::NodeId;

/// Nodes sharing one order.
///
/// Nodes of a tranche never link to each other.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tranche {
    order: u32,
    nodes: Vec<NodeId>,
}

impl Tranche {
    /// Create an empty tranche.
    pub fn new(order: u32) -> Self {
        Self {
            order,
            nodes: Vec::new(),
        }
    }

    /// Append a node.
    pub fn push(&mut self, node: NodeId) {
        self.nodes.push(node);
    }

    /// The shared order.
    pub fn order(&self) -> u32 {
        self.order
    }

    /// Member nodes in registration order.
    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    /// Check if the tranche has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Compile every member, then every member's data-map output.
    pub async fn compile(&self, ctx: &mut Codegen) -> Result<CompiledTranche> {
        for id in &self.nodes {
            ctx.compile_node(*id).await?;
        }
        for id in &self.nodes {
            ctx.compile_output(*id)?;
        }
        let (execute, output) = ctx.take_emitted();
        debug!(
            order = self.order,
            nodes = self.nodes.len(),
            steps = execute.len(),
            outputs = output.len(),
            "Compiled tranche"
        );
        Ok(CompiledTranche {
            order: self.order,
            execute,
            output,
        })
    }
}

/// The two entry points of a compiled tranche.
///
/// Execute computes node values into a run state and may start async work;
/// Output writes data-map entries and must only run after every tranche's
/// Execute has completed.
pub struct CompiledTranche {
    order: u32,
    execute: Vec<ExecFn>,
    output: Vec<JsonFn>,
}

impl CompiledTranche {
    /// The tranche order.
    pub fn order(&self) -> u32 {
        self.order
    }

    /// Run every compute step.
    ///
    /// Stops at the first synchronous failure. Async work already started
    /// keeps its waiters and must still be awaited.
    pub fn execute(&self, state: &Arc<RunState>) -> Result<()> {
        for step in &self.execute {
            step(state)?;
        }
        Ok(())
    }

    /// Write every data-map entry into `out`.
    pub fn output(&self, state: &RunState, out: &mut Vec<u8>) -> Result<()> {
        for write in &self.output {
            write(state, out)?;
        }
        Ok(())
    }

    /// Number of data-map entries written by Output.
    pub fn output_count(&self) -> usize {
        self.output.len()
    }
}

impl std::fmt::Debug for CompiledTranche {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompiledTranche")
            .field("order", &self.order)
            .field("execute", &self.execute.len())
            .field("output", &self.output.len())
            .finish()
    }
}
