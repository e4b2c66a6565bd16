//! Component node (presentation root).
//!
//! A component marks where a rendered page starts. When it is the graph
//! root only its dependencies are registered, so it never reaches the
//! compiler in a well-formed program.

use tranche_core::codegen::Codegen;
use tranche_core::error::TrancheError;
use tranche_core::node::Node;
use tranche_core::traits::{CompileFuture, Instruction};

/// Component node - a root that is never compiled itself.
#[derive(Debug, Default, Clone, Copy)]
pub struct ComponentInstruction;

impl Instruction for ComponentInstruction {
    fn compile<'a>(&'a self, node: &'a Node, _ctx: &'a mut Codegen) -> CompileFuture<'a> {
        Box::pin(async move {
            Err(TrancheError::NotExecutable {
                node_id: node.id(),
                kind: node.kind().to_string(),
            })
        })
    }
}
