//! Node kinds the language recognizes but the compiler does not handle yet.

use tranche_core::codegen::Codegen;
use tranche_core::error::TrancheError;
use tranche_core::node::Node;
use tranche_core::traits::{CompileFuture, Instruction};

fn not_implemented(node: &Node) -> CompileFuture<'_> {
    Box::pin(async move {
        Err(TrancheError::NotImplemented {
            node_id: node.id(),
            kind: node.kind().to_string(),
        })
    })
}

/// ToList node - collects values into an array. Not implemented.
#[derive(Debug, Default, Clone, Copy)]
pub struct ToListInstruction;

impl Instruction for ToListInstruction {
    fn compile<'a>(&'a self, node: &'a Node, _ctx: &'a mut Codegen) -> CompileFuture<'a> {
        not_implemented(node)
    }
}

/// Tokens node - splits text into tokens. Not implemented.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokensInstruction;

impl Instruction for TokensInstruction {
    fn compile<'a>(&'a self, node: &'a Node, _ctx: &'a mut Codegen) -> CompileFuture<'a> {
        not_implemented(node)
    }
}
