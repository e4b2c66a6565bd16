//! Loop node (repeated evaluation).
//!
//! Recognized so descriptions containing loops load and dedup normally;
//! compiling one is not supported yet.

use tranche_core::codegen::Codegen;
use tranche_core::error::TrancheError;
use tranche_core::node::Node;
use tranche_core::traits::{CompileFuture, Instruction};

/// Loop node - fails with `NotImplemented` when compiled.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoopInstruction;

impl Instruction for LoopInstruction {
    fn compile<'a>(&'a self, node: &'a Node, _ctx: &'a mut Codegen) -> CompileFuture<'a> {
        Box::pin(async move {
            Err(TrancheError::NotImplemented {
                node_id: node.id(),
                kind: node.kind().to_string(),
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::testutil::{GraphBuilder, run, services};
    use serde_json::json;
    use tranche_core::node::NodeKind;

    #[tokio::test]
    async fn compiling_fails() {
        let nodes = GraphBuilder::new()
            .node(NodeKind::Loop, json!({"times": 3}), &[], &[])
            .build();
        let err = run(nodes, services()).await.unwrap_err();
        assert_eq!(err.code(), "E203");
        assert!(err.is_compile_error());
    }
}
