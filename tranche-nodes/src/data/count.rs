//! Count node (array length).

use tranche_core::codegen::{Codegen, JsonFn};
use tranche_core::error::{Result, ResultExt, TrancheError};
use tranche_core::node::Node;
use tranche_core::traits::{CompileFuture, Instruction};
use tranche_core::value::{Value, ValueType};

/// Count node - stores the length of an array input.
///
/// # Inputs
/// - `input`: array (link or constant)
///
/// # Outputs
/// - `output`: `Int`
///
/// Other sequence types are not supported yet.
#[derive(Debug, Default, Clone, Copy)]
pub struct CountInstruction;

impl Instruction for CountInstruction {
    fn compile<'a>(&'a self, node: &'a Node, ctx: &'a mut Codegen) -> CompileFuture<'a> {
        Box::pin(async move {
            let input = ctx.require_input(node, "input")?;
            match input.ty() {
                ValueType::Array(_) | ValueType::Json => {}
                _ => {
                    return Err(TrancheError::NotImplemented {
                        node_id: node.id(),
                        kind: format!("{} over {}", node.kind(), input.ty()),
                    });
                }
            }

            let node_id = node.id();
            let slot = ctx.alloc_value(node, "output", ValueType::Int);
            ctx.emit(Box::new(move |state| {
                let value = input.read(state)?;
                let len = match value.as_array() {
                    Some(items) => i64::try_from(items.len()).with_node(node_id)?,
                    None if value.is_null() => 0,
                    None => {
                        return Err(TrancheError::InvalidValue {
                            node_id,
                            cause: "count input is not an array".to_string(),
                        });
                    }
                };
                state.store(slot, Value::int(len));
                Ok(())
            }));
            Ok(())
        })
    }

    fn emit_output_json(&self, node: &Node, ctx: &Codegen, field: &str) -> Result<JsonFn> {
        ctx.bound_json(node, field)
    }
}

#[cfg(test)]
mod tests {
    use crate::testutil::{GraphBuilder, run, services};
    use serde_json::json;
    use tranche_core::node::NodeKind;

    #[tokio::test]
    async fn counts_constant_array() {
        let nodes = GraphBuilder::new()
            .node(NodeKind::Count, json!({"input": [1, 2, 3]}), &[], &[(1, "output")])
            .build();
        let (_, out) = run(nodes, services()).await.unwrap();
        assert_eq!(out, r#"{"id":1,"c":3}"#);
    }

    #[tokio::test]
    async fn empty_array_counts_zero() {
        let nodes = GraphBuilder::new()
            .node(NodeKind::Count, json!({"input": []}), &[], &[(1, "output")])
            .build();
        let (_, out) = run(nodes, services()).await.unwrap();
        assert_eq!(out, r#"{"id":1,"c":0}"#);
    }

    #[tokio::test]
    async fn string_input_is_not_implemented() {
        let nodes = GraphBuilder::new()
            .node(NodeKind::Count, json!({"input": "abc"}), &[], &[])
            .build();
        let err = run(nodes, services()).await.unwrap_err();
        assert_eq!(err.code(), "E203");
    }

    #[tokio::test]
    async fn missing_input() {
        let nodes = GraphBuilder::new()
            .node(NodeKind::Count, json!({}), &[], &[])
            .build();
        let err = run(nodes, services()).await.unwrap_err();
        assert_eq!(err.code(), "E205");
    }
}
