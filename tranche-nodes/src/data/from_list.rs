//! FromList node (array element).

use tranche_core::codegen::{Codegen, JsonFn};
use tranche_core::error::{Result, TrancheError};
use tranche_core::node::Node;
use tranche_core::traits::{CompileFuture, Instruction};
use tranche_core::value::{Value, ValueType};

/// FromList node - stores the element of an array at an index.
///
/// # Inputs
/// - `input`: array (link or constant)
/// - `index`: `Int` (link or constant)
///
/// A null index, or one outside the array, stores `null`.
#[derive(Debug, Default, Clone, Copy)]
pub struct FromListInstruction;

impl Instruction for FromListInstruction {
    fn compile<'a>(&'a self, node: &'a Node, ctx: &'a mut Codegen) -> CompileFuture<'a> {
        Box::pin(async move {
            let input = ctx.require_input(node, "input")?;
            let element = match input.ty() {
                ValueType::Array(elem) => (**elem).clone(),
                ValueType::Json => ValueType::Json,
                other => {
                    return Err(TrancheError::NotImplemented {
                        node_id: node.id(),
                        kind: format!("{} over {}", node.kind(), other),
                    });
                }
            };

            let index = ctx.require_input(node, "index")?;
            if !matches!(index.ty(), ValueType::Int | ValueType::Json) {
                return Err(node.config_error("index", format!("expected Int, found {}", index.ty())));
            }

            let node_id = node.id();
            let slot = ctx.alloc_value(node, "output", element);
            ctx.emit(Box::new(move |state| {
                let list = input.read(state)?;
                let position = index.read(state)?;
                let position = match position.as_i64() {
                    Some(i) => i,
                    None if position.is_null() => {
                        state.store(slot, Value::null());
                        return Ok(());
                    }
                    None => {
                        return Err(TrancheError::InvalidValue {
                            node_id,
                            cause: format!("index {} is not an integer", position.string_form()),
                        });
                    }
                };
                let item = usize::try_from(position)
                    .ok()
                    .and_then(|i| list.as_array().and_then(|items| items.get(i)))
                    .cloned()
                    .map(Value)
                    .unwrap_or_default();
                state.store(slot, item);
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
    async fn picks_element() {
        let nodes = GraphBuilder::new()
            .node(
                NodeKind::FromList,
                json!({"input": ["a", "b", "c"], "index": 1}),
                &[],
                &[(4, "output")],
            )
            .build();
        let (_, out) = run(nodes, services()).await.unwrap();
        assert_eq!(out, r#"{"id":4,"c":"b"}"#);
    }

    #[tokio::test]
    async fn out_of_bounds_is_null() {
        let nodes = GraphBuilder::new()
            .node(
                NodeKind::FromList,
                json!({"input": [1], "index": 7}),
                &[],
                &[(4, "output")],
            )
            .build();
        let (_, out) = run(nodes, services()).await.unwrap();
        assert_eq!(out, r#"{"id":4,"c":null}"#);
    }

    #[tokio::test]
    async fn missing_index_is_null() {
        let nodes = GraphBuilder::new()
            .node(NodeKind::Fields, json!({"input": {"a": 1}}), &[], &[])
            .node(
                NodeKind::FromList,
                json!({"input": ["a", "b"]}),
                &[("index", 0, "absent")],
                &[(1, "output")],
            )
            .build();
        let (_, out) = run(nodes, services()).await.unwrap();
        assert_eq!(out, r#"{"id":1,"c":null}"#);
    }

    #[tokio::test]
    async fn index_from_count() {
        let nodes = GraphBuilder::new()
            .node(NodeKind::Count, json!({"input": [0, 0]}), &[], &[])
            .node(
                NodeKind::FromList,
                json!({"input": [10, 20, 30]}),
                &[("index", 0, "output")],
                &[(1, "output")],
            )
            .build();
        let (_, out) = run(nodes, services()).await.unwrap();
        assert_eq!(out, r#"{"id":1,"c":30}"#);
    }
}
