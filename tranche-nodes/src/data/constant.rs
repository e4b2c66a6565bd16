//! Constant node (literal holder).
//!
//! Constants never execute. The graph loader folds every link to a constant
//! into the consumer's constant data using [`ConstantInstruction::literal`].

use tranche_core::codegen::Codegen;
use tranche_core::error::TrancheError;
use tranche_core::flow::NodeDefinition;
use tranche_core::node::Node;
use tranche_core::traits::{CompileFuture, Instruction};
use tranche_core::value::Value;

/// Constant node - a literal inlined into its consumers.
///
/// # Example Configuration
/// ```json
/// { "type": "Constant", "data": { "value": 5 } }
/// ```
#[derive(Debug, Default, Clone, Copy)]
pub struct ConstantInstruction;

impl ConstantInstruction {
    /// The literal a link to `field` of this definition folds to.
    ///
    /// A constant holding `field` itself provides that value; any other
    /// field resolves to the `value` entry.
    pub fn literal<'a>(definition: &'a NodeDefinition, field: &str) -> Option<&'a Value> {
        definition
            .data
            .get(field)
            .or_else(|| definition.data.get("value"))
    }
}

impl Instruction for ConstantInstruction {
    fn compile<'a>(&'a self, node: &'a Node, _ctx: &'a mut Codegen) -> CompileFuture<'a> {
        Box::pin(async move {
            Err(TrancheError::NotExecutable {
                node_id: node.id(),
                kind: node.kind().to_string(),
            })
        })
    }
}
