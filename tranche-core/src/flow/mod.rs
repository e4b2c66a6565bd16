//! Input description types.
//!
//! A graph description is a node list where each node has a kind tag,
//! constant data, links to other nodes' outputs and requested data-map
//! outputs. Exactly one node is flagged as the root.

mod definition;
mod node;

pub use definition::GraphDefinition;
pub use node::{DataMapEntry, LinkDefinition, NodeDefinition};
