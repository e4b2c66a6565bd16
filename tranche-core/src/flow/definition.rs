//! Graph definition - the top-level input document.

use super::NodeDefinition;
use crate::error::{Result, TrancheError};
use serde::{Deserialize, Serialize};

/// A complete graph description.
///
/// Nodes are addressed by their 1-based position in `nodes`; a link with
/// node index `0` means "no link".
///
/// # Example
///
/// ```json
/// { "nodes": [
///   { "type": "Content", "root": true,
///     "data": { "type": "Article" },
///     "links": { "id": { "node": 2 } },
///     "outputs": [ { "id": 17, "field": "output" } ] },
///   { "type": "Constant", "data": { "value": 5 } } ] }
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphDefinition {
    /// Nodes in declaration order.
    #[serde(default)]
    pub nodes: Vec<NodeDefinition>,
}

impl GraphDefinition {
    /// Create an empty graph definition.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a node and return its 1-based index.
    pub fn push(&mut self, node: NodeDefinition) -> usize {
        self.nodes.push(node);
        self.nodes.len()
    }

    /// Add a node (builder form).
    pub fn with_node(mut self, node: NodeDefinition) -> Self {
        self.nodes.push(node);
        self
    }

    /// Parse a graph definition from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| TrancheError::Parse {
            cause: e.to_string(),
        })
    }

    /// Parse a graph definition from YAML.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(|e| TrancheError::Parse {
            cause: e.to_string(),
        })
    }

    /// Get a node by its 1-based index.
    pub fn node(&self, index: usize) -> Option<&NodeDefinition> {
        index.checked_sub(1).and_then(|i| self.nodes.get(i))
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if the graph has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
