//! Node definition from the input description.

use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

fn default_field() -> String {
    "output".to_string()
}

/// A raw node record.
///
/// Parsed once and never mutated afterwards; the executor turns it into a
/// compile-time node while wiring the graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeDefinition {
    /// Kind tag, e.g. `Content` or `If`.
    #[serde(rename = "type")]
    pub node_type: String,

    /// Whether this node is the graph's root.
    #[serde(default)]
    pub root: bool,

    /// Constant inputs.
    #[serde(default)]
    pub data: BTreeMap<String, Value>,

    /// Dynamic inputs, keyed by consuming field.
    #[serde(default)]
    pub links: BTreeMap<String, LinkDefinition>,

    /// Final JSON outputs requested by the presentation layer.
    #[serde(default)]
    pub outputs: Vec<DataMapEntry>,
}

impl NodeDefinition {
    /// Create a node definition with the given kind tag.
    pub fn new(node_type: impl Into<String>) -> Self {
        Self {
            node_type: node_type.into(),
            root: false,
            data: BTreeMap::new(),
            links: BTreeMap::new(),
            outputs: Vec::new(),
        }
    }

    /// Set a constant input.
    pub fn with_data(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.data.insert(field.into(), value.into());
        self
    }

    /// Link `field` to the `output` of the node at `node` (1-based).
    pub fn with_link(self, field: impl Into<String>, node: usize) -> Self {
        self.with_link_field(field, node, "output")
    }

    /// Link `field` to `source_field` of the node at `node` (1-based).
    pub fn with_link_field(
        mut self,
        field: impl Into<String>,
        node: usize,
        source_field: impl Into<String>,
    ) -> Self {
        self.links.insert(
            field.into(),
            LinkDefinition {
                node,
                field: source_field.into(),
            },
        );
        self
    }

    /// Request `field` as data-map output with the caller id `id`.
    pub fn with_output(mut self, id: i64, field: impl Into<String>) -> Self {
        self.outputs.push(DataMapEntry {
            id,
            field: field.into(),
        });
        self
    }

    /// Flag this node as the graph root.
    pub fn as_root(mut self) -> Self {
        self.root = true;
        self
    }
}

/// Reference to another node's output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkDefinition {
    /// 1-based source index, `0` for no link.
    pub node: usize,

    /// Source field.
    #[serde(default = "default_field")]
    pub field: String,
}

/// A requested final output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataMapEntry {
    /// Caller-assigned id written as `"id"`.
    pub id: i64,

    /// Field of the node to serialize.
    #[serde(default = "default_field")]
    pub field: String,
}

impl DataMapEntry {
    /// Create a data-map entry.
    pub fn new(id: i64, field: impl Into<String>) -> Self {
        Self {
            id,
            field: field.into(),
        }
    }
}
