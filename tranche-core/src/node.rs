//! Compile-time nodes.
//!
//! A [`Node`] is one instruction of the dataflow graph after its links have
//! been resolved to registered source nodes. Its structural identity (kind,
//! constant data, resolved links) is what the loader deduplicates on.

use crate::error::TrancheError;
use crate::flow::DataMapEntry;
use crate::traits::Instruction;
use crate::types::NodeId;
use crate::value::Value;
use std::collections::BTreeMap;
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// The closed set of node kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NodeKind {
    /// Presentation root; never compiled.
    Component,
    /// Literal holder; folded into consumers.
    Constant,
    /// Loads one entity.
    Content,
    /// Loads a filtered list of entities.
    ContentList,
    /// Length of an array.
    Count,
    /// Field projection of a whole object.
    Fields,
    /// Element of an array at an index.
    FromList,
    /// Comparison of two operands.
    If,
    /// Iteration placeholder.
    Loop,
    /// Tokenizer placeholder.
    Tokens,
    /// List builder placeholder.
    ToList,
}

impl NodeKind {
    /// Every kind, in tag order.
    pub const ALL: [NodeKind; 11] = [
        Self::Component,
        Self::Constant,
        Self::Content,
        Self::ContentList,
        Self::Count,
        Self::Fields,
        Self::FromList,
        Self::If,
        Self::Loop,
        Self::Tokens,
        Self::ToList,
    ];

    /// Look up a kind by its description tag.
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.tag() == tag)
    }

    /// The description tag of this kind.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Component => "Component",
            Self::Constant => "Constant",
            Self::Content => "Content",
            Self::ContentList => "ContentList",
            Self::Count => "Count",
            Self::Fields => "Fields",
            Self::FromList => "FromList",
            Self::If => "If",
            Self::Loop => "Loop",
            Self::Tokens => "Tokens",
            Self::ToList => "ToList",
        }
    }

    /// Whether a root of this kind is left out of the loader.
    pub fn is_presentation_root(&self) -> bool {
        matches!(self, Self::Component)
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// A resolved dynamic input.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Link {
    /// The registered node producing the value.
    pub source: NodeId,
    /// Field of the source node.
    pub field: String,
}

impl Link {
    /// Create a link to `field` of `source`.
    pub fn new(source: NodeId, field: impl Into<String>) -> Self {
        Self {
            source,
            field: field.into(),
        }
    }
}

/// An entry of a node's reverse-link index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Consumer {
    /// The consuming node.
    pub node: NodeId,
    /// The consuming field.
    pub field: String,
    /// The field of this node being read.
    pub source_field: String,
}

/// A node of the compiled graph.
#[derive(Clone)]
pub struct Node {
    id: NodeId,
    order: u32,
    kind: NodeKind,
    data: BTreeMap<String, Value>,
    links: BTreeMap<String, Link>,
    outputs: Vec<DataMapEntry>,
    consumers: Vec<Consumer>,
    identity: u64,
    instruction: Arc<dyn Instruction>,
}

impl Node {
    /// Create an unregistered node.
    ///
    /// Link sources must already be registered ids of the loader this node
    /// will be added to.
    pub fn new(
        kind: NodeKind,
        instruction: Arc<dyn Instruction>,
        data: BTreeMap<String, Value>,
        links: BTreeMap<String, Link>,
        outputs: Vec<DataMapEntry>,
    ) -> Self {
        let identity = identity_hash(kind, &data, &links);
        Self {
            id: NodeId::new(0),
            order: 0,
            kind,
            data,
            links,
            outputs,
            consumers: Vec::new(),
            identity,
            instruction,
        }
    }

    /// Record the id and order assigned at registration.
    pub fn assign(&mut self, id: NodeId, order: u32) {
        self.id = id;
        self.order = order;
    }

    /// Append data-map entries of an equal node merged into this one.
    pub fn merge_outputs(&mut self, outputs: impl IntoIterator<Item = DataMapEntry>) {
        for entry in outputs {
            if !self.outputs.contains(&entry) {
                self.outputs.push(entry);
            }
        }
    }

    /// Record a consumer reading one of this node's fields.
    pub fn add_consumer(&mut self, consumer: Consumer) {
        self.consumers.push(consumer);
    }

    /// Structural equality used for dedup.
    pub fn is_same(&self, other: &Node) -> bool {
        self.identity == other.identity
            && self.kind == other.kind
            && self.links == other.links
            && self.data.len() == other.data.len()
            && self
                .data
                .iter()
                .zip(other.data.iter())
                .all(|((ka, va), (kb, vb))| ka == kb && va.string_form() == vb.string_form())
    }

    /// Registered id (zero until registered).
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Topological depth, `1` for nodes without links.
    pub fn order(&self) -> u32 {
        self.order
    }

    /// The node kind.
    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    /// Precomputed identity hash.
    pub fn identity(&self) -> u64 {
        self.identity
    }

    /// Constant input for `field`.
    pub fn data(&self, field: &str) -> Option<&Value> {
        self.data.get(field)
    }

    /// All constant inputs.
    pub fn data_map(&self) -> &BTreeMap<String, Value> {
        &self.data
    }

    /// Dynamic input for `field`.
    pub fn link(&self, field: &str) -> Option<&Link> {
        self.links.get(field)
    }

    /// All dynamic inputs.
    pub fn links(&self) -> &BTreeMap<String, Link> {
        &self.links
    }

    /// Requested data-map outputs.
    pub fn outputs(&self) -> &[DataMapEntry] {
        &self.outputs
    }

    /// Nodes reading this node's fields.
    pub fn consumers(&self) -> &[Consumer] {
        &self.consumers
    }

    /// The instruction implementing this node's kind.
    pub fn instruction(&self) -> &Arc<dyn Instruction> {
        &self.instruction
    }

    /// Error for a capability this node's kind lacks.
    pub fn unsupported(&self, operation: &'static str, field: &str) -> TrancheError {
        TrancheError::Unsupported {
            node_id: self.id,
            kind: self.kind.tag().to_string(),
            operation,
            field: field.to_string(),
        }
    }

    /// Error for malformed constant data.
    pub fn config_error(&self, field: &str, cause: impl fmt::Display) -> TrancheError {
        TrancheError::NodeConfig {
            node_id: self.id,
            field: field.to_string(),
            cause: cause.to_string(),
        }
    }

    /// Error for an input with neither link nor constant.
    pub fn missing_input(&self, field: &str) -> TrancheError {
        TrancheError::MissingInput {
            node_id: self.id,
            field: field.to_string(),
        }
    }

    /// Constant string data, or a config error.
    pub fn require_str(&self, field: &str) -> crate::error::Result<&str> {
        match self.data.get(field) {
            Some(value) => value
                .as_str()
                .ok_or_else(|| self.config_error(field, "expected a string")),
            None => Err(self.missing_input(field)),
        }
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("order", &self.order)
            .field("data", &self.data)
            .field("links", &self.links)
            .field("outputs", &self.outputs)
            .finish_non_exhaustive()
    }
}

fn identity_hash(kind: NodeKind, data: &BTreeMap<String, Value>, links: &BTreeMap<String, Link>) -> u64 {
    let mut hasher = DefaultHasher::new();
    kind.hash(&mut hasher);
    for (key, value) in data {
        key.hash(&mut hasher);
        value.string_form().hash(&mut hasher);
    }
    for (field, link) in links {
        field.hash(&mut hasher);
        link.hash(&mut hasher);
    }
    hasher.finish()
}
