//! Error types for tranche.
//!
//! Every error carries a stable code. Description errors (E1xx) come from
//! parsing and wiring a graph, compile errors (E2xx) abort the whole compiled
//! program, and runtime errors (E3xx) are reported by a single run.

use crate::types::NodeId;
use thiserror::Error;

/// The main error type for tranche operations.
#[derive(Error, Debug)]
pub enum TrancheError {
    // =========================================================================
    // Description Errors (E100-E199)
    // =========================================================================
    /// The graph description could not be parsed.
    #[error("E100: Failed to parse graph description: {cause}")]
    Parse {
        /// Reason for the parse failure.
        cause: String,
    },

    /// A node carries a type tag outside the instruction set.
    #[error("E101: Unknown node type '{tag}' at index {index}")]
    UnknownNodeKind {
        /// The unrecognized tag.
        tag: String,
        /// 1-based position of the node in the description.
        index: usize,
    },

    /// A link refers to a node index past the end of the description.
    #[error("E102: Link '{field}' on node {index} targets index {target}, but the graph has {len} nodes")]
    LinkOutOfRange {
        /// 1-based position of the consuming node.
        index: usize,
        /// The consuming field.
        field: String,
        /// The out-of-range source index.
        target: usize,
        /// Number of nodes in the description.
        len: usize,
    },

    /// The description does not flag exactly one root.
    #[error("E103: Graph must flag exactly one root node, found {found}")]
    RootCount {
        /// Number of flagged roots.
        found: usize,
    },

    /// A constant node has no literal for the linked field.
    #[error("E104: Constant node {index} has no literal for field '{field}'")]
    InvalidConstant {
        /// 1-based position of the constant node.
        index: usize,
        /// The field that was linked.
        field: String,
    },

    /// Links form a cycle.
    #[error("E105: Link cycle detected through node {index}")]
    CyclicLink {
        /// 1-based position of a node on the cycle.
        index: usize,
    },

    // =========================================================================
    // Compile Errors (E200-E299)
    // =========================================================================
    /// A node kind lacks a requested capability.
    #[error("E200: {kind} node {node_id} does not support {operation} of field '{field}'")]
    Unsupported {
        /// The node that was asked.
        node_id: NodeId,
        /// The node's kind tag.
        kind: String,
        /// The capability that was requested.
        operation: &'static str,
        /// The requested field.
        field: String,
    },

    /// The catalog does not know an entity type.
    #[error("E201: Unknown entity type '{type_name}'")]
    UnknownEntityType {
        /// The unknown type name.
        type_name: String,
    },

    /// Comparator operands cannot be compared.
    #[error("E202: Node {node_id} cannot compare {left} with {right} using '{operator}'")]
    OperandTypeMismatch {
        /// The comparator node.
        node_id: NodeId,
        /// The comparison operator.
        operator: String,
        /// Type of the left operand.
        left: String,
        /// Type of the right operand.
        right: String,
    },

    /// The node kind is routed but has no compiled form yet.
    #[error("E203: {kind} node {node_id} is not supported yet")]
    NotImplemented {
        /// The node that was compiled.
        node_id: NodeId,
        /// The node's kind tag.
        kind: String,
    },

    /// A node was compiled twice.
    #[error("E204: Node {node_id} was already compiled")]
    AlreadyCompiled {
        /// The node compiled twice.
        node_id: NodeId,
    },

    /// A required input has neither a link nor a constant.
    #[error("E205: Node {node_id} is missing required input '{field}'")]
    MissingInput {
        /// The consuming node.
        node_id: NodeId,
        /// The missing input field.
        field: String,
    },

    /// Constant data on a node is malformed.
    #[error("E206: Node {node_id} has invalid '{field}': {cause}")]
    NodeConfig {
        /// The misconfigured node.
        node_id: NodeId,
        /// The offending field.
        field: String,
        /// What is wrong with it.
        cause: String,
    },

    /// A structural node kind reached compilation.
    #[error("E207: {kind} node {node_id} cannot be compiled directly")]
    NotExecutable {
        /// The node that was compiled.
        node_id: NodeId,
        /// The node's kind tag.
        kind: String,
    },

    /// A node id does not belong to the loader.
    #[error("E208: Node {node_id} is not registered")]
    NodeNotFound {
        /// The unknown id.
        node_id: NodeId,
    },

    /// The tranche levels are not dense.
    #[error("E209: Invalid topology: {cause}")]
    InvalidTopology {
        /// Description of the problem.
        cause: String,
    },

    // =========================================================================
    // Runtime Errors (E300-E399)
    // =========================================================================
    /// The data-access layer failed.
    #[error("E301: Failed to fetch '{type_name}': {cause}")]
    Fetch {
        /// The entity type being fetched.
        type_name: String,
        /// Reason for the failure.
        cause: String,
    },

    /// A runtime value has the wrong shape.
    #[error("E302: Invalid value in node {node_id}: {cause}")]
    InvalidValue {
        /// The node that read the value.
        node_id: NodeId,
        /// Description of the problem.
        cause: String,
    },

    /// JSON serialization failed.
    #[error("E303: Serialization failed: {0}")]
    Serialization(String),

    /// Pending work was started outside an async runtime.
    #[error("E304: No async runtime is available to drive pending work")]
    NoRuntime,

    /// Pending work was dropped by its runtime before it completed.
    #[error("E305: Pending work was cancelled before it completed")]
    Cancelled,
}

impl TrancheError {
    /// Get the error code (e.g., "E101").
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Parse { .. } => "E100",
            Self::UnknownNodeKind { .. } => "E101",
            Self::LinkOutOfRange { .. } => "E102",
            Self::RootCount { .. } => "E103",
            Self::InvalidConstant { .. } => "E104",
            Self::CyclicLink { .. } => "E105",
            Self::Unsupported { .. } => "E200",
            Self::UnknownEntityType { .. } => "E201",
            Self::OperandTypeMismatch { .. } => "E202",
            Self::NotImplemented { .. } => "E203",
            Self::AlreadyCompiled { .. } => "E204",
            Self::MissingInput { .. } => "E205",
            Self::NodeConfig { .. } => "E206",
            Self::NotExecutable { .. } => "E207",
            Self::NodeNotFound { .. } => "E208",
            Self::InvalidTopology { .. } => "E209",
            Self::Fetch { .. } => "E301",
            Self::InvalidValue { .. } => "E302",
            Self::Serialization(_) => "E303",
            Self::NoRuntime => "E304",
            Self::Cancelled => "E305",
        }
    }

    /// Check if this error aborts compilation of a program.
    #[must_use]
    pub fn is_compile_error(&self) -> bool {
        self.code().starts_with("E2")
    }

    /// Check if this error was raised while a run was executing.
    #[must_use]
    pub fn is_runtime_error(&self) -> bool {
        self.code().starts_with("E3")
    }

    /// Build a fetch error for an entity type.
    pub fn fetch(type_name: impl Into<String>, cause: impl std::fmt::Display) -> Self {
        Self::Fetch {
            type_name: type_name.into(),
            cause: cause.to_string(),
        }
    }
}

impl From<serde_json::Error> for TrancheError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

/// Result type alias using `TrancheError`.
pub type Result<T> = std::result::Result<T, TrancheError>;

/// Extension trait for adding node context to foreign errors.
pub trait ResultExt<T> {
    /// Wrap the error as an invalid runtime value of `node_id`.
    fn with_node(self, node_id: NodeId) -> Result<T>;
}

impl<T, E: std::fmt::Display> ResultExt<T> for std::result::Result<T, E> {
    fn with_node(self, node_id: NodeId) -> Result<T> {
        self.map_err(|e| TrancheError::InvalidValue {
            node_id,
            cause: e.to_string(),
        })
    }
}
