//! Loader - dedup, ordering and the codegen driver.

use super::config::LoaderConfig;
use crate::graph::Graph;
use crate::scheduler::{Program, ProgramConfig, Tranche};
use std::sync::Arc;
use tracing::{debug, info, trace};
use tranche_core::codegen::Codegen;
use tranche_core::error::{Result, TrancheError};
use tranche_core::flow::GraphDefinition;
use tranche_core::node::{Consumer, Node};
use tranche_core::traits::Services;
use tranche_core::types::NodeId;
use tranche_nodes::InstructionSet;

/// Registry of the deduplicated nodes of every graph compiled together.
#[derive(Debug)]
pub struct Loader {
    config: LoaderConfig,
    instructions: InstructionSet,
    nodes: Vec<Node>,
}

impl Default for Loader {
    fn default() -> Self {
        Self::new(LoaderConfig::default())
    }
}

impl Loader {
    /// Create an empty loader over the standard instruction set.
    pub fn new(config: LoaderConfig) -> Self {
        Self::with_instructions(config, InstructionSet::standard())
    }

    /// Create an empty loader over a custom instruction set.
    pub fn with_instructions(config: LoaderConfig, instructions: InstructionSet) -> Self {
        Self {
            config,
            instructions,
            nodes: Vec::new(),
        }
    }

    /// The loader configuration.
    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// The tag → instruction table.
    pub fn instructions(&self) -> &InstructionSet {
        &self.instructions
    }

    /// Register a node and return its id.
    ///
    /// The node's links must point at nodes already registered here. If an
    /// equal node is registered, its id is returned instead and the
    /// newcomer's data-map entries are appended to it; callers must use the
    /// returned id from then on.
    pub fn add(&mut self, mut node: Node) -> Result<NodeId> {
        let mut order = 1;
        for link in node.links().values() {
            let source = self
                .nodes
                .get(link.source.index())
                .ok_or(TrancheError::NodeNotFound {
                    node_id: link.source,
                })?;
            order = order.max(source.order() + 1);
        }

        if self.config.dedup {
            if let Some(existing) = self.nodes.iter_mut().find(|existing| existing.is_same(&node)) {
                trace!(node_id = %existing.id(), kind = %existing.kind(), "Merged duplicate node");
                existing.merge_outputs(node.outputs().to_vec());
                return Ok(existing.id());
            }
        }

        let id = NodeId::new(self.nodes.len() as u32);
        node.assign(id, order);
        for (field, link) in node.links() {
            if let Some(source) = self.nodes.get_mut(link.source.index()) {
                source.add_consumer(Consumer {
                    node: id,
                    field: field.clone(),
                    source_field: link.field.clone(),
                });
            }
        }
        trace!(node_id = %id, kind = %node.kind(), order, "Registered node");
        self.nodes.push(node);
        Ok(id)
    }

    /// Parse and wire one graph description into this loader.
    pub fn load_graph(&mut self, definition: &GraphDefinition) -> Result<Graph> {
        Graph::load(definition, self)
    }

    /// A registered node.
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    /// All registered nodes, by id.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Number of registered nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Nodes reading fields of `id`.
    pub fn consumers(&self, id: NodeId) -> &[Consumer] {
        self.node(id).map(Node::consumers).unwrap_or_default()
    }

    /// Group registered nodes by order.
    ///
    /// Tranche `i` holds the nodes of order `i + 1` in registration order.
    /// Every order up to the deepest must be populated.
    pub fn create_tranches(&self) -> Result<Vec<Tranche>> {
        let depth = self.nodes.iter().map(Node::order).max().unwrap_or(0);
        let mut tranches: Vec<Tranche> = (1..=depth).map(Tranche::new).collect();
        for node in &self.nodes {
            match (node.order() as usize).checked_sub(1).and_then(|i| tranches.get_mut(i)) {
                Some(tranche) => tranche.push(node.id()),
                None => {
                    return Err(TrancheError::InvalidTopology {
                        cause: format!("{} has order {}", node.id(), node.order()),
                    });
                }
            }
        }
        if let Some(empty) = tranches.iter().find(|tranche| tranche.is_empty()) {
            return Err(TrancheError::InvalidTopology {
                cause: format!("no node has order {}", empty.order()),
            });
        }
        Ok(tranches)
    }

    /// Compile every registered node into a program.
    ///
    /// Any compile error aborts the whole program.
    pub async fn compile(self, services: Services, config: ProgramConfig) -> Result<Program> {
        let tranches = self.create_tranches()?;
        debug!(nodes = self.nodes.len(), tranches = tranches.len(), "Compiling program");

        let nodes: Vec<Arc<Node>> = self.nodes.into_iter().map(Arc::new).collect();
        let node_count = nodes.len();
        let mut ctx = Codegen::new(nodes, services);
        let mut compiled = Vec::with_capacity(tranches.len());
        for tranche in &tranches {
            compiled.push(tranche.compile(&mut ctx).await?);
        }
        let layout = ctx.finish();

        info!(
            nodes = node_count,
            tranches = compiled.len(),
            value_slots = layout.value_count(),
            writer_slots = layout.writer_count(),
            "Program compiled"
        );
        Ok(Program::new(compiled, layout, config))
    }
}
