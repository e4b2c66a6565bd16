//! Graph - parse and wire one description.
//!
//! Wiring turns description nodes into [`Node`]s and registers them with a
//! [`Loader`], dependencies first:
//! - links to index `0` are no link
//! - links to a Constant are folded into the consumer's constant data
//! - every other link resolves to the id the loader returned for its source
//! - only nodes reachable from the single flagged root are registered, and
//!   a Component root contributes its dependencies but not itself

use crate::loader::Loader;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;
use tranche_core::error::{Result, TrancheError};
use tranche_core::flow::GraphDefinition;
use tranche_core::node::{Link, Node, NodeKind};
use tranche_core::traits::Instruction;
use tranche_core::types::NodeId;
use tranche_core::value::Value;
use tranche_nodes::ConstantInstruction;

/// One wired graph.
///
/// Maps description indices to the ids registered in the loader. Indices of
/// deduplicated nodes map to the shared node.
#[derive(Debug, Clone)]
pub struct Graph {
    root: Option<NodeId>,
    root_kind: NodeKind,
    registered: BTreeMap<usize, NodeId>,
}

impl Graph {
    /// Wire `definition` into `loader`.
    pub fn load(definition: &GraphDefinition, loader: &mut Loader) -> Result<Self> {
        let kinds = classify(definition, loader)?;

        let roots: Vec<usize> = definition
            .nodes
            .iter()
            .enumerate()
            .filter(|(i, node)| node.root && kinds[*i].is_some())
            .map(|(i, _)| i + 1)
            .collect();
        let &[root_index] = roots.as_slice() else {
            return Err(TrancheError::RootCount { found: roots.len() });
        };

        let mut wiring = Wiring {
            definition,
            loader,
            kinds,
            visits: vec![Visit::New; definition.len()],
            registered: BTreeMap::new(),
        };
        let root_kind = wiring.kind(root_index).unwrap_or(NodeKind::Component);

        let root = if root_kind.is_presentation_root() {
            wiring.visits[root_index - 1] = Visit::Active;
            wiring.resolve(root_index)?;
            wiring.visits[root_index - 1] = Visit::Done(None);
            None
        } else {
            wiring.visit(root_index)?
        };

        debug!(
            nodes = definition.len(),
            registered = wiring.registered.len(),
            root_kind = %root_kind,
            "Wired graph"
        );
        Ok(Self {
            root,
            root_kind,
            registered: wiring.registered,
        })
    }

    /// Registered id of the root, `None` for a presentation root.
    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// Kind of the flagged root.
    pub fn root_kind(&self) -> NodeKind {
        self.root_kind
    }

    /// Registered id of the node at 1-based `index`.
    ///
    /// `None` for folded constants, skipped tags, unreachable nodes and a
    /// presentation root.
    pub fn node_id(&self, index: usize) -> Option<NodeId> {
        self.registered.get(&index).copied()
    }

    /// Registered ids by description index.
    pub fn registered(&self) -> impl Iterator<Item = (usize, NodeId)> + '_ {
        self.registered.iter().map(|(index, id)| (*index, *id))
    }
}

type Classified = Option<(NodeKind, Arc<dyn Instruction>)>;

/// Look up every tag in the loader's instruction set.
fn classify(definition: &GraphDefinition, loader: &Loader) -> Result<Vec<Classified>> {
    definition
        .nodes
        .iter()
        .enumerate()
        .map(|(i, node)| match loader.instructions().for_tag(&node.node_type) {
            Some(found) => Ok(Some(found)),
            None if loader.config().strict_kinds => Err(TrancheError::UnknownNodeKind {
                tag: node.node_type.clone(),
                index: i + 1,
            }),
            None => {
                debug!(tag = %node.node_type, index = i + 1, "Skipping unknown node type");
                Ok(None)
            }
        })
        .collect()
}

#[derive(Debug, Clone, Copy)]
enum Visit {
    New,
    Active,
    Done(Option<NodeId>),
}

struct Wiring<'a> {
    definition: &'a GraphDefinition,
    loader: &'a mut Loader,
    kinds: Vec<Classified>,
    visits: Vec<Visit>,
    registered: BTreeMap<usize, NodeId>,
}

impl Wiring<'_> {
    fn kind(&self, index: usize) -> Option<NodeKind> {
        self.kinds
            .get(index - 1)
            .and_then(|found| found.as_ref())
            .map(|(kind, _)| *kind)
    }

    /// Register the node at `index` after its dependencies.
    fn visit(&mut self, index: usize) -> Result<Option<NodeId>> {
        match self.visits[index - 1] {
            Visit::Done(id) => return Ok(id),
            Visit::Active => return Err(TrancheError::CyclicLink { index }),
            Visit::New => {}
        }
        let Some((kind, instruction)) = self.kinds[index - 1].clone() else {
            self.visits[index - 1] = Visit::Done(None);
            return Ok(None);
        };

        self.visits[index - 1] = Visit::Active;
        let (data, links) = self.resolve(index)?;
        let graph = self.definition;
        let definition = &graph.nodes[index - 1];
        let node = Node::new(kind, instruction, data, links, definition.outputs.clone());
        let id = self.loader.add(node)?;

        self.visits[index - 1] = Visit::Done(Some(id));
        self.registered.insert(index, id);
        Ok(Some(id))
    }

    /// Constant data and dynamic links of the node at `index`, registering
    /// linked sources on the way.
    fn resolve(&mut self, index: usize) -> Result<(BTreeMap<String, Value>, BTreeMap<String, Link>)> {
        let graph = self.definition;
        let definition = &graph.nodes[index - 1];
        let mut data = definition.data.clone();
        let mut links = BTreeMap::new();

        for (field, link) in &definition.links {
            let target = link.node;
            if target == 0 {
                continue;
            }
            if target > graph.len() {
                if self.loader.config().strict_links {
                    return Err(TrancheError::LinkOutOfRange {
                        index,
                        field: field.clone(),
                        target,
                        len: graph.len(),
                    });
                }
                debug!(index, field = %field, target, "Dropping out-of-range link");
                continue;
            }

            match self.kind(target) {
                None => continue,
                Some(NodeKind::Constant) => {
                    let source = &graph.nodes[target - 1];
                    let literal = ConstantInstruction::literal(source, &link.field).ok_or_else(
                        || TrancheError::InvalidConstant {
                            index: target,
                            field: link.field.clone(),
                        },
                    )?;
                    data.insert(field.clone(), literal.clone());
                }
                Some(_) => {
                    if let Some(source) = self.visit(target)? {
                        links.insert(field.clone(), Link::new(source, link.field.clone()));
                    }
                }
            }
        }
        Ok((data, links))
    }
}
