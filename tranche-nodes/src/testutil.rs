//! Graph building and running helpers for instruction tests.

use crate::registry::InstructionSet;
use std::collections::BTreeMap;
use std::sync::Arc;
use tranche_core::codegen::{Codegen, ExecFn, JsonFn};
use tranche_core::error::Result;
use tranche_core::flow::DataMapEntry;
use tranche_core::node::{Consumer, Link, Node, NodeKind};
use tranche_core::run_state::{BufferPool, RunRequest, RunState};
use tranche_core::testing::{EntitySchema, MemoryStore, StaticCatalog};
use tranche_core::traits::Services;
use tranche_core::types::NodeId;
use tranche_core::value::{Value, ValueType};

/// Builds registered nodes directly, bypassing the graph loader.
///
/// Link sources are positions of earlier `node` calls; a node's order is one
/// more than its deepest source.
pub struct GraphBuilder {
    instructions: InstructionSet,
    nodes: Vec<Node>,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self {
            instructions: InstructionSet::standard(),
            nodes: Vec::new(),
        }
    }

    pub fn node(
        mut self,
        kind: NodeKind,
        data: serde_json::Value,
        links: &[(&str, usize, &str)],
        outputs: &[(i64, &str)],
    ) -> Self {
        let data: BTreeMap<String, Value> = match data {
            serde_json::Value::Object(map) => map.into_iter().map(|(k, v)| (k, Value(v))).collect(),
            _ => BTreeMap::new(),
        };
        let links: BTreeMap<String, Link> = links
            .iter()
            .map(|(field, source, source_field)| {
                (field.to_string(), Link::new(NodeId::new(*source as u32), *source_field))
            })
            .collect();
        let order = 1 + links
            .values()
            .map(|link| self.nodes[link.source.index()].order())
            .max()
            .unwrap_or(0);
        let outputs = outputs
            .iter()
            .map(|(id, field)| DataMapEntry::new(*id, *field))
            .collect();

        let id = NodeId::new(self.nodes.len() as u32);
        for (field, link) in &links {
            self.nodes[link.source.index()].add_consumer(Consumer {
                node: id,
                field: field.clone(),
                source_field: link.field.clone(),
            });
        }

        let instruction = self.instructions.get(kind).unwrap();
        let mut node = Node::new(kind, instruction, data, links, outputs);
        node.assign(id, order);
        self.nodes.push(node);
        self
    }

    pub fn build(self) -> Vec<Arc<Node>> {
        self.nodes.into_iter().map(Arc::new).collect()
    }
}

pub fn services() -> Services {
    Services::new(Arc::new(StaticCatalog::new()), Arc::new(MemoryStore::new()))
}

pub fn article_store() -> MemoryStore {
    MemoryStore::new()
        .with_entity("Article", serde_json::json!({"id": 5, "title": "Hello", "words": 120}))
        .with_entity(
            "Article",
            serde_json::json!({"id": 6, "title": "Tagged", "tags": [1, 2], "author": 3}),
        )
        .with_entity("Tag", serde_json::json!({"id": 1, "name": "rust"}))
        .with_entity("Tag", serde_json::json!({"id": 2, "name": "graphs"}))
        .with_entity("Author", serde_json::json!({"id": 3, "name": "Ada"}))
}

pub fn article_catalog() -> StaticCatalog {
    StaticCatalog::new()
        .with_type(
            EntitySchema::new("Article")
                .with_field("title", ValueType::String)
                .with_field("words", ValueType::Int)
                .with_relation("tags", "Tag", true)
                .with_relation("author", "Author", false)
                .with_virtual("slug", ValueType::String, |entity, _| {
                    let id = entity.get_field("id").unwrap_or_default();
                    Value::string(format!("article-{}", id.string_form()))
                }),
        )
        .with_type(EntitySchema::new("Tag").with_field("name", ValueType::String))
        .with_type(EntitySchema::new("Author").with_field("name", ValueType::String))
}

pub fn services_with(store: MemoryStore) -> Services {
    Services::new(Arc::new(article_catalog()), Arc::new(store))
}

pub fn article_services() -> Services {
    services_with(article_store())
}

pub async fn run(nodes: Vec<Arc<Node>>, services: Services) -> Result<(Arc<RunState>, String)> {
    run_with(nodes, services, RunRequest::default()).await
}

/// Compile `nodes` tranche by tranche and run them once.
///
/// Leaves writer buffers in place so tests can check cleanup.
pub async fn run_with(
    nodes: Vec<Arc<Node>>,
    services: Services,
    request: RunRequest,
) -> Result<(Arc<RunState>, String)> {
    let max_order = nodes.iter().map(|node| node.order()).max().unwrap_or(0);
    let mut ctx = Codegen::new(nodes.clone(), services);
    let mut tranches: Vec<(Vec<ExecFn>, Vec<JsonFn>)> = Vec::new();
    for order in 1..=max_order {
        let ids: Vec<NodeId> = nodes
            .iter()
            .filter(|node| node.order() == order)
            .map(|node| node.id())
            .collect();
        for id in &ids {
            ctx.compile_node(*id).await?;
        }
        for id in &ids {
            ctx.compile_output(*id)?;
        }
        tranches.push(ctx.take_emitted());
    }

    let layout = ctx.finish();
    let mut state = RunState::new(&layout, Arc::new(BufferPool::new(8, 64)));
    state.reset(request);
    let state = Arc::new(state);

    for (execute, _) in &tranches {
        for step in execute {
            step(&state)?;
        }
        state.completed().await;
        if let Some(err) = state.take_failure() {
            return Err(err);
        }
    }

    let mut out = Vec::new();
    for (_, output) in &tranches {
        for json in output {
            json(&state, &mut out)?;
        }
    }
    Ok((state, String::from_utf8(out).unwrap()))
}
