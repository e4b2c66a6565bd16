//! Codegen context.
//!
//! Compilation turns every node into closures. Instructions ask the
//! [`Codegen`] context for readers of their inputs, allocate the run-state
//! slots they write, and emit compute and output closures. The loader drains
//! the emitted closures once per tranche and finally takes the synthesized
//! [`RunLayout`].

mod layout;
mod reader;

pub use layout::{Binding, RunLayout, SlotInfo};
pub use reader::{ExecFn, JsonFn, Reader};

use crate::error::{Result, TrancheError};
use crate::node::Node;
use crate::traits::{EntityStore, EntityType, Services};
use crate::types::{NodeId, SlotId, WriterSlotId};
use crate::value::ValueType;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::debug;

/// Compile-time state shared by all instructions of one program.
pub struct Codegen {
    nodes: Vec<Arc<Node>>,
    services: Services,
    values: Vec<SlotInfo>,
    writers: Vec<SlotInfo>,
    bindings: HashMap<(NodeId, String), Binding>,
    writer_bindings: HashMap<(NodeId, String), WriterSlotId>,
    compiled: HashSet<NodeId>,
    prepared: HashSet<String>,
    // Compile-time only: whether the next data-map entry is the run's first.
    first_output: bool,
    execute: Vec<ExecFn>,
    output: Vec<JsonFn>,
}

impl Codegen {
    /// Create a context over registered `nodes`, indexed by id.
    pub fn new(nodes: Vec<Arc<Node>>, services: Services) -> Self {
        Self {
            nodes,
            services,
            values: Vec::new(),
            writers: Vec::new(),
            bindings: HashMap::new(),
            writer_bindings: HashMap::new(),
            compiled: HashSet::new(),
            prepared: HashSet::new(),
            first_output: true,
            execute: Vec::new(),
            output: Vec::new(),
        }
    }

    /// A registered node.
    pub fn node(&self, id: NodeId) -> Result<&Arc<Node>> {
        self.nodes
            .get(id.index())
            .ok_or(TrancheError::NodeNotFound { node_id: id })
    }

    /// Compile one node. Fails if the node was compiled before.
    pub async fn compile_node(&mut self, id: NodeId) -> Result<()> {
        let node = Arc::clone(self.node(id)?);
        if !self.compiled.insert(id) {
            return Err(TrancheError::AlreadyCompiled { node_id: id });
        }
        debug!(node_id = %id, kind = %node.kind(), order = node.order(), "Compiling node");
        let instruction = Arc::clone(node.instruction());
        instruction.compile(&node, self).await
    }

    /// Emit the data-map output of one node.
    ///
    /// Each entry is written as `{"id":<id>,"c":<json>}`. Entries are joined
    /// by commas, except that the first entry compiled in this context, and
    /// therefore the first written by a run, has no leading comma.
    pub fn compile_output(&mut self, id: NodeId) -> Result<()> {
        let node = Arc::clone(self.node(id)?);
        for entry in node.outputs() {
            let json = node.instruction().emit_output_json(&node, self, &entry.field)?;
            let separator = if std::mem::replace(&mut self.first_output, false) {
                ""
            } else {
                ","
            };
            let prefix = format!("{}{{\"id\":{},\"c\":", separator, entry.id);
            self.output.push(Box::new(move |state, out| {
                out.extend_from_slice(prefix.as_bytes());
                json(state, out)?;
                out.push(b'}');
                Ok(())
            }));
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Inputs
    // ------------------------------------------------------------------

    /// Reader of `field`: the linked source output, else the folded
    /// constant, else `None`.
    pub fn read_input(&self, node: &Node, field: &str) -> Result<Option<Reader>> {
        if let Some(link) = node.link(field) {
            let source = self.node(link.source)?;
            return source
                .instruction()
                .emit_output_read(source, self, &link.field)
                .map(Some);
        }
        Ok(node.data(field).cloned().map(Reader::constant))
    }

    /// Reader of a required input.
    pub fn require_input(&self, node: &Node, field: &str) -> Result<Reader> {
        self.read_input(node, field)?
            .ok_or_else(|| node.missing_input(field))
    }

    /// Static type of an input, `None` when absent.
    pub fn input_type(&self, node: &Node, field: &str) -> Result<Option<ValueType>> {
        if let Some(link) = node.link(field) {
            let source = self.node(link.source)?;
            return source
                .instruction()
                .output_type(source, self, &link.field)
                .map(Some);
        }
        Ok(node.data(field).map(ValueType::of))
    }

    // ------------------------------------------------------------------
    // Layout
    // ------------------------------------------------------------------

    /// Allocate a value slot for `field` of `node`.
    pub fn alloc_value(&mut self, node: &Node, field: &str, ty: ValueType) -> SlotId {
        let slot = SlotId::new(self.values.len() as u32);
        self.values.push(SlotInfo::new(node.id(), field));
        self.bindings
            .insert((node.id(), field.to_string()), Binding { slot, ty });
        slot
    }

    /// Allocate a pool-backed writer slot for `field` of `node`.
    pub fn alloc_writer(&mut self, node: &Node, field: &str) -> WriterSlotId {
        let slot = WriterSlotId::new(self.writers.len() as u32);
        self.writers.push(SlotInfo::new(node.id(), field));
        self.writer_bindings.insert((node.id(), field.to_string()), slot);
        slot
    }

    /// The value slot bound to a field.
    pub fn binding(&self, node: NodeId, field: &str) -> Option<&Binding> {
        self.bindings.get(&(node, field.to_string()))
    }

    /// Reader of the value slot bound to a field.
    pub fn bound_reader(&self, node: NodeId, field: &str) -> Option<Reader> {
        self.binding(node, field)
            .map(|binding| Reader::slot(binding.slot, binding.ty.clone()))
    }

    /// JSON writer of the value slot bound to a field.
    pub fn bound_json(&self, node: &Node, field: &str) -> Result<JsonFn> {
        self.bound_reader(node.id(), field)
            .map(Reader::into_json)
            .ok_or_else(|| node.unsupported("json output", field))
    }

    /// The writer slot bound to a field.
    pub fn writer(&self, node: NodeId, field: &str) -> Option<WriterSlotId> {
        self.writer_bindings.get(&(node, field.to_string())).copied()
    }

    // ------------------------------------------------------------------
    // Collaborators
    // ------------------------------------------------------------------

    /// Resolve an entity type through the catalog.
    pub fn entity_type(&self, type_name: &str) -> Result<Arc<dyn EntityType>> {
        self.services
            .catalog
            .entity_type(type_name)
            .ok_or_else(|| TrancheError::UnknownEntityType {
                type_name: type_name.to_string(),
            })
    }

    /// The data-access layer.
    pub fn store(&self) -> Arc<dyn EntityStore> {
        Arc::clone(&self.services.store)
    }

    /// Run the store's one-off setup for an entity type.
    pub async fn prepare_store(&mut self, type_name: &str) -> Result<()> {
        if self.prepared.contains(type_name) {
            return Ok(());
        }
        self.services.store.prepare(type_name).resolve().await?;
        debug!(type_name, "Prepared entity store");
        self.prepared.insert(type_name.to_string());
        Ok(())
    }

    // ------------------------------------------------------------------
    // Emission
    // ------------------------------------------------------------------

    /// Append a compute step to the current tranche.
    pub fn emit(&mut self, step: ExecFn) {
        self.execute.push(step);
    }

    /// Drain the closures emitted since the last call.
    pub fn take_emitted(&mut self) -> (Vec<ExecFn>, Vec<JsonFn>) {
        (
            std::mem::take(&mut self.execute),
            std::mem::take(&mut self.output),
        )
    }

    /// Finish compilation and return the run-state layout.
    pub fn finish(self) -> RunLayout {
        RunLayout::new(self.values, self.writers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::DataMapEntry;
    use crate::node::NodeKind;
    use crate::run_state::{BufferPool, RunState};
    use crate::testing::{MemoryStore, NoopInstruction, StaticCatalog};
    use crate::value::Value;
    use std::collections::BTreeMap;

    fn literal(id: u32, value: i64, outputs: Vec<DataMapEntry>) -> Arc<Node> {
        let mut data = BTreeMap::new();
        data.insert("value".to_string(), Value::int(value));
        let mut node = Node::new(
            NodeKind::Count,
            Arc::new(NoopInstruction),
            data,
            BTreeMap::new(),
            outputs,
        );
        node.assign(NodeId::new(id), 1);
        Arc::new(node)
    }

    fn services() -> Services {
        Services::new(Arc::new(StaticCatalog::new()), Arc::new(MemoryStore::new()))
    }

    #[tokio::test]
    async fn compile_twice_fails() {
        let mut ctx = Codegen::new(vec![literal(0, 1, Vec::new())], services());
        ctx.compile_node(NodeId::new(0)).await.unwrap();
        let err = ctx.compile_node(NodeId::new(0)).await.unwrap_err();
        assert_eq!(err.code(), "E204");
    }

    #[test]
    fn unknown_node_is_reported() {
        let ctx = Codegen::new(Vec::new(), services());
        assert_eq!(ctx.node(NodeId::new(3)).unwrap_err().code(), "E208");
    }

    #[test]
    fn only_first_entry_is_unprefixed() {
        let nodes = vec![
            literal(0, 1, vec![DataMapEntry::new(10, "output"), DataMapEntry::new(11, "output")]),
            literal(1, 2, vec![DataMapEntry::new(12, "output")]),
        ];
        let mut ctx = Codegen::new(nodes, services());
        ctx.compile_output(NodeId::new(0)).unwrap();
        let (_, first) = ctx.take_emitted();
        ctx.compile_output(NodeId::new(1)).unwrap();
        let (_, second) = ctx.take_emitted();

        let layout = ctx.finish();
        let state = RunState::new(&layout, Arc::new(BufferPool::new(1, 16)));
        let mut out = Vec::new();
        for json in first.iter().chain(second.iter()) {
            json(&state, &mut out).unwrap();
        }
        assert_eq!(
            String::from_utf8(out).unwrap(),
            r#"{"id":10,"c":1},{"id":11,"c":1},{"id":12,"c":2}"#
        );
    }

    #[test]
    fn constant_inputs_read_as_literals() {
        let node = literal(0, 4, Vec::new());
        let ctx = Codegen::new(vec![Arc::clone(&node)], services());
        let reader = ctx.require_input(&node, "value").unwrap();
        assert_eq!(reader.ty(), &ValueType::Int);
        assert_eq!(ctx.input_type(&node, "missing").unwrap(), None);
        assert_eq!(ctx.require_input(&node, "missing").unwrap_err().code(), "E205");
    }

    #[test]
    fn unknown_entity_type() {
        let ctx = Codegen::new(Vec::new(), services());
        assert_eq!(ctx.entity_type("Ghost").err().map(|e| e.code()), Some("E201"));
    }
}
