//! Content node (single entity).

use super::includes::{IncludePlan, Included};
use super::write_virtual;
use std::collections::BTreeSet;
use std::sync::Arc;
use tranche_core::codegen::{Codegen, JsonFn, Reader};
use tranche_core::error::Result;
use tranche_core::node::Node;
use tranche_core::traits::{CompileFuture, EntityType, Fetch, Instruction};
use tranche_core::types::SlotId;
use tranche_core::value::{Value, ValueType};

const VIRTUAL_FIELD: &str = "@virtual";

/// Content node - loads one entity.
///
/// # Inputs
/// - `type`: entity type name (constant, required)
/// - `id`: entity id (constant or link); without one the run's primary
///   entity is used
/// - `includes`: relation fields to expand (constant)
///
/// # Outputs
/// - `output`: the whole entity, or `{"result":..,"includes":{..}}` as JSON
///   when includes are requested
/// - any other name: that field of the entity; virtual fields are emitted as
///   `{"json":<rendered>,"select":"<field>"}`
///
/// # Example Configuration
/// ```json
/// { "type": "Content", "data": { "type": "Article", "id": 5, "includes": "tags" },
///   "outputs": [ { "id": 1, "field": "output" } ] }
/// ```
#[derive(Debug, Default, Clone, Copy)]
pub struct ContentInstruction;

/// Fields of `node` requested by consumers or data-map entries.
fn requested_fields(node: &Node) -> BTreeSet<&str> {
    node.consumers()
        .iter()
        .map(|c| c.source_field.as_str())
        .chain(node.outputs().iter().map(|o| o.field.as_str()))
        .collect()
}

impl ContentInstruction {
    fn entity_type(&self, node: &Node, ctx: &Codegen) -> Result<Arc<dyn EntityType>> {
        ctx.entity_type(node.require_str("type")?)
    }

    fn entity_reader(&self, node: &Node, ctx: &Codegen) -> Result<Reader> {
        ctx.bound_reader(node.id(), "output")
            .ok_or_else(|| node.unsupported("read", "output"))
    }

    fn virtual_slot(&self, node: &Node, ctx: &Codegen, field: &str) -> Result<SlotId> {
        ctx.binding(node.id(), VIRTUAL_FIELD)
            .map(|binding| binding.slot)
            .ok_or_else(|| node.unsupported("read", field))
    }
}

impl Instruction for ContentInstruction {
    fn compile<'a>(&'a self, node: &'a Node, ctx: &'a mut Codegen) -> CompileFuture<'a> {
        Box::pin(async move {
            let type_name = node.require_str("type")?.to_string();
            let entity_type = ctx.entity_type(&type_name)?;
            let plan = IncludePlan::parse(node, ctx, entity_type.as_ref())?;

            ctx.prepare_store(&type_name).await?;
            let targets: Vec<String> = plan.targets().map(str::to_string).collect();
            for target in &targets {
                ctx.prepare_store(target).await?;
            }

            let id = ctx.read_input(node, "id")?;
            let renders_virtual = requested_fields(node)
                .into_iter()
                .any(|field| entity_type.is_virtual(field));

            let slot = ctx.alloc_value(node, "output", ValueType::Entity(type_name.clone()));
            let virtual_slot =
                renders_virtual.then(|| ctx.alloc_value(node, VIRTUAL_FIELD, ValueType::Json));
            let includes_slot = (!plan.is_empty()).then(|| ctx.alloc_writer(node, "includes"));
            let store = ctx.store();

            ctx.emit(Box::new(move |state| {
                let fetch = match &id {
                    Some(reader) => {
                        let id = reader.read(state)?;
                        if id.is_null() {
                            Fetch::ready(None)
                        } else {
                            store.get(&type_name, &id, state.context())
                        }
                    }
                    None => Fetch::ready(state.primary().cloned()),
                };

                let fetch = if plan.is_empty() {
                    fetch.map(|entity| (entity, Included::new()))
                } else {
                    let plan = plan.clone();
                    let store = Arc::clone(&store);
                    let ctx = state.context().clone();
                    fetch.and_then(move |entity| {
                        let found = entity.iter().cloned().collect::<Vec<_>>();
                        plan.fetch(store.as_ref(), &found, &ctx)
                            .map(move |included| (entity, included))
                    })
                };

                let entity_type = Arc::clone(&entity_type);
                let plan = plan.clone();
                state.settle(fetch, move |state, (entity, included)| {
                    let entity = entity.unwrap_or_default();
                    if let Some(virtual_slot) = virtual_slot {
                        if !entity.is_null() {
                            let rendered = entity_type.render_virtual(&entity, state.context())?;
                            state.store(virtual_slot, rendered);
                        }
                    }
                    if let Some(includes_slot) = includes_slot {
                        let mut buffer = state.acquire_buffer();
                        let written = plan.write(&included, &mut buffer);
                        state.put_writer(includes_slot, buffer);
                        written?;
                    }
                    state.store(slot, entity);
                    Ok(())
                })
            }));
            Ok(())
        })
    }

    fn emit_output_read(&self, node: &Node, ctx: &Codegen, field: &str) -> Result<Reader> {
        let entity = self.entity_reader(node, ctx)?;
        if field == "output" {
            return Ok(entity);
        }

        let entity_type = self.entity_type(node, ctx)?;
        let ty = entity_type
            .field_type(field)
            .ok_or_else(|| node.unsupported("read", field))?;
        let owned = field.to_string();
        if entity_type.is_virtual(field) {
            let slot = self.virtual_slot(node, ctx, field)?;
            return Ok(Reader::new(ty, move |state| {
                Ok(state.with_value(slot, |rendered| {
                    rendered.get_field(&owned).unwrap_or_default()
                }))
            }));
        }
        Ok(entity.map(ty, move |entity| {
            if entity.is_null() {
                return Ok(Value::null());
            }
            Ok(entity_type.read_field(&entity, &owned))
        }))
    }

    fn emit_output_json(&self, node: &Node, ctx: &Codegen, field: &str) -> Result<JsonFn> {
        let entity_type = self.entity_type(node, ctx)?;
        let slot = ctx
            .binding(node.id(), "output")
            .map(|binding| binding.slot)
            .ok_or_else(|| node.unsupported("json output", field))?;

        if field == "output" {
            let includes = ctx.writer(node.id(), "includes");
            return Ok(Box::new(move |state, out| {
                let write_entity = |out: &mut Vec<u8>| {
                    state.with_value(slot, |entity| {
                        if entity.is_null() {
                            out.extend_from_slice(b"null");
                            Ok(())
                        } else {
                            entity_type.write_json(entity, out)
                        }
                    })
                };
                match includes {
                    None => write_entity(out),
                    Some(includes) => {
                        out.extend_from_slice(b"{\"result\":");
                        write_entity(out)?;
                        out.extend_from_slice(b",\"includes\":");
                        state.with_writer(includes, |bytes| {
                            out.extend_from_slice(bytes.unwrap_or(&b"{}"[..]))
                        });
                        out.push(b'}');
                        Ok(())
                    }
                }
            }));
        }

        if entity_type.is_virtual(field) {
            let virtual_slot = self.virtual_slot(node, ctx, field)?;
            let select = serde_json::to_string(field)?;
            return Ok(Box::new(move |state, out| {
                if state.with_value(slot, Value::is_null) {
                    out.extend_from_slice(b"null");
                    return Ok(());
                }
                state.with_value(virtual_slot, |rendered| write_virtual(rendered, &select, out))
            }));
        }

        self.emit_output_read(node, ctx, field).map(Reader::into_json)
    }

    fn output_type(&self, node: &Node, ctx: &Codegen, field: &str) -> Result<ValueType> {
        if field == "output" {
            return Ok(ValueType::Entity(node.require_str("type")?.to_string()));
        }
        self.entity_type(node, ctx)?
            .field_type(field)
            .ok_or_else(|| node.unsupported("type lookup", field))
    }
}
