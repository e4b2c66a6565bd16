//! ContentList node (filtered entity collection).

use super::includes::{IncludePlan, Included};
use std::collections::BTreeMap;
use std::sync::Arc;
use tranche_core::codegen::{Codegen, JsonFn, Reader};
use tranche_core::error::{Result, TrancheError};
use tranche_core::node::Node;
use tranche_core::run_state::RunState;
use tranche_core::traits::{CompileFuture, EntityType, Instruction, ListQuery};
use tranche_core::types::NodeId;
use tranche_core::value::{Value, ValueType};

const FILTER_PREFIX: &str = "filter.";

/// ContentList node - loads a filtered list of entities.
///
/// The list is materialized as JSON into a pool-backed buffer during Execute.
/// It cannot be read as a typed value by other nodes; it only reaches final
/// output.
///
/// # Inputs
/// - `type`: entity type name (constant, required)
/// - `filter`: object of equality filters (constant)
/// - `filter.<key>`: dynamic filter value (link)
/// - `sort`: field name, `-` prefixed for descending (constant)
/// - `limit`, `offset`: paging (constant or link)
/// - `includes`: relation fields to expand (constant)
/// - `total`: whether to report the unpaged count (constant bool)
///
/// # Outputs
/// - `output`: `[...]`, or `{"items":[...],"total":N,"includes":{..}}` when
///   `total` or `includes` are requested
#[derive(Debug, Default, Clone, Copy)]
pub struct ContentListInstruction;

struct QueryPlan {
    node_id: NodeId,
    filter: BTreeMap<String, Value>,
    dynamic_filter: Vec<(String, Reader)>,
    sort: Option<String>,
    limit: Option<Reader>,
    offset: Option<Reader>,
    count_total: bool,
}

impl QueryPlan {
    fn parse(node: &Node, ctx: &Codegen) -> Result<Self> {
        let filter = match node.data("filter") {
            None => BTreeMap::new(),
            Some(value) => match value.inner() {
                serde_json::Value::Object(map) => map
                    .iter()
                    .map(|(k, v)| (k.clone(), Value(v.clone())))
                    .collect(),
                _ => return Err(node.config_error("filter", "expected an object")),
            },
        };

        let mut dynamic_filter = Vec::new();
        for field in node.links().keys() {
            if let Some(key) = field.strip_prefix(FILTER_PREFIX) {
                dynamic_filter.push((key.to_string(), ctx.require_input(node, field)?));
            }
        }

        let sort = match node.data("sort") {
            None => None,
            Some(value) => Some(
                value
                    .as_str()
                    .ok_or_else(|| node.config_error("sort", "expected a field name"))?
                    .to_string(),
            ),
        };

        let count_total = match node.data("total") {
            None => false,
            Some(value) => value
                .as_bool()
                .ok_or_else(|| node.config_error("total", "expected a boolean"))?,
        };

        Ok(Self {
            node_id: node.id(),
            filter,
            dynamic_filter,
            sort,
            limit: ctx.read_input(node, "limit")?,
            offset: ctx.read_input(node, "offset")?,
            count_total,
        })
    }

    fn read_count(&self, reader: &Option<Reader>, state: &RunState) -> Result<Option<u64>> {
        let Some(reader) = reader else {
            return Ok(None);
        };
        let value = reader.read(state)?;
        if value.is_null() {
            return Ok(None);
        }
        value
            .as_u64()
            .map(Some)
            .ok_or_else(|| TrancheError::InvalidValue {
                node_id: self.node_id,
                cause: format!("expected a non-negative integer, found {}", value.string_form()),
            })
    }

    fn build(&self, state: &RunState) -> Result<ListQuery> {
        let mut filter = self.filter.clone();
        for (key, reader) in &self.dynamic_filter {
            filter.insert(key.clone(), reader.read(state)?);
        }
        Ok(ListQuery {
            filter,
            sort: self.sort.clone(),
            limit: self.read_count(&self.limit, state)?,
            offset: self.read_count(&self.offset, state)?.unwrap_or(0),
            count_total: self.count_total,
        })
    }
}

fn write_items(entity_type: &dyn EntityType, items: &[Value], out: &mut Vec<u8>) -> Result<()> {
    out.push(b'[');
    for (i, entity) in items.iter().enumerate() {
        if i > 0 {
            out.push(b',');
        }
        entity_type.write_json(entity, out)?;
    }
    out.push(b']');
    Ok(())
}

impl Instruction for ContentListInstruction {
    fn compile<'a>(&'a self, node: &'a Node, ctx: &'a mut Codegen) -> CompileFuture<'a> {
        Box::pin(async move {
            let type_name = node.require_str("type")?.to_string();
            let entity_type = ctx.entity_type(&type_name)?;
            let plan = IncludePlan::parse(node, ctx, entity_type.as_ref())?;
            let query = QueryPlan::parse(node, ctx)?;

            ctx.prepare_store(&type_name).await?;
            let targets: Vec<String> = plan.targets().map(str::to_string).collect();
            for target in &targets {
                ctx.prepare_store(target).await?;
            }

            let items_slot = ctx.alloc_writer(node, "items");
            let includes_slot = (!plan.is_empty()).then(|| ctx.alloc_writer(node, "includes"));
            let total_slot = query
                .count_total
                .then(|| ctx.alloc_value(node, "total", ValueType::Int));
            let store = ctx.store();
            tracing::debug!(
                node_id = %node.id(),
                type_name = %type_name,
                includes = targets.len(),
                total = query.count_total,
                "Planned content list"
            );

            ctx.emit(Box::new(move |state| {
                let list_query = query.build(state)?;
                let fetch = store.list(&type_name, &list_query, state.context());
                let fetch = if plan.is_empty() {
                    fetch.map(|page| (page, Included::new()))
                } else {
                    let plan = plan.clone();
                    let store = Arc::clone(&store);
                    let ctx = state.context().clone();
                    fetch.and_then(move |page| {
                        plan.fetch(store.as_ref(), &page.items, &ctx)
                            .map(move |included| (page, included))
                    })
                };

                let entity_type = Arc::clone(&entity_type);
                let plan = plan.clone();
                state.settle(fetch, move |state, (page, included)| {
                    // Buffers go into their slots even on error so cleanup
                    // returns them to the pool.
                    let mut items = state.acquire_buffer();
                    let written = write_items(entity_type.as_ref(), &page.items, &mut items);
                    state.put_writer(items_slot, items);
                    written?;

                    if let Some(includes_slot) = includes_slot {
                        let mut buffer = state.acquire_buffer();
                        let written = plan.write(&included, &mut buffer);
                        state.put_writer(includes_slot, buffer);
                        written?;
                    }
                    if let Some(total_slot) = total_slot {
                        let total = page.total.unwrap_or(page.items.len() as u64);
                        state.store(total_slot, Value::int(total as i64));
                    }
                    Ok(())
                })
            }));
            Ok(())
        })
    }

    fn emit_output_read(&self, node: &Node, _ctx: &Codegen, field: &str) -> Result<Reader> {
        Err(node.unsupported("read", field))
    }

    fn emit_output_json(&self, node: &Node, ctx: &Codegen, field: &str) -> Result<JsonFn> {
        if field != "output" {
            return Err(node.unsupported("json output", field));
        }
        let items = ctx
            .writer(node.id(), "items")
            .ok_or_else(|| node.unsupported("json output", field))?;
        let includes = ctx.writer(node.id(), "includes");
        let total = ctx.binding(node.id(), "total").map(|binding| binding.slot);

        if includes.is_none() && total.is_none() {
            return Ok(Box::new(move |state, out| {
                state.with_writer(items, |bytes| out.extend_from_slice(bytes.unwrap_or(&b"[]"[..])));
                Ok(())
            }));
        }

        Ok(Box::new(move |state, out| {
            out.extend_from_slice(b"{\"items\":");
            state.with_writer(items, |bytes| out.extend_from_slice(bytes.unwrap_or(&b"[]"[..])));
            if let Some(total) = total {
                out.extend_from_slice(b",\"total\":");
                state.with_value(total, |value| value.write_json(out))?;
            }
            if let Some(includes) = includes {
                out.extend_from_slice(b",\"includes\":");
                state.with_writer(includes, |bytes| {
                    out.extend_from_slice(bytes.unwrap_or(&b"{}"[..]))
                });
            }
            out.push(b'}');
            Ok(())
        }))
    }

    fn output_type(&self, node: &Node, _ctx: &Codegen, field: &str) -> Result<ValueType> {
        Err(node.unsupported("type lookup", field))
    }
}
