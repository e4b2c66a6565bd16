//! Related-entity expansion shared by Content and ContentList.

use std::collections::HashSet;
use std::sync::Arc;
use tranche_core::codegen::Codegen;
use tranche_core::error::Result;
use tranche_core::node::Node;
use tranche_core::run_state::RequestContext;
use tranche_core::traits::{EntityStore, EntityType, Fetch};
use tranche_core::value::Value;

/// Entities loaded for one relation field.
pub type Included = Vec<(String, Vec<Value>)>;

#[derive(Clone)]
struct IncludeRelation {
    field: String,
    target: Arc<dyn EntityType>,
}

/// The relation fields a node expands.
///
/// Parsed from the `includes` constant, given either as an array of field
/// names or as a comma-separated string.
#[derive(Clone, Default)]
pub struct IncludePlan {
    relations: Vec<IncludeRelation>,
}

impl IncludePlan {
    /// Resolve the `includes` of `node` against its entity type.
    pub fn parse(node: &Node, ctx: &Codegen, entity_type: &dyn EntityType) -> Result<Self> {
        let Some(raw) = node.data("includes") else {
            return Ok(Self::default());
        };

        let names: Vec<String> = if let Some(list) = raw.as_array() {
            list.iter()
                .map(|item| {
                    item.as_str()
                        .map(str::to_string)
                        .ok_or_else(|| node.config_error("includes", "expected field names"))
                })
                .collect::<Result<_>>()?
        } else if let Some(text) = raw.as_str() {
            text.split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(str::to_string)
                .collect()
        } else {
            return Err(node.config_error("includes", "expected an array or a string"));
        };

        let mut relations = Vec::with_capacity(names.len());
        for field in names {
            let relation = entity_type.relation(&field).ok_or_else(|| {
                node.config_error(
                    "includes",
                    format!("'{}' is not a relation of {}", field, entity_type.name()),
                )
            })?;
            let target = ctx.entity_type(&relation.target)?;
            relations.push(IncludeRelation { field, target });
        }
        Ok(Self { relations })
    }

    /// Check if nothing is expanded.
    pub fn is_empty(&self) -> bool {
        self.relations.is_empty()
    }

    /// Target entity type names, for store preparation.
    pub fn targets(&self) -> impl Iterator<Item = &str> {
        self.relations.iter().map(|r| r.target.name())
    }

    /// Load the related entities of `entities`.
    ///
    /// Ids are collected across all entities and loaded once each; missing
    /// targets are skipped.
    pub fn fetch(
        &self,
        store: &dyn EntityStore,
        entities: &[Value],
        ctx: &RequestContext,
    ) -> Fetch<Included> {
        let per_relation = self
            .relations
            .iter()
            .map(|relation| {
                let mut seen = HashSet::new();
                let gets = entities
                    .iter()
                    .filter_map(|entity| entity.get_field(&relation.field))
                    .flat_map(|ids| match ids.as_array() {
                        Some(list) => list.iter().cloned().map(Value).collect(),
                        None => vec![ids],
                    })
                    .filter(|id| !id.is_null() && seen.insert(id.string_form()))
                    .map(|id| store.get(relation.target.name(), &id, ctx))
                    .collect();
                let field = relation.field.clone();
                Fetch::all(gets).map(move |found| {
                    (field, found.into_iter().flatten().collect::<Vec<Value>>())
                })
            })
            .collect();
        Fetch::all(per_relation)
    }

    /// Write `{"<field>":[...],...}`.
    pub fn write(&self, included: &Included, out: &mut Vec<u8>) -> Result<()> {
        out.push(b'{');
        for (i, (relation, (field, entities))) in self.relations.iter().zip(included).enumerate() {
            if i > 0 {
                out.push(b',');
            }
            serde_json::to_writer(&mut *out, field)?;
            out.extend_from_slice(b":[");
            for (j, entity) in entities.iter().enumerate() {
                if j > 0 {
                    out.push(b',');
                }
                relation.target.write_json(entity, out)?;
            }
            out.push(b']');
        }
        out.push(b'}');
        Ok(())
    }
}
