//! Entity serialization collaborator.

use super::EntityStore;
use crate::error::Result;
use crate::run_state::RequestContext;
use crate::value::{Value, ValueType};
use std::sync::Arc;

/// A relation field pointing at another entity type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relation {
    /// Target entity type.
    pub target: String,
    /// Whether the field holds a list of ids.
    pub many: bool,
}

/// Static description of one entity type.
pub trait EntityType: Send + Sync {
    /// Type name, as used in `type` constants.
    fn name(&self) -> &str;

    /// Type of a stored or virtual field, `None` if unknown.
    fn field_type(&self, field: &str) -> Option<ValueType>;

    /// Relation behind `field`, if it is one.
    fn relation(&self, _field: &str) -> Option<Relation> {
        None
    }

    /// Whether `field` is computed rather than stored.
    fn is_virtual(&self, _field: &str) -> bool {
        false
    }

    /// Read a stored field from an in-memory entity.
    fn read_field(&self, entity: &Value, field: &str) -> Value {
        entity.get_field(field).unwrap_or_default()
    }

    /// Write the whole entity as JSON.
    fn write_json(&self, entity: &Value, out: &mut Vec<u8>) -> Result<()> {
        entity.write_json(out)
    }

    /// Render the entity's virtual fields into one JSON object.
    fn render_virtual(&self, _entity: &Value, _ctx: &RequestContext) -> Result<Value> {
        Ok(Value(serde_json::Value::Object(serde_json::Map::new())))
    }
}

/// Lookup of entity types by name.
pub trait Catalog: Send + Sync {
    /// The entity type called `name`.
    fn entity_type(&self, name: &str) -> Option<Arc<dyn EntityType>>;
}

/// External collaborators handed to compilation.
#[derive(Clone)]
pub struct Services {
    /// Entity serialization.
    pub catalog: Arc<dyn Catalog>,
    /// Entity access.
    pub store: Arc<dyn EntityStore>,
}

impl Services {
    /// Bundle a catalog and a store.
    pub fn new(catalog: Arc<dyn Catalog>, store: Arc<dyn EntityStore>) -> Self {
        Self { catalog, store }
    }
}
