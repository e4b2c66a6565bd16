//! Declarative entity types.

use crate::error::Result;
use crate::run_state::RequestContext;
use crate::traits::{Catalog, EntityType, Relation};
use crate::value::{Value, ValueType};
use std::collections::BTreeMap;
use std::sync::Arc;

type VirtualFn = Arc<dyn Fn(&Value, &RequestContext) -> Value + Send + Sync>;

/// An entity type described field by field.
#[derive(Clone)]
pub struct EntitySchema {
    name: String,
    fields: BTreeMap<String, ValueType>,
    relations: BTreeMap<String, Relation>,
    virtuals: BTreeMap<String, (ValueType, VirtualFn)>,
}

impl EntitySchema {
    /// Create a type with a single `id: Int` field.
    pub fn new(name: impl Into<String>) -> Self {
        let mut fields = BTreeMap::new();
        fields.insert("id".to_string(), ValueType::Int);
        Self {
            name: name.into(),
            fields,
            relations: BTreeMap::new(),
            virtuals: BTreeMap::new(),
        }
    }

    /// Declare a stored field.
    pub fn with_field(mut self, field: impl Into<String>, ty: ValueType) -> Self {
        self.fields.insert(field.into(), ty);
        self
    }

    /// Declare a relation field holding one id, or a list of ids if `many`.
    pub fn with_relation(mut self, field: impl Into<String>, target: impl Into<String>, many: bool) -> Self {
        let field = field.into();
        let ty = if many {
            ValueType::Array(Box::new(ValueType::Int))
        } else {
            ValueType::Int
        };
        self.fields.insert(field.clone(), ty);
        self.relations.insert(
            field,
            Relation {
                target: target.into(),
                many,
            },
        );
        self
    }

    /// Declare a computed field.
    pub fn with_virtual(
        mut self,
        field: impl Into<String>,
        ty: ValueType,
        compute: impl Fn(&Value, &RequestContext) -> Value + Send + Sync + 'static,
    ) -> Self {
        self.virtuals.insert(field.into(), (ty, Arc::new(compute)));
        self
    }
}

impl EntityType for EntitySchema {
    fn name(&self) -> &str {
        &self.name
    }

    fn field_type(&self, field: &str) -> Option<ValueType> {
        self.fields
            .get(field)
            .or_else(|| self.virtuals.get(field).map(|(ty, _)| ty))
            .cloned()
    }

    fn relation(&self, field: &str) -> Option<Relation> {
        self.relations.get(field).cloned()
    }

    fn is_virtual(&self, field: &str) -> bool {
        self.virtuals.contains_key(field)
    }

    fn render_virtual(&self, entity: &Value, ctx: &RequestContext) -> Result<Value> {
        let rendered = self
            .virtuals
            .iter()
            .map(|(field, (_, compute))| (field.clone(), compute(entity, ctx).into_inner()))
            .collect();
        Ok(Value(serde_json::Value::Object(rendered)))
    }
}

/// Catalog over a fixed set of entity types.
#[derive(Default, Clone)]
pub struct StaticCatalog {
    types: BTreeMap<String, Arc<dyn EntityType>>,
}

impl StaticCatalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an entity type.
    pub fn with_type(mut self, entity_type: impl EntityType + 'static) -> Self {
        self.types
            .insert(entity_type.name().to_string(), Arc::new(entity_type));
        self
    }
}

impl Catalog for StaticCatalog {
    fn entity_type(&self, name: &str) -> Option<Arc<dyn EntityType>> {
        self.types.get(name).cloned()
    }
}
