//! Common test utilities for integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;
use tranche_core::error::Result;
use tranche_core::flow::GraphDefinition;
use tranche_core::run_state::RunRequest;
use tranche_core::testing::{EntitySchema, FetchMode, MemoryStore, StaticCatalog};
use tranche_core::traits::Services;
use tranche_core::value::{Value, ValueType};
use tranche_executor::loader::{Loader, LoaderConfig};
use tranche_executor::scheduler::{Program, ProgramConfig};

/// Catalog with Article, Tag and Author types.
pub fn catalog() -> StaticCatalog {
    StaticCatalog::new()
        .with_type(
            EntitySchema::new("Article")
                .with_field("title", ValueType::String)
                .with_field("words", ValueType::Int)
                .with_field("section", ValueType::String)
                .with_relation("tags", "Tag", true)
                .with_virtual("slug", ValueType::String, |entity, _| {
                    let id = entity.get_field("id").unwrap_or_default();
                    Value::string(format!("article-{}", id.string_form()))
                }),
        )
        .with_type(EntitySchema::new("Tag").with_field("name", ValueType::String))
        .with_type(EntitySchema::new("Author").with_field("name", ValueType::String))
}

/// Store holding a few articles and tags.
pub fn store(mode: FetchMode) -> MemoryStore {
    MemoryStore::new()
        .with_mode(mode)
        .with_entity("Article", serde_json::json!({"id": 5, "title": "Hello", "words": 120, "section": "news"}))
        .with_entity("Article", serde_json::json!({"id": 6, "title": "Tagged", "words": 80, "section": "news", "tags": [1, 2]}))
        .with_entity("Article", serde_json::json!({"id": 7, "title": "Match", "words": 300, "section": "sport"}))
        .with_entity("Tag", serde_json::json!({"id": 1, "name": "rust"}))
        .with_entity("Tag", serde_json::json!({"id": 2, "name": "graphs"}))
}

/// Services answering synchronously.
pub fn services() -> Services {
    services_with(Arc::new(store(FetchMode::Immediate)))
}

/// Services whose store suspends every lookup on the runtime.
pub fn deferred_services() -> Services {
    services_with(Arc::new(store(FetchMode::Deferred(Duration::from_millis(2)))))
}

/// Services over a given store.
pub fn services_with(store: Arc<MemoryStore>) -> Services {
    Services::new(Arc::new(catalog()), store)
}

/// Load every graph into one strict loader.
pub fn load(graphs: &[GraphDefinition]) -> Result<Loader> {
    let mut loader = Loader::new(LoaderConfig::default());
    for graph in graphs {
        loader.load_graph(graph)?;
    }
    Ok(loader)
}

/// Load and compile graphs together.
pub async fn compile(graphs: &[GraphDefinition], services: Services) -> Result<Program> {
    load(graphs)?
        .compile(services, ProgramConfig::default())
        .await
}

/// Run a program once and return the output as text.
pub async fn run(program: &Program, request: RunRequest) -> Result<String> {
    let mut out = Vec::new();
    program.run(request, &mut out).await?;
    Ok(String::from_utf8(out).expect("output is UTF-8"))
}

/// Parse a JSON description.
pub fn graph(json: &str) -> GraphDefinition {
    GraphDefinition::from_json(json).expect("valid description")
}
