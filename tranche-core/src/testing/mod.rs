//! In-memory collaborators for tests.
//!
//! [`StaticCatalog`] and [`MemoryStore`] stand in for the serialization and
//! data-access layers. The store can answer synchronously, like a warm cache,
//! or suspend every lookup on the tokio runtime to exercise the run-state
//! completion signal.
//!
//! # Example
//!
//! ```ignore
//! use tranche_core::testing::{EntitySchema, FetchMode, MemoryStore, StaticCatalog};
//!
//! let catalog = StaticCatalog::new()
//!     .with_type(EntitySchema::new("Article").with_field("title", ValueType::String));
//! let store = MemoryStore::new()
//!     .with_mode(FetchMode::Deferred(Duration::from_millis(5)))
//!     .with_entity("Article", json!({"id": 5, "title": "Hello"}));
//! let services = Services::new(Arc::new(catalog), Arc::new(store));
//! ```

mod catalog;
mod store;

pub use catalog::{EntitySchema, StaticCatalog};
pub use store::{FetchMode, MemoryStore};

use crate::codegen::{Codegen, JsonFn, Reader};
use crate::error::Result;
use crate::node::Node;
use crate::traits::{CompileFuture, Instruction};
use crate::value::Value;

/// Instruction that computes nothing and outputs its `value` constant.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopInstruction;

impl Instruction for NoopInstruction {
    fn compile<'a>(&'a self, _node: &'a Node, _ctx: &'a mut Codegen) -> CompileFuture<'a> {
        Box::pin(async { Ok(()) })
    }

    fn emit_output_json(&self, node: &Node, _ctx: &Codegen, _field: &str) -> Result<JsonFn> {
        let value = node.data("value").cloned().unwrap_or_else(Value::null);
        Ok(Reader::constant(value).into_json())
    }
}
