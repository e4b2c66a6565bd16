//! Convenient re-exports for common usage.

pub use crate::codegen::{Codegen, ExecFn, JsonFn, Reader, RunLayout};
pub use crate::error::{Result, ResultExt, TrancheError};
pub use crate::flow::{DataMapEntry, GraphDefinition, LinkDefinition, NodeDefinition};
pub use crate::node::{Link, Node, NodeKind};
pub use crate::run_state::{BufferPool, RequestContext, RunRequest, RunState};
pub use crate::traits::{
    Catalog, CompileFuture, EntityStore, EntityType, Fetch, Instruction, ListPage, ListQuery,
    Relation, Services,
};
pub use crate::types::{NodeId, RunId, SlotId, WriterSlotId};
pub use crate::value::{Value, ValueType};
