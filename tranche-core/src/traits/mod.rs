//! Core traits.
//!
//! - `Instruction`: the behaviour of one node kind
//! - `Catalog` / `EntityType`: static entity type information
//! - `EntityStore`: async entity access

mod catalog;
mod instruction;
mod store;

pub use catalog::{Catalog, EntityType, Relation, Services};
pub use instruction::{CompileFuture, Instruction};
pub use store::{EntityStore, Fetch, FetchFuture, ListPage, ListQuery};
