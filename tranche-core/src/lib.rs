//! Tranche Core Library
//!
//! Foundational types for the tranche dataflow compiler.
//!
//! # Overview
//!
//! A graph description lists nodes with constant inputs, links to other
//! nodes' outputs and requested data-map outputs. The executor deduplicates
//! those nodes, orders them into tranches of equal dependency depth, and
//! compiles every tranche into closures that compute node values into a
//! per-run [`RunState`](run_state::RunState) and later serialize the
//! requested fields.
//!
//! # Key Components
//!
//! - **Flow**: serde-backed input description
//! - **Node**: compile-time node with structural identity
//! - **Traits**: the `Instruction` node contract and the entity collaborators
//! - **Codegen**: context instructions compile against
//! - **RunState**: per-run slots and the completion signal for async work
//!
//! # Example
//!
//! ```ignore
//! use tranche_core::prelude::*;
//!
//! let graph = GraphDefinition::new().with_node(
//!     NodeDefinition::new("Content")
//!         .with_data("type", "Article")
//!         .with_data("id", 5i64)
//!         .with_output(1, "output")
//!         .as_root(),
//! );
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod codegen;
pub mod error;
pub mod flow;
pub mod node;
pub mod prelude;
pub mod run_state;
pub mod testing;
pub mod traits;
pub mod types;
pub mod value;
