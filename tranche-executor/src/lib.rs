//! Tranche executor - wiring, scheduling and running graphs.
//!
//! This crate turns graph descriptions into runnable programs:
//! - [`graph::Graph`] parses and wires one description, folding constants
//! - [`loader::Loader`] deduplicates nodes across graphs, orders them and
//!   groups them into tranches
//! - [`scheduler::Program`] holds the compiled tranches and runs requests
//! - [`observability`] installs the tracing subscriber
//!
//! # Example
//!
//! ```ignore
//! use tranche_executor::prelude::*;
//!
//! let mut loader = Loader::default();
//! loader.load_graph(&GraphDefinition::from_json(description)?)?;
//! let program = loader.compile(services, ProgramConfig::from_env()).await?;
//!
//! let mut out = Vec::new();
//! program.run(RunRequest::default(), &mut out).await?;
//! ```

#![warn(missing_docs)]

pub mod graph;
pub mod loader;
pub mod observability;
pub mod scheduler;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::graph::Graph;
    pub use crate::loader::{Loader, LoaderConfig};
    pub use crate::observability::{LogFormat, TracingConfig, init_tracing};
    pub use crate::scheduler::{CompiledTranche, Program, ProgramConfig, Tranche};
    pub use tranche_core::prelude::*;
}
