#![allow(clippy::module_inception)]

//! Node registry shared by every graph compiled together.
//!
//! The loader deduplicates structurally identical nodes, assigns each node
//! its dependency depth, groups nodes into tranches and drives compilation
//! into a [`Program`](crate::scheduler::Program).
//!
//! # Example
//!
//! ```ignore
//! use tranche_executor::loader::{Loader, LoaderConfig};
//!
//! let mut loader = Loader::new(LoaderConfig::default());
//! loader.load_graph(&GraphDefinition::from_json(page)?)?;
//! loader.load_graph(&GraphDefinition::from_json(sidebar)?)?;
//! let program = loader.compile(services, ProgramConfig::default()).await?;
//! ```

mod config;
mod loader;

pub use config::LoaderConfig;
pub use loader::Loader;
