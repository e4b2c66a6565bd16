//! Tranche scheduling and the run driver.
//!
//! - [`Tranche`] - Nodes of equal dependency depth
//! - [`CompiledTranche`] - A tranche's Execute and Output closures
//! - [`Program`] - Every compiled tranche plus the run-state layout; runs
//!   requests against pooled run states
//!
//! Tranches run one after another and the nodes of a tranche run in
//! registration order.

mod config;
mod program;
mod tranche;

pub use config::ProgramConfig;
pub use program::Program;
pub use tranche::{CompiledTranche, Tranche};
