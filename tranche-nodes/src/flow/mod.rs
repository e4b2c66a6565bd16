//! Flow nodes.
//!
//! - [`IfInstruction`] - Compares two operands into a boolean
//! - [`LoopInstruction`] - Recognized, not yet compiled
//! - [`ComponentInstruction`] - Presentation root, never compiled

mod component;
mod if_node;
mod loop_node;

pub use component::ComponentInstruction;
pub use if_node::{Comparison, IfInstruction};
pub use loop_node::LoopInstruction;
