//! Core identifier types.

mod ids;

pub use ids::{NodeId, RunId, SlotId, WriterSlotId};
