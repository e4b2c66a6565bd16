//! Run-state layout synthesized during compilation.

use crate::types::{NodeId, SlotId};
use crate::value::ValueType;

/// Owner of one run-state slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotInfo {
    /// Node that allocated the slot.
    pub node: NodeId,
    /// Field the slot holds.
    pub field: String,
}

impl SlotInfo {
    /// Describe a slot.
    pub fn new(node: NodeId, field: impl Into<String>) -> Self {
        Self {
            node,
            field: field.into(),
        }
    }
}

/// A value slot bound to a node field.
#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    /// The slot.
    pub slot: SlotId,
    /// Static type of the stored value.
    pub ty: ValueType,
}

/// Slots a run state must provide.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunLayout {
    values: Vec<SlotInfo>,
    writers: Vec<SlotInfo>,
}

impl RunLayout {
    /// Create a layout from value and writer slots.
    pub fn new(values: Vec<SlotInfo>, writers: Vec<SlotInfo>) -> Self {
        Self { values, writers }
    }

    /// Number of value slots.
    pub fn value_count(&self) -> usize {
        self.values.len()
    }

    /// Number of pool-backed writer slots.
    pub fn writer_count(&self) -> usize {
        self.writers.len()
    }

    /// Value slot owners.
    pub fn values(&self) -> &[SlotInfo] {
        &self.values
    }

    /// Writer slot owners.
    pub fn writers(&self) -> &[SlotInfo] {
        &self.writers
    }
}
