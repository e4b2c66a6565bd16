//! Emitted closures.

use crate::error::Result;
use crate::run_state::RunState;
use crate::types::SlotId;
use crate::value::{Value, ValueType};
use std::fmt;
use std::sync::Arc;

/// Compute step of one node, run during a tranche's Execute phase.
pub type ExecFn = Box<dyn Fn(&Arc<RunState>) -> Result<()> + Send + Sync>;

/// Writer of one JSON fragment, run during a tranche's Output phase.
pub type JsonFn = Box<dyn Fn(&RunState, &mut Vec<u8>) -> Result<()> + Send + Sync>;

type ReadFn = dyn Fn(&RunState) -> Result<Value> + Send + Sync;

/// A typed read of an already computed value.
#[derive(Clone)]
pub struct Reader {
    ty: ValueType,
    read: Arc<ReadFn>,
}

impl Reader {
    /// Wrap a read closure.
    pub fn new(ty: ValueType, read: impl Fn(&RunState) -> Result<Value> + Send + Sync + 'static) -> Self {
        Self {
            ty,
            read: Arc::new(read),
        }
    }

    /// A folded constant.
    pub fn constant(value: Value) -> Self {
        let ty = ValueType::of(&value);
        Self::new(ty, move |_| Ok(value.clone()))
    }

    /// A run-state slot.
    pub fn slot(slot: SlotId, ty: ValueType) -> Self {
        Self::new(ty, move |state| Ok(state.load(slot)))
    }

    /// Derive another reader from this one.
    pub fn map(
        self,
        ty: ValueType,
        f: impl Fn(Value) -> Result<Value> + Send + Sync + 'static,
    ) -> Self {
        let inner = self.read;
        Self::new(ty, move |state| f(inner(state)?))
    }

    /// Static type of the value read.
    pub fn ty(&self) -> &ValueType {
        &self.ty
    }

    /// Read the value.
    pub fn read(&self, state: &RunState) -> Result<Value> {
        (self.read)(state)
    }

    /// JSON writer serializing the value read.
    pub fn into_json(self) -> JsonFn {
        Box::new(move |state, out| self.read(state)?.write_json(out))
    }
}

impl fmt::Debug for Reader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reader").field("ty", &self.ty).finish_non_exhaustive()
    }
}
