//! Tag → instruction table.
//!
//! The instruction set is closed: every [`NodeKind`] maps to exactly one
//! instruction, and unknown tags resolve to nothing.

use crate::data::{
    ConstantInstruction, ContentInstruction, ContentListInstruction, CountInstruction,
    FieldsInstruction, FromListInstruction, ToListInstruction, TokensInstruction,
};
use crate::flow::{ComponentInstruction, IfInstruction, LoopInstruction};
use std::collections::HashMap;
use std::sync::Arc;
use tranche_core::node::NodeKind;
use tranche_core::traits::Instruction;

/// Instructions by node kind.
///
/// Instructions are stateless and shared by every node of their kind.
#[derive(Clone)]
pub struct InstructionSet {
    instructions: HashMap<NodeKind, Arc<dyn Instruction>>,
}

impl InstructionSet {
    /// The standard instruction set.
    pub fn standard() -> Self {
        let instructions = NodeKind::ALL
            .into_iter()
            .map(|kind| (kind, Self::instruction_for(kind)))
            .collect();
        Self { instructions }
    }

    fn instruction_for(kind: NodeKind) -> Arc<dyn Instruction> {
        match kind {
            NodeKind::Component => Arc::new(ComponentInstruction),
            NodeKind::Constant => Arc::new(ConstantInstruction),
            NodeKind::Content => Arc::new(ContentInstruction),
            NodeKind::ContentList => Arc::new(ContentListInstruction),
            NodeKind::Count => Arc::new(CountInstruction),
            NodeKind::Fields => Arc::new(FieldsInstruction),
            NodeKind::FromList => Arc::new(FromListInstruction),
            NodeKind::If => Arc::new(IfInstruction),
            NodeKind::Loop => Arc::new(LoopInstruction),
            NodeKind::Tokens => Arc::new(TokensInstruction),
            NodeKind::ToList => Arc::new(ToListInstruction),
        }
    }

    /// The instruction of `kind`.
    pub fn get(&self, kind: NodeKind) -> Option<Arc<dyn Instruction>> {
        self.instructions.get(&kind).cloned()
    }

    /// The instruction of a tag, `None` for unknown tags.
    pub fn for_tag(&self, tag: &str) -> Option<(NodeKind, Arc<dyn Instruction>)> {
        let kind = NodeKind::from_tag(tag)?;
        self.get(kind).map(|instruction| (kind, instruction))
    }

    /// Number of registered kinds.
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    /// Check if the set is empty.
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }
}

impl Default for InstructionSet {
    fn default() -> Self {
        Self::standard()
    }
}

impl std::fmt::Debug for InstructionSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstructionSet")
            .field("kinds", &self.instructions.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn covers_every_kind() {
        let set = InstructionSet::standard();
        assert_eq!(set.len(), NodeKind::ALL.len());
        for kind in NodeKind::ALL {
            assert!(set.get(kind).is_some(), "{kind} has no instruction");
        }
    }

    #[test]
    fn resolves_tags() {
        let set = InstructionSet::standard();
        assert_eq!(set.for_tag("If").map(|(kind, _)| kind), Some(NodeKind::If));
        assert!(set.for_tag("Banana").is_none());
    }
}
