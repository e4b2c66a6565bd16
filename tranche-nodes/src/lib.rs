//! The tranche instruction set.
//!
//! Every node kind of a graph description maps to one [`Instruction`]:
//!
//! ## Data (`data::*`)
//! - [`data::ConstantInstruction`] - Literals, folded away by the graph loader
//! - [`data::ContentInstruction`] - One entity by id, with includes and virtual fields
//! - [`data::ContentListInstruction`] - A filtered, sorted, paged entity list
//! - [`data::CountInstruction`] - Array length
//! - [`data::FieldsInstruction`] - Field projection of an object
//! - [`data::FromListInstruction`] - Array element by index
//! - [`data::ToListInstruction`], [`data::TokensInstruction`] - Not implemented
//!
//! ## Flow (`flow::*`)
//! - [`flow::IfInstruction`] - Typed comparison of two operands
//! - [`flow::LoopInstruction`] - Not implemented
//! - [`flow::ComponentInstruction`] - Presentation root
//!
//! [`registry::InstructionSet`] is the closed tag → instruction table.
//!
//! [`Instruction`]: tranche_core::traits::Instruction

pub mod data;
pub mod flow;
pub mod registry;

pub use data::{
    ConstantInstruction, ContentInstruction, ContentListInstruction, CountInstruction,
    FieldsInstruction, FromListInstruction, ToListInstruction, TokensInstruction,
};
pub use flow::{Comparison, ComponentInstruction, IfInstruction, LoopInstruction};
pub use registry::InstructionSet;

#[cfg(test)]
mod testutil;
