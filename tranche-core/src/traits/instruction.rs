//! The node contract.

use crate::codegen::{Codegen, JsonFn, Reader};
use crate::error::Result;
use crate::node::Node;
use crate::value::ValueType;
use std::future::Future;
use std::pin::Pin;

/// Future returned by [`Instruction::compile`].
pub type CompileFuture<'a> = Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;

/// Behaviour of one node kind.
///
/// Instructions are stateless; everything a compiled node needs lives in the
/// closures it emits into the [`Codegen`] context and in the run-state slots
/// it allocates there.
///
/// # Example
///
/// ```ignore
/// struct Double;
///
/// impl Instruction for Double {
///     fn compile<'a>(&'a self, node: &'a Node, ctx: &'a mut Codegen) -> CompileFuture<'a> {
///         Box::pin(async move {
///             let input = ctx.require_input(node, "input")?;
///             let slot = ctx.alloc_value(node, "output", ValueType::Int);
///             ctx.emit(Box::new(move |state| {
///                 let v = input.read(state)?.as_i64().unwrap_or(0);
///                 state.store(slot, Value::int(v * 2));
///                 Ok(())
///             }));
///             Ok(())
///         })
///     }
/// }
/// ```
pub trait Instruction: Send + Sync {
    /// Emit the logic computing this node's values into the run state.
    ///
    /// Called exactly once per node. May perform one-off asynchronous setup;
    /// per-run asynchronous work goes through the run state instead.
    fn compile<'a>(&'a self, node: &'a Node, ctx: &'a mut Codegen) -> CompileFuture<'a>;

    /// Emit a read of an already computed `field`.
    ///
    /// The default reads the slot bound to `field` during compile.
    fn emit_output_read(&self, node: &Node, ctx: &Codegen, field: &str) -> Result<Reader> {
        ctx.bound_reader(node.id(), field)
            .ok_or_else(|| node.unsupported("read", field))
    }

    /// Emit a writer of `field`'s JSON to the run's output buffer.
    ///
    /// Only used for data-map output. Unsupported unless overridden.
    fn emit_output_json(&self, node: &Node, _ctx: &Codegen, field: &str) -> Result<JsonFn> {
        Err(node.unsupported("json output", field))
    }

    /// Static type of `field`, without emitting anything.
    fn output_type(&self, node: &Node, ctx: &Codegen, field: &str) -> Result<ValueType> {
        ctx.binding(node.id(), field)
            .map(|binding| binding.ty.clone())
            .ok_or_else(|| node.unsupported("type lookup", field))
    }
}
