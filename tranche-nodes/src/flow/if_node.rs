//! If node (operand comparison).
//!
//! Compares two operands into a boolean. Operand types are checked while
//! compiling, so a mismatch never reaches a run.

use std::cmp::Ordering;
use std::fmt;
use tranche_core::codegen::{Codegen, JsonFn, Reader};
use tranche_core::error::{Result, TrancheError};
use tranche_core::node::Node;
use tranche_core::traits::{CompileFuture, Instruction};
use tranche_core::types::NodeId;
use tranche_core::value::{Value, ValueType};

/// Comparison applied by an If node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    /// `a < b`
    LessThan,
    /// `a > b`
    MoreThan,
    /// `a <= b`
    LessThanEqual,
    /// `a >= b`
    MoreThanEqual,
    /// `a == b`
    EqualTo,
}

impl Comparison {
    /// Parse an operator name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "lessThan" => Some(Self::LessThan),
            "moreThan" => Some(Self::MoreThan),
            "lessThanEqual" => Some(Self::LessThanEqual),
            "moreThanEqual" => Some(Self::MoreThanEqual),
            "equalTo" => Some(Self::EqualTo),
            _ => None,
        }
    }

    /// The operator name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::LessThan => "lessThan",
            Self::MoreThan => "moreThan",
            Self::LessThanEqual => "lessThanEqual",
            Self::MoreThanEqual => "moreThanEqual",
            Self::EqualTo => "equalTo",
        }
    }

    fn accepts(&self, ty: &ValueType) -> bool {
        match self {
            Self::EqualTo => ty.is_numeric() || matches!(ty, ValueType::String | ValueType::Bool),
            _ => ty.is_numeric(),
        }
    }

    fn holds(&self, ord: Ordering) -> bool {
        match self {
            Self::LessThan => ord == Ordering::Less,
            Self::MoreThan => ord == Ordering::Greater,
            Self::LessThanEqual => ord != Ordering::Greater,
            Self::MoreThanEqual => ord != Ordering::Less,
            Self::EqualTo => ord == Ordering::Equal,
        }
    }

    fn evaluate(&self, node_id: NodeId, ty: &ValueType, a: &Value, b: &Value) -> Result<bool> {
        let invalid = |value: &Value| TrancheError::InvalidValue {
            node_id,
            cause: format!("expected {}, found {}", ty, value.string_form()),
        };
        let ord = match ty {
            ValueType::Int => {
                let x = a.as_i64().ok_or_else(|| invalid(a))?;
                let y = b.as_i64().ok_or_else(|| invalid(b))?;
                x.cmp(&y)
            }
            ValueType::Float => {
                let x = a.as_f64().ok_or_else(|| invalid(a))?;
                let y = b.as_f64().ok_or_else(|| invalid(b))?;
                // NaN compares unequal to everything.
                match x.partial_cmp(&y) {
                    Some(ord) => ord,
                    None => return Ok(false),
                }
            }
            _ => return Ok(a == b),
        };
        Ok(self.holds(ord))
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// If node - stores the result of comparing two operands.
///
/// # Inputs
/// - `operator`: one of `lessThan`, `moreThan`, `lessThanEqual`,
///   `moreThanEqual`, `equalTo` (constant)
/// - `operanda`, `operandb`: constants or links. A missing operand takes the
///   zero value of the other operand's type.
///
/// # Outputs
/// - `output`: `Bool`, written as `true`/`false`
///
/// # Example Configuration
/// ```json
/// { "type": "If", "data": { "operator": "moreThan", "operanda": 5 },
///   "links": { "operandb": { "node": 2 } } }
/// ```
#[derive(Debug, Default, Clone, Copy)]
pub struct IfInstruction;

impl IfInstruction {
    fn operator(node: &Node) -> Result<Comparison> {
        let name = node.require_str("operator")?;
        Comparison::from_name(name)
            .ok_or_else(|| node.config_error("operator", format!("unknown comparison '{}'", name)))
    }
}

impl Instruction for IfInstruction {
    fn compile<'a>(&'a self, node: &'a Node, ctx: &'a mut Codegen) -> CompileFuture<'a> {
        Box::pin(async move {
            let operator = Self::operator(node)?;
            let a_type = ctx.input_type(node, "operanda")?;
            let b_type = ctx.input_type(node, "operandb")?;

            let mismatch = |left: &Option<ValueType>, right: &Option<ValueType>| {
                let describe = |ty: &Option<ValueType>| {
                    ty.as_ref().map_or_else(|| "missing".to_string(), ToString::to_string)
                };
                TrancheError::OperandTypeMismatch {
                    node_id: node.id(),
                    operator: operator.to_string(),
                    left: describe(left),
                    right: describe(right),
                }
            };

            let ty = match (&a_type, &b_type) {
                (Some(a), Some(b)) if a != b => return Err(mismatch(&a_type, &b_type)),
                (Some(ty), _) | (None, Some(ty)) => ty.clone(),
                (None, None) => return Err(node.missing_input("operanda")),
            };
            if !operator.accepts(&ty) {
                return Err(mismatch(&a_type, &b_type));
            }

            let operand = |field: &str| -> Result<Reader> {
                Ok(ctx
                    .read_input(node, field)?
                    .unwrap_or_else(|| Reader::constant(ty.zero_value())))
            };
            let a = operand("operanda")?;
            let b = operand("operandb")?;

            let node_id = node.id();
            let slot = ctx.alloc_value(node, "output", ValueType::Bool);
            ctx.emit(Box::new(move |state| {
                let left = a.read(state)?;
                let right = b.read(state)?;
                let result = operator.evaluate(node_id, &ty, &left, &right)?;
                tracing::trace!(node_id = %node_id, operator = %operator, result, "If evaluated comparison");
                state.store(slot, Value::bool(result));
                Ok(())
            }));
            Ok(())
        })
    }

    fn emit_output_json(&self, node: &Node, ctx: &Codegen, field: &str) -> Result<JsonFn> {
        let reader = ctx
            .bound_reader(node.id(), field)
            .ok_or_else(|| node.unsupported("json output", field))?;
        Ok(Box::new(move |state, out| {
            let token: &[u8] = if reader.read(state)?.as_bool() == Some(true) {
                b"true"
            } else {
                b"false"
            };
            out.extend_from_slice(token);
            Ok(())
        }))
    }
}
