//! Fields node (object projection).
//!
//! Decouples how an object was obtained from which of its fields is wanted:
//! any consumer may ask a Fields node for any field, and the node projects it
//! out of its `input` when read.

use std::sync::Arc;
use tranche_core::codegen::{Codegen, JsonFn, Reader};
use tranche_core::error::Result;
use tranche_core::node::Node;
use tranche_core::traits::{CompileFuture, EntityType, Instruction};
use tranche_core::value::{Value, ValueType};

/// Fields node - exposes named fields of an upstream whole-object value.
///
/// # Inputs
/// - `input`: an entity or JSON object
///
/// # Outputs
/// - `output`: the input itself
/// - any other name: that field of the input, typed through the catalog for
///   entities and as `Json` otherwise
#[derive(Debug, Default, Clone, Copy)]
pub struct FieldsInstruction;

enum Projection {
    Whole(Reader),
    Stored(Reader),
    Virtual {
        input: Reader,
        entity_type: Arc<dyn EntityType>,
        ty: ValueType,
    },
}

impl FieldsInstruction {
    fn project(&self, node: &Node, ctx: &Codegen, field: &str) -> Result<Projection> {
        let input = ctx.require_input(node, "input")?;
        if field == "output" {
            return Ok(Projection::Whole(input));
        }

        let owned = field.to_string();
        match input.ty().clone() {
            ValueType::Entity(type_name) => {
                let entity_type = ctx.entity_type(&type_name)?;
                let ty = entity_type
                    .field_type(field)
                    .ok_or_else(|| node.unsupported("read", field))?;
                if entity_type.is_virtual(field) {
                    return Ok(Projection::Virtual {
                        input,
                        entity_type,
                        ty,
                    });
                }
                Ok(Projection::Stored(input.map(ty, move |entity| {
                    if entity.is_null() {
                        return Ok(Value::null());
                    }
                    Ok(entity_type.read_field(&entity, &owned))
                })))
            }
            ValueType::Json => Ok(Projection::Stored(input.map(ValueType::Json, move |value| {
                Ok(value.get_field(&owned).unwrap_or_default())
            }))),
            _ => Err(node.unsupported("read", field)),
        }
    }
}

impl Instruction for FieldsInstruction {
    fn compile<'a>(&'a self, node: &'a Node, ctx: &'a mut Codegen) -> CompileFuture<'a> {
        Box::pin(async move {
            // Projections are built lazily by readers; only check the input.
            self.project(node, ctx, "output").map(|_| ())
        })
    }

    fn emit_output_read(&self, node: &Node, ctx: &Codegen, field: &str) -> Result<Reader> {
        match self.project(node, ctx, field)? {
            Projection::Whole(reader) | Projection::Stored(reader) => Ok(reader),
            Projection::Virtual {
                input,
                entity_type,
                ty,
            } => {
                let field = field.to_string();
                Ok(Reader::new(ty, move |state| {
                    let entity = input.read(state)?;
                    if entity.is_null() {
                        return Ok(Value::null());
                    }
                    let rendered = entity_type.render_virtual(&entity, state.context())?;
                    Ok(rendered.get_field(&field).unwrap_or_default())
                }))
            }
        }
    }

    fn emit_output_json(&self, node: &Node, ctx: &Codegen, field: &str) -> Result<JsonFn> {
        match self.project(node, ctx, field)? {
            Projection::Whole(reader) => match reader.ty().clone() {
                ValueType::Entity(type_name) => {
                    let entity_type = ctx.entity_type(&type_name)?;
                    Ok(Box::new(move |state, out| {
                        let entity = reader.read(state)?;
                        if entity.is_null() {
                            out.extend_from_slice(b"null");
                            return Ok(());
                        }
                        entity_type.write_json(&entity, out)
                    }))
                }
                _ => Ok(reader.into_json()),
            },
            Projection::Stored(reader) => Ok(reader.into_json()),
            Projection::Virtual {
                input,
                entity_type,
                ..
            } => {
                let select = serde_json::to_string(field)?;
                Ok(Box::new(move |state, out| {
                    let entity = input.read(state)?;
                    if entity.is_null() {
                        out.extend_from_slice(b"null");
                        return Ok(());
                    }
                    let rendered = entity_type.render_virtual(&entity, state.context())?;
                    crate::data::write_virtual(&rendered, &select, out)
                }))
            }
        }
    }

    fn output_type(&self, node: &Node, ctx: &Codegen, field: &str) -> Result<ValueType> {
        self.emit_output_read(node, ctx, field)
            .map(|reader| reader.ty().clone())
    }
}
