//! Data nodes.
//!
//! These nodes load and reshape values within a graph:
//! - [`ConstantInstruction`] - Literal folded into consumers at load time
//! - [`ContentInstruction`] - Single entity fetched by id
//! - [`ContentListInstruction`] - Filtered entity list, output only
//! - [`CountInstruction`] - Length of an array
//! - [`FieldsInstruction`] - Field projection of an object
//! - [`FromListInstruction`] - Element of an array by index
//! - [`ToListInstruction`], [`TokensInstruction`] - Recognized, not yet compiled

mod constant;
mod content;
mod content_list;
mod count;
mod fields;
mod from_list;
mod includes;
mod placeholder;

pub use constant::ConstantInstruction;
pub use content::ContentInstruction;
pub use content_list::ContentListInstruction;
pub use count::CountInstruction;
pub use fields::FieldsInstruction;
pub use from_list::FromListInstruction;
pub use includes::{IncludePlan, Included};
pub use placeholder::{ToListInstruction, TokensInstruction};

use tranche_core::error::Result;
use tranche_core::value::Value;

/// Write a rendered virtual field as `{"json":<rendered>,"select":<field>}`.
///
/// `select_json` is the already-encoded field name.
pub(crate) fn write_virtual(rendered: &Value, select_json: &str, out: &mut Vec<u8>) -> Result<()> {
    out.extend_from_slice(b"{\"json\":");
    rendered.write_json(out)?;
    out.extend_from_slice(b",\"select\":");
    out.extend_from_slice(select_json.as_bytes());
    out.push(b'}');
    Ok(())
}
