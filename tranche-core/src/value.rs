//! Dynamic values flowing between nodes.
//!
//! Node outputs are stored in the run state as [`Value`]s. At compile time
//! every readable output also has a [`ValueType`], which is what the
//! comparator and the projection nodes validate against.

use crate::error::{Result, TrancheError};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;

/// Dynamic value stored in a run-state slot.
///
/// Wraps serde_json::Value so that literals from the graph description and
/// entities from the data-access layer share one representation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Value(pub JsonValue);

impl Value {
    /// Create a null value.
    pub fn null() -> Self {
        Self(JsonValue::Null)
    }

    /// Create a boolean value.
    pub fn bool(v: bool) -> Self {
        Self(JsonValue::Bool(v))
    }

    /// Create an integer value.
    pub fn int(v: i64) -> Self {
        Self(JsonValue::Number(v.into()))
    }

    /// Create a floating-point value.
    pub fn float(v: f64) -> Self {
        Self(serde_json::Number::from_f64(v).map_or(JsonValue::Null, JsonValue::Number))
    }

    /// Create a string value.
    pub fn string(v: impl Into<String>) -> Self {
        Self(JsonValue::String(v.into()))
    }

    /// Create an array value.
    pub fn array(items: Vec<Value>) -> Self {
        Self(JsonValue::Array(items.into_iter().map(|v| v.0).collect()))
    }

    /// Check if the value is null.
    pub fn is_null(&self) -> bool {
        self.0.is_null()
    }

    /// Get a field by path (dot notation, `name[0]` indexes arrays).
    ///
    /// Returns None if the field doesn't exist.
    pub fn get_field(&self, path: &str) -> Option<Value> {
        let mut current = &self.0;
        for part in path.split('.') {
            if let Some((field, idx_str)) = part.split_once('[') {
                current = current.get(field)?;
                let idx: usize = idx_str.strip_suffix(']')?.parse().ok()?;
                current = current.get(idx)?;
            } else {
                current = current.get(part)?;
            }
        }
        Some(Value(current.clone()))
    }

    /// Borrow as a string slice.
    pub fn as_str(&self) -> Option<&str> {
        self.0.as_str()
    }

    /// Convert to i64 if the value is an integral number.
    pub fn as_i64(&self) -> Option<i64> {
        self.0.as_i64()
    }

    /// Convert to u64 if the value is a non-negative integral number.
    pub fn as_u64(&self) -> Option<u64> {
        self.0.as_u64()
    }

    /// Convert to f64 if the value is a number.
    pub fn as_f64(&self) -> Option<f64> {
        self.0.as_f64()
    }

    /// Get the boolean if the value is one.
    pub fn as_bool(&self) -> Option<bool> {
        self.0.as_bool()
    }

    /// Borrow the elements if the value is an array.
    pub fn as_array(&self) -> Option<&Vec<JsonValue>> {
        self.0.as_array()
    }

    /// String form used for structural identity.
    ///
    /// Strings compare by their content, everything else by its JSON text,
    /// so `"5"` and `5` are the same constant.
    pub fn string_form(&self) -> String {
        match &self.0 {
            JsonValue::String(s) => s.clone(),
            other => other.to_string(),
        }
    }

    /// Append the JSON encoding of this value to `out`.
    pub fn write_json(&self, out: &mut Vec<u8>) -> Result<()> {
        serde_json::to_writer(out, &self.0).map_err(|e| TrancheError::Serialization(e.to_string()))
    }

    /// Access the inner serde_json::Value.
    pub fn inner(&self) -> &JsonValue {
        &self.0
    }

    /// Convert into the inner serde_json::Value.
    pub fn into_inner(self) -> JsonValue {
        self.0
    }
}

impl Default for Value {
    fn default() -> Self {
        Self::null()
    }
}

impl From<JsonValue> for Value {
    fn from(v: JsonValue) -> Self {
        Self(v)
    }
}

impl From<Value> for JsonValue {
    fn from(v: Value) -> Self {
        v.0
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::string(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::string(s)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::bool(v)
    }
}

/// Static type of a node output.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ValueType {
    /// `true` / `false`.
    Bool,
    /// Integral number.
    Int,
    /// Floating-point number.
    Float,
    /// UTF-8 string.
    String,
    /// A whole entity of the named type.
    Entity(String),
    /// Array of the element type.
    Array(Box<ValueType>),
    /// Untyped JSON.
    Json,
}

impl ValueType {
    /// Infer the type of a literal.
    pub fn of(value: &Value) -> Self {
        match &value.0 {
            JsonValue::Bool(_) => Self::Bool,
            JsonValue::Number(n) if n.is_i64() || n.is_u64() => Self::Int,
            JsonValue::Number(_) => Self::Float,
            JsonValue::String(_) => Self::String,
            JsonValue::Array(items) => {
                let elem = items.first().map_or(Self::Json, |v| Self::of(&Value(v.clone())));
                Self::Array(Box::new(elem))
            }
            JsonValue::Null | JsonValue::Object(_) => Self::Json,
        }
    }

    /// Check if the type is `Int` or `Float`.
    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Int | Self::Float)
    }

    /// Element type if this is an array.
    pub fn element(&self) -> Option<&ValueType> {
        match self {
            Self::Array(elem) => Some(elem),
            _ => None,
        }
    }

    /// The value an absent operand of this type defaults to.
    pub fn zero_value(&self) -> Value {
        match self {
            Self::Bool => Value::bool(false),
            Self::Int => Value::int(0),
            Self::Float => Value::float(0.0),
            Self::String => Value::string(""),
            Self::Array(_) => Value::array(Vec::new()),
            Self::Entity(_) | Self::Json => Value::null(),
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool => write!(f, "Bool"),
            Self::Int => write!(f, "Int"),
            Self::Float => write!(f, "Float"),
            Self::String => write!(f, "String"),
            Self::Entity(name) => write!(f, "Entity({})", name),
            Self::Array(elem) => write!(f, "Array({})", elem),
            Self::Json => write!(f, "Json"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn value_nested_field_access() {
        let value = Value(json!({
            "author": { "name": "ada", "tags": ["x", "y"] }
        }));

        assert_eq!(
            value.get_field("author.name").and_then(|v| v.as_str().map(String::from)),
            Some("ada".to_string())
        );
        assert_eq!(value.get_field("author.tags[1]"), Some(Value::string("y")));
        assert!(value.get_field("author.missing").is_none());
    }

    #[test]
    fn string_form_unifies_literals() {
        assert_eq!(Value::string("5").string_form(), Value::int(5).string_form());
        assert_eq!(Value::bool(true).string_form(), "true");
        assert_eq!(Value::null().string_form(), "null");
    }

    #[test]
    fn write_json_appends() {
        let mut out = b"[".to_vec();
        Value(json!({"id": 5})).write_json(&mut out).unwrap();
        out.push(b']');
        assert_eq!(out, br#"[{"id":5}]"#);
    }

    #[test]
    fn literal_types() {
        assert_eq!(ValueType::of(&Value::int(3)), ValueType::Int);
        assert_eq!(ValueType::of(&Value::float(0.5)), ValueType::Float);
        assert_eq!(ValueType::of(&Value::string("a")), ValueType::String);
        assert_eq!(
            ValueType::of(&Value(json!([1, 2]))),
            ValueType::Array(Box::new(ValueType::Int))
        );
        assert_eq!(ValueType::of(&Value(json!({}))), ValueType::Json);
    }

    #[test]
    fn zero_values() {
        assert_eq!(ValueType::Int.zero_value(), Value::int(0));
        assert_eq!(ValueType::String.zero_value(), Value::string(""));
        assert!(ValueType::Entity("Article".into()).zero_value().is_null());
    }
}
