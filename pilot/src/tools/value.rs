//! Argument values passed to tools.

use std::collections::BTreeMap;

use serde_json::Value;

/// Tool arguments keyed by parameter name.
pub type ToolArgs = BTreeMap<String, ToolValue>;

/// A scalar JSON value as seen by a tool.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolValue {
    String(String),
    Integer(i64),
    Number(f64),
    Boolean(bool),
    Null,
}

impl ToolValue {
    /// Decode a JSON value, trying boolean, integer, number, string, then null.
    ///
    /// Integral numbers decode as [`ToolValue::Integer`]. Arrays and objects are not
    /// scalars; they are kept as their compact JSON text.
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Bool(b) => ToolValue::Boolean(*b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    ToolValue::Integer(i)
                } else {
                    match n.as_f64() {
                        Some(f) if is_integral(f) => ToolValue::Integer(f as i64),
                        Some(f) => ToolValue::Number(f),
                        None => ToolValue::String(n.to_string()),
                    }
                }
            }
            Value::String(s) => ToolValue::String(s.clone()),
            Value::Null => ToolValue::Null,
            Value::Array(_) | Value::Object(_) => ToolValue::String(value.to_string()),
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            ToolValue::String(s) => Value::String(s.clone()),
            ToolValue::Integer(i) => Value::from(*i),
            ToolValue::Number(f) => Value::from(*f),
            ToolValue::Boolean(b) => Value::Bool(*b),
            ToolValue::Null => Value::Null,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ToolValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ToolValue::Integer(i) => Some(*i),
            _ => None,
        }
    }
}

fn is_integral(f: f64) -> bool {
    f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64
}

/// Coerce a JSON `arguments` object into tool arguments.
///
/// Anything other than an object yields no arguments.
pub fn args_from_json(value: Option<&Value>) -> ToolArgs {
    match value {
        Some(Value::Object(map)) => map
            .iter()
            .map(|(key, value)| (key.clone(), ToolValue::from_json(value)))
            .collect(),
        _ => ToolArgs::new(),
    }
}

/// Compact JSON text of tool arguments, as stored in execution records.
pub fn args_to_json(args: &ToolArgs) -> String {
    let map: serde_json::Map<String, Value> = args
        .iter()
        .map(|(key, value)| (key.clone(), value.to_json()))
        .collect();
    Value::Object(map).to_string()
}
