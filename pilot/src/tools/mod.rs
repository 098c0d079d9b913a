//! Local tools the agent can call through the protocol server.
//!
//! Every tool reports failure through [`ToolResult::failure`]; a failing tool
//! is never a protocol error.

pub mod clipboard;
pub mod notification;
pub mod registry;
pub mod shell;
pub mod value;
pub mod web;

use serde::Serialize;
use serde_json::{Map, Value, json};

pub use registry::ToolRegistry;
pub use value::{ToolArgs, ToolValue};

/// A capability exposed to the agent.
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    fn parameters(&self) -> &[ToolParameter];
    fn execute(&self, args: &ToolArgs) -> ToolResult;
}

/// JSON Schema type of a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterType {
    String,
    Integer,
    Number,
    Boolean,
}

#[derive(Debug, Clone, Copy)]
pub struct ToolParameter {
    pub name: &'static str,
    pub description: &'static str,
    pub kind: ParameterType,
    pub required: bool,
    pub enum_values: Option<&'static [&'static str]>,
}

/// Outcome of one tool execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolResult {
    pub content: String,
    pub is_error: bool,
}

impl ToolResult {
    pub fn success(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_error: false,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            content: message.into(),
            is_error: true,
        }
    }
}

/// JSON Schema object describing a tool's parameters.
pub fn input_schema(parameters: &[ToolParameter]) -> Value {
    let mut properties = Map::new();
    let mut required = Vec::new();
    for param in parameters {
        let mut prop = json!({
            "type": param.kind,
            "description": param.description,
        });
        if let Some(values) = param.enum_values {
            prop["enum"] = json!(values);
        }
        properties.insert(param.name.to_string(), prop);
        if param.required {
            required.push(param.name);
        }
    }
    json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}

/// String argument that must be present.
pub(crate) fn required_str<'a>(args: &'a ToolArgs, name: &str) -> Result<&'a str, ToolResult> {
    args.get(name)
        .and_then(ToolValue::as_str)
        .ok_or_else(|| ToolResult::failure(format!("Missing required parameter: {name}")))
}
