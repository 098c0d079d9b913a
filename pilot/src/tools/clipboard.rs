use std::sync::Arc;

use crate::io::clipboard::Clipboard;
use crate::tools::{ParameterType, Tool, ToolArgs, ToolParameter, ToolResult, required_str};

const PARAMETERS: &[ToolParameter] = &[
    ToolParameter {
        name: "action",
        description: "The action to perform: 'read' to get clipboard contents, 'write' to set them.",
        kind: ParameterType::String,
        required: true,
        enum_values: Some(&["read", "write"]),
    },
    ToolParameter {
        name: "content",
        description: "The text to write to the clipboard. Required when action is 'write'.",
        kind: ParameterType::String,
        required: false,
        enum_values: None,
    },
];

/// Reads or replaces the clipboard text.
pub struct ClipboardTool {
    clipboard: Arc<dyn Clipboard>,
}

impl ClipboardTool {
    pub fn new(clipboard: Arc<dyn Clipboard>) -> Self {
        Self { clipboard }
    }
}

impl Tool for ClipboardTool {
    fn name(&self) -> &str {
        "clipboard"
    }

    fn description(&self) -> &str {
        "Read or write the system clipboard."
    }

    fn parameters(&self) -> &[ToolParameter] {
        PARAMETERS
    }

    fn execute(&self, args: &ToolArgs) -> ToolResult {
        let action = match required_str(args, "action") {
            Ok(action) => action,
            Err(missing) => return missing,
        };
        match action {
            "read" => match self.clipboard.read_text() {
                Ok(Some(text)) => ToolResult::success(text),
                Ok(None) => ToolResult::success("Clipboard is empty."),
                Err(err) => ToolResult::failure(format!("Failed to read clipboard: {err:#}")),
            },
            "write" => {
                let content = match required_str(args, "content") {
                    Ok(content) => content,
                    Err(missing) => return missing,
                };
                match self.clipboard.write_text(content) {
                    Ok(()) => ToolResult::success("Clipboard updated."),
                    Err(err) => ToolResult::failure(format!("Failed to write clipboard: {err:#}")),
                }
            }
            other => ToolResult::failure(format!("Unknown action: {other}. Use 'read' or 'write'.")),
        }
    }
}
