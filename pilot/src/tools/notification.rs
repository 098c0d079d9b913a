use std::sync::Arc;

use crate::io::notifier::{NotificationOutcome, Notifier};
use crate::tools::{ParameterType, Tool, ToolArgs, ToolParameter, ToolResult, required_str};

const PARAMETERS: &[ToolParameter] = &[
    ToolParameter {
        name: "title",
        description: "The notification title.",
        kind: ParameterType::String,
        required: true,
        enum_values: None,
    },
    ToolParameter {
        name: "body",
        description: "The notification body text.",
        kind: ParameterType::String,
        required: true,
        enum_values: None,
    },
];

pub const DENIED_GUIDANCE: &str = "Notification permission denied. \
Please enable notifications for Pilot in your system notification settings.";

/// Posts a desktop notification.
pub struct NotificationTool {
    notifier: Arc<dyn Notifier>,
}

impl NotificationTool {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self { notifier }
    }
}

impl Tool for NotificationTool {
    fn name(&self) -> &str {
        "notification"
    }

    fn description(&self) -> &str {
        "Send a desktop notification with a title and body."
    }

    fn parameters(&self) -> &[ToolParameter] {
        PARAMETERS
    }

    fn execute(&self, args: &ToolArgs) -> ToolResult {
        let title = match required_str(args, "title") {
            Ok(title) => title,
            Err(missing) => return missing,
        };
        let body = match required_str(args, "body") {
            Ok(body) => body,
            Err(missing) => return missing,
        };
        match self.notifier.send(title, body) {
            Ok(NotificationOutcome::Delivered) => ToolResult::success("Notification sent."),
            Ok(NotificationOutcome::Denied) => ToolResult::success(DENIED_GUIDANCE),
            Err(err) => ToolResult::failure(format!("Failed to send notification: {err:#}")),
        }
    }
}
