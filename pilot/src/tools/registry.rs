use std::collections::HashMap;
use std::sync::Arc;

use tracing::warn;

use crate::io::clipboard::Clipboard;
use crate::io::notifier::Notifier;
use crate::tools::Tool;
use crate::tools::clipboard::ClipboardTool;
use crate::tools::notification::NotificationTool;
use crate::tools::shell::ShellTool;
use crate::tools::web::WebTool;

/// Fixed set of tools, looked up by name. Immutable after construction.
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
    by_name: HashMap<String, usize>,
}

impl ToolRegistry {
    /// Register `tools` in order. A repeated name keeps the first registration.
    pub fn new(tools: Vec<Arc<dyn Tool>>) -> Self {
        let mut kept: Vec<Arc<dyn Tool>> = Vec::with_capacity(tools.len());
        let mut by_name = HashMap::with_capacity(tools.len());
        for tool in tools {
            let name = tool.name().to_string();
            if by_name.contains_key(&name) {
                warn!(tool = %name, "duplicate tool name; keeping first registration");
                continue;
            }
            by_name.insert(name, kept.len());
            kept.push(tool);
        }
        Self {
            tools: kept,
            by_name,
        }
    }

    /// The built-in tools: clipboard, notification, shell, web.
    pub fn builtin(
        clipboard: Arc<dyn Clipboard>,
        notifier: Arc<dyn Notifier>,
        shell: impl Into<String>,
    ) -> Self {
        let tools: Vec<Arc<dyn Tool>> = vec![
            Arc::new(ClipboardTool::new(clipboard)),
            Arc::new(NotificationTool::new(notifier)),
            Arc::new(ShellTool::new(shell)),
            Arc::new(WebTool::new()),
        ];
        Self::new(tools)
    }

    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.by_name.get(name).map(|&idx| self.tools[idx].as_ref())
    }

    /// Tools in registration order.
    pub fn tools(&self) -> impl Iterator<Item = &dyn Tool> {
        self.tools.iter().map(AsRef::as_ref)
    }
}
