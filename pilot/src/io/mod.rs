//! I/O helpers: agent subprocesses, desktop capabilities, and on-disk stores.

pub mod clipboard;
pub mod config;
pub mod execution_log;
pub mod invoker;
pub mod mcp_config;
pub mod notifier;
pub mod process;
pub mod prompt;
pub mod resolver;
pub mod session_store;
