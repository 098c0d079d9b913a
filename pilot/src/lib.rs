//! Desktop assistant bridge to a locally installed agent CLI.
//!
//! The crate drives the `claude` executable as a subprocess and hosts the
//! tools it may call back into:
//!
//! - **[`core`]**: Pure logic (argument vectors, output parsing, shared types).
//!   No I/O, fully testable in isolation.
//! - **[`io`]**: Side-effecting operations (subprocesses, clipboard,
//!   notifications, config and on-disk stores).
//! - **[`tools`]** and **[`protocol`]**: The tool registry and the
//!   newline-delimited JSON-RPC server the `pilot-tools` binary runs.
//!
//! [`assistant`] coordinates core logic with I/O to implement CLI commands.

pub mod assistant;
pub mod core;
pub mod exit_codes;
pub mod io;
pub mod logging;
pub mod protocol;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
pub mod tools;
