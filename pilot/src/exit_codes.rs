//! Stable exit codes for pilot CLI commands.

/// Command succeeded.
pub const OK: i32 = 0;
/// Invalid input or configuration, or any failure not covered below.
pub const INVALID: i32 = 1;
/// The agent executable could not be found or started.
pub const AGENT_NOT_FOUND: i32 = 2;
/// The agent ran but failed: non-zero exit, timeout, or unusable output.
pub const AGENT_FAILED: i32 = 3;
