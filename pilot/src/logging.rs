//! Diagnostic tracing for pilot and pilot-tools.
//!
//! Tracing goes to stderr only. Stdout carries command output for `pilot`
//! and protocol lines for `pilot-tools`. Tool call records are product data
//! and are written by `io::execution_log`, independent of `RUST_LOG`.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_DIRECTIVE: &str = "warn";

/// Where stderr ends up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogTarget {
    /// A person's terminal; colors allowed.
    Terminal,
    /// Captured by a parent process (the agent spawning `pilot-tools`); plain text.
    Captured,
}

/// Install the global subscriber. `RUST_LOG` overrides the `warn` default.
///
/// ```bash
/// RUST_LOG=pilot=debug pilot ask "what time is it in Tokyo?"
/// ```
pub fn init(target: LogTarget) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(target == LogTarget::Terminal)
                .with_target(target == LogTarget::Captured)
                .compact(),
        )
        .init();
}
