//! Pure logic for agent invocations: argument vectors, output parsing, and
//! the types and errors shared across the crate.

pub mod args;
pub mod error;
pub mod output;
pub mod text;
pub mod types;
