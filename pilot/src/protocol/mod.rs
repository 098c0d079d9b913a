//! Newline-delimited JSON-RPC server exposing the tool registry to the agent.

pub mod dispatcher;
pub mod envelope;
pub mod transport;

pub use dispatcher::Dispatcher;
pub use transport::serve;
