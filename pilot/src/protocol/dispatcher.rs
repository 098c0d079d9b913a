//! Routes decoded requests to the tool registry.

use std::any::Any;
use std::thread;
use std::time::Instant;

use chrono::Utc;
use serde_json::{Map, Value, json};
use tracing::{debug, info, warn};

use crate::core::types::ToolExecutionRecord;
use crate::io::execution_log::ExecutionLogSink;
use crate::protocol::envelope::{INVALID_PARAMS, METHOD_NOT_FOUND, Request, Response};
use crate::tools::value::{args_from_json, args_to_json};
use crate::tools::{Tool, ToolArgs, ToolRegistry, ToolResult, input_schema};

pub const PROTOCOL_VERSION: &str = "2024-11-05";
pub const SERVER_NAME: &str = "pilot";

/// Routes decoded requests to the tool registry.
pub struct Dispatcher<'a> {
    registry: &'a ToolRegistry,
    sink: &'a dyn ExecutionLogSink,
}

impl<'a> Dispatcher<'a> {
    pub fn new(registry: &'a ToolRegistry, sink: &'a dyn ExecutionLogSink) -> Self {
        Self { registry, sink }
    }

    /// Response for `request`, or `None` when nothing must be written back.
    pub fn handle(&self, request: &Request) -> Option<Response> {
        let Some(id) = request.id else {
            debug!(method = %request.method, "notification received");
            return None;
        };
        match request.method.as_str() {
            "initialize" => Some(Response::success(id, initialize_result())),
            "notifications/initialized" => None,
            "tools/list" => Some(Response::success(id, self.list_tools())),
            "tools/call" => Some(self.call_tool(id, &request.params)),
            other => Some(Response::error(
                Some(id),
                METHOD_NOT_FOUND,
                format!("Method not found: {other}"),
            )),
        }
    }

    fn list_tools(&self) -> Value {
        let tools: Vec<Value> = self
            .registry
            .tools()
            .map(|tool| {
                json!({
                    "name": tool.name(),
                    "description": tool.description(),
                    "inputSchema": input_schema(tool.parameters()),
                })
            })
            .collect();
        json!({ "tools": tools })
    }

    fn call_tool(&self, id: i64, params: &Map<String, Value>) -> Response {
        let Some(name) = params.get("name").and_then(Value::as_str) else {
            return Response::error(
                Some(id),
                INVALID_PARAMS,
                "Missing 'name' in tools/call params",
            );
        };
        let Some(tool) = self.registry.get(name) else {
            return Response::error(Some(id), INVALID_PARAMS, format!("Unknown tool: {name}"));
        };
        let args = args_from_json(params.get("arguments"));

        let executed_at = Utc::now();
        let started = Instant::now();
        let result = run_tool(tool, &args);
        let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        info!(
            tool = name,
            is_error = result.is_error,
            duration_ms,
            "tool call finished"
        );

        let record = ToolExecutionRecord {
            tool_name: name.to_string(),
            arguments_json: args_to_json(&args),
            result_content: result.content.clone(),
            is_error: result.is_error,
            executed_at,
            duration_ms,
        };
        if let Err(err) = self.sink.record(&record) {
            warn!(tool = name, err = %format!("{err:#}"), "failed to record tool execution");
        }

        Response::success(
            id,
            json!({
                "content": [{ "type": "text", "text": result.content }],
                "isError": result.is_error,
            }),
        )
    }
}

fn initialize_result() -> Value {
    json!({
        "protocolVersion": PROTOCOL_VERSION,
        "capabilities": { "tools": {} },
        "serverInfo": {
            "name": SERVER_NAME,
            "version": env!("CARGO_PKG_VERSION"),
        },
    })
}

/// Execute on a scoped worker thread; a panic becomes an error result.
fn run_tool(tool: &dyn Tool, args: &ToolArgs) -> ToolResult {
    thread::scope(|scope| {
        let worker = scope.spawn(|| tool.execute(args));
        worker.join().unwrap_or_else(|panic| {
            warn!(tool = tool.name(), "tool panicked");
            ToolResult::failure(format!(
                "Tool execution failed: {}",
                panic_message(&*panic)
            ))
        })
    })
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(message) = panic.downcast_ref::<&str>() {
        *message
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.as_str()
    } else {
        "tool panicked"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::clipboard::MemoryClipboard;
    use crate::io::execution_log::DiscardLog;
    use crate::protocol::envelope::JSONRPC_VERSION;
    use crate::test_support::{FakeNotifier, MemoryLog};
    use crate::tools::{ParameterType, ToolParameter};
    use std::sync::Arc;

    fn registry() -> ToolRegistry {
        ToolRegistry::builtin(
            Arc::new(MemoryClipboard::with_text("copied text")),
            Arc::new(FakeNotifier::delivering()),
            "/bin/sh",
        )
    }

    fn request(id: Option<i64>, method: &str, params: Value) -> Request {
        let Value::Object(params) = params else {
            panic!("params must be an object");
        };
        Request {
            id,
            method: method.to_string(),
            params,
        }
    }

    #[test]
    fn initialize_reports_server_info() {
        let registry = registry();
        let dispatcher = Dispatcher::new(&registry, &DiscardLog);
        let response = dispatcher
            .handle(&request(Some(1), "initialize", json!({})))
            .expect("response");
        let result = response.result.expect("result");
        assert_eq!(response.jsonrpc, JSONRPC_VERSION);
        assert_eq!(result["protocolVersion"], "2024-11-05");
        assert_eq!(result["capabilities"]["tools"], json!({}));
        assert_eq!(result["serverInfo"]["name"], "pilot");
    }

    #[test]
    fn notifications_are_never_answered() {
        let registry = registry();
        let dispatcher = Dispatcher::new(&registry, &DiscardLog);
        for method in ["initialize", "tools/list", "tools/call", "bogus"] {
            assert!(dispatcher.handle(&request(None, method, json!({}))).is_none());
        }
        assert!(
            dispatcher
                .handle(&request(Some(4), "notifications/initialized", json!({})))
                .is_none()
        );
    }

    #[test]
    fn unknown_method_is_method_not_found() {
        let registry = registry();
        let dispatcher = Dispatcher::new(&registry, &DiscardLog);
        let response = dispatcher
            .handle(&request(Some(2), "resources/list", json!({})))
            .expect("response");
        let error = response.error.expect("error");
        assert_eq!(error.code, METHOD_NOT_FOUND);
        assert_eq!(error.message, "Method not found: resources/list");
        assert_eq!(response.id, Some(2));
    }

    #[test]
    fn tools_list_describes_every_tool_in_order() {
        let registry = registry();
        let dispatcher = Dispatcher::new(&registry, &DiscardLog);
        let result = dispatcher
            .handle(&request(Some(3), "tools/list", json!({})))
            .and_then(|response| response.result)
            .expect("result");
        let tools = result["tools"].as_array().expect("tools");
        let names: Vec<&str> = tools.iter().filter_map(|tool| tool["name"].as_str()).collect();
        assert_eq!(names, ["clipboard", "notification", "shell", "web"]);
        let clipboard = &tools[0]["inputSchema"];
        assert_eq!(clipboard["type"], "object");
        assert_eq!(clipboard["properties"]["action"]["enum"], json!(["read", "write"]));
        assert_eq!(clipboard["required"], json!(["action"]));
    }

    #[test]
    fn call_without_name_is_invalid_params() {
        let registry = registry();
        let dispatcher = Dispatcher::new(&registry, &DiscardLog);
        let error = dispatcher
            .handle(&request(Some(5), "tools/call", json!({"arguments": {}})))
            .and_then(|response| response.error)
            .expect("error");
        assert_eq!(error.code, INVALID_PARAMS);
    }

    #[test]
    fn call_to_unknown_tool_is_invalid_params() {
        let registry = registry();
        let log = MemoryLog::default();
        let dispatcher = Dispatcher::new(&registry, &log);
        let error = dispatcher
            .handle(&request(Some(6), "tools/call", json!({"name": "teleport"})))
            .and_then(|response| response.error)
            .expect("error");
        assert_eq!(error.code, INVALID_PARAMS);
        assert_eq!(error.message, "Unknown tool: teleport");
        assert!(log.records().is_empty());
    }

    #[test]
    fn call_returns_text_content_and_records_execution() {
        let registry = registry();
        let log = MemoryLog::default();
        let dispatcher = Dispatcher::new(&registry, &log);
        let result = dispatcher
            .handle(&request(
                Some(7),
                "tools/call",
                json!({"name": "clipboard", "arguments": {"action": "read"}}),
            ))
            .and_then(|response| response.result)
            .expect("result");
        assert_eq!(
            result,
            json!({"content": [{"type": "text", "text": "copied text"}], "isError": false})
        );

        let records = log.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].tool_name, "clipboard");
        assert_eq!(records[0].arguments_json, r#"{"action":"read"}"#);
        assert_eq!(records[0].result_content, "copied text");
        assert!(!records[0].is_error);
    }

    #[test]
    fn failing_tool_is_a_result_not_a_protocol_error() {
        let registry = registry();
        let log = MemoryLog::default();
        let dispatcher = Dispatcher::new(&registry, &log);
        let response = dispatcher
            .handle(&request(
                Some(8),
                "tools/call",
                json!({"name": "clipboard", "arguments": {"action": "shred"}}),
            ))
            .expect("response");
        assert!(response.error.is_none());
        assert_eq!(response.result.expect("result")["isError"], true);
        assert!(log.records()[0].is_error);
    }

    struct Panicking;

    impl Tool for Panicking {
        fn name(&self) -> &str {
            "panicky"
        }
        fn description(&self) -> &str {
            "Always panics."
        }
        fn parameters(&self) -> &[ToolParameter] {
            const PARAMS: &[ToolParameter] = &[ToolParameter {
                name: "x",
                description: "unused",
                kind: ParameterType::Boolean,
                required: false,
                enum_values: None,
            }];
            PARAMS
        }
        fn execute(&self, _args: &ToolArgs) -> ToolResult {
            panic!("boom");
        }
    }

    #[test]
    fn panicking_tool_becomes_error_result() {
        let tools: Vec<Arc<dyn Tool>> = vec![Arc::new(Panicking)];
        let registry = ToolRegistry::new(tools);
        let log = MemoryLog::default();
        let dispatcher = Dispatcher::new(&registry, &log);
        let result = dispatcher
            .handle(&request(Some(9), "tools/call", json!({"name": "panicky"})))
            .and_then(|response| response.result)
            .expect("result");
        assert_eq!(result["isError"], true);
        assert_eq!(result["content"][0]["text"], "Tool execution failed: boom");
        assert_eq!(log.records().len(), 1);
    }
}
