//! JSON-RPC 2.0 request and response envelopes.

use serde::Serialize;
use serde_json::{Map, Value};

pub const JSONRPC_VERSION: &str = "2.0";

pub const PARSE_ERROR: i64 = -32700;
pub const METHOD_NOT_FOUND: i64 = -32601;
pub const INVALID_PARAMS: i64 = -32602;

/// A decoded request. `id: None` marks a notification.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub id: Option<i64>,
    pub method: String,
    pub params: Map<String, Value>,
}

impl Request {
    /// Decode one request line.
    ///
    /// Returns `None` unless the line is a JSON object with a string `method`.
    /// Only integer ids are recognized; a non-object `params` is treated as empty.
    pub fn parse(line: &str) -> Option<Self> {
        let Value::Object(mut object) = serde_json::from_str(line).ok()? else {
            return None;
        };
        let method = match object.remove("method") {
            Some(Value::String(method)) => method,
            _ => return None,
        };
        let id = object.get("id").and_then(Value::as_i64);
        let params = match object.remove("params") {
            Some(Value::Object(params)) => params,
            _ => Map::new(),
        };
        Some(Self { id, method, params })
    }

    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }
}

/// Integer `id` of a line that may not be a valid request.
pub fn extract_id(line: &str) -> Option<i64> {
    match serde_json::from_str::<Value>(line) {
        Ok(Value::Object(object)) => object.get("id").and_then(Value::as_i64),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorObject {
    pub code: i64,
    pub message: String,
}

/// A response line. Exactly one of `result` and `error` is set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Response {
    pub jsonrpc: &'static str,
    pub id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorObject>,
}

impl Response {
    pub fn success(id: i64, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id: Some(id),
            result: Some(result),
            error: None,
        }
    }

    /// Error response; a missing id serializes as `null`.
    pub fn error(id: Option<i64>, code: i64, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            result: None,
            error: Some(ErrorObject {
                code,
                message: message.into(),
            }),
        }
    }
}
