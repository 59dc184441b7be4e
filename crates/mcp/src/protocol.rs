//! JSON-RPC 2.0 message types for the MCP transport.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// MCP protocol version offered when the client does not name one.
pub const MCP_VERSION: &str = "2025-03-26";

/// JSON-RPC version tag.
pub const JSONRPC_VERSION: &str = "2.0";

/// Standard JSON-RPC error codes
pub mod error_codes {
    /// Invalid JSON
    pub const PARSE_ERROR: i32 = -32700;
    /// Not a valid request object
    pub const INVALID_REQUEST: i32 = -32600;
    /// Method does not exist
    pub const METHOD_NOT_FOUND: i32 = -32601;
    /// Invalid method parameters
    pub const INVALID_PARAMS: i32 = -32602;
    /// Internal error
    pub const INTERNAL_ERROR: i32 = -32603;
}

/// Incoming request or notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    /// Must be "2.0"
    pub jsonrpc: String,
    /// Absent for notifications; an explicit `null` is still a request
    #[serde(
        default,
        deserialize_with = "present_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<Value>,
    /// Method name
    pub method: String,
    /// Method parameters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl JsonRpcRequest {
    /// Notifications never get a response.
    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }
}

/// Only called when the member exists, so `null` maps to `Some(Value::Null)`.
fn present_id<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

/// Outgoing response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    /// Always "2.0"
    pub jsonrpc: String,
    /// Request id, `null` when it could not be read
    pub id: Value,
    /// Result data
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    /// Successful response.
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Error response.
    pub fn failure(id: Value, error: JsonRpcError) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: None,
            error: Some(error),
        }
    }
}

/// JSON-RPC error object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcError {
    /// Error code
    pub code: i32,
    /// Message
    pub message: String,
    /// Extra data
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcError {
    /// Error with a code and message.
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    /// `-32700`
    pub fn parse_error(detail: impl std::fmt::Display) -> Self {
        Self::new(error_codes::PARSE_ERROR, format!("Parse error: {}", detail))
    }

    /// `-32600`
    pub fn invalid_request(detail: impl std::fmt::Display) -> Self {
        Self::new(
            error_codes::INVALID_REQUEST,
            format!("Invalid request: {}", detail),
        )
    }

    /// `-32601`
    pub fn method_not_found(method: &str) -> Self {
        Self::new(
            error_codes::METHOD_NOT_FOUND,
            format!("Method not found: {}", method),
        )
    }

    /// `-32602`
    pub fn invalid_params(detail: impl std::fmt::Display) -> Self {
        Self::new(error_codes::INVALID_PARAMS, detail.to_string())
    }
}

/// Parameters of `tools/call`.
#[derive(Debug, Clone, Deserialize)]
pub struct ToolCallParams {
    /// Tool name
    pub name: String,
    /// Tool arguments
    #[serde(default)]
    pub arguments: Option<Value>,
}

/// Text content block of a tool result.
pub fn text_result(text: impl Into<String>, is_error: bool) -> Value {
    serde_json::json!({
        "content": [{
            "type": "text",
            "text": text.into()
        }],
        "isError": is_error
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_parse() {
        let req: JsonRpcRequest = serde_json::from_value(json!({
            "jsonrpc": "2.0",
            "id": 7,
            "method": "tools/list"
        }))
        .unwrap();
        assert_eq!(req.method, "tools/list");
        assert_eq!(req.id, Some(json!(7)));
        assert!(!req.is_notification());
        assert!(req.params.is_none());
    }

    #[test]
    fn test_notification_has_no_id() {
        let req: JsonRpcRequest = serde_json::from_value(json!({
            "jsonrpc": "2.0",
            "method": "notifications/initialized"
        }))
        .unwrap();
        assert!(req.is_notification());
    }

    #[test]
    fn test_null_id_is_a_request() {
        let req: JsonRpcRequest = serde_json::from_value(json!({
            "jsonrpc": "2.0",
            "id": null,
            "method": "ping"
        }))
        .unwrap();
        assert_eq!(req.id, Some(Value::Null));
        assert!(!req.is_notification());
    }

    #[test]
    fn test_response_serialization() {
        let ok = serde_json::to_value(JsonRpcResponse::success(json!("a"), json!({}))).unwrap();
        assert_eq!(ok, json!({"jsonrpc": "2.0", "id": "a", "result": {}}));

        let err = serde_json::to_value(JsonRpcResponse::failure(
            Value::Null,
            JsonRpcError::method_not_found("nope"),
        ))
        .unwrap();
        assert_eq!(err["id"], Value::Null);
        assert_eq!(err["error"]["code"], -32601);
        assert!(err.get("result").is_none());
        assert!(err["error"].get("data").is_none());
    }

    #[test]
    fn test_text_result() {
        let result = text_result("hello", true);
        assert_eq!(result["content"][0]["type"], "text");
        assert_eq!(result["content"][0]["text"], "hello");
        assert_eq!(result["isError"], true);
    }
}
