//! JSON-RPC 2.0 message framing shared by the transports

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const JSONRPC_VERSION: &str = "2.0";

/// Outgoing request with a numeric id
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: &'static str,
    pub id: u64,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl JsonRpcRequest {
    pub fn new(id: u64, method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            method: method.into(),
            params,
        }
    }
}

/// Outgoing notification (no response expected)
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcNotification {
    pub jsonrpc: &'static str,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl JsonRpcNotification {
    pub fn new(method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            method: method.into(),
            params,
        }
    }
}

/// Incoming response, either a result or an error object
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcResponse {
    #[allow(dead_code)]
    pub jsonrpc: Option<String>,
    pub id: Option<Value>,
    pub result: Option<Value>,
    pub error: Option<JsonRpcErrorObject>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcErrorObject {
    pub code: i64,
    pub message: String,
    #[allow(dead_code)]
    pub data: Option<Value>,
}

impl JsonRpcResponse {
    /// Unwrap the result payload, turning a protocol-level error object
    /// into an `Err`
    pub fn into_result(self) -> anyhow::Result<Value> {
        if let Some(err) = self.error {
            anyhow::bail!("JSON-RPC error {}: {}", err.code, err.message);
        }
        Ok(self.result.unwrap_or(Value::Null))
    }

    /// Whether this message answers the given request id
    pub fn answers(&self, id: u64) -> bool {
        matches!(&self.id, Some(Value::Number(n)) if n.as_u64() == Some(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_serializes_without_null_params() {
        let req = JsonRpcRequest::new(1, "tools/list", None);
        let text = serde_json::to_string(&req).unwrap();
        assert!(!text.contains("params"));
        assert!(text.contains("\"jsonrpc\":\"2.0\""));
    }

    #[test]
    fn response_result_roundtrip() {
        let raw = json!({"jsonrpc": "2.0", "id": 3, "result": {"tools": []}});
        let resp: JsonRpcResponse = serde_json::from_value(raw).unwrap();
        assert!(resp.answers(3));
        assert!(!resp.answers(4));
        let value = resp.into_result().unwrap();
        assert!(value.get("tools").is_some());
    }

    #[test]
    fn response_error_becomes_err() {
        let raw = json!({"jsonrpc": "2.0", "id": 1, "error": {"code": -32601, "message": "method not found"}});
        let resp: JsonRpcResponse = serde_json::from_value(raw).unwrap();
        let err = resp.into_result().unwrap_err();
        assert!(err.to_string().contains("method not found"));
    }
}
