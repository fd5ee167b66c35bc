//! MCP protocol definitions and JSON-RPC message types

pub mod jsonrpc;
pub mod mcp;

pub use jsonrpc::{JsonRpcNotification, JsonRpcRequest, JsonRpcResponse};
pub use mcp::{Implementation, InitializeResult, ListToolsResult, Tool};
