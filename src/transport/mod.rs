//! Transport layer for MCP server communication
//!
//! Two transports cover the configured spectrum: `stdio` spawns a local
//! server process and speaks JSON-RPC over its pipes, `streamable_http`
//! POSTs JSON-RPC to a streamed endpoint. The scan core never sees these
//! directly; it goes through the `Connector` seam in `client`.

pub mod stdio;
pub mod streamable_http;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

use crate::config::TransportSpec;

pub use stdio::StdioTransport;
pub use streamable_http::HttpTransport;

/// MCP transport abstraction
#[async_trait]
pub trait Transport: Send {
    /// Send a JSON-RPC request and wait for its response payload
    async fn request(&mut self, method: &str, params: Option<Value>) -> Result<Value>;

    /// Send a notification (no response expected)
    async fn notify(&mut self, method: &str, params: Option<Value>) -> Result<()>;

    /// Release the transport resource. Must be safe to call on every exit
    /// path; close errors are swallowed by callers.
    async fn close(&mut self) -> Result<()>;

    /// Transport type name for logging
    fn transport_type(&self) -> &'static str;
}

/// Transport tunables
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Bound for a single request/response exchange in seconds
    pub timeout_secs: u64,
    /// Maximum accepted message size in bytes
    pub max_message_size: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            max_message_size: 10 * 1024 * 1024,
        }
    }
}

/// Open a transport for the given server configuration
pub async fn connect(spec: &TransportSpec, config: TransportConfig) -> Result<Box<dyn Transport>> {
    match spec {
        TransportSpec::Stdio { command, args, env } => {
            let transport = StdioTransport::spawn(command, args, env, config).await?;
            Ok(Box::new(transport))
        }
        TransportSpec::Http { url } => {
            let transport = HttpTransport::new(url, config)?;
            Ok(Box::new(transport))
        }
    }
}
