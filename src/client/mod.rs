//! MCP client and the connector seam
//!
//! `McpClient` drives the initialize handshake and tool enumeration over a
//! transport. `Connector` is the boundary the orchestrator sees: give it a
//! server configuration, get the advertised tools or a typed failure. The
//! connection attempt races a fixed timeout; whichever settles first decides
//! the outcome, and the transport is released on every exit path.

pub mod mock;

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

use crate::config::ServerConfig;
use crate::error::ScanError;
use crate::protocol::mcp::{InitializeParams, InitializeResult, ListToolsResult, ServerCapabilities};
use crate::protocol::{Implementation, Tool};
use crate::transport::{self, Transport, TransportConfig};

pub use mock::{MockConnector, MockFailure};

/// Default bound for establishing a connection and listing tools
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Boundary between the orchestrator and the wire
#[async_trait]
pub trait Connector: Send + Sync {
    /// Connect to the server, enumerate its tools, and release the
    /// transport. Fails with `Connection` on an unreachable transport and
    /// `Timeout` when no response arrives within the bound.
    async fn get_tools(&self, server: &ServerConfig) -> Result<Vec<Tool>, ScanError>;
}

/// MCP client session over an open transport
pub struct McpClient {
    transport: Box<dyn Transport>,
    capabilities: ServerCapabilities,
}

impl McpClient {
    /// Open a transport and complete the initialize handshake
    pub async fn connect(server: &ServerConfig, client_info: Implementation) -> Result<Self> {
        let transport =
            transport::connect(&server.transport, TransportConfig::default()).await?;
        let mut client = Self {
            transport,
            capabilities: ServerCapabilities::default(),
        };
        let init = client.initialize(client_info).await?;
        debug!(
            "initialized {} {} over {}",
            init.server_info.name,
            init.server_info.version,
            client.transport.transport_type()
        );
        client.capabilities = init.capabilities;
        Ok(client)
    }

    async fn initialize(&mut self, client_info: Implementation) -> Result<InitializeResult> {
        let params = serde_json::to_value(InitializeParams::new(client_info))?;
        let result = self
            .transport
            .request("initialize", Some(params))
            .await
            .context("initialize request failed")?;
        let init: InitializeResult =
            serde_json::from_value(result).context("malformed initialize result")?;
        self.transport
            .notify("notifications/initialized", Some(json!({})))
            .await?;
        Ok(init)
    }

    /// Enumerate the server's advertised tools
    ///
    /// Servers that do not advertise the tools capability contribute an
    /// empty list.
    pub async fn list_tools(&mut self) -> Result<Vec<Tool>> {
        if !self.capabilities.has_tools() {
            return Ok(Vec::new());
        }
        let result = self
            .transport
            .request("tools/list", Some(json!({})))
            .await
            .context("tools/list request failed")?;
        let listed: ListToolsResult =
            serde_json::from_value(result).context("malformed tools/list result")?;
        Ok(listed.tools)
    }

    /// Release the transport
    pub async fn close(&mut self) -> Result<()> {
        self.transport.close().await
    }
}

/// Production connector: spawns or dials the server, bounded by a timeout
pub struct McpConnector {
    timeout: Duration,
    client_info: Implementation,
}

impl McpConnector {
    pub fn new() -> Self {
        Self::with_timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout,
            client_info: Implementation::new("mcpaudit", env!("CARGO_PKG_VERSION")),
        }
    }

    /// Identify to servers under a different client name
    pub fn identify_as(mut self, name: impl Into<String>) -> Self {
        self.client_info.name = name.into();
        self
    }
}

impl Default for McpConnector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Connector for McpConnector {
    async fn get_tools(&self, server: &ServerConfig) -> Result<Vec<Tool>, ScanError> {
        let timeout_secs = self.timeout.as_secs();

        // The connect attempt and the timeout race; on timeout the dropped
        // future tears the transport down via kill_on_drop.
        let connecting = McpClient::connect(server, self.client_info.clone());
        let mut client = match tokio::time::timeout(self.timeout, connecting).await {
            Ok(Ok(client)) => client,
            Ok(Err(err)) => return Err(ScanError::connection(&server.name, err)),
            Err(_) => return Err(ScanError::timeout(&server.name, timeout_secs)),
        };

        let listed = tokio::time::timeout(self.timeout, client.list_tools()).await;
        // Close on every exit path; close errors are swallowed
        let _ = client.close().await;

        match listed {
            Ok(Ok(tools)) => Ok(tools),
            Ok(Err(err)) => Err(ScanError::connection(&server.name, err)),
            Err(_) => Err(ScanError::timeout(&server.name, timeout_secs)),
        }
    }
}
