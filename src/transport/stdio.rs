//! Stdio transport for locally spawned MCP servers

use std::collections::HashMap;
use std::process::Stdio;

use anyhow::{Context, Result};
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};

use crate::protocol::jsonrpc::{JsonRpcNotification, JsonRpcRequest, JsonRpcResponse};

use super::{Transport, TransportConfig};

/// Communicates with a spawned MCP server over stdin/stdout, one JSON-RPC
/// message per line
pub struct StdioTransport {
    child: Child,
    stdin: ChildStdin,
    reader: BufReader<ChildStdout>,
    config: TransportConfig,
    request_id: u64,
}

impl StdioTransport {
    /// Spawn the server process and wire up its pipes
    ///
    /// `kill_on_drop` covers the path where a connection timeout drops the
    /// in-flight future before `close` can run.
    pub async fn spawn(
        command: &str,
        args: &[String],
        env: &HashMap<String, String>,
        config: TransportConfig,
    ) -> Result<Self> {
        let mut child = Command::new(command)
            .args(args)
            .envs(env)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("failed to spawn MCP server process '{}'", command))?;

        let stdin = child.stdin.take().context("child stdin unavailable")?;
        let stdout = child.stdout.take().context("child stdout unavailable")?;

        Ok(Self {
            child,
            stdin,
            reader: BufReader::new(stdout),
            config,
            request_id: 0,
        })
    }

    fn next_id(&mut self) -> u64 {
        self.request_id += 1;
        self.request_id
    }

    async fn write_line(&mut self, payload: &str) -> Result<()> {
        self.stdin.write_all(payload.as_bytes()).await?;
        self.stdin.write_all(b"\n").await?;
        self.stdin.flush().await?;
        Ok(())
    }

    /// Read lines until the response with the given id arrives, skipping
    /// interleaved server notifications
    async fn read_response(&mut self, id: u64) -> Result<JsonRpcResponse> {
        loop {
            let mut line = String::new();
            let read = self.reader.read_line(&mut line).await?;
            if read == 0 {
                anyhow::bail!("server closed its stdout before responding");
            }
            if line.len() > self.config.max_message_size {
                anyhow::bail!("server message exceeds {} bytes", self.config.max_message_size);
            }
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            match serde_json::from_str::<JsonRpcResponse>(trimmed) {
                Ok(response) if response.answers(id) => return Ok(response),
                Ok(_) => continue,
                Err(_) => continue,
            }
        }
    }
}

#[async_trait::async_trait]
impl Transport for StdioTransport {
    async fn request(&mut self, method: &str, params: Option<Value>) -> Result<Value> {
        let id = self.next_id();
        let request = JsonRpcRequest::new(id, method, params);
        self.write_line(&serde_json::to_string(&request)?).await?;
        self.read_response(id).await?.into_result()
    }

    async fn notify(&mut self, method: &str, params: Option<Value>) -> Result<()> {
        let notification = JsonRpcNotification::new(method, params);
        self.write_line(&serde_json::to_string(&notification)?).await
    }

    async fn close(&mut self) -> Result<()> {
        self.child.kill().await?;
        Ok(())
    }

    fn transport_type(&self) -> &'static str {
        "stdio"
    }
}
