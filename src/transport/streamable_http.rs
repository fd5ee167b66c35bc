//! Streamable HTTP transport (MCP 2025 spec)
//!
//! POSTs JSON-RPC messages to the endpoint. Responses arrive either as
//! plain JSON or as a short SSE stream whose first `data:` line carries the
//! response object; both shapes are handled. The session id returned by the
//! server is echoed on subsequent requests and released on close.

use anyhow::{Context, Result};
use serde_json::Value;
use std::time::Duration;

use crate::protocol::jsonrpc::{JsonRpcNotification, JsonRpcRequest, JsonRpcResponse};

use super::{Transport, TransportConfig};

const SESSION_HEADER: &str = "Mcp-Session-Id";

pub struct HttpTransport {
    url: String,
    client: reqwest::Client,
    request_id: u64,
    session_id: Option<String>,
}

impl HttpTransport {
    pub fn new(url: &str, config: TransportConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            url: url.to_string(),
            client,
            request_id: 0,
            session_id: None,
        })
    }

    fn next_id(&mut self) -> u64 {
        self.request_id += 1;
        self.request_id
    }

    async fn post(&mut self, body: &Value) -> Result<reqwest::Response> {
        let mut request = self
            .client
            .post(&self.url)
            .header("content-type", "application/json")
            .header("accept", "application/json, text/event-stream")
            .json(body);
        if let Some(session) = &self.session_id {
            request = request.header(SESSION_HEADER, session);
        }

        let response = request.send().await.context("HTTP request failed")?;
        let status = response.status();
        if !status.is_success() && status != reqwest::StatusCode::ACCEPTED {
            anyhow::bail!("endpoint returned HTTP {}", status);
        }

        if let Some(session) = response
            .headers()
            .get(SESSION_HEADER)
            .and_then(|v| v.to_str().ok())
        {
            self.session_id = Some(session.to_string());
        }

        Ok(response)
    }

    fn parse_body(content_type: &str, body: &str) -> Result<JsonRpcResponse> {
        if content_type.starts_with("text/event-stream") {
            for line in body.lines() {
                if let Some(data) = line.strip_prefix("data:") {
                    let data = data.trim();
                    if data.is_empty() {
                        continue;
                    }
                    return serde_json::from_str(data).context("malformed SSE response payload");
                }
            }
            anyhow::bail!("SSE response carried no data event");
        }
        serde_json::from_str(body).context("malformed JSON response payload")
    }
}

#[async_trait::async_trait]
impl Transport for HttpTransport {
    async fn request(&mut self, method: &str, params: Option<Value>) -> Result<Value> {
        let id = self.next_id();
        let request = serde_json::to_value(JsonRpcRequest::new(id, method, params))?;

        let response = self.post(&request).await?;
        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("application/json")
            .to_string();
        let body = response.text().await.context("failed to read response body")?;

        Self::parse_body(&content_type, &body)?.into_result()
    }

    async fn notify(&mut self, method: &str, params: Option<Value>) -> Result<()> {
        let notification = serde_json::to_value(JsonRpcNotification::new(method, params))?;
        self.post(&notification).await?;
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(session) = self.session_id.take() {
            // Session teardown is best-effort
            let _ = self
                .client
                .delete(&self.url)
                .header(SESSION_HEADER, session)
                .send()
                .await;
        }
        Ok(())
    }

    fn transport_type(&self) -> &'static str {
        "streamable_http"
    }
}
