//! Scripted connector for tests
//!
//! Serves canned tool lists or failures per server name without touching a
//! real transport.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;

use crate::config::ServerConfig;
use crate::error::ScanError;
use crate::protocol::Tool;

use super::Connector;

/// Failure to stage for a server
#[derive(Debug, Clone)]
pub enum MockFailure {
    Connection(String),
    Timeout,
}

/// Connector that replays scripted outcomes
#[derive(Default)]
pub struct MockConnector {
    tools: HashMap<String, Vec<Tool>>,
    failures: HashMap<String, MockFailure>,
    delays: HashMap<String, Duration>,
}

impl MockConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tools(mut self, server: impl Into<String>, tools: Vec<Tool>) -> Self {
        self.tools.insert(server.into(), tools);
        self
    }

    pub fn with_connection_failure(
        mut self,
        server: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        self.failures
            .insert(server.into(), MockFailure::Connection(message.into()));
        self
    }

    pub fn with_timeout_failure(mut self, server: impl Into<String>) -> Self {
        self.failures.insert(server.into(), MockFailure::Timeout);
        self
    }

    /// Delay the response to exercise concurrent scheduling
    pub fn with_delay(mut self, server: impl Into<String>, delay: Duration) -> Self {
        self.delays.insert(server.into(), delay);
        self
    }
}

#[async_trait]
impl Connector for MockConnector {
    async fn get_tools(&self, server: &ServerConfig) -> Result<Vec<Tool>, ScanError> {
        if let Some(delay) = self.delays.get(&server.name) {
            tokio::time::sleep(*delay).await;
        }
        if let Some(failure) = self.failures.get(&server.name) {
            return Err(match failure {
                MockFailure::Connection(message) => {
                    ScanError::connection(&server.name, message)
                }
                MockFailure::Timeout => ScanError::timeout(&server.name, 30),
            });
        }
        Ok(self.tools.get(&server.name).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn scripted_tools_are_returned() {
        let connector = MockConnector::new().with_tools("notes", vec![Tool::new("send")]);
        let tools = connector
            .get_tools(&ServerConfig::stdio("notes", "cmd"))
            .await
            .unwrap();
        assert_eq!(tools.len(), 1);
    }

    #[tokio::test]
    async fn unknown_server_has_no_tools() {
        let connector = MockConnector::new();
        let tools = connector
            .get_tools(&ServerConfig::stdio("mystery", "cmd"))
            .await
            .unwrap();
        assert!(tools.is_empty());
    }

    #[tokio::test]
    async fn scripted_failures_map_to_error_variants() {
        let connector = MockConnector::new()
            .with_connection_failure("down", "refused")
            .with_timeout_failure("slow");

        let err = connector
            .get_tools(&ServerConfig::stdio("down", "cmd"))
            .await
            .unwrap_err();
        assert!(matches!(err, ScanError::Connection { .. }));

        let err = connector
            .get_tools(&ServerConfig::stdio("slow", "cmd"))
            .await
            .unwrap_err();
        assert!(err.is_timeout());
    }
}
