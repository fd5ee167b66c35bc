//! mcpaudit - Security auditor for MCP servers
//!
//! Audits the tools advertised by Model Context Protocol servers for
//! security risks hidden in their natural-language descriptions and input
//! schemas: hidden instructions, tool shadowing, sensitive file access,
//! exfiltration channels, and cross-server impersonation. The auditor never
//! executes tool code and never mutates server state; it only enumerates
//! and inspects.
//!
//! # Modules
//!
//! - `scanner` - Detection engine, cross-origin correlation, orchestration
//! - `client` - MCP client and the connector seam to the wire
//! - `transport` - stdio and streamable HTTP transports
//! - `ai` - Optional model-backed second opinion on flagged tools
//! - `config` - Server configuration loading
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use mcpaudit::client::McpConnector;
//! use mcpaudit::scanner::ScanOrchestrator;
//!
//! let orchestrator = ScanOrchestrator::new(Arc::new(McpConnector::new()));
//! let result = orchestrator.scan(&servers).await;
//! for vulnerability in &result.vulnerabilities {
//!     println!("{}: {}", vulnerability.server, vulnerability.severity);
//! }
//! ```

pub mod ai;
pub mod client;
pub mod config;
pub mod error;
pub mod protocol;
pub mod scanner;
pub mod transport;
pub mod ui;

// Re-export commonly used types
pub use config::{ServerConfig, TransportSpec};
pub use error::ScanError;
pub use scanner::{ProgressEvent, ScanOrchestrator, ScanResult, Severity, Vulnerability};
