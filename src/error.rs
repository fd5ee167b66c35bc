//! Error taxonomy for the audit pipeline
//!
//! Per-server failures are isolated by the orchestrator and never abort a
//! whole-configuration scan. Detection itself is total and has no error
//! representation here.

use thiserror::Error;

/// Errors produced while auditing a configured server
#[derive(Debug, Error)]
pub enum ScanError {
    /// Malformed server entry in the configuration source
    #[error("invalid configuration for server '{server}': {message}")]
    Configuration { server: String, message: String },

    /// Transport could not be established or broke mid-handshake
    #[error("connection to '{server}' failed: {message}")]
    Connection { server: String, message: String },

    /// No response within the connection bound
    #[error("connection to '{server}' timed out after {timeout_secs}s")]
    Timeout { server: String, timeout_secs: u64 },

    /// Secondary-opinion call failed; downgraded to a null-risk annotation
    /// by the orchestrator, never propagated past it
    #[error("secondary analysis failed: {message}")]
    Analysis { message: String },
}

impl ScanError {
    pub fn connection(server: impl Into<String>, message: impl ToString) -> Self {
        Self::Connection {
            server: server.into(),
            message: message.to_string(),
        }
    }

    pub fn timeout(server: impl Into<String>, timeout_secs: u64) -> Self {
        Self::Timeout {
            server: server.into(),
            timeout_secs,
        }
    }

    pub fn analysis(message: impl ToString) -> Self {
        Self::Analysis {
            message: message.to_string(),
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}
