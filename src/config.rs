//! Server configuration loading
//!
//! Reads the Claude-Desktop-style `mcpServers` JSON mapping. Validation of
//! entries happens here; the scan core treats transport configuration as
//! opaque.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Transport configuration for one server: either a spawn command or a
/// streamed HTTP endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TransportSpec {
    Http {
        url: String,
    },
    Stdio {
        command: String,
        #[serde(default)]
        args: Vec<String>,
        #[serde(default)]
        env: HashMap<String, String>,
    },
}

/// A configured server to audit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    pub name: String,
    pub transport: TransportSpec,
}

impl ServerConfig {
    pub fn stdio(name: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            transport: TransportSpec::Stdio {
                command: command.into(),
                args: Vec::new(),
                env: HashMap::new(),
            },
        }
    }

    pub fn http(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            transport: TransportSpec::Http { url: url.into() },
        }
    }
}

#[derive(Debug, Deserialize)]
struct ConfigFile {
    #[serde(rename = "mcpServers", default)]
    mcp_servers: BTreeMap<String, TransportSpec>,
}

/// Parse a configuration document into an ordered server list
///
/// Ordering is by server name, so repeated runs over the same file scan in
/// the same sequence.
pub fn parse_config(text: &str) -> Result<Vec<ServerConfig>> {
    let file: ConfigFile = serde_json::from_str(text).context("malformed configuration file")?;
    Ok(file
        .mcp_servers
        .into_iter()
        .map(|(name, transport)| ServerConfig { name, transport })
        .collect())
}

/// Load and parse a configuration file from disk
pub fn load_config(path: &Path) -> Result<Vec<ServerConfig>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read configuration file {}", path.display()))?;
    parse_config(&text).with_context(|| format!("in {}", path.display()))
}

/// Well-known Claude Desktop configuration locations, first match wins
pub fn default_config_path() -> Option<PathBuf> {
    let home = std::env::var_os("HOME").map(PathBuf::from)?;
    let candidates = [
        home.join("Library/Application Support/Claude/claude_desktop_config.json"),
        home.join(".config/Claude/claude_desktop_config.json"),
    ];
    candidates.into_iter().find(|p| p.exists())
}
