//! Scan orchestration
//!
//! Drives connection, enumeration, detection, and correlation across all
//! configured servers. Servers are scanned with bounded concurrency;
//! correlation needs the complete server/tool name index and therefore runs
//! only after every server has reached a terminal state. A per-server
//! failure contributes zero tools and never aborts the scan.

use std::sync::Arc;
use std::time::Instant;

use futures::stream::{self, StreamExt};
use tracing::{debug, info, warn};

use crate::ai::{SecondaryAnalyzer, SecondaryOpinion};
use crate::client::Connector;
use crate::config::ServerConfig;
use crate::protocol::Tool;

use super::crossref;
use super::detectors::ToolDetectors;
use super::finding::{ScanResult, Vulnerability};
use super::progress::{NoopSink, ProgressEvent, ProgressSink};

/// Tunables for one scan invocation
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Maximum concurrent server scans
    pub concurrency: usize,
    /// Server names exempt from cross-origin correlation
    pub safe_list: Vec<String>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            concurrency: 4,
            safe_list: Vec::new(),
        }
    }
}

/// Terminal state of one server's pass
enum ServerOutcome {
    Connected {
        server: String,
        tools: Vec<Tool>,
        vulnerabilities: Vec<Vulnerability>,
    },
    /// Recorded via a `server-error` event; contributes zero tools
    Failed,
}

/// Orchestrates the full audit pipeline
pub struct ScanOrchestrator {
    config: ScanConfig,
    connector: Arc<dyn Connector>,
    analyzer: Option<Arc<dyn SecondaryAnalyzer>>,
    sink: Arc<dyn ProgressSink>,
}

impl ScanOrchestrator {
    pub fn new(connector: Arc<dyn Connector>) -> Self {
        Self {
            config: ScanConfig::default(),
            connector,
            analyzer: None,
            sink: Arc::new(NoopSink),
        }
    }

    pub fn with_config(mut self, config: ScanConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_analyzer(mut self, analyzer: Arc<dyn SecondaryAnalyzer>) -> Self {
        self.analyzer = Some(analyzer);
        self
    }

    pub fn with_sink(mut self, sink: Arc<dyn ProgressSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Audit every configured server and return the aggregate result
    pub async fn scan(&self, servers: &[ServerConfig]) -> ScanResult {
        let start = Instant::now();
        info!("scanning {} configured servers", servers.len());

        let mut outcomes: Vec<(usize, ServerOutcome)> = stream::iter(servers.iter().enumerate())
            .map(|(index, server)| async move { (index, self.scan_server(server).await) })
            .buffer_unordered(self.config.concurrency.max(1))
            .collect()
            .await;
        // Concurrency is unordered; the result list follows config order
        outcomes.sort_by_key(|(index, _)| *index);

        // Every server is terminal here: the name index is complete and the
        // correlation pass may begin.
        let all_names: Vec<String> = servers.iter().map(|s| s.name.clone()).collect();

        let mut result = ScanResult::new();
        for (_, outcome) in &outcomes {
            match outcome {
                ServerOutcome::Connected { .. } => result.servers_scanned += 1,
                ServerOutcome::Failed => result.servers_failed += 1,
            }
        }

        for (_, outcome) in &outcomes {
            let ServerOutcome::Connected {
                server,
                tools,
                vulnerabilities,
            } = outcome
            else {
                continue;
            };

            for vulnerability in vulnerabilities {
                result.add_vulnerability(vulnerability.clone());
            }

            let others: Vec<String> = all_names
                .iter()
                .filter(|name| *name != server)
                .cloned()
                .collect();
            let mut cross_matches = Vec::new();
            for tool in tools {
                let detection = crossref::correlate(
                    tool.description.as_deref(),
                    &others,
                    server,
                    &tool.name,
                    &self.config.safe_list,
                );
                cross_matches.extend(detection.matches);
            }
            if !cross_matches.is_empty() {
                result.add_vulnerability(Vulnerability::cross_reference(server, cross_matches));
            }
        }

        result.duration_ms = start.elapsed().as_millis() as u64;
        info!(
            "scan finished: {} findings across {} servers ({} failed)",
            result.total_findings(),
            result.servers_scanned,
            result.servers_failed
        );
        result
    }

    /// Run one server to a terminal state: connect, enumerate, detect
    async fn scan_server(&self, server: &ServerConfig) -> ServerOutcome {
        debug!("connecting to {}", server.name);
        let tools = match self.connector.get_tools(server).await {
            Ok(tools) => tools,
            Err(err) => {
                warn!("server {} failed: {}", server.name, err);
                self.sink.emit(ProgressEvent::ServerError {
                    server: server.name.clone(),
                    message: err.to_string(),
                });
                return ServerOutcome::Failed;
            }
        };

        self.sink.emit(ProgressEvent::ServerConnected {
            server: server.name.clone(),
            tools: tools.len(),
        });

        let detectors = ToolDetectors::new();
        let mut vulnerabilities = Vec::new();
        for tool in &tools {
            self.sink.emit(ProgressEvent::ToolScanning {
                server: server.name.clone(),
                tool: tool.name.clone(),
            });

            let details = detectors.run_all(tool);
            let severity = details.severity();
            let flagged = severity.is_some();

            if let Some(severity) = severity {
                let opinion = self.secondary_opinion(tool).await;
                vulnerabilities.push(
                    Vulnerability::for_tool(&server.name, &tool.name, severity, details)
                        .with_opinion(opinion),
                );
            }

            self.sink.emit(ProgressEvent::ToolAnalyzed {
                server: server.name.clone(),
                tool: tool.name.clone(),
                flagged,
            });
        }

        ServerOutcome::Connected {
            server: server.name.clone(),
            tools,
            vulnerabilities,
        }
    }

    /// Ask the optional secondary analyzer about a flagged tool. A failed
    /// call becomes a null-risk annotation; it never propagates.
    async fn secondary_opinion(&self, tool: &Tool) -> Option<SecondaryOpinion> {
        let analyzer = self.analyzer.as_ref()?;
        let description = tool.description.as_deref().unwrap_or("");
        match analyzer.analyze(description).await {
            Ok(opinion) => Some(opinion),
            Err(err) => Some(SecondaryOpinion {
                analysis: format!("analysis unavailable: {}", err),
                overall_risk: None,
            }),
        }
    }
}
