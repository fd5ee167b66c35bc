//! mcpaudit - Security auditor for MCP servers

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod ai;
mod client;
mod config;
mod error;
mod protocol;
mod scanner;
mod transport;
mod ui;

use ai::ClaudeAnalyzer;
use client::McpConnector;
use config::{default_config_path, load_config};
use scanner::{NoopSink, ProgressSink, ScanConfig, ScanOrchestrator};
use ui::TerminalSink;

/// mcpaudit - Security auditor for MCP servers
#[derive(Parser)]
#[command(
    name = "mcpaudit",
    version,
    about = "Audits MCP servers for prompt injection, tool shadowing, and exfiltration risks"
)]
struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Output format
    #[arg(short, long, default_value = "text", global = true)]
    format: OutputFormat,

    /// Suppress progress output
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan configured servers for security risks
    Scan {
        /// Scan only these servers (default: all configured)
        servers: Vec<String>,

        /// Path to MCP config file (auto-detected if not specified)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Connection timeout per server (seconds)
        #[arg(short, long, default_value = "30")]
        timeout: u64,

        /// Maximum concurrent server scans
        #[arg(short = 'j', long, default_value = "4")]
        concurrency: usize,

        /// Server names exempt from cross-origin correlation
        #[arg(long, value_delimiter = ',')]
        safe_list: Vec<String>,

        /// Skip the model-backed second opinion
        #[arg(long)]
        no_opinion: bool,

        /// Client name to present to servers during the handshake
        #[arg(long)]
        identify_as: Option<String>,
    },

    /// List servers found in the configuration
    Servers {
        /// Path to MCP config file (auto-detected if not specified)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn init_logging(verbosity: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbosity {
            0 => EnvFilter::new("mcpaudit=info"),
            1 => EnvFilter::new("mcpaudit=debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}

fn resolve_config(explicit: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path);
    }
    match default_config_path() {
        Some(path) => Ok(path),
        None => bail!("no MCP configuration found; pass one with --config"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    match cli.command {
        Commands::Scan {
            servers,
            config,
            timeout,
            concurrency,
            safe_list,
            no_opinion,
            identify_as,
        } => {
            let path = resolve_config(config)?;
            let mut configured = load_config(&path)?;
            if !servers.is_empty() {
                configured.retain(|s| servers.contains(&s.name));
                if configured.is_empty() {
                    bail!("none of the requested servers are configured in {}", path.display());
                }
            }

            let mut connector = McpConnector::with_timeout(Duration::from_secs(timeout));
            if let Some(name) = identify_as {
                connector = connector.identify_as(name);
            }

            let scan_config = ScanConfig {
                concurrency,
                safe_list,
            };
            let mut orchestrator =
                ScanOrchestrator::new(Arc::new(connector)).with_config(scan_config);
            if !no_opinion {
                orchestrator = orchestrator.with_analyzer(Arc::new(ClaudeAnalyzer::from_env()));
            }

            let interactive =
                !cli.quiet && matches!(cli.format, OutputFormat::Text);
            let terminal = interactive.then(|| Arc::new(TerminalSink::new(configured.len())));
            let sink: Arc<dyn ProgressSink> = match &terminal {
                Some(sink) => sink.clone(),
                None => Arc::new(NoopSink),
            };
            let result = orchestrator.with_sink(sink).scan(&configured).await;
            if let Some(sink) = &terminal {
                sink.finish();
            }

            match cli.format {
                OutputFormat::Text => ui::output::print_text(&result),
                OutputFormat::Json => ui::output::print_json(&result)?,
            }

            if result.has_high() {
                std::process::exit(1);
            }
        }
        Commands::Servers { config } => {
            let path = resolve_config(config)?;
            let configured = load_config(&path)?;
            if configured.is_empty() {
                println!("No servers configured in {}", path.display());
            } else {
                println!("Servers in {}:", path.display());
                for server in configured {
                    let kind = match server.transport {
                        config::TransportSpec::Stdio { ref command, .. } => {
                            format!("stdio: {}", command)
                        }
                        config::TransportSpec::Http { ref url } => format!("http: {}", url),
                    };
                    println!("  {} ({})", server.name.cyan(), kind);
                }
            }
        }
    }

    Ok(())
}
