//! Detection-and-correlation engine
//!
//! Pattern-based detection of prompt-injection risks in MCP tool
//! descriptions and schemas, cross-server name correlation, and the
//! orchestration that drives both across a server configuration.

pub mod crossref;
pub mod detectors;
pub mod finding;
pub mod orchestrator;
pub mod patterns;
pub mod progress;

pub use crossref::{correlate, CrossRefDetection};
pub use detectors::{Detection, ToolDetectors};
pub use finding::{
    CrossRefMatch, DetectionCategory, DetectionDetails, DetectionMatch, ScanResult, ScanSummary,
    Severity, Vulnerability,
};
pub use orchestrator::{ScanConfig, ScanOrchestrator};
pub use progress::{ChannelSink, NoopSink, ProgressEvent, ProgressSink};
