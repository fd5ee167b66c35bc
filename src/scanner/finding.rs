//! Finding data model and severity policy
//!
//! Everything here is an immutable snapshot produced within a single scan
//! invocation; nothing persists across runs.

use serde::{Deserialize, Serialize};

use crate::ai::SecondaryOpinion;

/// Severity of a confirmed vulnerability
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Risk category a detection rule belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DetectionCategory {
    HiddenInstructions,
    ToolShadowing,
    SensitiveFileAccess,
    ExfiltrationChannels,
}

impl DetectionCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            DetectionCategory::HiddenInstructions => "hidden-instructions",
            DetectionCategory::ToolShadowing => "tool-shadowing",
            DetectionCategory::SensitiveFileAccess => "sensitive-file-access",
            DetectionCategory::ExfiltrationChannels => "exfiltration-channels",
        }
    }
}

impl std::fmt::Display for DetectionCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One rule firing on one input
///
/// Invariant: `context` always contains `matched` as a substring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionMatch {
    /// Category label
    #[serde(rename = "type")]
    pub category: DetectionCategory,
    /// Rule identifier from the pattern library
    #[serde(rename = "pattern")]
    pub rule: String,
    /// Literal substring found in the input
    #[serde(rename = "match")]
    pub matched: String,
    /// Window around the match, clipped to text bounds with `...` markers
    pub context: String,
}

/// Per-tool bundle of detector outputs, one sequence per category
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionDetails {
    pub hidden_instructions: Vec<DetectionMatch>,
    pub tool_shadowing: Vec<DetectionMatch>,
    pub sensitive_file_access: Vec<DetectionMatch>,
    pub exfiltration_channels: Vec<DetectionMatch>,
}

impl DetectionDetails {
    pub fn is_empty(&self) -> bool {
        self.hidden_instructions.is_empty()
            && self.tool_shadowing.is_empty()
            && self.sensitive_file_access.is_empty()
            && self.exfiltration_channels.is_empty()
    }

    pub fn match_count(&self) -> usize {
        self.hidden_instructions.len()
            + self.tool_shadowing.len()
            + self.sensitive_file_access.len()
            + self.exfiltration_channels.len()
    }

    /// Severity implied by which categories fired, or `None` when the
    /// bundle is empty.
    ///
    /// Hidden instructions, tool shadowing, and sensitive file access are
    /// direct instruction-injection primitives and weigh HIGH; an
    /// exfiltration channel alone weighs MEDIUM. The mapping is documented
    /// in DESIGN.md.
    pub fn severity(&self) -> Option<Severity> {
        if !self.hidden_instructions.is_empty()
            || !self.tool_shadowing.is_empty()
            || !self.sensitive_file_access.is_empty()
        {
            Some(Severity::High)
        } else if !self.exfiltration_channels.is_empty() {
            Some(Severity::Medium)
        } else {
            None
        }
    }
}

/// A tool description naming another known server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrossRefMatch {
    /// Server whose tool makes the reference
    pub server: String,
    /// Tool whose description makes the reference
    pub tool: String,
    /// Normalized name of the referenced server
    pub referenced_name: String,
    /// Window around the original token in the original text
    pub context: String,
}

/// A confirmed finding for one server, and optionally one tool
///
/// A record exists only when at least one detector or the correlator fired.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vulnerability {
    pub server: String,
    /// Absent for pure cross-reference findings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool: Option<String>,
    pub severity: Severity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detection_details: Option<DetectionDetails>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cross_ref_matches: Option<Vec<CrossRefMatch>>,
    /// AI-derived opinion, reported alongside the heuristic severity but
    /// never overriding it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secondary_opinion: Option<SecondaryOpinion>,
}

impl Vulnerability {
    pub fn for_tool(
        server: impl Into<String>,
        tool: impl Into<String>,
        severity: Severity,
        details: DetectionDetails,
    ) -> Self {
        Self {
            server: server.into(),
            tool: Some(tool.into()),
            severity,
            detection_details: Some(details),
            cross_ref_matches: None,
            secondary_opinion: None,
        }
    }

    pub fn cross_reference(server: impl Into<String>, matches: Vec<CrossRefMatch>) -> Self {
        Self {
            server: server.into(),
            tool: None,
            severity: Severity::Medium,
            detection_details: None,
            cross_ref_matches: Some(matches),
            secondary_opinion: None,
        }
    }

    pub fn with_opinion(mut self, opinion: Option<SecondaryOpinion>) -> Self {
        self.secondary_opinion = opinion;
        self
    }
}

/// Findings breakdown by severity
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScanSummary {
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

/// Aggregate result of one scan invocation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanResult {
    pub vulnerabilities: Vec<Vulnerability>,
    pub summary: ScanSummary,
    pub servers_scanned: usize,
    pub servers_failed: usize,
    pub duration_ms: u64,
}

impl ScanResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_vulnerability(&mut self, vulnerability: Vulnerability) {
        match vulnerability.severity {
            Severity::High => self.summary.high += 1,
            Severity::Medium => self.summary.medium += 1,
            Severity::Low => self.summary.low += 1,
        }
        self.vulnerabilities.push(vulnerability);
    }

    pub fn total_findings(&self) -> usize {
        self.vulnerabilities.len()
    }

    pub fn has_high(&self) -> bool {
        self.summary.high > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_match(category: DetectionCategory) -> DetectionMatch {
        DetectionMatch {
            category,
            rule: "test-rule".to_string(),
            matched: "trigger".to_string(),
            context: "...a trigger phrase...".to_string(),
        }
    }

    #[test]
    fn severity_ordering() {
        assert!(Severity::High > Severity::Medium);
        assert!(Severity::Medium > Severity::Low);
    }

    #[test]
    fn severity_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Severity::High).unwrap(), "\"high\"");
    }

    #[test]
    fn category_serializes_kebab_case() {
        assert_eq!(
            serde_json::to_string(&DetectionCategory::HiddenInstructions).unwrap(),
            "\"hidden-instructions\""
        );
    }

    #[test]
    fn empty_details_have_no_severity() {
        let details = DetectionDetails::default();
        assert!(details.is_empty());
        assert_eq!(details.severity(), None);
    }

    #[test]
    fn injection_categories_weigh_high() {
        for category in [
            DetectionCategory::HiddenInstructions,
            DetectionCategory::ToolShadowing,
            DetectionCategory::SensitiveFileAccess,
        ] {
            let mut details = DetectionDetails::default();
            match category {
                DetectionCategory::HiddenInstructions => {
                    details.hidden_instructions.push(sample_match(category))
                }
                DetectionCategory::ToolShadowing => {
                    details.tool_shadowing.push(sample_match(category))
                }
                DetectionCategory::SensitiveFileAccess => {
                    details.sensitive_file_access.push(sample_match(category))
                }
                DetectionCategory::ExfiltrationChannels => unreachable!(),
            }
            assert_eq!(details.severity(), Some(Severity::High));
        }
    }

    #[test]
    fn exfiltration_alone_weighs_medium() {
        let details = DetectionDetails {
            exfiltration_channels: vec![sample_match(DetectionCategory::ExfiltrationChannels)],
            ..Default::default()
        };
        assert_eq!(details.severity(), Some(Severity::Medium));
    }

    #[test]
    fn high_category_dominates_exfiltration() {
        let details = DetectionDetails {
            hidden_instructions: vec![sample_match(DetectionCategory::HiddenInstructions)],
            exfiltration_channels: vec![sample_match(DetectionCategory::ExfiltrationChannels)],
            ..Default::default()
        };
        assert_eq!(details.severity(), Some(Severity::High));
        assert_eq!(details.match_count(), 2);
    }

    #[test]
    fn cross_reference_vulnerability_has_no_tool() {
        let vuln = Vulnerability::cross_reference(
            "notes",
            vec![CrossRefMatch {
                server: "notes".to_string(),
                tool: "send".to_string(),
                referenced_name: "whatsapp".to_string(),
                context: "call (whatsapp) to send".to_string(),
            }],
        );
        assert!(vuln.tool.is_none());
        assert_eq!(vuln.severity, Severity::Medium);
        assert!(vuln.detection_details.is_none());
    }

    #[test]
    fn tool_vulnerability_serialization_skips_absent_fields() {
        let vuln = Vulnerability::for_tool(
            "notes",
            "send",
            Severity::High,
            DetectionDetails::default(),
        );
        let json = serde_json::to_string(&vuln).unwrap();
        assert!(json.contains("\"tool\":\"send\""));
        assert!(!json.contains("crossRefMatches"));
        assert!(!json.contains("secondaryOpinion"));
    }

    #[test]
    fn scan_result_summary_counts() {
        let mut result = ScanResult::new();
        result.add_vulnerability(Vulnerability::for_tool(
            "a",
            "t1",
            Severity::High,
            DetectionDetails::default(),
        ));
        result.add_vulnerability(Vulnerability::cross_reference("a", vec![]));

        assert_eq!(result.summary.high, 1);
        assert_eq!(result.summary.medium, 1);
        assert_eq!(result.total_findings(), 2);
        assert!(result.has_high());
    }
}
