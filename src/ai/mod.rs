//! Secondary opinion on flagged tool descriptions
//!
//! A model review may accompany a heuristic finding but never overrides its
//! severity. Failures here are soft by design: the orchestrator downgrades
//! them to a null-risk annotation.

pub mod claude;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ScanError;
use crate::scanner::Severity;

pub use claude::ClaudeAnalyzer;

/// Model-derived review of one tool description
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecondaryOpinion {
    /// Free-text assessment
    pub analysis: String,
    /// Risk label extracted from the assessment, if the model produced one
    pub overall_risk: Option<Severity>,
}

impl SecondaryOpinion {
    /// Degraded opinion used when no review could be obtained
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            analysis: reason.into(),
            overall_risk: None,
        }
    }
}

/// Reviewer of tool descriptions
#[async_trait]
pub trait SecondaryAnalyzer: Send + Sync {
    async fn analyze(&self, description: &str) -> Result<SecondaryOpinion, ScanError>;
}

/// Scripted analyzer for tests
pub struct MockAnalyzer {
    risk: Option<Severity>,
    fail: bool,
}

impl MockAnalyzer {
    pub fn with_risk(risk: Severity) -> Self {
        Self {
            risk: Some(risk),
            fail: false,
        }
    }

    pub fn null_opinion() -> Self {
        Self {
            risk: None,
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            risk: None,
            fail: true,
        }
    }
}

#[async_trait]
impl SecondaryAnalyzer for MockAnalyzer {
    async fn analyze(&self, description: &str) -> Result<SecondaryOpinion, ScanError> {
        if self.fail {
            return Err(ScanError::analysis("scripted failure"));
        }
        Ok(SecondaryOpinion {
            analysis: format!("reviewed {} characters", description.len()),
            overall_risk: self.risk,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_returns_configured_risk() {
        let analyzer = MockAnalyzer::with_risk(Severity::High);
        let opinion = analyzer.analyze("something").await.unwrap();
        assert_eq!(opinion.overall_risk, Some(Severity::High));
    }

    #[tokio::test]
    async fn mock_failure_is_analysis_error() {
        let err = MockAnalyzer::failing().analyze("x").await.unwrap_err();
        assert!(matches!(err, ScanError::Analysis { .. }));
    }

    #[test]
    fn unavailable_opinion_carries_reason() {
        let opinion = SecondaryOpinion::unavailable("no credentials");
        assert_eq!(opinion.analysis, "no credentials");
        assert!(opinion.overall_risk.is_none());
    }

    #[test]
    fn opinion_serializes_camel_case() {
        let opinion = SecondaryOpinion {
            analysis: "ok".to_string(),
            overall_risk: Some(Severity::Medium),
        };
        let json = serde_json::to_string(&opinion).unwrap();
        assert!(json.contains("\"overallRisk\":\"medium\""));
    }
}
