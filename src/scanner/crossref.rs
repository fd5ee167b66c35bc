//! Cross-origin correlator
//!
//! A tool description that names another known server is a strong signal of
//! cross-server impersonation or hijacking. The correlator compares the
//! description's tokens against the other discovered server names and a
//! fixed list of well-known server identifiers. It needs the complete name
//! index, so the orchestrator runs it only after every server has reached a
//! terminal state.

use std::collections::HashSet;

use regex::Regex;

use super::detectors::context_window;
use super::finding::CrossRefMatch;
use super::patterns::WELL_KNOWN_SERVERS;

/// Result of correlating one description against the name index
#[derive(Debug, Clone, PartialEq)]
pub struct CrossRefDetection {
    pub detected: bool,
    pub matches: Vec<CrossRefMatch>,
}

impl CrossRefDetection {
    fn none() -> Self {
        Self {
            detected: false,
            matches: Vec::new(),
        }
    }
}

/// Normalize a server name or description token for comparison: strip one
/// enclosing parenthesis pair, underscores to hyphens, lowercase.
fn normalize(token: &str) -> String {
    let stripped = strip_parens(token);
    stripped.replace('_', "-").to_lowercase()
}

/// Remove exactly one enclosing parenthesis pair, if present
fn strip_parens(token: &str) -> &str {
    token
        .strip_prefix('(')
        .and_then(|t| t.strip_suffix(')'))
        .unwrap_or(token)
}

/// Correlate a tool description against the global name index.
///
/// Candidate set = (other discovered server names minus the safe list) ∪
/// (well-known server identifiers minus the current server's own name).
/// An empty candidate set means no detection. At most one match per
/// normalized candidate is reported.
pub fn correlate(
    description: Option<&str>,
    other_server_names: &[String],
    current_server: &str,
    current_tool: &str,
    safe_list: &[String],
) -> CrossRefDetection {
    let Some(text) = description else {
        return CrossRefDetection::none();
    };

    let safe: HashSet<String> = safe_list.iter().map(|s| normalize(s)).collect();
    let current = normalize(current_server);

    let mut candidates: HashSet<String> = HashSet::new();
    for name in other_server_names {
        let normalized = normalize(name);
        if !safe.contains(&normalized) {
            candidates.insert(normalized);
        }
    }
    for name in WELL_KNOWN_SERVERS {
        let normalized = normalize(name);
        if normalized != current {
            candidates.insert(normalized);
        }
    }

    if candidates.is_empty() {
        return CrossRefDetection::none();
    }

    let mut matches = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    for token in text.split_whitespace() {
        let normalized = normalize(token);
        if normalized.is_empty() || seen.contains(&normalized) {
            continue;
        }
        if !candidates.contains(&normalized) {
            continue;
        }
        seen.insert(normalized.clone());
        matches.push(CrossRefMatch {
            server: current_server.to_string(),
            tool: current_tool.to_string(),
            referenced_name: normalized,
            // Context is recomputed from the original token: normalization
            // can shift length and position.
            context: locate_context(text, strip_parens(token)),
        });
    }

    CrossRefDetection {
        detected: !matches.is_empty(),
        matches,
    }
}

/// Re-locate the original (non-normalized) token in the original text via a
/// word-boundary search and cut a context window around it.
fn locate_context(text: &str, original: &str) -> String {
    let pattern = format!(r"\b{}\b", regex::escape(original));
    if let Ok(re) = Regex::new(&pattern) {
        if let Some(found) = re.find(text) {
            return context_window(text, found.start(), found.end());
        }
    }
    original.to_string()
}
