//! Pattern library for the category detectors
//!
//! Declarative rule tables, kept apart from the detection control flow so
//! the rule set stays independently testable. Every pattern is
//! case-insensitive and matched against raw tool text; one match is
//! reported per rule.

/// A single detection rule: a stable identifier and a regex source
pub struct Rule {
    pub id: &'static str,
    pub pattern: &'static str,
}

const fn rule(id: &'static str, pattern: &'static str) -> Rule {
    Rule { id, pattern }
}

/// Phrasing that conceals behavior from the user, instruction wrapper tags
/// historically used to smuggle directives, and direct override phrasing.
pub const HIDDEN_INSTRUCTION_RULES: &[Rule] = &[
    rule(
        "concealment-directive",
        r"(?i)do\s+not\s+(tell|inform|mention|alert|notify)\s+(the\s+)?user",
    ),
    rule(
        "concealment-contraction",
        r"(?i)don'?t\s+(tell|show|reveal|mention)\s+(this|that|it|the\s+user|anyone)",
    ),
    rule(
        "keep-secret",
        r"(?i)keep\s+(this|it|these\s+instructions?)\s+(a\s+)?(secret|hidden|private|confidential)",
    ),
    rule(
        "hide-from-user",
        r"(?i)hide\s+(this|it|these\s+instructions?)\s+from",
    ),
    // Wrapper tags seen in the wild, including the one-letter shorthand
    rule(
        "instruction-wrapper-tag",
        r"(?i)<\s*/?\s*(important|system|secret|instructions?|hidden|s)\s*>",
    ),
    rule(
        "ignore-previous",
        r"(?i)ignore\s+(all\s+)?(previous|prior|above|earlier)\s+(instructions?|prompts?|rules?|guidelines?)",
    ),
    rule(
        "unconditional-always",
        r"(?i)\balways\s+(do|use|run|call|include|send|say|respond\s+with)\b",
    ),
    rule(
        "never-disclose",
        r"(?i)\bnever\s+(tell|show|reveal|mention|disclose)\b",
    ),
];

/// Phrasing that conditions behavior on another tool's presence, claims
/// override or replacement authority, or coerces the agent with urgency.
pub const TOOL_SHADOWING_RULES: &[Rule] = &[
    rule(
        "presence-condition",
        r"(?i)(when|if|whenever)\s+(the\s+)?\S+\s+(tool|server)\s+is\s+(available|present|installed|active)",
    ),
    rule("instead-of", r"(?i)\binstead\s+of\s+(using|calling)\b"),
    rule("use-this-instead", r"(?i)use\s+this\s+(tool\s+)?instead"),
    rule(
        "override-directive",
        r"(?i)\b(overrides?|supersedes?|replaces?)\s+(all\s+|any\s+)?(other|existing|previous)\s+tools?",
    ),
    rule("takes-precedence", r"(?i)takes?\s+(priority|precedence)\s+over"),
    rule(
        "before-any-other",
        r"(?i)before\s+(using|calling|invoking)\s+(any\s+)?other\s+tools?",
    ),
    rule("urgency-marker", r"(?i)\b(important|urgent|critical|attention)\s*[:!]"),
    rule("must-use", r"(?i)you\s+must\s+(always\s+)?(use|call|invoke)\b"),
];

/// References to credential material, protocol client configuration files,
/// and path-traversal sequences.
pub const SENSITIVE_FILE_RULES: &[Rule] = &[
    rule(
        "ssh-material",
        r"(?i)(\.ssh\b|id_rsa|id_ed25519|id_ecdsa|authorized_keys|known_hosts)",
    ),
    rule("env-file", r"(?i)\.env\b"),
    rule(
        "credential-wording",
        r"(?i)\b(passwords?|api[_\s-]?keys?|access\s+tokens?|secrets?|credentials?|private\s+keys?)\b",
    ),
    rule(
        "system-credential-path",
        r"(?i)(/etc/passwd|/etc/shadow|\.aws/credentials|\.netrc|\.npmrc|\.git-credentials|\.pgpass)",
    ),
    rule(
        "mcp-config-path",
        r"(?i)(claude_desktop_config\.json|\.cursor/mcp\.json|\bmcp\.json\b)",
    ),
    rule("path-traversal", r"\.\./"),
];

/// Parameter names historically used to smuggle attacker-controlled content
/// through innocuous-looking optional fields. Compared case-insensitively
/// against declared property names, exact match only.
pub const EXFILTRATION_PARAM_NAMES: &[&str] = &[
    "additional_info",
    "annotation",
    "comment",
    "comments",
    "context",
    "debug",
    "debug_info",
    "details",
    "explanation",
    "extra",
    "feedback",
    "metadata",
    "note",
    "notes",
    "reasoning",
    "side_note",
    "sidenote",
    "thought",
    "thoughts",
];

/// Well-known MCP server identifiers used by the cross-origin correlator.
/// A tool description naming one of these (other than its own server) is a
/// strong impersonation signal.
pub const WELL_KNOWN_SERVERS: &[&str] = &[
    "discord",
    "fetch",
    "filesystem",
    "gitlab",
    "github",
    "gmail",
    "google-drive",
    "jira",
    "linear",
    "memory",
    "notion",
    "postgres",
    "puppeteer",
    "sentry",
    "slack",
    "sqlite",
    "stripe",
    "telegram",
    "whatsapp",
];

#[cfg(test)]
mod tests {
    use super::*;
    use regex::Regex;

    #[test]
    fn all_rule_patterns_compile() {
        for table in [
            HIDDEN_INSTRUCTION_RULES,
            TOOL_SHADOWING_RULES,
            SENSITIVE_FILE_RULES,
        ] {
            for rule in table {
                assert!(
                    Regex::new(rule.pattern).is_ok(),
                    "pattern for rule '{}' does not compile",
                    rule.id
                );
            }
        }
    }

    #[test]
    fn rule_ids_are_unique_within_a_table() {
        for table in [
            HIDDEN_INSTRUCTION_RULES,
            TOOL_SHADOWING_RULES,
            SENSITIVE_FILE_RULES,
        ] {
            let mut seen = std::collections::HashSet::new();
            for rule in table {
                assert!(seen.insert(rule.id), "duplicate rule id '{}'", rule.id);
            }
        }
    }

    #[test]
    fn param_vocabulary_is_lowercase_and_unique() {
        let mut seen = std::collections::HashSet::new();
        for name in EXFILTRATION_PARAM_NAMES {
            assert_eq!(*name, name.to_lowercase());
            assert!(seen.insert(*name));
        }
    }

    #[test]
    fn well_known_servers_are_normalized() {
        for name in WELL_KNOWN_SERVERS {
            assert_eq!(*name, name.to_lowercase());
            assert!(!name.contains('_'), "use hyphens in '{}'", name);
        }
    }

    #[test]
    fn wrapper_tag_covers_one_letter_shorthand() {
        let re = Regex::new(
            HIDDEN_INSTRUCTION_RULES
                .iter()
                .find(|r| r.id == "instruction-wrapper-tag")
                .unwrap()
                .pattern,
        )
        .unwrap();
        assert!(re.is_match("<IMPORTANT>"));
        assert!(re.is_match("</system>"));
        assert!(re.is_match("<s>"));
        assert!(!re.is_match("<p>"));
    }

    #[test]
    fn env_file_rule_requires_word_boundary() {
        let re = Regex::new(
            SENSITIVE_FILE_RULES
                .iter()
                .find(|r| r.id == "env-file")
                .unwrap()
                .pattern,
        )
        .unwrap();
        assert!(re.is_match("read the .env file"));
        assert!(!re.is_match("a friendly .environment description"));
    }
}
