//! Eligibility triage for externally-supplied task descriptions.
//!
//! Before a session is ever started for an issue, the title and body are
//! screened: requests that ask for security to be weakened are rejected
//! outright, and reports with no code-shaped signal are rejected as not
//! actionable. The two rejections carry different severities so callers can
//! distinguish "actively harmful" from "merely not for us".

use std::sync::LazyLock;

use regex::Regex;

use crate::core::types::{SafetyVerdict, Severity};

struct IntentRule {
    description: &'static str,
    pattern: Regex,
}

impl IntentRule {
    fn new(description: &'static str, pattern: &str) -> Self {
        Self {
            description,
            pattern: Regex::new(pattern).expect("harmful-intent pattern must compile"),
        }
    }
}

// Matched against the lowercased concatenation of title and body.
static HARMFUL_INTENT_RULES: LazyLock<Vec<IntentRule>> = LazyLock::new(|| {
    vec![
        IntentRule::new(
            "asks to bypass authentication or login",
            r"bypass(ing)?\s+(the\s+)?(auth\w*|login)",
        ),
        IntentRule::new(
            "asks to disable security",
            r"disable\s+(the\s+)?security",
        ),
        IntentRule::new(
            "asks to remove validation",
            r"remove\s+(the\s+)?(input\s+)?validation",
        ),
        IntentRule::new("asks for a backdoor", r"back\s?door"),
        IntentRule::new(
            "asks to expose secrets",
            r"(expose|leak|print|log)\s+(the\s+)?secrets?",
        ),
        IntentRule::new(
            "asks to skip checks",
            r"skip\s+(the\s+)?(security\s+|safety\s+)?checks?",
        ),
        IntentRule::new(
            "asks to hardcode a password",
            r"hard\s?-?cod(e|ing)\s+(the\s+)?(a\s+)?passwords?",
        ),
        IntentRule::new(
            "asks to remove authentication",
            r"remove\s+(the\s+)?auth\w*",
        ),
        IntentRule::new(
            "asks to disable CSRF protection",
            r"disable\s+(the\s+)?csrf",
        ),
        IntentRule::new(
            "asks to ignore TLS/SSL verification",
            r"(ignore|disable|skip)\s+(the\s+)?(tls|ssl)",
        ),
    ]
});

// At least one of these must match for an issue to count as code-related.
static CODE_SIGNALS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        // Failure vocabulary.
        r"\b(error|bug|crash(es|ed)?|exception|panic|fail(s|ed|ure)?|broken|regression)\b",
        // Common failure-mode terms.
        r"\b(undefined|null|nan|timeout|leak|deadlock|stack trace|traceback|segfault)\b",
        r"(doesn't|does not|won't|will not|stopped)\s+work",
        // Source-file extensions.
        r"\.(rs|js|jsx|ts|tsx|py|go|java|rb|c|cc|cpp|h|hpp|json|ya?ml|toml)\b",
        // Language keywords.
        r"\b(function|fn|class|struct|impl|def|const|let|var|return|import|async|await)\b",
        // Line references.
        r"\bline\s+\d+|:\d+:\d+",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("code-signal pattern must compile"))
    .collect()
});

/// Decide whether an issue is eligible for autonomous handling.
///
/// Harmful intent is a critical rejection; a clean but non-code-related
/// report is a warning rejection.
pub fn check_issue(title: &str, body: &str) -> SafetyVerdict {
    let text = format!("{title}\n{body}").to_lowercase();

    for rule in HARMFUL_INTENT_RULES.iter() {
        if rule.pattern.is_match(&text) {
            return SafetyVerdict::deny(rule.description, Severity::Critical);
        }
    }

    if !CODE_SIGNALS.iter().any(|signal| signal.is_match(&text)) {
        return SafetyVerdict::deny(
            "issue does not appear to be code-related",
            Severity::Warning,
        );
    }

    SafetyVerdict::allow()
}
