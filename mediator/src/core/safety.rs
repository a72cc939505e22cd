//! Safety classifier for capability calls and proposed changes.
//!
//! Verdicts are data, never errors: a deny is something the model (or the
//! calling agent) is expected to observe and react to. Checks run in a fixed
//! order and the first failing check wins, so verdicts are deterministic.

use serde_json::Value;

use crate::core::protected::protected_path;
use crate::core::rules::scan_harmful;
use crate::core::types::{ChangeType, ProposedChange, SafetyVerdict, Severity};
use crate::io::context::AgentContext;

/// Capabilities that can mutate filesystem, version-control, or remote
/// issue/PR state. Everything else skips the harmful-content scan.
pub const SENSITIVE_CAPABILITIES: &[&str] = &[
    "write_file",
    "create_file",
    "delete_file",
    "apply_change",
    "run_command",
    "commit_changes",
    "create_branch",
    "push_branch",
    "create_pull_request",
    "update_pull_request",
    "comment_on_issue",
    "update_issue",
    "add_labels",
];

/// Keyword stems counted by the security-regression heuristic. Stems, so
/// `validat` covers validate/validation/validator.
const SECURITY_KEYWORDS: &[&str] = &[
    "validat",
    "sanitiz",
    "escap",
    "authenticat",
    "authoriz",
    "csrf",
    "xss",
    "security-header",
    "rate-limit",
];

pub fn is_sensitive(name: &str) -> bool {
    SENSITIVE_CAPABILITIES.contains(&name)
}

/// Classify a capability invocation before it runs.
///
/// Non-sensitive capabilities are always allowed. Sensitive ones have their
/// serialized arguments scanned against the harmful-content rules, and any
/// `path`/`file_path` argument checked against the protected-path rules.
pub fn check_capability_call(name: &str, args: &Value, ctx: &AgentContext) -> SafetyVerdict {
    if !is_sensitive(name) {
        return SafetyVerdict::allow();
    }

    let serialized = args.to_string();
    if let Some(rule) = scan_harmful(&serialized) {
        return SafetyVerdict::deny(
            format!("arguments to '{name}' contain {}", rule.description),
            rule.severity,
        );
    }

    if let Some(path) = path_argument(args) {
        let relative = relative_to_workdir(path, ctx);
        if let Some(reason) = protected_path(relative) {
            return SafetyVerdict::deny(reason, Severity::Critical);
        }
    }

    SafetyVerdict::allow()
}

/// Classify a fully-formed proposed change.
///
/// Check order is fixed: protected path, harmful content in the new
/// content, then the security-regression heuristic for modifies that carry
/// both sides. The regression heuristic is syntactic and advisory only, so
/// it denies at `warning` severity.
pub fn check_change(change: &ProposedChange) -> SafetyVerdict {
    if let Some(reason) = protected_path(&change.file_path) {
        return SafetyVerdict::deny(reason, Severity::Critical);
    }

    if let Some(content) = &change.new_content {
        if let Some(rule) = scan_harmful(content) {
            return SafetyVerdict::deny(
                format!("new content of '{}' contains {}", change.file_path, rule.description),
                rule.severity,
            );
        }
    }

    if change.change_type == ChangeType::Modify {
        if let (Some(original), Some(new)) = (&change.original_content, &change.new_content) {
            if let Some(verdict) = security_regression(&change.file_path, original, new) {
                return verdict;
            }
        }
    }

    SafetyVerdict::allow()
}

/// Flag modifies that strictly reduce the occurrence count of any
/// security-relevant keyword. Known to false-positive on refactors that
/// rename or consolidate security helpers, hence `warning`.
fn security_regression(path: &str, original: &str, new: &str) -> Option<SafetyVerdict> {
    let original_lower = original.to_lowercase();
    let new_lower = new.to_lowercase();

    for keyword in SECURITY_KEYWORDS {
        let before = count_occurrences(&original_lower, keyword);
        if before == 0 {
            continue;
        }
        let after = count_occurrences(&new_lower, keyword);
        if after < before {
            return Some(SafetyVerdict::deny(
                format!(
                    "modification of '{path}' reduces '{keyword}' occurrences \
                     from {before} to {after}; possible removal of security logic"
                ),
                Severity::Warning,
            ));
        }
    }
    None
}

fn count_occurrences(haystack: &str, needle: &str) -> usize {
    haystack.matches(needle).count()
}

/// Pull a path-like argument out of the call arguments, accepting the
/// snake- and camel-case spellings capabilities use.
fn path_argument(args: &Value) -> Option<&str> {
    ["path", "file_path", "filePath"]
        .iter()
        .find_map(|key| args.get(key))
        .and_then(Value::as_str)
}

/// Capabilities sometimes pass absolute paths inside the checkout; strip
/// the working directory so the protected-path rules see the repo-relative
/// form.
fn relative_to_workdir<'a>(path: &'a str, ctx: &AgentContext) -> &'a str {
    let workdir = ctx.working_dir.to_string_lossy();
    path.strip_prefix(workdir.as_ref())
        .map(|rest| rest.trim_start_matches(['/', '\\']))
        .unwrap_or(path)
}
