//! Protected file and directory checks.
//!
//! Paths here are repo-relative strings as they appear in capability
//! arguments and proposed changes. Any match is a critical safety denial:
//! these files carry credentials or repository identity and must never be
//! touched by an autonomous session.

use std::sync::LazyLock;

use regex::Regex;

/// Exact names denied either as the full relative path or as a trailing
/// `/<name>` component.
const PROTECTED_FILES: &[&str] = &[
    ".env",
    ".env.local",
    ".env.production",
    "credentials.json",
    "secrets.json",
    "service-account.json",
    ".git/config",
    ".npmrc",
    ".pypirc",
    ".netrc",
];

static PROTECTED_DIR_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(^|/)\.ssh(/|$)",
        r"(^|/)\.aws(/|$)",
        r"(^|/)\.gcloud(/|$)",
        r"(^|/)\.azure(/|$)",
        r"(?i)(^|/)secrets?(/|$)",
        r"(?i)(^|/)credentials?(/|$)",
        r"(?i)(^|/)private-keys?(/|$)",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("protected-path pattern must compile"))
    .collect()
});

/// Return a denial reason when `path` names a protected file or lives under
/// a protected directory.
pub fn protected_path(path: &str) -> Option<String> {
    let normalized = normalize(path);

    for name in PROTECTED_FILES {
        if normalized == *name || normalized.ends_with(&format!("/{name}")) {
            return Some(format!("'{normalized}' is a protected file ({name})"));
        }
    }
    for pattern in PROTECTED_DIR_PATTERNS.iter() {
        if pattern.is_match(&normalized) {
            return Some(format!("'{normalized}' is under a protected directory"));
        }
    }
    None
}

fn normalize(path: &str) -> String {
    let forward = path.replace('\\', "/");
    forward.trim_start_matches("./").to_string()
}
