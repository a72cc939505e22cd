//! Per-run context describing the repository a session operates on.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Immutable description of one run's target repository.
///
/// Supplied by the calling agent, consumed by capabilities and the
/// classifier (the validator resolves change paths against `working_dir`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentContext {
    /// Local checkout the session operates on.
    pub working_dir: PathBuf,
    pub repo_owner: String,
    pub repo_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pr_number: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issue_number: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit_sha: Option<String>,
    /// Free-form extras the calling agent wants capabilities to see.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
}

impl AgentContext {
    pub fn new(working_dir: impl Into<PathBuf>, repo_owner: &str, repo_name: &str) -> Self {
        Self {
            working_dir: working_dir.into(),
            repo_owner: repo_owner.to_string(),
            repo_name: repo_name.to_string(),
            pr_number: None,
            issue_number: None,
            branch: None,
            commit_sha: None,
            metadata: BTreeMap::new(),
        }
    }

    /// `owner/name`, as it appears in remote URLs and log lines.
    pub fn repo_slug(&self) -> String {
        format!("{}/{}", self.repo_owner, self.repo_name)
    }
}
