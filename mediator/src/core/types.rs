//! Shared deterministic types for the mediation core.
//!
//! These types define stable contracts between the classifier, validator,
//! gate, and session loop. They carry no I/O and no hidden state; everything
//! a caller needs to react to is visible in the data.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// How serious a safety or validation finding is.
///
/// `Warning` is advisory, `Error` blocks validity, `Critical` blocks on
/// safety grounds regardless of structural validity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
    Critical,
}

/// Outcome of a safety check over a capability call, a proposed change, or
/// an issue description.
///
/// A pure value: `reason` and `severity` are always populated when
/// `safe == false` and always absent when `safe == true`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafetyVerdict {
    pub safe: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,
}

impl SafetyVerdict {
    pub fn allow() -> Self {
        Self {
            safe: true,
            reason: None,
            severity: None,
        }
    }

    pub fn deny(reason: impl Into<String>, severity: Severity) -> Self {
        Self {
            safe: false,
            reason: Some(reason.into()),
            severity: Some(severity),
        }
    }
}

/// Kind of file mutation a capability proposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeType {
    Create,
    Modify,
    Delete,
}

/// Risk level declared by the capability that produced a change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

/// An inert description of a file create/modify/delete.
///
/// Produced by capabilities, collected by the gate, and never applied by
/// this crate; applying a change is the caller's decision after running the
/// validator and classifier over it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposedChange {
    /// Path relative to [`AgentContext::working_dir`](crate::io::context::AgentContext).
    pub file_path: String,
    pub change_type: ChangeType,
    /// Content the capability saw when it built the change (modify only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_content: Option<String>,
    /// Full content after the change (create/modify).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_content: Option<String>,
    pub description: String,
    pub risk_level: RiskLevel,
}

/// One entry of the session audit trail.
///
/// Appended per invocation in dispatch order, including denied calls (whose
/// `result` is the synthetic denial object, not real capability output).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCallRecord {
    pub capability: String,
    pub args: Value,
    pub result: Value,
}

/// Findings from validating one proposed change.
///
/// `errors` block application; `warnings` are advisory. Entries appear in
/// the order the checks ran, which is fixed per change type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationResult {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationResult {
    /// A change is valid iff no check produced an error.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}
