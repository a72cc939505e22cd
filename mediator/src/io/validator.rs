//! Pre-apply validation of proposed changes against the working tree.
//!
//! The validator never raises: every finding comes back as data in a
//! [`ValidationResult`], including malformed change fields. Errors block
//! application; warnings are advisory and must not be treated as failures.

use std::fs;
use std::path::{Component, Path, PathBuf};

use tracing::debug;

use crate::core::content::{change_ratio, check_content};
use crate::core::types::{ChangeType, ProposedChange, ValidationResult};
use crate::io::config::ValidatorOptions;
use crate::io::context::AgentContext;

/// Manifests whose deletion would strand the build; deleting them is always
/// an error.
const IRREPLACEABLE_MANIFESTS: &[&str] = &["package.json", "tsconfig.json"];

/// Validate one proposed change against the current repository state.
///
/// Pure in the sense of spec'd behavior: the result depends only on the
/// change and the on-disk state at call time, so validating an unchanged
/// proposal twice yields identical results.
pub fn validate_change(
    change: &ProposedChange,
    ctx: &AgentContext,
    opts: &ValidatorOptions,
) -> ValidationResult {
    let mut result = ValidationResult::default();

    let Some(target) = resolve_target(change, ctx, &mut result) else {
        return result;
    };

    match change.change_type {
        ChangeType::Create => check_create(change, &target, &mut result),
        ChangeType::Modify => check_modify(change, &target, &mut result),
        ChangeType::Delete => check_delete(change, &target, &mut result),
    }

    if let Some(new_content) = &change.new_content {
        if new_content.len() > opts.max_content_chars {
            result.warnings.push(format!(
                "new content of '{}' is {} characters (limit {}); split the change",
                change.file_path,
                new_content.len(),
                opts.max_content_chars
            ));
        }
        if let Some(original) = &change.original_content {
            let ratio = change_ratio(original, new_content);
            if ratio > opts.major_rewrite_ratio {
                result.warnings.push(format!(
                    "change rewrites {:.0}% of '{}'; major rewrite, review closely",
                    ratio * 100.0,
                    change.file_path
                ));
            }
        }
    }

    debug!(
        path = %change.file_path,
        errors = result.errors.len(),
        warnings = result.warnings.len(),
        "validated change"
    );
    result
}

/// Resolve the change path under the working directory, rejecting shapes
/// that could escape it. Returns `None` when the path itself is malformed.
fn resolve_target(
    change: &ProposedChange,
    ctx: &AgentContext,
    result: &mut ValidationResult,
) -> Option<PathBuf> {
    if change.file_path.trim().is_empty() {
        result.errors.push("change is missing a file path".to_string());
        return None;
    }
    let relative = Path::new(&change.file_path);
    if relative.is_absolute()
        || relative
            .components()
            .any(|component| matches!(component, Component::ParentDir))
    {
        result.errors.push(format!(
            "path '{}' escapes the working directory",
            change.file_path
        ));
        return None;
    }
    Some(ctx.working_dir.join(relative))
}

fn check_create(change: &ProposedChange, target: &Path, result: &mut ValidationResult) {
    if target.exists() {
        result.errors.push(format!(
            "cannot create '{}': file already exists",
            change.file_path
        ));
    }
    match &change.new_content {
        None => result.errors.push(format!(
            "create change for '{}' is missing new content",
            change.file_path
        )),
        Some(content) => append_content_findings(&change.file_path, content, result),
    }
}

fn check_modify(change: &ProposedChange, target: &Path, result: &mut ValidationResult) {
    if !target.exists() {
        result.errors.push(format!(
            "cannot modify '{}': file does not exist",
            change.file_path
        ));
    }
    match &change.new_content {
        None => result.errors.push(format!(
            "modify change for '{}' is missing new content",
            change.file_path
        )),
        Some(content) => {
            if let Some(original) = &change.original_content {
                // Stale-base detection: the file moved under the agent
                // between proposal and validation.
                if let Ok(current) = fs::read_to_string(target) {
                    if current != *original {
                        result.warnings.push(format!(
                            "on-disk content of '{}' differs from the captured original \
                             (stale base)",
                            change.file_path
                        ));
                    }
                }
            }
            append_content_findings(&change.file_path, content, result);
        }
    }
}

fn check_delete(change: &ProposedChange, target: &Path, result: &mut ValidationResult) {
    if !target.exists() {
        result.warnings.push(format!(
            "'{}' is already absent; delete is a no-op",
            change.file_path
        ));
    }
    if is_test_file(&change.file_path) {
        result.warnings.push(format!(
            "'{}' looks like a test file; confirm the coverage is replaced",
            change.file_path
        ));
    }
    if let Some(name) = file_name(&change.file_path) {
        if IRREPLACEABLE_MANIFESTS.contains(&name) {
            result.errors.push(format!(
                "'{}' cannot be deleted: irreplaceable build metadata",
                change.file_path
            ));
        }
    }
}

fn append_content_findings(path: &str, content: &str, result: &mut ValidationResult) {
    let report = check_content(path, content);
    result.errors.extend(report.errors);
    result.warnings.extend(report.warnings);
}

fn is_test_file(path: &str) -> bool {
    let Some(name) = file_name(path) else {
        return false;
    };
    if name.contains(".test.") || name.contains(".spec.") {
        return true;
    }
    Path::new(name)
        .file_stem()
        .map(|stem| stem.to_string_lossy().ends_with("_test"))
        .unwrap_or(false)
}

fn file_name(path: &str) -> Option<&str> {
    path.rsplit(['/', '\\']).next()
}
