//! Mediator configuration (TOML).

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::session::DEFAULT_STEP_BUDGET;

/// Tunables for one mediated session.
///
/// This file is intended to be edited by humans and must remain stable and
/// automatable. Missing fields default to sensible values.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MediatorConfig {
    /// Maximum number of model-planning iterations per session.
    pub step_budget: u32,

    pub validator: ValidatorOptions,
}

/// Thresholds used by the change validator's advisory checks.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ValidatorOptions {
    /// Warn when a single file's new content exceeds this many characters.
    pub max_content_chars: usize,

    /// Warn when the change ratio exceeds this fraction (major rewrite).
    pub major_rewrite_ratio: f64,
}

impl Default for ValidatorOptions {
    fn default() -> Self {
        Self {
            max_content_chars: 100_000,
            major_rewrite_ratio: 0.8,
        }
    }
}

impl Default for MediatorConfig {
    fn default() -> Self {
        Self {
            step_budget: DEFAULT_STEP_BUDGET,
            validator: ValidatorOptions::default(),
        }
    }
}

impl MediatorConfig {
    pub fn validate(&self) -> Result<()> {
        if self.step_budget == 0 {
            return Err(anyhow!("step_budget must be > 0"));
        }
        if self.validator.max_content_chars == 0 {
            return Err(anyhow!("validator.max_content_chars must be > 0"));
        }
        let ratio = self.validator.major_rewrite_ratio;
        if !(ratio > 0.0 && ratio <= 1.0) {
            return Err(anyhow!("validator.major_rewrite_ratio must be in (0, 1]"));
        }
        Ok(())
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `MediatorConfig::default()`.
pub fn load_config(path: &Path) -> Result<MediatorConfig> {
    if !path.exists() {
        let cfg = MediatorConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: MediatorConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}

/// Atomically write config to disk (temp file + rename).
pub fn write_config(path: &Path, cfg: &MediatorConfig) -> Result<()> {
    cfg.validate()?;
    let mut buf = toml::to_string_pretty(cfg).context("serialize config toml")?;
    buf.push('\n');
    write_atomic(path, &buf)
}

fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let parent = path
        .parent()
        .with_context(|| format!("config path missing parent {}", path.display()))?;
    fs::create_dir_all(parent).with_context(|| format!("create directory {}", parent.display()))?;
    let tmp_path = path.with_extension("toml.tmp");
    fs::write(&tmp_path, contents)
        .with_context(|| format!("write temp config {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace config {}", path.display()))?;
    Ok(())
}
