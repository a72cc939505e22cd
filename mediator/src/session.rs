//! Step-bounded orchestration loop driving one mediated session.
//!
//! The loop alternates between awaiting the model and dispatching the
//! capability calls it requested, through the gate, until the model stops
//! requesting calls or the step budget runs out. Model and fatal capability
//! errors propagate to the caller untouched; the loop adds no retries, no
//! timeouts, and no cancellation beyond the budget.

use anyhow::Result;
use serde_json::Value;
use tracing::{debug, info, instrument};

use crate::capability::{CapabilityRegistry, CapabilitySpec};
use crate::core::types::{ProposedChange, ToolCallRecord};
use crate::gate::ToolGate;
use crate::io::context::AgentContext;

/// Default maximum number of model-planning iterations per session.
pub const DEFAULT_STEP_BUDGET: u32 = 12;

/// Inputs for one session.
#[derive(Debug, Clone)]
pub struct SessionRequest {
    pub system: String,
    pub task: String,
    /// Zero means "use [`DEFAULT_STEP_BUDGET`]".
    pub step_budget: u32,
}

impl SessionRequest {
    /// Build a request carrying the configured step budget.
    pub fn with_config(
        system: impl Into<String>,
        task: impl Into<String>,
        config: &crate::io::config::MediatorConfig,
    ) -> Self {
        Self {
            system: system.into(),
            task: task.into(),
            step_budget: config.step_budget,
        }
    }
}

/// One capability invocation the model asked for.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolRequest {
    pub capability: String,
    pub args: Value,
}

/// One model planning step: narrative text plus requested invocations.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelTurn {
    pub text: String,
    pub calls: Vec<ToolRequest>,
}

/// Everything the model sees on one step.
#[derive(Debug, Clone)]
pub struct SessionPrompt<'a> {
    pub system: &'a str,
    pub task: &'a str,
    pub capabilities: &'a [CapabilitySpec],
    /// 1-indexed step number.
    pub step: u32,
    pub step_budget: u32,
    /// Records produced by the previous step's dispatches (empty on step 1).
    pub tool_results: &'a [ToolCallRecord],
}

/// Narrow provider-agnostic seam to the inference backend.
///
/// Implementations own their conversation state; the loop only hands over
/// the prompt for the current step. Errors propagate out of the loop as
/// session failures.
pub trait Model {
    fn send(&mut self, prompt: &SessionPrompt) -> Result<ModelTurn>;
}

/// The sole output of one session run.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionOutcome {
    /// The model's final answer text (last non-empty turn).
    pub model_text: String,
    /// Changes surfaced by capabilities, in discovery order. Inert until
    /// the caller validates and applies them.
    pub proposed_changes: Vec<ProposedChange>,
    /// The full audit trail, in invocation order, denials included.
    pub tool_calls: Vec<ToolCallRecord>,
}

/// Drive one session to completion or budget exhaustion.
///
/// The budget bounds model steps, not capability calls: every call the
/// model requests within a step is dispatched, then the step counts against
/// the budget. Budget exhaustion returns the partial outcome accumulated so
/// far, which is the only cancellation mechanism this loop has.
#[instrument(skip_all, fields(repo = %ctx.repo_slug(), budget = request.step_budget))]
pub fn run_session<M: Model>(
    model: &mut M,
    registry: &CapabilityRegistry,
    ctx: &AgentContext,
    request: &SessionRequest,
) -> Result<SessionOutcome> {
    let budget = if request.step_budget == 0 {
        DEFAULT_STEP_BUDGET
    } else {
        request.step_budget
    };
    let specs = registry.specs();
    let mut gate = ToolGate::new(registry, ctx);
    let mut model_text = String::new();
    let mut previous_results: Vec<ToolCallRecord> = Vec::new();

    info!(capabilities = specs.len(), budget, "starting session");

    for step in 1..=budget {
        let prompt = SessionPrompt {
            system: &request.system,
            task: &request.task,
            capabilities: &specs,
            step,
            step_budget: budget,
            tool_results: &previous_results,
        };
        let turn = model.send(&prompt)?;

        if !turn.text.trim().is_empty() {
            model_text = turn.text;
        }
        if turn.calls.is_empty() {
            debug!(step, "model produced a final answer");
            break;
        }

        debug!(step, calls = turn.calls.len(), "dispatching requested calls");
        previous_results = turn
            .calls
            .into_iter()
            .map(|call| gate.dispatch(&call.capability, call.args))
            .collect::<Result<Vec<_>>>()?;
    }

    let (tool_calls, proposed_changes) = gate.into_parts();
    info!(
        tool_calls = tool_calls.len(),
        proposed_changes = proposed_changes.len(),
        "session finished"
    );
    Ok(SessionOutcome {
        model_text,
        proposed_changes,
        tool_calls,
    })
}
