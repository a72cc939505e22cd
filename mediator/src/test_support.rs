//! Test-only fakes: scripted models and capabilities that never touch a
//! real backend.

use std::cell::Cell;
use std::collections::VecDeque;
use std::path::Path;
use std::rc::Rc;

use anyhow::{Result, anyhow};
use serde_json::{Value, json};

use crate::capability::{Capability, CapabilityOutput, CapabilitySpec};
use crate::core::types::{ChangeType, ProposedChange, RiskLevel, ToolCallRecord};
use crate::io::context::AgentContext;
use crate::session::{Model, ModelTurn, SessionPrompt};

/// Context rooted at a test directory with fixed repo coordinates.
pub fn test_context(dir: &Path) -> AgentContext {
    AgentContext::new(dir, "acme", "widgets")
}

/// Accept-anything object schema for fakes.
pub fn permissive_schema() -> Value {
    json!({"type": "object"})
}

/// Deterministic low-risk modify change for gate/session tests.
pub fn sample_change(path: &str) -> ProposedChange {
    ProposedChange {
        file_path: path.to_string(),
        change_type: ChangeType::Modify,
        original_content: Some("const a = 1;".to_string()),
        new_content: Some("const a = 2;".to_string()),
        description: format!("bump constant in {path}"),
        risk_level: RiskLevel::Low,
    }
}

/// Capability that echoes its arguments back and counts invocations, so
/// tests can assert a denied call never reached it.
pub struct EchoCapability {
    spec: CapabilitySpec,
    invocations: Rc<Cell<u32>>,
}

impl EchoCapability {
    pub fn new(name: &str) -> Self {
        Self {
            spec: CapabilitySpec {
                name: name.to_string(),
                description: format!("echo fake for {name}"),
                input_schema: permissive_schema(),
            },
            invocations: Rc::new(Cell::new(0)),
        }
    }

    /// Shared invocation counter; keep a clone before boxing the fake.
    pub fn invocations(&self) -> Rc<Cell<u32>> {
        Rc::clone(&self.invocations)
    }
}

impl Capability for EchoCapability {
    fn spec(&self) -> &CapabilitySpec {
        &self.spec
    }

    fn execute(&self, args: &Value, _ctx: &AgentContext) -> Result<CapabilityOutput> {
        self.invocations.set(self.invocations.get() + 1);
        Ok(CapabilityOutput::Plain(json!({"echo": args})))
    }
}

/// Capability that returns a fixed proposed change on every invocation.
pub struct ChangeCapability {
    spec: CapabilitySpec,
    change: ProposedChange,
}

impl ChangeCapability {
    pub fn new(name: &str, change: ProposedChange) -> Self {
        Self {
            spec: CapabilitySpec {
                name: name.to_string(),
                description: format!("change-proposing fake for {name}"),
                input_schema: permissive_schema(),
            },
            change,
        }
    }
}

impl Capability for ChangeCapability {
    fn spec(&self) -> &CapabilitySpec {
        &self.spec
    }

    fn execute(&self, _args: &Value, _ctx: &AgentContext) -> Result<CapabilityOutput> {
        Ok(CapabilityOutput::Change {
            result: json!({"proposed": self.change.file_path}),
            change: self.change.clone(),
        })
    }
}

/// Capability whose execution always fails fatally.
pub struct FailingCapability {
    spec: CapabilitySpec,
}

impl FailingCapability {
    pub fn new(name: &str) -> Self {
        Self {
            spec: CapabilitySpec {
                name: name.to_string(),
                description: format!("always-failing fake for {name}"),
                input_schema: permissive_schema(),
            },
        }
    }
}

impl Capability for FailingCapability {
    fn spec(&self) -> &CapabilitySpec {
        &self.spec
    }

    fn execute(&self, _args: &Value, _ctx: &AgentContext) -> Result<CapabilityOutput> {
        Err(anyhow!("backend unavailable"))
    }
}

/// Model that replays a fixed list of turns (optionally repeating the last
/// shape forever) and records what each step was shown.
pub struct ScriptedModel {
    turns: VecDeque<ModelTurn>,
    repeating: Option<ModelTurn>,
    consumed: u32,
    seen_results: Vec<Vec<ToolCallRecord>>,
}

impl ScriptedModel {
    pub fn new(turns: Vec<ModelTurn>) -> Self {
        Self {
            turns: turns.into(),
            repeating: None,
            consumed: 0,
            seen_results: Vec::new(),
        }
    }

    /// A model that emits the same turn on every step, for budget tests.
    pub fn repeating(turn: ModelTurn) -> Self {
        Self {
            turns: VecDeque::new(),
            repeating: Some(turn),
            consumed: 0,
            seen_results: Vec::new(),
        }
    }

    pub fn turns_consumed(&self) -> u32 {
        self.consumed
    }

    /// Tool results shown to the model, one entry per step.
    pub fn seen_results(&self) -> &[Vec<ToolCallRecord>] {
        &self.seen_results
    }
}

impl Model for ScriptedModel {
    fn send(&mut self, prompt: &SessionPrompt) -> Result<ModelTurn> {
        self.seen_results.push(prompt.tool_results.to_vec());
        if let Some(turn) = self.turns.pop_front() {
            self.consumed += 1;
            return Ok(turn);
        }
        if let Some(turn) = &self.repeating {
            self.consumed += 1;
            return Ok(turn.clone());
        }
        Err(anyhow!(
            "scripted model exhausted after {} turn(s)",
            self.consumed
        ))
    }
}
