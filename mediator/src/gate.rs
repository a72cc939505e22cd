//! Interception gate between the model and the real capabilities.
//!
//! Every requested invocation passes through [`ToolGate::dispatch`]:
//! safety-check, execute if safe, record. Denials are recorded as synthetic
//! results the model sees like ordinary tool output, so it can adapt its
//! plan instead of crashing the session. The gate never alters arguments,
//! never alters a successful payload, and never retries.

use anyhow::Result;
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::capability::CapabilityRegistry;
use crate::core::safety::check_capability_call;
use crate::core::types::{ProposedChange, ToolCallRecord};
use crate::io::context::AgentContext;

/// Session-scoped wrapper owning the audit trail and the collected changes.
pub struct ToolGate<'a> {
    registry: &'a CapabilityRegistry,
    ctx: &'a AgentContext,
    calls: Vec<ToolCallRecord>,
    changes: Vec<ProposedChange>,
}

impl<'a> ToolGate<'a> {
    pub fn new(registry: &'a CapabilityRegistry, ctx: &'a AgentContext) -> Self {
        Self {
            registry,
            ctx,
            calls: Vec::new(),
            changes: Vec::new(),
        }
    }

    /// Dispatch one requested invocation.
    ///
    /// Unknown names, schema violations, and safety denials all become
    /// recorded synthetic results. Only a capability's own fatal error
    /// propagates; it aborts the session per the error tiers.
    pub fn dispatch(&mut self, name: &str, args: Value) -> Result<ToolCallRecord> {
        let registry = self.registry;
        let Some(capability) = registry.get(name) else {
            warn!(capability = name, "unknown capability requested");
            let result = json!({"error": format!("unknown capability: {name}")});
            return Ok(self.record(name, args, result));
        };

        if let Err(message) = capability.check_args(&args) {
            warn!(capability = name, %message, "arguments rejected by schema");
            let result = json!({"error": format!("invalid arguments: {message}")});
            return Ok(self.record(name, args, result));
        }

        let verdict = check_capability_call(name, &args, self.ctx);
        if !verdict.safe {
            let reason = verdict.reason.as_deref().unwrap_or("unspecified");
            warn!(capability = name, reason, "capability call denied");
            let result = json!({"error": format!("Safety check failed: {reason}")});
            return Ok(self.record(name, args, result));
        }

        let output = capability.execute(&args, self.ctx)?;
        if let Some(change) = output.change() {
            debug!(
                capability = name,
                path = %change.file_path,
                "collected proposed change"
            );
            self.changes.push(change.clone());
        }
        let result = output.result().clone();
        Ok(self.record(name, args, result))
    }

    fn record(&mut self, name: &str, args: Value, result: Value) -> ToolCallRecord {
        let record = ToolCallRecord {
            capability: name.to_string(),
            args,
            result,
        };
        self.calls.push(record.clone());
        record
    }

    /// Audit trail so far, in exact invocation order (denials included).
    pub fn calls(&self) -> &[ToolCallRecord] {
        &self.calls
    }

    /// Changes collected so far, in discovery order.
    pub fn changes(&self) -> &[ProposedChange] {
        &self.changes
    }

    pub fn into_parts(self) -> (Vec<ToolCallRecord>, Vec<ProposedChange>) {
        (self.calls, self.changes)
    }
}
