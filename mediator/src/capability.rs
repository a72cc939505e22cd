//! Capability abstraction and registry.
//!
//! A capability is a named, schema-described operation the model may
//! invoke. The registry owns the boxed implementations for one session and
//! compiles each declared input schema at registration time, so malformed
//! definitions fail fast instead of at dispatch.

use anyhow::{Result, anyhow};
use jsonschema::{Validator, validator_for};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::types::ProposedChange;
use crate::io::context::AgentContext;

/// Declared surface of a capability: what the model sees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapabilitySpec {
    pub name: String,
    pub description: String,
    /// JSON Schema for the arguments, used for documentation and runtime
    /// validation.
    pub input_schema: Value,
}

/// What a capability execution produced.
///
/// A tagged union rather than structural sniffing: a capability that
/// represents a file mutation returns `Change` and the gate extracts the
/// proposal exhaustively.
#[derive(Debug, Clone, PartialEq)]
pub enum CapabilityOutput {
    Plain(Value),
    Change {
        result: Value,
        change: ProposedChange,
    },
}

impl CapabilityOutput {
    /// The payload recorded in the audit trail and shown to the model.
    pub fn result(&self) -> &Value {
        match self {
            Self::Plain(result) => result,
            Self::Change { result, .. } => result,
        }
    }

    pub fn change(&self) -> Option<&ProposedChange> {
        match self {
            Self::Plain(_) => None,
            Self::Change { change, .. } => Some(change),
        }
    }
}

/// An executable operation the model may request.
///
/// Implementations own their side effects; a non-fatal failure should be
/// expressed in the returned payload (an `error` field), while a returned
/// `Err` is fatal and aborts the whole session.
pub trait Capability {
    fn spec(&self) -> &CapabilitySpec;

    fn execute(&self, args: &Value, ctx: &AgentContext) -> Result<CapabilityOutput>;
}

/// One registered capability plus its compiled argument validator.
pub struct RegisteredCapability {
    capability: Box<dyn Capability>,
    validator: Validator,
}

impl RegisteredCapability {
    pub fn spec(&self) -> &CapabilitySpec {
        self.capability.spec()
    }

    /// Check arguments against the declared schema; `Err` carries the
    /// joined schema violation messages.
    pub fn check_args(&self, args: &Value) -> Result<(), String> {
        if self.validator.is_valid(args) {
            return Ok(());
        }
        let messages = self
            .validator
            .iter_errors(args)
            .map(|err| err.to_string())
            .collect::<Vec<_>>();
        Err(messages.join("; "))
    }

    pub fn execute(&self, args: &Value, ctx: &AgentContext) -> Result<CapabilityOutput> {
        self.capability.execute(args, ctx)
    }
}

/// Ordered collection of the capabilities available to one session.
#[derive(Default)]
pub struct CapabilityRegistry {
    capabilities: Vec<RegisteredCapability>,
}

impl CapabilityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a capability. Duplicate names and uncompilable schemas are
    /// fatal: both are malformed definitions, not runtime conditions.
    pub fn register(&mut self, capability: Box<dyn Capability>) -> Result<()> {
        let name = capability.spec().name.clone();
        if self.get(&name).is_some() {
            return Err(anyhow!("duplicate capability '{name}'"));
        }
        let validator = validator_for(&capability.spec().input_schema)
            .map_err(|err| anyhow!("invalid input schema for '{name}': {err}"))?;
        self.capabilities.push(RegisteredCapability {
            capability,
            validator,
        });
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&RegisteredCapability> {
        self.capabilities
            .iter()
            .find(|registered| registered.spec().name == name)
    }

    /// Declared specs in registration order, for the model prompt.
    pub fn specs(&self) -> Vec<CapabilitySpec> {
        self.capabilities
            .iter()
            .map(|registered| registered.spec().clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.capabilities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.capabilities.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::EchoCapability;
    use serde_json::json;

    #[test]
    fn register_rejects_duplicate_names() {
        let mut registry = CapabilityRegistry::new();
        registry
            .register(Box::new(EchoCapability::new("echo")))
            .expect("first registration");
        let err = registry
            .register(Box::new(EchoCapability::new("echo")))
            .expect_err("duplicate should fail");
        assert!(err.to_string().contains("duplicate capability"));
    }

    #[test]
    fn register_rejects_uncompilable_schema() {
        struct BadSchema {
            spec: CapabilitySpec,
        }
        impl Capability for BadSchema {
            fn spec(&self) -> &CapabilitySpec {
                &self.spec
            }
            fn execute(&self, _args: &Value, _ctx: &AgentContext) -> Result<CapabilityOutput> {
                Ok(CapabilityOutput::Plain(Value::Null))
            }
        }

        let mut registry = CapabilityRegistry::new();
        let err = registry
            .register(Box::new(BadSchema {
                spec: CapabilitySpec {
                    name: "bad".to_string(),
                    description: "broken schema".to_string(),
                    input_schema: json!({"type": "no-such-type"}),
                },
            }))
            .expect_err("bad schema should fail");
        assert!(err.to_string().contains("invalid input schema"));
    }

    #[test]
    fn check_args_reports_schema_violations() {
        let mut registry = CapabilityRegistry::new();
        struct Strict {
            spec: CapabilitySpec,
        }
        impl Capability for Strict {
            fn spec(&self) -> &CapabilitySpec {
                &self.spec
            }
            fn execute(&self, _args: &Value, _ctx: &AgentContext) -> Result<CapabilityOutput> {
                Ok(CapabilityOutput::Plain(Value::Null))
            }
        }
        registry
            .register(Box::new(Strict {
                spec: CapabilitySpec {
                    name: "strict".to_string(),
                    description: "requires a path".to_string(),
                    input_schema: json!({
                        "type": "object",
                        "properties": {"path": {"type": "string"}},
                        "required": ["path"]
                    }),
                },
            }))
            .expect("register");

        let registered = registry.get("strict").expect("registered");
        assert!(registered.check_args(&json!({"path": "a.ts"})).is_ok());
        assert!(registered.check_args(&json!({})).is_err());
    }

    #[test]
    fn specs_preserve_registration_order() {
        let mut registry = CapabilityRegistry::new();
        registry
            .register(Box::new(EchoCapability::new("first")))
            .expect("register");
        registry
            .register(Box::new(EchoCapability::new("second")))
            .expect("register");
        let names: Vec<_> = registry.specs().into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["first", "second"]);
    }
}
