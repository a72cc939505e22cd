//! End-to-end flow: a scripted model plans against a small registry, the
//! gate records and denies, and the caller validates the collected changes
//! before deciding what to apply.

use mediator::capability::CapabilityRegistry;
use mediator::core::safety::check_change;
use mediator::core::types::{ChangeType, ProposedChange, RiskLevel, Severity};
use mediator::io::config::ValidatorOptions;
use mediator::io::validator::validate_change;
use mediator::session::{ModelTurn, SessionRequest, ToolRequest, run_session};
use mediator::test_support::{
    ChangeCapability, EchoCapability, FailingCapability, ScriptedModel, test_context,
};
use serde_json::json;

fn request(step_budget: u32) -> SessionRequest {
    SessionRequest {
        system: "you maintain this repository".to_string(),
        task: "fix issue #7".to_string(),
        step_budget,
    }
}

fn call(capability: &str, args: serde_json::Value) -> ToolRequest {
    ToolRequest {
        capability: capability.to_string(),
        args,
    }
}

#[test]
fn full_session_collects_audit_trail_and_changes() {
    let temp = tempfile::tempdir().expect("tempdir");
    std::fs::write(temp.path().join("app.ts"), "const total = 0;").expect("write fixture");
    let ctx = test_context(temp.path());

    let proposed = ProposedChange {
        file_path: "app.ts".to_string(),
        change_type: ChangeType::Modify,
        original_content: Some("const total = 0;".to_string()),
        new_content: Some("const total = 1;".to_string()),
        description: "initialize total".to_string(),
        risk_level: RiskLevel::Low,
    };

    let mut registry = CapabilityRegistry::new();
    registry
        .register(Box::new(EchoCapability::new("read_file")))
        .expect("register read_file");
    registry
        .register(Box::new(ChangeCapability::new("propose_fix", proposed)))
        .expect("register propose_fix");

    let mut model = ScriptedModel::new(vec![
        ModelTurn {
            text: String::new(),
            calls: vec![call("read_file", json!({"path": "app.ts"}))],
        },
        ModelTurn {
            text: String::new(),
            calls: vec![call("propose_fix", json!({}))],
        },
        ModelTurn {
            text: "fixed the initialization bug".to_string(),
            calls: Vec::new(),
        },
    ]);

    let outcome = run_session(&mut model, &registry, &ctx, &request(10)).expect("session");

    assert_eq!(outcome.model_text, "fixed the initialization bug");
    let names: Vec<_> = outcome
        .tool_calls
        .iter()
        .map(|record| record.capability.clone())
        .collect();
    assert_eq!(names, vec!["read_file", "propose_fix"]);
    assert_eq!(outcome.proposed_changes.len(), 1);

    // Caller-side gating before apply: classifier then validator.
    let change = &outcome.proposed_changes[0];
    assert!(check_change(change).safe);
    let result = validate_change(change, &ctx, &ValidatorOptions::default());
    assert!(result.is_valid(), "errors: {:?}", result.errors);
}

#[test]
fn denied_write_is_audited_and_the_model_can_adapt() {
    let temp = tempfile::tempdir().expect("tempdir");
    let ctx = test_context(temp.path());

    let mut registry = CapabilityRegistry::new();
    let spy = EchoCapability::new("write_file");
    let invocations = spy.invocations();
    registry.register(Box::new(spy)).expect("register");

    let mut model = ScriptedModel::new(vec![
        ModelTurn {
            text: String::new(),
            calls: vec![call("write_file", json!({"path": ".env", "content": "K=v"}))],
        },
        // The model sees the denial as tool output and gives up cleanly.
        ModelTurn {
            text: "cannot touch that file".to_string(),
            calls: Vec::new(),
        },
    ]);

    let outcome = run_session(&mut model, &registry, &ctx, &request(5)).expect("session");

    assert_eq!(invocations.get(), 0, "denied call must not execute");
    assert_eq!(outcome.tool_calls.len(), 1);
    let denial = outcome.tool_calls[0].result["error"]
        .as_str()
        .expect("denial message");
    assert!(denial.starts_with("Safety check failed:"));
    assert!(outcome.proposed_changes.is_empty());
    // The denial was visible to the next step.
    assert_eq!(model.seen_results()[1].len(), 1);
}

#[test]
fn step_budget_bounds_the_session_at_step_granularity() {
    let temp = tempfile::tempdir().expect("tempdir");
    let ctx = test_context(temp.path());

    let mut registry = CapabilityRegistry::new();
    registry
        .register(Box::new(EchoCapability::new("read_file")))
        .expect("register");

    let mut model = ScriptedModel::repeating(ModelTurn {
        text: String::new(),
        calls: vec![call("read_file", json!({"path": "a"}))],
    });

    let outcome = run_session(&mut model, &registry, &ctx, &request(1)).expect("session");
    assert_eq!(outcome.tool_calls.len(), 1);
    assert_eq!(model.turns_consumed(), 1);
}

#[test]
fn fatal_capability_error_aborts_the_session() {
    let temp = tempfile::tempdir().expect("tempdir");
    let ctx = test_context(temp.path());

    let mut registry = CapabilityRegistry::new();
    registry
        .register(Box::new(FailingCapability::new("read_file")))
        .expect("register");

    let mut model = ScriptedModel::repeating(ModelTurn {
        text: String::new(),
        calls: vec![call("read_file", json!({}))],
    });

    let err = run_session(&mut model, &registry, &ctx, &request(3)).expect_err("must abort");
    assert!(err.to_string().contains("backend unavailable"));
}

#[test]
fn protected_path_change_is_critical_regardless_of_content() {
    let change = ProposedChange {
        file_path: "config/secrets/tokens.yaml".to_string(),
        change_type: ChangeType::Create,
        original_content: None,
        new_content: Some("harmless: true\n".to_string()),
        description: "add token config".to_string(),
        risk_level: RiskLevel::Low,
    };
    let verdict = check_change(&change);
    assert!(!verdict.safe);
    assert_eq!(verdict.severity, Some(Severity::Critical));
}
