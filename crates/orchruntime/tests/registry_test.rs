// crates/orchruntime/tests/registry_test.rs

use async_trait::async_trait;
use futures::StreamExt;
use orchcore::{
    Orchestrator, OrchestratorError, ProgressStream, Result, RunHandle, RunStatus,
    RunStatusRecord, RunTracker, ValidationIssue, ValidationReport,
};
use orchruntime::{OrchestratorRegistry, OrchestratorRuntime, RuntimeConfig};
use serde_json::{json, Value};
use std::sync::Arc;

/// Adapter that only requires a `steps` list
struct StepsAdapter {
    name: String,
    runs: RunTracker,
}

impl StepsAdapter {
    fn boxed(name: &str) -> Box<dyn Orchestrator> {
        Box::new(Self {
            name: name.to_string(),
            runs: RunTracker::new(name),
        })
    }
}

#[async_trait]
impl Orchestrator for StepsAdapter {
    fn framework(&self) -> &str {
        &self.name
    }

    fn validate(&self, definition: &Value) -> ValidationReport {
        match definition.get("steps") {
            Some(Value::Array(_)) => ValidationReport::new(),
            Some(_) => ValidationIssue::NotAList { field: "steps" }.into(),
            None => ValidationIssue::MissingCollection { field: "steps" }.into(),
        }
    }

    async fn execute(&self, definition: &Value) -> Result<RunHandle> {
        self.runs.start(definition).await
    }

    async fn stream(&self, definition: &Value) -> Result<ProgressStream> {
        self.runs.stream(definition).await
    }

    async fn get_status(&self, run_id: &str) -> Result<RunStatusRecord> {
        self.runs.status(run_id).await
    }

    async fn stop(&self, run_id: &str) -> Result<bool> {
        self.runs.stop(run_id).await
    }
}

fn registry() -> OrchestratorRegistry {
    let mut registry = OrchestratorRegistry::new();
    registry.register_fn("Steps", || StepsAdapter::boxed("steps"));
    registry.register_fn("other", || StepsAdapter::boxed("other"));
    registry
}

#[test]
fn test_lookup_is_case_insensitive() {
    let registry = registry();

    for name in ["steps", "Steps", "STEPS"] {
        let orchestrator = registry.resolve(name).expect("registered");
        assert_eq!(orchestrator.framework(), "steps");
    }
    assert!(registry.contains("OTHER"));
    assert_eq!(registry.supported_frameworks(), vec!["other", "steps"]);
}

#[test]
fn test_unknown_framework_lists_alternatives() {
    let registry = registry();

    let err = match registry.resolve("unknown-framework") {
        Ok(_) => panic!("lookup should fail"),
        Err(e) => e,
    };

    match &err {
        OrchestratorError::NotSupported { framework, supported } => {
            assert_eq!(framework, "unknown-framework");
            assert_eq!(supported, &vec!["other".to_string(), "steps".to_string()]);
        }
        other => panic!("unexpected error: {}", other),
    }
    assert!(err.to_string().contains("not supported"));
    assert!(err.to_string().contains("other, steps"));
}

#[tokio::test]
async fn test_reregistration_replaces_instance() {
    let mut registry = registry();
    let first = registry.resolve("steps").unwrap();
    let handle = first.execute(&json!({"steps": []})).await.unwrap();

    registry.register_fn("STEPS", || StepsAdapter::boxed("steps"));
    let second = registry.resolve("steps").unwrap();

    let status = second.get_status(&handle.run_id.to_string()).await.unwrap();
    assert!(!status.is_found());
    assert_eq!(registry.supported_frameworks().len(), 2);
}

#[tokio::test]
async fn test_resolve_returns_long_lived_instance() {
    let registry = registry();
    let handle = registry
        .resolve("steps")
        .unwrap()
        .execute(&json!({"steps": []}))
        .await
        .unwrap();

    let status = registry
        .resolve("Steps")
        .unwrap()
        .get_status(&handle.run_id.to_string())
        .await
        .unwrap();
    assert!(status.is_found());

    // A fresh instance has its own empty store
    let fresh = registry.instantiate("steps").unwrap();
    let status = fresh.get_status(&handle.run_id.to_string()).await.unwrap();
    assert!(!status.is_found());
}

#[test]
fn test_pipeline_reports_parse_errors() {
    let runtime = OrchestratorRuntime::new(Arc::new(registry()));

    let outcome = runtime.validate_text("name: [unclosed", Some("steps"));

    assert!(!outcome.valid);
    let errors = outcome.errors.unwrap();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].starts_with("YAML parsing error"));
    assert!(outcome.workflow.is_none());
}

#[test]
fn test_pipeline_combines_shape_and_adapter_errors() {
    let runtime = OrchestratorRuntime::new(Arc::new(registry()));

    let outcome = runtime.validate_text("description: no name here\n", Some("steps"));

    assert!(!outcome.valid);
    assert_eq!(
        outcome.errors.unwrap(),
        vec![
            "Workflow 'name' must be a non-empty string".to_string(),
            "Missing 'steps' field in workflow".to_string(),
        ]
    );
    assert_eq!(outcome.framework.as_deref(), Some("steps"));
}

#[test]
fn test_pipeline_rejects_non_mapping() {
    let runtime = OrchestratorRuntime::new(Arc::new(registry()));

    let outcome = runtime.validate_text("- a\n- b\n", None);

    assert!(!outcome.valid);
    assert_eq!(
        outcome.errors.unwrap(),
        vec!["Workflow definition must be a mapping".to_string()]
    );
    assert!(outcome.framework.is_none());
}

#[test]
fn test_framework_precedence() {
    let config = RuntimeConfig {
        default_framework: "steps".to_string(),
    };
    let runtime = OrchestratorRuntime::with_config(Arc::new(registry()), config);
    let pipeline = runtime.pipeline();
    let document = json!({"name": "W", "framework": "Other"});

    assert_eq!(pipeline.select_framework(&document, Some("STEPS")), "steps");
    assert_eq!(pipeline.select_framework(&document, None), "other");
    assert_eq!(pipeline.select_framework(&json!({"name": "W"}), None), "steps");
    assert_eq!(pipeline.select_framework(&json!({"name": "W"}), Some("")), "steps");
}

#[test]
fn test_pipeline_unknown_framework() {
    let runtime = OrchestratorRuntime::new(Arc::new(registry()));

    let outcome = runtime.validate_text("name: W\nsteps: []\n", Some("nope"));

    assert!(!outcome.valid);
    let errors = outcome.errors.unwrap();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].starts_with("Framework error: Framework 'nope' is not supported"));
}

#[test]
fn test_pipeline_unknown_framework_keeps_shape_errors() {
    let runtime = OrchestratorRuntime::new(Arc::new(registry()));

    let outcome = runtime.validate_text("steps: []
", Some("nope"));

    assert!(!outcome.valid);
    let errors = outcome.errors.unwrap();
    assert_eq!(errors.len(), 2);
    assert_eq!(errors[0], "Workflow 'name' must be a non-empty string");
    assert!(errors[1].starts_with("Framework error: Framework 'nope' is not supported"));
    assert_eq!(outcome.framework.as_deref(), Some("nope"));
}

#[tokio::test]
async fn test_runtime_start_indexes_runs() {
    let config = RuntimeConfig {
        default_framework: "steps".to_string(),
    };
    let runtime = OrchestratorRuntime::with_config(Arc::new(registry()), config);

    let handle = runtime
        .start(&json!({"name": "W", "steps": []}), None)
        .await
        .unwrap();
    let run_id = handle.run_id.to_string();

    let status = runtime.status(&run_id, None).await.unwrap();
    assert!(status.is_found());

    // Asking the wrong adapter finds nothing
    let status = runtime.status(&run_id, Some("other")).await.unwrap();
    assert!(!status.is_found());

    assert!(runtime.stop(&run_id, None).await.unwrap());
    assert!(!runtime.stop("missing", None).await.unwrap());
}

#[tokio::test]
async fn test_runtime_indexes_runs_under_registered_alias() {
    let mut registry = OrchestratorRegistry::new();
    registry.register_fn("steps-alias", || StepsAdapter::boxed("steps"));
    let runtime = OrchestratorRuntime::new(Arc::new(registry));
    let definition = json!({"name": "W", "steps": []});

    let handle = runtime.start(&definition, Some("Steps-Alias")).await.unwrap();
    assert_eq!(handle.framework, "steps");
    let run_id = handle.run_id.to_string();

    let status = runtime.status(&run_id, None).await.unwrap();
    assert!(status.is_found());
    assert!(runtime.stop(&run_id, None).await.unwrap());
}

#[tokio::test]
async fn test_runtime_alias_and_builtin_keep_runs_apart() {
    let mut registry = registry();
    registry.register_fn("steps-alias", || StepsAdapter::boxed("steps"));
    let runtime = OrchestratorRuntime::new(Arc::new(registry));

    let handle = runtime
        .start(&json!({"name": "W", "steps": []}), Some("steps-alias"))
        .await
        .unwrap();
    let run_id = handle.run_id.to_string();

    // Looked up through the alias that started it, not the adapter's own name
    let status = runtime.status(&run_id, None).await.unwrap();
    assert!(status.is_found());
    let status = runtime.status(&run_id, Some("steps")).await.unwrap();
    assert!(!status.is_found());
}

#[tokio::test]
async fn test_runtime_stream_indexes_runs() {
    let runtime = OrchestratorRuntime::new(Arc::new(registry()));

    let updates: Vec<_> = runtime
        .stream(&json!({"name": "W", "steps": []}), Some("other"))
        .await
        .unwrap()
        .collect()
        .await;
    let run_id = updates[0].run_id.to_string();

    let status = runtime.status(&run_id, None).await.unwrap();
    assert_eq!(status.status, RunStatus::Completed);
    assert!(runtime.stop(&run_id, None).await.unwrap());
}

#[tokio::test]
async fn test_runtime_start_rejects_invalid_definition() {
    let runtime = OrchestratorRuntime::new(Arc::new(registry()));

    let err = runtime
        .start(&json!({"name": "W"}), Some("steps"))
        .await
        .unwrap_err();

    match err {
        OrchestratorError::InvalidDefinition { framework, report } => {
            assert_eq!(framework, "steps");
            assert_eq!(report.len(), 1);
        }
        other => panic!("unexpected error: {}", other),
    }
}
