// crates/orchadapters/tests/graph_test.rs

use orchadapters::GraphAdapter;
use orchcore::{EdgeSpec, NodeSpec, Orchestrator, RunStatus, WorkflowDefinition, TERMINAL_NODE};
use serde_json::{json, Value};

fn valid_graph() -> Value {
    json!({
        "name": "Test Graph",
        "nodes": [
            {"id": "node1", "type": "agent", "config": {}},
            {"id": "node2", "type": "tool", "config": {"tool": "search"}}
        ],
        "edges": [
            {"source": "node1", "target": "node2"},
            {"source": "node2", "target": "END"}
        ]
    })
}

fn errors_of(definition: &Value) -> Vec<String> {
    GraphAdapter::new()
        .validate(definition)
        .errors()
        .unwrap_or_default()
}

#[test]
fn test_valid_graph() {
    let report = GraphAdapter::new().validate(&valid_graph());

    assert!(report.is_valid());
    assert_eq!(report.errors(), None);
}

#[test]
fn test_typed_graph_validates() {
    let workflow = WorkflowDefinition::graph(
        "Router",
        vec![NodeSpec::new("classify", "llm").with_config("model", "gpt-4")],
        vec![EdgeSpec::new("classify", TERMINAL_NODE)],
    );

    let report = GraphAdapter::new().validate(&workflow.to_value().unwrap());

    assert!(report.is_valid(), "{:?}", report.errors());
}

#[test]
fn test_empty_edges_allowed() {
    let definition = json!({
        "name": "Single",
        "nodes": [{"id": "only", "type": "agent", "config": {}}],
        "edges": []
    });

    assert!(errors_of(&definition).is_empty());
}

#[test]
fn test_missing_nodes_short_circuits() {
    let errors = errors_of(&json!({"name": "Test Graph", "edges": [{"source": "x"}]}));

    assert_eq!(errors, vec!["Missing 'nodes' field in workflow"]);
}

#[test]
fn test_missing_edges_reported() {
    let errors = errors_of(&json!({
        "name": "G",
        "nodes": [{"id": "n", "type": "agent", "config": {}}]
    }));

    assert_eq!(errors, vec!["Missing 'edges' field in workflow"]);
}

#[test]
fn test_empty_nodes_and_bad_edges_type() {
    let errors = errors_of(&json!({"name": "G", "nodes": [], "edges": {}}));

    assert_eq!(
        errors,
        vec!["At least one node is required", "'edges' must be a list"]
    );
}

#[test]
fn test_field_errors_per_item() {
    let errors = errors_of(&json!({
        "name": "G",
        "nodes": [{"id": "n1"}, "n2"],
        "edges": [{"source": "n1"}, 42]
    }));

    assert_eq!(
        errors,
        vec![
            "Node 0 missing required field: type",
            "Node 0 missing required field: config",
            "Node 1 must be a mapping",
            "Edge 0 missing required field: target",
            "Edge 1 must be a mapping",
        ]
    );
}

#[test]
fn test_dangling_references() {
    let mut definition = valid_graph();
    definition["edges"] = json!([
        {"source": "ghost", "target": "node1"},
        {"source": "node1", "target": "nowhere"},
        {"source": "END", "target": "END"}
    ]);

    let errors = errors_of(&definition);

    assert_eq!(
        errors,
        vec![
            "Edge 0 references unknown source node: ghost",
            "Edge 1 references unknown target node: nowhere",
            "Edge 2 references unknown source node: END",
        ]
    );
}

#[test]
fn test_terminal_sentinel_is_exact() {
    let mut definition = valid_graph();
    definition["edges"] = json!([{"source": "node1", "target": "end"}]);

    let errors = errors_of(&definition);

    assert_eq!(errors, vec!["Edge 0 references unknown target node: end"]);
}

#[tokio::test]
async fn test_execute_status_stop() {
    let adapter = GraphAdapter::new();

    let handle = adapter.execute(&valid_graph()).await.unwrap();
    assert_eq!(handle.status, RunStatus::Started);
    assert_eq!(handle.message, "LangGraph workflow started successfully");

    let run_id = handle.run_id.to_string();
    assert_eq!(
        adapter.get_status(&run_id).await.unwrap().status,
        RunStatus::Running
    );
    assert!(adapter.stop(&run_id).await.unwrap());
    assert_eq!(
        adapter.get_status(&run_id).await.unwrap().status,
        RunStatus::Stopped
    );
    assert!(!adapter.stop("unknown").await.unwrap());
}
