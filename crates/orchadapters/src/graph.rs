use async_trait::async_trait;
use orchcore::validation::{
    check_collection, check_required_fields, declared_values, display_value, Collection,
};
use orchcore::{
    ItemKind, Orchestrator, ProgressStream, Result, RunHandle, RunStatusRecord, RunStore,
    RunTracker, ValidationIssue, ValidationReport, TERMINAL_NODE,
};
use orchruntime::{FrameworkMetadata, OrchestratorFactory};
use serde_json::Value;
use std::sync::Arc;

pub const GRAPH_FRAMEWORK: &str = "langgraph";
pub const GRAPH_DISPLAY_NAME: &str = "LangGraph";

const NODE_FIELDS: [&str; 3] = ["id", "type", "config"];
const EDGE_FIELDS: [&str; 2] = ["source", "target"];

/// Adapter for node/edge (graph style) workflows
pub struct GraphAdapter {
    runs: RunTracker,
}

impl GraphAdapter {
    pub fn new() -> Self {
        Self {
            runs: RunTracker::new(GRAPH_FRAMEWORK).with_display_name(GRAPH_DISPLAY_NAME),
        }
    }

    pub fn with_store(store: Arc<dyn RunStore>) -> Self {
        Self {
            runs: RunTracker::with_store(GRAPH_FRAMEWORK, store)
                .with_display_name(GRAPH_DISPLAY_NAME),
        }
    }
}

impl Default for GraphAdapter {
    fn default() -> Self {
        Self::new()
    }
}

fn is_terminal(target: &Value) -> bool {
    target.as_str() == Some(TERMINAL_NODE)
}

#[async_trait]
impl Orchestrator for GraphAdapter {
    fn framework(&self) -> &str {
        GRAPH_FRAMEWORK
    }

    fn validate(&self, definition: &Value) -> ValidationReport {
        let mut report = ValidationReport::new();

        let Some(body) = definition.as_object() else {
            report.push(ValidationIssue::NotAMapping);
            return report;
        };

        let nodes = match check_collection(body, "nodes", "node", true, &mut report) {
            Collection::Missing => {
                report.push(ValidationIssue::MissingCollection { field: "nodes" });
                return report;
            }
            Collection::NotAList => &[][..],
            Collection::Items(items) => items,
        };

        // Edges may be empty: a single node graph is legal
        let edges = match check_collection(body, "edges", "edge", false, &mut report) {
            Collection::Missing => {
                report.push(ValidationIssue::MissingCollection { field: "edges" });
                &[][..]
            }
            Collection::NotAList => &[][..],
            Collection::Items(items) => items,
        };

        check_required_fields(nodes, ItemKind::Node, &NODE_FIELDS, &mut report);
        let edges = check_required_fields(edges, ItemKind::Edge, &EDGE_FIELDS, &mut report);

        let node_ids = declared_values(nodes, "id");
        for (index, edge) in edges {
            if let Some(source) = edge.get("source") {
                if !node_ids.contains(&source) {
                    report.push(ValidationIssue::UnknownReference {
                        kind: ItemKind::Edge,
                        index,
                        target: "source node",
                        value: display_value(source),
                    });
                }
            }
            if let Some(target) = edge.get("target") {
                if !node_ids.contains(&target) && !is_terminal(target) {
                    report.push(ValidationIssue::UnknownReference {
                        kind: ItemKind::Edge,
                        index,
                        target: "target node",
                        value: display_value(target),
                    });
                }
            }
        }

        report
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

pub struct GraphAdapterFactory;

impl OrchestratorFactory for GraphAdapterFactory {
    fn create(&self) -> Box<dyn Orchestrator> {
        Box::new(GraphAdapter::new())
    }

    fn framework(&self) -> &str {
        GRAPH_FRAMEWORK
    }

    fn metadata(&self) -> FrameworkMetadata {
        FrameworkMetadata {
            display_name: GRAPH_DISPLAY_NAME.to_string(),
            description: format!(
                "State graph of typed nodes joined by edges; '{}' ends a path",
                TERMINAL_NODE
            ),
            collections: vec!["nodes".to_string(), "edges".to_string()],
        }
    }
}
