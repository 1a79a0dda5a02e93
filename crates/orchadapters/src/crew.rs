use async_trait::async_trait;
use orchcore::validation::{
    check_collection, check_required_fields, declared_values, display_value, Collection,
};
use orchcore::{
    ItemKind, Orchestrator, ProgressStream, Result, RunHandle, RunStatusRecord, RunStore,
    RunTracker, ValidationIssue, ValidationReport,
};
use orchruntime::{FrameworkMetadata, OrchestratorFactory};
use serde_json::Value;
use std::sync::Arc;

pub const CREW_FRAMEWORK: &str = "crewai";
pub const CREW_DISPLAY_NAME: &str = "CrewAI";

const AGENT_FIELDS: [&str; 5] = ["name", "role", "goal", "backstory", "model"];
const TASK_FIELDS: [&str; 4] = ["name", "description", "expectedOutput", "agent"];

/// Adapter for agent/task (crew style) workflows
pub struct CrewAdapter {
    runs: RunTracker,
}

impl CrewAdapter {
    pub fn new() -> Self {
        Self {
            runs: RunTracker::new(CREW_FRAMEWORK).with_display_name(CREW_DISPLAY_NAME),
        }
    }

    pub fn with_store(store: Arc<dyn RunStore>) -> Self {
        Self {
            runs: RunTracker::with_store(CREW_FRAMEWORK, store)
                .with_display_name(CREW_DISPLAY_NAME),
        }
    }
}

impl Default for CrewAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Orchestrator for CrewAdapter {
    fn framework(&self) -> &str {
        CREW_FRAMEWORK
    }

    fn validate(&self, definition: &Value) -> ValidationReport {
        let mut report = ValidationReport::new();

        let Some(body) = definition.as_object() else {
            report.push(ValidationIssue::NotAMapping);
            return report;
        };

        let agents = match check_collection(body, "agents", "agent", true, &mut report) {
            Collection::Missing => {
                report.push(ValidationIssue::MissingCollection { field: "agents" });
                return report;
            }
            Collection::NotAList => &[][..],
            Collection::Items(items) => items,
        };

        let tasks = match check_collection(body, "tasks", "task", true, &mut report) {
            Collection::Missing => {
                report.push(ValidationIssue::MissingCollection { field: "tasks" });
                &[][..]
            }
            Collection::NotAList => &[][..],
            Collection::Items(items) => items,
        };

        check_required_fields(agents, ItemKind::Agent, &AGENT_FIELDS, &mut report);
        let tasks = check_required_fields(tasks, ItemKind::Task, &TASK_FIELDS, &mut report);

        let agent_names = declared_values(agents, "name");
        for (index, task) in tasks {
            if let Some(agent) = task.get("agent") {
                if !agent_names.contains(&agent) {
                    report.push(ValidationIssue::UnknownReference {
                        kind: ItemKind::Task,
                        index,
                        target: "agent",
                        value: display_value(agent),
                    });
                }
            }
        }

        report
    }

    async fn execute(&self, definition: &Value) -> Result<RunHandle> {
        // TODO: hand the crew to an execution engine once one exists
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

pub struct CrewAdapterFactory;

impl OrchestratorFactory for CrewAdapterFactory {
    fn create(&self) -> Box<dyn Orchestrator> {
        Box::new(CrewAdapter::new())
    }

    fn framework(&self) -> &str {
        CREW_FRAMEWORK
    }

    fn metadata(&self) -> FrameworkMetadata {
        FrameworkMetadata {
            display_name: CREW_DISPLAY_NAME.to_string(),
            description: "Role-playing agents working through an ordered task list".to_string(),
            collections: vec!["agents".to_string(), "tasks".to_string()],
        }
    }
}
