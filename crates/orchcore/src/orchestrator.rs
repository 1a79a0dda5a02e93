use crate::{ProgressStream, Result, RunHandle, RunStatusRecord, ValidationReport};
use async_trait::async_trait;
use serde_json::Value;

/// Capability set every framework adapter implements.
///
/// Definitions arrive as already-decoded documents so that validation can
/// report on malformed input instead of failing to deserialize it.
#[async_trait]
pub trait Orchestrator: Send + Sync {
    /// Canonical (lower-case) framework name, e.g. "crewai"
    fn framework(&self) -> &str;

    /// Check a definition against this framework's structural rules.
    ///
    /// Pure: never touches run state. Every problem found is reported.
    fn validate(&self, definition: &Value) -> ValidationReport;

    /// Begin a run and return immediately with a `started` acknowledgement
    async fn execute(&self, definition: &Value) -> Result<RunHandle>;

    /// Begin a run and return its progress updates
    async fn stream(&self, definition: &Value) -> Result<ProgressStream>;

    /// Status of a run started by this adapter; `not_found` for any other id
    async fn get_status(&self, run_id: &str) -> Result<RunStatusRecord>;

    /// Stop a run. Returns false only when the id is unknown here.
    async fn stop(&self, run_id: &str) -> Result<bool>;
}
