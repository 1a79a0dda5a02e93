//! Core abstractions for the orchestrator layer
//!
//! This crate provides the workflow definition types, the capability trait
//! every framework adapter implements, validation reporting, and run
//! bookkeeping. It knows nothing about concrete frameworks.

mod error;
mod orchestrator;
mod run;
pub mod validation;
mod workflow;

pub use error::{DefinitionError, OrchestratorError};
pub use orchestrator::Orchestrator;
pub use run::{
    InMemoryRunStore, ProgressStream, ProgressUpdate, RunHandle, RunId, RunRecord,
    RunStatus, RunStatusRecord, RunStore, RunTracker,
};
pub use validation::{IssueCategory, ItemKind, ValidationIssue, ValidationReport};
pub use workflow::{
    parse_document, AgentSpec, EdgeSpec, NodeSpec, TaskSpec, WorkflowBody, WorkflowDefinition,
    DEFAULT_FRAMEWORK, TERMINAL_NODE,
};

/// Result type for orchestrator operations
pub type Result<T> = std::result::Result<T, OrchestratorError>;
