//! Orchestrator runtime
//!
//! This crate resolves framework names to adapters, runs the validation
//! pipeline over raw documents, and holds the process-scoped context the
//! HTTP layer and CLI are built on.

mod pipeline;
mod registry;
mod runtime;

pub use pipeline::{ValidationOutcome, ValidationPipeline};
pub use registry::{FrameworkMetadata, OrchestratorFactory, OrchestratorRegistry};
pub use runtime::{OrchestratorRuntime, RuntimeConfig};
