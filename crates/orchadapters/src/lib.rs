//! Built-in framework adapters
//!
//! One adapter per supported workflow framework

mod crew;
mod graph;

pub use crew::{CrewAdapter, CrewAdapterFactory, CREW_DISPLAY_NAME, CREW_FRAMEWORK};
pub use graph::{GraphAdapter, GraphAdapterFactory, GRAPH_DISPLAY_NAME, GRAPH_FRAMEWORK};
use orchruntime::OrchestratorRegistry;

use std::sync::Arc;

/// Register all built-in adapters with a registry
pub fn register_all(registry: &mut OrchestratorRegistry) {
    registry.register(Arc::new(CrewAdapterFactory));
    registry.register(Arc::new(GraphAdapterFactory));
}
