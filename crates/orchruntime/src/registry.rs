use orchcore::{Orchestrator, OrchestratorError, Result};
use std::collections::HashMap;
use std::sync::Arc;

/// Factory trait for creating adapter instances
pub trait OrchestratorFactory: Send + Sync {
    /// Create a new adapter with an empty run store
    fn create(&self) -> Box<dyn Orchestrator>;

    /// Framework name the adapter serves
    fn framework(&self) -> &str;

    /// Optional: describe the framework for listing endpoints
    fn metadata(&self) -> FrameworkMetadata {
        FrameworkMetadata::default()
    }
}

/// Metadata about a framework
#[derive(Debug, Clone, Default)]
pub struct FrameworkMetadata {
    /// Human-facing spelling of the framework name
    pub display_name: String,
    pub description: String,
    /// Top-level collections a definition for this framework carries
    pub collections: Vec<String>,
}

struct FnFactory<F> {
    framework: String,
    constructor: F,
}

impl<F> OrchestratorFactory for FnFactory<F>
where
    F: Fn() -> Box<dyn Orchestrator> + Send + Sync,
{
    fn create(&self) -> Box<dyn Orchestrator> {
        (self.constructor)()
    }

    fn framework(&self) -> &str {
        &self.framework
    }
}

struct Registration {
    factory: Arc<dyn OrchestratorFactory>,
    instance: Arc<dyn Orchestrator>,
}

/// Registry of available frameworks.
///
/// Names are stored lower-cased and looked up case-insensitively. Each
/// registration builds one long-lived adapter so that run records survive
/// between `execute` and later `get_status`/`stop` calls. All registrations
/// must happen before the registry is shared.
#[derive(Default)]
pub struct OrchestratorRegistry {
    registrations: HashMap<String, Registration>,
}

fn canonical(name: &str) -> String {
    name.to_lowercase()
}

impl OrchestratorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory under its own framework name
    pub fn register(&mut self, factory: Arc<dyn OrchestratorFactory>) {
        let name = factory.framework().to_string();
        self.register_as(&name, factory);
    }

    /// Register a factory under `name`, replacing any earlier registration
    pub fn register_as(&mut self, name: &str, factory: Arc<dyn OrchestratorFactory>) {
        let name = canonical(name);
        let instance: Arc<dyn Orchestrator> = Arc::from(factory.create());

        if self
            .registrations
            .insert(name.clone(), Registration { factory, instance })
            .is_some()
        {
            tracing::info!("Re-registered framework: {}", name);
        } else {
            tracing::info!("Registering framework: {}", name);
        }
    }

    /// Register a plain constructor function
    pub fn register_fn<F>(&mut self, name: &str, constructor: F)
    where
        F: Fn() -> Box<dyn Orchestrator> + Send + Sync + 'static,
    {
        let factory = FnFactory {
            framework: canonical(name),
            constructor,
        };
        self.register_as(name, Arc::new(factory));
    }

    /// Resolve a framework name to its long-lived adapter
    pub fn resolve(&self, name: &str) -> Result<Arc<dyn Orchestrator>> {
        self.lookup(name).map(|r| r.instance.clone())
    }

    /// Build a fresh adapter with its own empty run store
    pub fn instantiate(&self, name: &str) -> Result<Box<dyn Orchestrator>> {
        self.lookup(name).map(|r| r.factory.create())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.registrations.contains_key(&canonical(name))
    }

    /// Get all registered framework names, sorted
    pub fn supported_frameworks(&self) -> Vec<String> {
        let mut names: Vec<String> = self.registrations.keys().cloned().collect();
        names.sort();
        names
    }

    /// Get metadata for a framework
    pub fn get_metadata(&self, name: &str) -> Option<FrameworkMetadata> {
        self.registrations
            .get(&canonical(name))
            .map(|r| r.factory.metadata())
    }

    fn lookup(&self, name: &str) -> Result<&Registration> {
        self.registrations.get(&canonical(name)).ok_or_else(|| {
            tracing::warn!("Unsupported framework requested: {}", name);
            OrchestratorError::NotSupported {
                framework: name.to_string(),
                supported: self.supported_frameworks(),
            }
        })
    }
}
