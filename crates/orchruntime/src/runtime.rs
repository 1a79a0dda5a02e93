use crate::{OrchestratorRegistry, ValidationOutcome, ValidationPipeline};
use orchcore::{
    Orchestrator, OrchestratorError, ProgressStream, Result, RunHandle, RunStatusRecord,
    DEFAULT_FRAMEWORK,
};
use serde_json::Value;
use futures::StreamExt;
use std::collections::HashMap;
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Process-scoped context handed to the HTTP layer and CLI.
///
/// Build the registry completely before constructing the runtime; it is
/// read-only afterwards.
pub struct OrchestratorRuntime {
    registry: Arc<OrchestratorRegistry>,
    config: RuntimeConfig,
    /// Which framework started each run, for lookups by run id alone
    runs: RwLock<HashMap<String, String>>,
}

impl OrchestratorRuntime {
    pub fn new(registry: Arc<OrchestratorRegistry>) -> Self {
        Self::with_config(registry, RuntimeConfig::default())
    }

    pub fn with_config(registry: Arc<OrchestratorRegistry>, config: RuntimeConfig) -> Self {
        Self {
            registry,
            config,
            runs: RwLock::new(HashMap::new()),
        }
    }

    pub fn registry(&self) -> &Arc<OrchestratorRegistry> {
        &self.registry
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn default_framework(&self) -> &str {
        &self.config.default_framework
    }

    pub fn pipeline(&self) -> ValidationPipeline<'_> {
        ValidationPipeline::new(&self.registry, &self.config.default_framework)
    }

    /// Resolve a framework, falling back to the configured default
    pub fn resolve(&self, framework: Option<&str>) -> Result<Arc<dyn Orchestrator>> {
        let name = framework
            .filter(|f| !f.trim().is_empty())
            .unwrap_or(self.config.default_framework.as_str());
        self.registry.resolve(name)
    }

    pub fn validate_text(&self, text: &str, framework: Option<&str>) -> ValidationOutcome {
        self.pipeline().validate_text(text, framework)
    }

    /// Validate a definition and, if it passes, start a run
    pub async fn start(&self, definition: &Value, framework: Option<&str>) -> Result<RunHandle> {
        let (name, orchestrator) = self.checked(definition, framework)?;
        let handle = orchestrator.execute(definition).await?;

        self.index(handle.run_id.to_string(), name).await;
        Ok(handle)
    }

    /// Validate a definition and, if it passes, start a streamed run.
    ///
    /// The run is indexed as soon as its first update is available.
    pub async fn stream(
        &self,
        definition: &Value,
        framework: Option<&str>,
    ) -> Result<ProgressStream> {
        let (name, orchestrator) = self.checked(definition, framework)?;
        let mut updates = orchestrator.stream(definition).await?.peekable();

        if let Some(first) = Pin::new(&mut updates).peek().await {
            let run_id = first.run_id.to_string();
            self.index(run_id, name).await;
        }

        Ok(updates.boxed())
    }

    /// Status of a run; the framework defaults to the one that started it
    pub async fn status(&self, run_id: &str, framework: Option<&str>) -> Result<RunStatusRecord> {
        match self.owner(run_id, framework).await {
            Some(name) => self.registry.resolve(&name)?.get_status(run_id).await,
            None => Ok(RunStatusRecord::not_found(run_id)),
        }
    }

    /// Stop a run; returns false when no adapter knows the id
    pub async fn stop(&self, run_id: &str, framework: Option<&str>) -> Result<bool> {
        match self.owner(run_id, framework).await {
            Some(name) => self.registry.resolve(&name)?.stop(run_id).await,
            None => Ok(false),
        }
    }

    /// Returns the registry key that resolved, which is what the run index stores
    fn checked(
        &self,
        definition: &Value,
        framework: Option<&str>,
    ) -> Result<(String, Arc<dyn Orchestrator>)> {
        let pipeline = self.pipeline();
        let name = pipeline.select_framework(definition, framework);
        let orchestrator = self.registry.resolve(&name)?;

        let mut report = ValidationPipeline::check_shape(definition);
        report.extend(orchestrator.validate(definition));
        if !report.is_valid() {
            tracing::warn!("Rejected {} workflow with {} error(s)", name, report.len());
            return Err(OrchestratorError::InvalidDefinition {
                framework: name,
                report,
            });
        }

        Ok((name, orchestrator))
    }

    async fn index(&self, run_id: String, framework: String) {
        self.runs.write().await.insert(run_id, framework);
    }

    async fn owner(&self, run_id: &str, framework: Option<&str>) -> Option<String> {
        match framework.filter(|f| !f.trim().is_empty()) {
            Some(name) => Some(name.to_string()),
            None => self.runs.read().await.get(run_id).cloned(),
        }
    }
}

/// Configuration for the runtime
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub default_framework: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            default_framework: DEFAULT_FRAMEWORK.to_string(),
        }
    }
}

impl RuntimeConfig {
    /// Defaults overridden by `ORCH_DEFAULT_FRAMEWORK`
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(framework) = std::env::var("ORCH_DEFAULT_FRAMEWORK") {
            if !framework.trim().is_empty() {
                config.default_framework = framework.to_lowercase();
            }
        }
        config
    }
}
