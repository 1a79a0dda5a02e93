use crate::{OrchestratorError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::stream::{self, BoxStream, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

pub type RunId = Uuid;

/// Lifecycle of one run.
///
/// `started → running → {completed | failed | stopped}`; the last three are
/// terminal. `NotFound` only ever appears in status lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Started,
    Running,
    Completed,
    Failed,
    Stopped,
    NotFound,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Started => "started",
            RunStatus::Running => "running",
            RunStatus::Completed => "completed",
            RunStatus::Failed => "failed",
            RunStatus::Stopped => "stopped",
            RunStatus::NotFound => "not_found",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, RunStatus::Completed | RunStatus::Failed | RunStatus::Stopped)
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bookkeeping for one run, owned by the adapter that started it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRecord {
    pub id: RunId,
    pub framework: String,
    pub status: RunStatus,
    pub config: Value,
    pub progress: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RunRecord {
    pub fn new(framework: impl Into<String>, config: Value) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            framework: framework.into(),
            status: RunStatus::Running,
            config,
            progress: 0.0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Move to `stopped` unless the run already reached a terminal state
    pub fn stop(&mut self) {
        if !self.status.is_terminal() {
            self.status = RunStatus::Stopped;
            self.updated_at = Utc::now();
        }
    }
}

/// Acknowledgement returned by `execute`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunHandle {
    #[serde(rename = "workflowId")]
    pub run_id: RunId,
    pub framework: String,
    pub status: RunStatus,
    pub message: String,
}

impl RunHandle {
    /// `display_name` is the human-facing spelling, e.g. `CrewAI` for `crewai`
    pub fn started(run_id: RunId, framework: &str, display_name: &str) -> Self {
        Self {
            run_id,
            framework: framework.to_string(),
            status: RunStatus::Started,
            message: format!("{} workflow started successfully", display_name),
        }
    }
}

/// Answer to a status query; `status` is `not_found` for unknown ids
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunStatusRecord {
    #[serde(rename = "workflowId")]
    pub run_id: String,
    pub status: RunStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RunStatusRecord {
    pub fn not_found(run_id: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
            status: RunStatus::NotFound,
            progress: None,
            error: Some("Workflow not found".to_string()),
        }
    }

    pub fn is_found(&self) -> bool {
        self.status != RunStatus::NotFound
    }
}

impl From<&RunRecord> for RunStatusRecord {
    fn from(record: &RunRecord) -> Self {
        Self {
            run_id: record.id.to_string(),
            status: record.status,
            progress: Some(record.progress),
            error: None,
        }
    }
}

/// Snapshot emitted while a run progresses
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressUpdate {
    #[serde(rename = "workflowId")]
    pub run_id: RunId,
    pub status: RunStatus,
    pub progress: f64,
}

pub type ProgressStream = BoxStream<'static, ProgressUpdate>;

/// Storage for run records.
///
/// The in-memory implementation stands in for a database; each call
/// touches a single key.
#[async_trait]
pub trait RunStore: Send + Sync {
    async fn get(&self, id: RunId) -> Result<Option<RunRecord>>;

    async fn put(&self, record: RunRecord) -> Result<()>;

    async fn delete(&self, id: RunId) -> Result<Option<RunRecord>>;

    /// Stop a run in place, returning the updated record if it exists
    async fn stop(&self, id: RunId) -> Result<Option<RunRecord>>;
}

#[derive(Debug, Default)]
pub struct InMemoryRunStore {
    records: RwLock<HashMap<RunId, RunRecord>>,
}

impl InMemoryRunStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl RunStore for InMemoryRunStore {
    async fn get(&self, id: RunId) -> Result<Option<RunRecord>> {
        Ok(self.records.read().await.get(&id).cloned())
    }

    async fn put(&self, record: RunRecord) -> Result<()> {
        let mut records = self.records.write().await;
        if records.contains_key(&record.id) {
            return Err(OrchestratorError::Store(format!(
                "run id collision: {}",
                record.id
            )));
        }
        records.insert(record.id, record);
        Ok(())
    }

    async fn delete(&self, id: RunId) -> Result<Option<RunRecord>> {
        Ok(self.records.write().await.remove(&id))
    }

    async fn stop(&self, id: RunId) -> Result<Option<RunRecord>> {
        let mut records = self.records.write().await;
        Ok(records.get_mut(&id).map(|record| {
            record.stop();
            record.clone()
        }))
    }
}

/// Run bookkeeping shared by the stub adapters.
///
/// Each adapter owns one tracker, so run ids never cross adapters.
pub struct RunTracker {
    framework: String,
    display_name: String,
    store: Arc<dyn RunStore>,
}

impl RunTracker {
    pub fn new(framework: impl Into<String>) -> Self {
        Self::with_store(framework, Arc::new(InMemoryRunStore::new()))
    }

    pub fn with_store(framework: impl Into<String>, store: Arc<dyn RunStore>) -> Self {
        let framework = framework.into();
        Self {
            display_name: framework.clone(),
            framework,
            store,
        }
    }

    /// Name used in start messages; defaults to the framework key
    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self
    }

    pub fn framework(&self) -> &str {
        &self.framework
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Record a new `running` run and acknowledge it as `started`
    pub async fn start(&self, config: &Value) -> Result<RunHandle> {
        let record = RunRecord::new(&self.framework, config.clone());
        let run_id = record.id;
        self.store.put(record).await?;

        tracing::info!("Started {} run {}", self.framework, run_id);

        Ok(RunHandle::started(run_id, &self.framework, &self.display_name))
    }

    /// Run to completion and return its progress updates.
    ///
    /// The stored record already holds the final update, so a status query
    /// made while the stream is consumed agrees with its last item.
    pub async fn stream(&self, config: &Value) -> Result<ProgressStream> {
        let mut record = RunRecord::new(&self.framework, config.clone());
        record.status = RunStatus::Completed;
        record.progress = 100.0;
        let run_id = record.id;
        self.store.put(record).await?;

        tracing::info!("Streamed {} run {}", self.framework, run_id);

        let updates = vec![
            ProgressUpdate {
                run_id,
                status: RunStatus::Started,
                progress: 0.0,
            },
            ProgressUpdate {
                run_id,
                status: RunStatus::Completed,
                progress: 100.0,
            },
        ];
        Ok(stream::iter(updates).boxed())
    }

    pub async fn status(&self, run_id: &str) -> Result<RunStatusRecord> {
        let Ok(id) = Uuid::parse_str(run_id) else {
            return Ok(RunStatusRecord::not_found(run_id));
        };

        Ok(match self.store.get(id).await? {
            Some(record) => RunStatusRecord::from(&record),
            None => RunStatusRecord::not_found(run_id),
        })
    }

    pub async fn stop(&self, run_id: &str) -> Result<bool> {
        let Ok(id) = Uuid::parse_str(run_id) else {
            return Ok(false);
        };

        match self.store.stop(id).await? {
            Some(record) => {
                tracing::info!("Stopped {} run {} ({})", self.framework, id, record.status);
                Ok(true)
            }
            None => {
                tracing::debug!("Stop requested for unknown {} run {}", self.framework, run_id);
                Ok(false)
            }
        }
    }
}
