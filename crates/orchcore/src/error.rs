use crate::ValidationReport;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OrchestratorError {
    #[error("Framework '{framework}' is not supported. Available frameworks: {}", .supported.join(", "))]
    NotSupported {
        framework: String,
        supported: Vec<String>,
    },

    #[error("Invalid {framework} workflow: {} error(s)", .report.len())]
    InvalidDefinition {
        framework: String,
        report: ValidationReport,
    },

    #[error("Definition error: {0}")]
    Definition(#[from] DefinitionError),

    #[error("Run store error: {0}")]
    Store(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl OrchestratorError {
    /// Registered names carried by a `NotSupported` error
    pub fn supported_frameworks(&self) -> Option<&[String]> {
        match self {
            OrchestratorError::NotSupported { supported, .. } => Some(supported),
            _ => None,
        }
    }
}

/// Failures turning raw text or values into a workflow definition
#[derive(Error, Debug)]
pub enum DefinitionError {
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Workflow definition must be a mapping")]
    NotAMapping,

    #[error("Workflow shape error: {0}")]
    Shape(#[from] serde_json::Error),
}
