use crate::OrchestratorRegistry;
use orchcore::{parse_document, ValidationIssue, ValidationReport, WorkflowDefinition};
use serde::Serialize;
use serde_json::Value;

/// Result of running a raw document through the pipeline.
///
/// `workflow` carries whatever typed definition could be decoded, even
/// when the document is invalid, so callers can show it next to the
/// errors.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationOutcome {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub framework: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workflow: Option<WorkflowDefinition>,
}

impl ValidationOutcome {
    fn failed(
        errors: Vec<String>,
        framework: Option<String>,
        workflow: Option<WorkflowDefinition>,
    ) -> Self {
        Self {
            valid: false,
            errors: Some(errors),
            framework,
            workflow,
        }
    }

    fn from_report(
        report: &ValidationReport,
        framework: String,
        workflow: Option<WorkflowDefinition>,
    ) -> Self {
        Self {
            valid: report.is_valid(),
            errors: report.errors(),
            framework: Some(framework),
            workflow,
        }
    }
}

/// Parse → generic shape check → framework-specific validation
pub struct ValidationPipeline<'a> {
    registry: &'a OrchestratorRegistry,
    default_framework: &'a str,
}

impl<'a> ValidationPipeline<'a> {
    pub fn new(registry: &'a OrchestratorRegistry, default_framework: &'a str) -> Self {
        Self {
            registry,
            default_framework,
        }
    }

    /// Validate YAML (or JSON) text
    pub fn validate_text(&self, text: &str, framework: Option<&str>) -> ValidationOutcome {
        match parse_document(text) {
            Ok(document) => self.validate_document(&document, framework),
            Err(e) => ValidationOutcome::failed(vec![e.to_string()], None, None),
        }
    }

    /// Validate an already-decoded document
    pub fn validate_document(
        &self,
        document: &Value,
        framework: Option<&str>,
    ) -> ValidationOutcome {
        let shape = Self::check_shape(document);
        if !document.is_object() {
            return ValidationOutcome::failed(shape.errors().unwrap_or_default(), None, None);
        }

        let framework = self.select_framework(document, framework);
        let workflow = WorkflowDefinition::from_value(document.clone()).ok();

        let orchestrator = match self.registry.resolve(&framework) {
            Ok(orchestrator) => orchestrator,
            Err(e) => {
                // Shape problems are still reported next to the lookup failure
                let mut errors = shape.errors().unwrap_or_default();
                errors.push(format!("Framework error: {}", e));
                return ValidationOutcome::failed(errors, Some(framework), workflow);
            }
        };

        let mut report = shape;
        report.extend(orchestrator.validate(document));

        tracing::debug!(
            "Validated workflow against {}: {} error(s)",
            orchestrator.framework(),
            report.len()
        );

        ValidationOutcome::from_report(&report, orchestrator.framework().to_string(), workflow)
    }

    /// Framework-agnostic checks: a mapping with a non-empty `name`
    pub fn check_shape(document: &Value) -> ValidationReport {
        let Some(fields) = document.as_object() else {
            return ValidationIssue::NotAMapping.into();
        };

        let mut report = ValidationReport::new();
        match fields.get("name").and_then(Value::as_str) {
            Some(name) if !name.trim().is_empty() => {}
            _ => report.push(ValidationIssue::MissingName),
        }
        report
    }

    /// Explicit choice, then the document's `framework` key, then the default
    pub fn select_framework(&self, document: &Value, explicit: Option<&str>) -> String {
        explicit
            .filter(|f| !f.trim().is_empty())
            .or_else(|| document.get("framework").and_then(Value::as_str))
            .unwrap_or(self.default_framework)
            .to_lowercase()
    }
}
