//! Validation reporting shared by every framework adapter.
//!
//! Adapters never fail fast: each problem becomes a [`ValidationIssue`]
//! pushed onto a [`ValidationReport`], so a caller sees every problem in
//! one pass. The helpers at the bottom implement the collection and
//! required-field checks both built-in adapters need.

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;
use thiserror::Error;

/// Kind of item inside a workflow body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemKind {
    Agent,
    Task,
    Node,
    Edge,
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ItemKind::Agent => "Agent",
            ItemKind::Task => "Task",
            ItemKind::Node => "Node",
            ItemKind::Edge => "Edge",
        };
        f.write_str(name)
    }
}

/// Broad class of a validation problem
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueCategory {
    /// Missing or mistyped top-level structure
    Shape,
    /// A required field missing on one item
    Field,
    /// A cross-reference that does not resolve
    Reference,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationIssue {
    #[error("Workflow definition must be a mapping")]
    NotAMapping,

    #[error("Workflow 'name' must be a non-empty string")]
    MissingName,

    #[error("Missing '{field}' field in workflow")]
    MissingCollection { field: &'static str },

    #[error("'{field}' must be a list")]
    NotAList { field: &'static str },

    #[error("At least one {item} is required")]
    EmptyCollection { item: &'static str },

    #[error("{kind} {index} must be a mapping")]
    ItemNotAMapping { kind: ItemKind, index: usize },

    #[error("{kind} {index} missing required field: {field}")]
    MissingField {
        kind: ItemKind,
        index: usize,
        field: &'static str,
    },

    #[error("{kind} {index} references unknown {target}: {value}")]
    UnknownReference {
        kind: ItemKind,
        index: usize,
        target: &'static str,
        value: String,
    },
}

impl ValidationIssue {
    pub fn category(&self) -> IssueCategory {
        match self {
            ValidationIssue::NotAMapping
            | ValidationIssue::MissingName
            | ValidationIssue::MissingCollection { .. }
            | ValidationIssue::NotAList { .. }
            | ValidationIssue::EmptyCollection { .. } => IssueCategory::Shape,
            ValidationIssue::ItemNotAMapping { .. } | ValidationIssue::MissingField { .. } => {
                IssueCategory::Field
            }
            ValidationIssue::UnknownReference { .. } => IssueCategory::Reference,
        }
    }
}

/// Accumulated outcome of validating one definition
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationReport {
    issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, issue: ValidationIssue) {
        self.issues.push(issue);
    }

    pub fn extend(&mut self, other: ValidationReport) {
        self.issues.extend(other.issues);
    }

    pub fn is_valid(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn len(&self) -> usize {
        self.issues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    /// Issues in discovery order
    pub fn issues(&self) -> &[ValidationIssue] {
        &self.issues
    }

    /// Rendered messages, or `None` when the definition is valid
    pub fn errors(&self) -> Option<Vec<String>> {
        if self.issues.is_empty() {
            None
        } else {
            Some(self.issues.iter().map(|i| i.to_string()).collect())
        }
    }
}

impl From<ValidationIssue> for ValidationReport {
    fn from(issue: ValidationIssue) -> Self {
        Self {
            issues: vec![issue],
        }
    }
}

impl Serialize for ValidationReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ValidationReport", 2)?;
        state.serialize_field("valid", &self.is_valid())?;
        state.serialize_field("errors", &self.errors())?;
        state.end()
    }
}

/// Outcome of looking up a top-level collection
#[derive(Debug)]
pub enum Collection<'a> {
    /// Key absent from the body
    Missing,
    /// Present but not a sequence
    NotAList,
    Items(&'a [Value]),
}

/// Presence, type, and (optionally) non-empty checks for `body[field]`.
///
/// Absence is returned rather than recorded so the caller decides whether
/// it short-circuits.
pub fn check_collection<'a>(
    body: &'a Map<String, Value>,
    field: &'static str,
    item: &'static str,
    require_items: bool,
    report: &mut ValidationReport,
) -> Collection<'a> {
    match body.get(field) {
        None => Collection::Missing,
        Some(Value::Array(items)) => {
            if require_items && items.is_empty() {
                report.push(ValidationIssue::EmptyCollection { item });
            }
            Collection::Items(items)
        }
        Some(_) => {
            report.push(ValidationIssue::NotAList { field });
            Collection::NotAList
        }
    }
}

/// Record one issue per item that is not a mapping or lacks a required key.
///
/// Returns the items that are mappings, paired with their index, for
/// further reference checks.
pub fn check_required_fields<'a>(
    items: &'a [Value],
    kind: ItemKind,
    required: &[&'static str],
    report: &mut ValidationReport,
) -> Vec<(usize, &'a Map<String, Value>)> {
    let mut mappings = Vec::with_capacity(items.len());

    for (index, item) in items.iter().enumerate() {
        let Some(fields) = item.as_object() else {
            report.push(ValidationIssue::ItemNotAMapping { kind, index });
            continue;
        };

        for &field in required {
            if !fields.contains_key(field) {
                report.push(ValidationIssue::MissingField { kind, index, field });
            }
        }

        mappings.push((index, fields));
    }

    mappings
}

/// Values of `key` across the mapping items of a collection
pub fn declared_values<'a>(items: &'a [Value], key: &str) -> Vec<&'a Value> {
    items
        .iter()
        .filter_map(|item| item.as_object())
        .filter_map(|fields| fields.get(key))
        .collect()
}

/// Render a referenced value for an error message
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn errors_absent_exactly_when_valid() {
        let mut report = ValidationReport::new();
        assert!(report.is_valid());
        assert_eq!(report.errors(), None);

        report.push(ValidationIssue::MissingCollection { field: "agents" });
        assert!(!report.is_valid());
        assert_eq!(
            report.errors(),
            Some(vec!["Missing 'agents' field in workflow".to_string()])
        );
    }

    #[test]
    fn report_serializes_flag_and_errors() {
        let report = ValidationReport::from(ValidationIssue::EmptyCollection { item: "node" });
        let value = serde_json::to_value(&report).unwrap();

        assert_eq!(
            value,
            json!({"valid": false, "errors": ["At least one node is required"]})
        );
        assert_eq!(
            serde_json::to_value(ValidationReport::new()).unwrap(),
            json!({"valid": true, "errors": null})
        );
    }

    #[test]
    fn issue_categories() {
        assert_eq!(ValidationIssue::MissingName.category(), IssueCategory::Shape);
        assert_eq!(
            ValidationIssue::MissingField { kind: ItemKind::Task, index: 0, field: "agent" }
                .category(),
            IssueCategory::Field
        );
        assert_eq!(
            ValidationIssue::UnknownReference {
                kind: ItemKind::Edge,
                index: 1,
                target: "source node",
                value: "x".into(),
            }
            .to_string(),
            "Edge 1 references unknown source node: x"
        );
    }

    #[test]
    fn collection_checks() {
        let body = json!({"agents": [], "tasks": "nope"});
        let body = body.as_object().unwrap();
        let mut report = ValidationReport::new();

        assert!(matches!(
            check_collection(body, "agents", "agent", true, &mut report),
            Collection::Items(items) if items.is_empty()
        ));
        assert!(matches!(
            check_collection(body, "tasks", "task", true, &mut report),
            Collection::NotAList
        ));
        assert!(matches!(
            check_collection(body, "edges", "edge", false, &mut report),
            Collection::Missing
        ));
        assert_eq!(report.len(), 2);
    }

    #[test]
    fn required_fields_reported_per_item() {
        let items = json!([{"id": "a"}, 7, {"id": "b", "type": "x", "config": {}}]);
        let items = items.as_array().unwrap();
        let mut report = ValidationReport::new();

        let required = ["id", "type", "config"];
        let mappings = check_required_fields(items, ItemKind::Node, &required, &mut report);

        assert_eq!(mappings.len(), 2);
        assert_eq!(
            report.errors().unwrap(),
            vec![
                "Node 0 missing required field: type",
                "Node 0 missing required field: config",
                "Node 1 must be a mapping",
            ]
        );
    }
}
