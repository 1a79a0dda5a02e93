use crate::DefinitionError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Framework used when neither the caller nor the definition names one
pub const DEFAULT_FRAMEWORK: &str = "crewai";

/// Edge target that ends a graph run; it is never a declared node
pub const TERMINAL_NODE: &str = "END";

/// Complete workflow definition
///
/// The body depends on the framework the workflow targets: agent/task
/// frameworks carry `agents` and `tasks`, graph frameworks carry `nodes`
/// and `edges`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowDefinition {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub framework: Option<String>,
    #[serde(flatten)]
    pub body: WorkflowBody,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WorkflowBody {
    AgentTask {
        agents: Vec<AgentSpec>,
        tasks: Vec<TaskSpec>,
    },
    Graph {
        nodes: Vec<NodeSpec>,
        edges: Vec<EdgeSpec>,
    },
}

impl WorkflowDefinition {
    pub fn agent_task(
        name: impl Into<String>,
        agents: Vec<AgentSpec>,
        tasks: Vec<TaskSpec>,
    ) -> Self {
        Self {
            name: name.into(),
            description: None,
            framework: None,
            body: WorkflowBody::AgentTask { agents, tasks },
        }
    }

    pub fn graph(name: impl Into<String>, nodes: Vec<NodeSpec>, edges: Vec<EdgeSpec>) -> Self {
        Self {
            name: name.into(),
            description: None,
            framework: None,
            body: WorkflowBody::Graph { nodes, edges },
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_framework(mut self, framework: impl Into<String>) -> Self {
        self.framework = Some(framework.into());
        self
    }

    /// Decode an already-parsed document
    pub fn from_value(value: Value) -> Result<Self, DefinitionError> {
        if !value.is_object() {
            return Err(DefinitionError::NotAMapping);
        }
        Ok(serde_json::from_value(value)?)
    }

    /// Parse a YAML (or JSON) document
    pub fn from_yaml_str(text: &str) -> Result<Self, DefinitionError> {
        Self::from_value(parse_document(text)?)
    }

    pub fn to_value(&self) -> Result<Value, DefinitionError> {
        Ok(serde_json::to_value(self)?)
    }

    pub fn agents(&self) -> &[AgentSpec] {
        match &self.body {
            WorkflowBody::AgentTask { agents, .. } => agents,
            WorkflowBody::Graph { .. } => &[],
        }
    }

    pub fn tasks(&self) -> &[TaskSpec] {
        match &self.body {
            WorkflowBody::AgentTask { tasks, .. } => tasks,
            WorkflowBody::Graph { .. } => &[],
        }
    }

    pub fn nodes(&self) -> &[NodeSpec] {
        match &self.body {
            WorkflowBody::Graph { nodes, .. } => nodes,
            WorkflowBody::AgentTask { .. } => &[],
        }
    }

    pub fn edges(&self) -> &[EdgeSpec] {
        match &self.body {
            WorkflowBody::Graph { edges, .. } => edges,
            WorkflowBody::AgentTask { .. } => &[],
        }
    }

    pub fn find_agent(&self, name: &str) -> Option<&AgentSpec> {
        self.agents().iter().find(|a| a.name == name)
    }

    pub fn find_node(&self, id: &str) -> Option<&NodeSpec> {
        self.nodes().iter().find(|n| n.id == id)
    }
}

/// Parse YAML text into a structured document.
///
/// JSON is accepted too since it is a YAML subset.
pub fn parse_document(text: &str) -> Result<Value, DefinitionError> {
    Ok(serde_yaml::from_str(text)?)
}

/// Agent taking part in an agent/task workflow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentSpec {
    pub name: String,
    pub role: String,
    pub goal: String,
    pub backstory: String,
    pub model: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_delegation: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verbose: Option<bool>,
}

impl AgentSpec {
    pub fn new(
        name: impl Into<String>,
        role: impl Into<String>,
        goal: impl Into<String>,
        backstory: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            role: role.into(),
            goal: goal.into(),
            backstory: backstory.into(),
            model: model.into(),
            tools: Vec::new(),
            allow_delegation: None,
            verbose: None,
        }
    }

    pub fn with_tool(mut self, tool: impl Into<String>) -> Self {
        self.tools.push(tool.into());
        self
    }

    pub fn with_delegation(mut self, allow: bool) -> Self {
        self.allow_delegation = Some(allow);
        self
    }
}

/// Unit of work assigned to one agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskSpec {
    pub name: String,
    pub description: String,
    pub expected_output: String,
    pub agent: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub async_execution: Option<bool>,
    /// Names of tasks whose output this task depends on
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub context: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_json: Option<bool>,
}

impl TaskSpec {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        expected_output: impl Into<String>,
        agent: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            expected_output: expected_output.into(),
            agent: agent.into(),
            tools: Vec::new(),
            async_execution: None,
            context: Vec::new(),
            output_json: None,
        }
    }

    pub fn with_context(mut self, task: impl Into<String>) -> Self {
        self.context.push(task.into());
        self
    }
}

/// Node in a graph workflow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeSpec {
    pub id: String,
    #[serde(rename = "type")]
    pub node_type: String,
    pub config: Map<String, Value>,
}

impl NodeSpec {
    pub fn new(id: impl Into<String>, node_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            node_type: node_type.into(),
            config: Map::new(),
        }
    }

    pub fn with_config(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.config.insert(key.into(), value.into());
        self
    }
}

/// Directed edge between two graph nodes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeSpec {
    pub source: String,
    pub target: String,
}

impl EdgeSpec {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.target == TERMINAL_NODE
    }
}
