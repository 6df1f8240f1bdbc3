//! Rust types for the flow definition document written by the flow editor.
//!
//! A node travels as `{id, type, position?, data: {label, config}}`. The `type`
//! string selects one `NodeKind` variant and `data.config` is read into that
//! variant's config struct. Types this crate does not know become
//! `NodeKind::Unknown` so newer editors can still save through older engines.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::DEFAULT_EVENT_NAME;

// =============================================================================
// TOP-LEVEL DOCUMENT
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowDocument {
    #[serde(default)]
    pub nodes: Vec<FlowNode>,
    #[serde(default)]
    pub edges: Vec<FlowEdge>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub viewport: Option<Viewport>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Viewport {
    pub x: f64,
    pub y: f64,
    pub zoom: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowEdge {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub source: String,
    pub target: String,
    /// Output port on the source node. `None` is the default single output.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_handle: Option<String>,
}

impl FlowEdge {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        FlowEdge {
            id: None,
            source: source.into(),
            target: target.into(),
            source_handle: None,
        }
    }

    pub fn on_port(mut self, port: impl Into<String>) -> Self {
        self.source_handle = Some(port.into());
        self
    }
}

/// Human-readable name of an output port, used in error messages.
pub fn describe_port(port: Option<&str>) -> String {
    match port {
        Some(p) => format!("port '{}'", p),
        None => "default output".to_string(),
    }
}

// =============================================================================
// NODES
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawNode", into = "RawNode")]
pub struct FlowNode {
    pub id: String,
    pub label: String,
    pub position: Option<Position>,
    pub kind: NodeKind,
}

impl FlowNode {
    pub fn new(id: impl Into<String>, label: impl Into<String>, kind: NodeKind) -> Self {
        FlowNode {
            id: id.into(),
            label: label.into(),
            position: None,
            kind,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn node_type(&self) -> &str {
        self.kind.type_name()
    }

    pub fn is_trigger(&self) -> bool {
        matches!(self.kind, NodeKind::Trigger(_))
    }

    /// The payload schema, if this node is a trigger.
    pub fn trigger_schema(&self) -> Option<&[SchemaField]> {
        match &self.kind {
            NodeKind::Trigger(c) => Some(&c.schema),
            _ => None,
        }
    }
}

/// Wire shape of a node, before `type` has been dispatched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawNode {
    pub id: String,
    #[serde(rename = "type")]
    pub node_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
    #[serde(default)]
    pub data: RawNodeData,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawNodeData {
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub config: Value,
}

fn read_config<C: DeserializeOwned + Default>(value: Value) -> Result<C, serde_json::Error> {
    if value.is_null() {
        return Ok(C::default());
    }
    serde_json::from_value(value)
}

impl TryFrom<RawNode> for FlowNode {
    type Error = serde_json::Error;

    fn try_from(raw: RawNode) -> Result<Self, Self::Error> {
        let config = raw.data.config;
        let kind = match raw.node_type.as_str() {
            "trigger" => NodeKind::Trigger(read_config(config)?),
            "action" => NodeKind::Action(read_config(config)?),
            "condition" => NodeKind::Condition(read_config(config)?),
            "switch" => NodeKind::Switch(read_config(config)?),
            "loop" => NodeKind::Loop(read_config(config)?),
            "humanTask" => NodeKind::HumanTask(read_config(config)?),
            "automation" => NodeKind::Automation(read_config(config)?),
            "variable" => NodeKind::Variable(read_config(config)?),
            "goto" => NodeKind::Goto(read_config(config)?),
            _ => NodeKind::Unknown {
                type_name: raw.node_type,
                config,
            },
        };
        Ok(FlowNode {
            id: raw.id,
            label: raw.data.label,
            position: raw.position,
            kind,
        })
    }
}

impl From<FlowNode> for RawNode {
    fn from(node: FlowNode) -> Self {
        let node_type = node.kind.type_name().to_string();
        let config = match node.kind {
            NodeKind::Trigger(c) => serde_json::to_value(c),
            NodeKind::Action(c) => serde_json::to_value(c),
            NodeKind::Condition(c) => serde_json::to_value(c),
            NodeKind::Switch(c) => serde_json::to_value(c),
            NodeKind::Loop(c) => serde_json::to_value(c),
            NodeKind::HumanTask(c) => serde_json::to_value(c),
            NodeKind::Automation(c) => serde_json::to_value(c),
            NodeKind::Variable(c) => serde_json::to_value(c),
            NodeKind::Goto(c) => serde_json::to_value(c),
            NodeKind::Unknown { config, .. } => Ok(config),
        };
        RawNode {
            id: node.id,
            node_type,
            position: node.position,
            data: RawNodeData {
                label: node.label,
                config: config.unwrap_or_default(),
            },
        }
    }
}

// =============================================================================
// NODE KIND: closed union over the node palette
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Trigger(TriggerConfig),
    Action(ActionConfig),
    Condition(ConditionConfig),
    Switch(SwitchConfig),
    Loop(LoopConfig),
    HumanTask(HumanTaskConfig),
    Automation(AutomationConfig),
    Variable(VariableConfig),
    Goto(GotoConfig),
    /// A node type this engine does not recognise. No port or reference checks apply.
    Unknown { type_name: String, config: Value },
}

pub const PORT_TRUE: &str = "true";
pub const PORT_FALSE: &str = "false";
pub const PORT_ITEM: &str = "item";
pub const PORT_DONE: &str = "done";
pub const PORT_DEFAULT: &str = "default";

/// Which output ports a node exposes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputPorts {
    /// One unnamed output; an edge on a named handle is an unknown port.
    Single,
    /// Branching node: every edge must use one of these handles.
    Named(Vec<String>),
    /// Unknown node type.
    Unchecked,
}

impl OutputPorts {
    pub fn accepts(&self, port: Option<&str>) -> bool {
        match self {
            OutputPorts::Single => port.is_none(),
            OutputPorts::Unchecked => true,
            OutputPorts::Named(ports) => port.is_some_and(|p| ports.iter().any(|n| n == p)),
        }
    }
}

impl NodeKind {
    pub fn type_name(&self) -> &str {
        match self {
            NodeKind::Trigger(_) => "trigger",
            NodeKind::Action(_) => "action",
            NodeKind::Condition(_) => "condition",
            NodeKind::Switch(_) => "switch",
            NodeKind::Loop(_) => "loop",
            NodeKind::HumanTask(_) => "humanTask",
            NodeKind::Automation(_) => "automation",
            NodeKind::Variable(_) => "variable",
            NodeKind::Goto(_) => "goto",
            NodeKind::Unknown { type_name, .. } => type_name,
        }
    }

    pub fn output_ports(&self) -> OutputPorts {
        match self {
            NodeKind::Condition(_) => {
                OutputPorts::Named(vec![PORT_TRUE.to_string(), PORT_FALSE.to_string()])
            }
            NodeKind::Loop(_) => {
                OutputPorts::Named(vec![PORT_ITEM.to_string(), PORT_DONE.to_string()])
            }
            NodeKind::Switch(c) => {
                let mut ports: Vec<String> = c.cases.iter().map(|case| case.id.clone()).collect();
                ports.push(PORT_DEFAULT.to_string());
                OutputPorts::Named(ports)
            }
            NodeKind::Unknown { .. } => OutputPorts::Unchecked,
            _ => OutputPorts::Single,
        }
    }

    pub fn is_branching(&self) -> bool {
        matches!(self.output_ports(), OutputPorts::Named(_))
    }
}

// =============================================================================
// TRIGGER
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TriggerConfig {
    /// Declared payload of the execute webhook, addressed as `body.<key>`.
    pub schema: Vec<SchemaField>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaField {
    pub key: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub required: bool,
}

impl SchemaField {
    pub fn new(key: impl Into<String>, field_type: FieldType, required: bool) -> Self {
        SchemaField {
            key: key.into(),
            field_type,
            required,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Number,
    Boolean,
    Object,
    Array,
}

impl FieldType {
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            FieldType::String => value.is_string(),
            FieldType::Number => value.is_number(),
            FieldType::Boolean => value.is_boolean(),
            FieldType::Object => value.is_object(),
            FieldType::Array => value.is_array(),
        }
    }
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldType::String => write!(f, "string"),
            FieldType::Number => write!(f, "number"),
            FieldType::Boolean => write!(f, "boolean"),
            FieldType::Object => write!(f, "object"),
            FieldType::Array => write!(f, "array"),
        }
    }
}

// =============================================================================
// ACTION
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ActionConfig {
    /// Integration the action calls, e.g. `http`, `email`, `slack`.
    pub service: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    pub headers: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

// =============================================================================
// CONTROL FLOW
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConditionConfig {
    pub rules: Vec<ConditionRule>,
    pub combinator: Combinator,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConditionRule {
    pub left: String,
    pub operator: String,
    pub right: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Combinator {
    #[default]
    And,
    Or,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SwitchConfig {
    pub expression: String,
    pub cases: Vec<SwitchCase>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SwitchCase {
    /// Port name for this case's outgoing edge.
    pub id: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoopConfig {
    /// Expression yielding the collection to iterate.
    pub items: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_iterations: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GotoConfig {
    /// Node the runtime jumps to. Not an edge.
    pub target_id: String,
}

// =============================================================================
// HUMAN TASK / AUTOMATION / VARIABLE
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HumanTaskConfig {
    pub title: String,
    pub description: String,
    pub assignee: String,
    /// Fields the assignee fills in.
    pub form: Vec<SchemaField>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AutomationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Any matching rule resumes the wait.
    pub correlation: Vec<CorrelationRule>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorrelationRule {
    #[serde(default = "default_event_name")]
    pub event_name: String,
    pub key: String,
    #[serde(alias = "value")]
    pub value_expression: String,
}

fn default_event_name() -> String {
    DEFAULT_EVENT_NAME.to_string()
}

impl CorrelationRule {
    pub fn new(
        event_name: impl Into<String>,
        key: impl Into<String>,
        value_expression: impl Into<String>,
    ) -> Self {
        CorrelationRule {
            event_name: event_name.into(),
            key: key.into(),
            value_expression: value_expression.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VariableConfig {
    pub name: String,
    pub value: String,
}
