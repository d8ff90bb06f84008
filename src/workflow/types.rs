/// Core workflow type definitions
///
/// Defines the documents exchanged with the workflow service: full workflow
/// documents, listing summaries, nodes, edges, execution reports and the portable
/// export/import shape. Field names follow the JSON the editor canvas produces.

use crate::workflow::catalog::{NodeConfig, NodeKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Server-assigned workflow identifier
pub type WorkflowId = i64;

/// A complete workflow document as returned by `get`
///
/// `id` is absent only for a draft that has never been persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowDocument {
    #[serde(default)]
    pub id: Option<WorkflowId>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub edges: Vec<Edge>,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub last_execution_status: ExecutionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// One row of the workflow listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowSummary {
    pub id: WorkflowId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub is_active: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub last_execution_status: ExecutionStatus,
    pub updated_at: DateTime<Utc>,
}

/// Status of the most recent run as tracked by the workflow service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    #[default]
    None,
    Pending,
    Running,
    Completed,
    Failed,
}

impl ExecutionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionStatus::None => "none",
            ExecutionStatus::Pending => "pending",
            ExecutionStatus::Running => "running",
            ExecutionStatus::Completed => "completed",
            ExecutionStatus::Failed => "failed",
        }
    }

    pub fn parse(value: &str) -> Self {
        match value {
            "pending" => ExecutionStatus::Pending,
            "running" => ExecutionStatus::Running,
            "completed" => ExecutionStatus::Completed,
            "failed" => ExecutionStatus::Failed,
            _ => ExecutionStatus::None,
        }
    }
}

/// 2-D canvas position
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Point halfway between two positions
    pub fn midpoint(&self, other: &Position) -> Position {
        Position::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }
}

/// A single automation node
///
/// The `type` tag and `data` payload come from the flattened [`NodeConfig`], so a
/// node serializes as `{"id", "type", "position", "data"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Unique within the workflow, `node_<N>` when allocated by the editor
    pub id: String,
    pub position: Position,
    #[serde(flatten)]
    pub config: NodeConfig,
    /// Measured size, present once the node has been resized on the canvas
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
}

impl Node {
    pub fn new(id: impl Into<String>, position: Position, config: NodeConfig) -> Self {
        Self {
            id: id.into(),
            position,
            config,
            width: None,
            height: None,
        }
    }

    /// Catalog kind, `None` for a node type this build does not know
    pub fn kind(&self) -> Option<NodeKind> {
        self.config.kind()
    }
}

/// Rendering/behaviour tag carried by an edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    #[default]
    Default,
    /// Edge that offers mid-edge insertion of a new node
    Insertable,
}

/// Directed connection between two node ports
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    pub id: String,
    pub source: String,
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_handle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_handle: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: EdgeKind,
    #[serde(default)]
    pub animated: bool,
}

impl Edge {
    /// Whether either endpoint is the given node
    pub fn touches(&self, node_id: &str) -> bool {
        self.source == node_id || self.target == node_id
    }
}

/// A user request to connect two ports, as emitted by the canvas
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    pub source: String,
    pub target: String,
    #[serde(default)]
    pub source_handle: Option<String>,
    #[serde(default)]
    pub target_handle: Option<String>,
}

impl Connection {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            source_handle: None,
            target_handle: None,
        }
    }

    pub fn with_handles(mut self, source_handle: Option<&str>, target_handle: Option<&str>) -> Self {
        self.source_handle = source_handle.map(str::to_string);
        self.target_handle = target_handle.map(str::to_string);
        self
    }

    /// Edge id derived from endpoints and ports; identical connections share it
    pub fn edge_id(&self) -> String {
        format!(
            "edge_{}{}-{}{}",
            self.source,
            self.source_handle.as_deref().map(|h| format!(":{h}")).unwrap_or_default(),
            self.target,
            self.target_handle.as_deref().map(|h| format!(":{h}")).unwrap_or_default(),
        )
    }
}

/// Body of `create`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateWorkflow {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Body of `update`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateWorkflow {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

/// Portable document used by export and import
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortableWorkflow {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

/// Outcome reported by a single remote run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    Success,
    Failure,
}

/// Severity of one execution log entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

/// One timestamped message produced by a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub time: DateTime<Utc>,
    pub message: String,
    pub level: LogLevel,
}

impl LogEntry {
    pub fn now(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            time: Utc::now(),
            message: message.into(),
            level,
        }
    }
}

/// Response of `execute`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionReport {
    pub status: RunOutcome,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub logs: Vec<LogEntry>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
