/// Workflow Management Layer
///
/// Type definitions shared by the editor and the workflow service:
/// - Documents, nodes, edges and execution reports
/// - The typed node catalog
/// - SQLite persistence with sqlx

// Core workflow type definitions
pub mod types;

// Node kinds and their typed configuration payloads
pub mod catalog;

// SQLite persistence layer for workflow storage
pub mod storage;

// Re-export commonly used types
pub use catalog::{NodeConfig, NodeKind};
pub use types::{Edge, Node, WorkflowDocument, WorkflowId, WorkflowSummary};
