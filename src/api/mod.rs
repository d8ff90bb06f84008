/// HTTP API Layer
///
/// REST endpoints of the reference workflow service:
/// - Workflow CRUD operations
/// - Activation toggles
/// - One-shot execution, export and import

// Workflow management endpoints
pub mod workflows;

// Re-export router builder
pub use workflows::{create_workflow_routes, AppState};
