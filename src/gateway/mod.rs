/// Persistence Gateway
///
/// The only seam between the editor and the remote workflow service. It covers CRUD,
/// activation toggles, one-shot execution and export/import. The transport is an
/// implementation detail: [`http::HttpGateway`] talks REST, and tests plug in
/// scripted doubles.

use crate::workflow::types::{
    CreateWorkflow, ExecutionReport, PortableWorkflow, UpdateWorkflow, WorkflowDocument,
    WorkflowId, WorkflowSummary,
};
use thiserror::Error;

// Listing/document cache with explicit invalidation
pub mod cache;

// REST transport built on reqwest
pub mod http;

pub use cache::WorkflowCache;
pub use http::HttpGateway;

/// Tracing target for gateway traffic
pub const TRACING_TARGET: &str = "tradeflow::gateway";

/// Failure reported by the workflow service or the transport
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    #[error("workflow not found")]
    NotFound,

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("transport error: {0}")]
    Transport(String),
}

/// Abstract RPC surface of the workflow service
///
/// `activate` and `deactivate` are idempotent: toggling into the state a workflow is
/// already in succeeds without change.
#[async_trait::async_trait]
pub trait WorkflowGateway: Send + Sync {
    async fn list(&self) -> Result<Vec<WorkflowSummary>, GatewayError>;

    async fn get(&self, id: WorkflowId) -> Result<WorkflowDocument, GatewayError>;

    async fn create(&self, request: CreateWorkflow) -> Result<WorkflowDocument, GatewayError>;

    async fn update(
        &self,
        id: WorkflowId,
        request: UpdateWorkflow,
    ) -> Result<WorkflowDocument, GatewayError>;

    async fn delete(&self, id: WorkflowId) -> Result<(), GatewayError>;

    async fn activate(&self, id: WorkflowId) -> Result<(), GatewayError>;

    async fn deactivate(&self, id: WorkflowId) -> Result<(), GatewayError>;

    /// Run the workflow once, synchronously from the caller's point of view
    async fn execute(&self, id: WorkflowId) -> Result<ExecutionReport, GatewayError>;

    async fn export(&self, id: WorkflowId) -> Result<PortableWorkflow, GatewayError>;

    async fn import(&self, document: PortableWorkflow) -> Result<WorkflowDocument, GatewayError>;
}
