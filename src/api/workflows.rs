/// Workflow management REST API endpoints
///
/// Serves the workflow service contract the editor's gateway talks to: CRUD,
/// activation toggles, one-shot execution and export/import. Errors are returned as
/// `{"detail": "..."}` with 400, 404 or 500.

use crate::{
    runtime::engine::ExecutionEngine,
    workflow::{
        storage::WorkflowStorage,
        types::{
            CreateWorkflow, Edge, ExecutionReport, ExecutionStatus, Node, PortableWorkflow,
            RunOutcome, UpdateWorkflow, WorkflowDocument, WorkflowId, WorkflowSummary,
        },
    },
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use std::{collections::HashSet, sync::Arc};
use uuid::Uuid;

/// Application state containing shared resources
#[derive(Clone)]
pub struct AppState {
    /// Workflow storage for persistence
    pub storage: WorkflowStorage,
    /// Dry-run engine behind `execute`
    pub engine: Arc<ExecutionEngine>,
}

/// Error response rendered as `{"detail": ...}`
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    detail: String,
}

impl ApiError {
    fn bad_request(detail: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            detail: detail.into(),
        }
    }

    fn not_found(id: WorkflowId) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            detail: format!("Workflow {id} not found"),
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        tracing::error!("❌ Storage failure: {}", err);
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            detail: "Internal server error".to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "detail": self.detail }))).into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

/// Create workflow management routes
pub fn create_workflow_routes() -> Router<AppState> {
    Router::new()
        .route("/api/workflows", get(list_workflows).post(create_workflow))
        .route("/api/workflows/import", post(import_workflow))
        .route(
            "/api/workflows/{id}",
            get(get_workflow).put(update_workflow).delete(delete_workflow),
        )
        .route("/api/workflows/{id}/activate", post(activate_workflow))
        .route("/api/workflows/{id}/deactivate", post(deactivate_workflow))
        .route("/api/workflows/{id}/execute", post(execute_workflow))
        .route("/api/workflows/{id}/export", get(export_workflow))
}

/// Check a name and graph before it is stored
fn validate_workflow(name: &str, nodes: &[Node], edges: &[Edge]) -> Result<(), ApiError> {
    if name.trim().is_empty() {
        return Err(ApiError::bad_request("Workflow name is required"));
    }

    let mut ids = HashSet::new();
    for node in nodes {
        if !ids.insert(node.id.as_str()) {
            return Err(ApiError::bad_request(format!("Duplicate node id: {}", node.id)));
        }
        node.config
            .validate(&node.id)
            .map_err(|e| ApiError::bad_request(e.to_string()))?;
    }

    for edge in edges {
        for endpoint in [&edge.source, &edge.target] {
            if !ids.contains(endpoint.as_str()) {
                return Err(ApiError::bad_request(format!(
                    "Edge {} references unknown node: {}",
                    edge.id, endpoint
                )));
            }
        }
    }

    Ok(())
}

/// GET /api/workflows
async fn list_workflows(State(state): State<AppState>) -> ApiResult<Vec<WorkflowSummary>> {
    Ok(Json(state.storage.list().await?))
}

/// POST /api/workflows
/// Body: { "name": "...", "description": "..." }
async fn create_workflow(
    State(state): State<AppState>,
    Json(payload): Json<CreateWorkflow>,
) -> ApiResult<WorkflowDocument> {
    validate_workflow(&payload.name, &[], &[])?;

    let workflow = state
        .storage
        .create(payload.name.trim(), payload.description.as_deref(), Vec::new(), Vec::new())
        .await?;

    tracing::info!("🆕 Created workflow {:?} ({})", workflow.id, workflow.name);
    Ok(Json(workflow))
}

/// GET /api/workflows/{id}
async fn get_workflow(
    State(state): State<AppState>,
    Path(id): Path<WorkflowId>,
) -> ApiResult<WorkflowDocument> {
    state
        .storage
        .get(id)
        .await?
        .map(Json)
        .ok_or(ApiError::not_found(id))
}

/// PUT /api/workflows/{id}
/// Body: { "name": "...", "nodes": [...], "edges": [...] }
async fn update_workflow(
    State(state): State<AppState>,
    Path(id): Path<WorkflowId>,
    Json(payload): Json<UpdateWorkflow>,
) -> ApiResult<WorkflowDocument> {
    validate_workflow(&payload.name, &payload.nodes, &payload.edges)?;

    let workflow = state
        .storage
        .update(id, &payload)
        .await?
        .ok_or(ApiError::not_found(id))?;

    tracing::info!(
        "💾 Updated workflow {} ({}) with {} nodes and {} edges",
        id,
        workflow.name,
        workflow.nodes.len(),
        workflow.edges.len()
    );
    Ok(Json(workflow))
}

/// DELETE /api/workflows/{id}
async fn delete_workflow(
    State(state): State<AppState>,
    Path(id): Path<WorkflowId>,
) -> ApiResult<Value> {
    if !state.storage.delete(id).await? {
        return Err(ApiError::not_found(id));
    }

    tracing::info!("🗑️ Deleted workflow {}", id);
    Ok(Json(json!({ "message": "Workflow deleted successfully" })))
}

/// POST /api/workflows/{id}/activate
async fn activate_workflow(
    State(state): State<AppState>,
    Path(id): Path<WorkflowId>,
) -> ApiResult<Value> {
    set_active(&state, id, true).await
}

/// POST /api/workflows/{id}/deactivate
async fn deactivate_workflow(
    State(state): State<AppState>,
    Path(id): Path<WorkflowId>,
) -> ApiResult<Value> {
    set_active(&state, id, false).await
}

/// Idempotent: toggling into the current state succeeds unchanged
async fn set_active(state: &AppState, id: WorkflowId, active: bool) -> ApiResult<Value> {
    if !state.storage.set_active(id, active).await? {
        return Err(ApiError::not_found(id));
    }

    tracing::info!("🔁 Workflow {} active: {}", id, active);
    Ok(Json(json!({ "id": id, "is_active": active })))
}

/// POST /api/workflows/{id}/execute
///
/// Runs the workflow once and records `running`, then `completed` or `failed`.
async fn execute_workflow(
    State(state): State<AppState>,
    Path(id): Path<WorkflowId>,
) -> ApiResult<ExecutionReport> {
    let workflow = state
        .storage
        .get(id)
        .await?
        .ok_or(ApiError::not_found(id))?;

    let execution_id = Uuid::new_v4();
    tracing::info!("🚀 Execution {} of workflow {} started", execution_id, id);
    state
        .storage
        .set_execution_status(id, ExecutionStatus::Running)
        .await?;

    let report = state.engine.execute(&workflow);

    let status = match report.status {
        RunOutcome::Success => ExecutionStatus::Completed,
        RunOutcome::Failure => ExecutionStatus::Failed,
    };
    state.storage.set_execution_status(id, status).await?;

    tracing::info!(
        "🏁 Execution {} of workflow {} finished: {}",
        execution_id,
        id,
        status.as_str()
    );
    Ok(Json(report))
}

/// GET /api/workflows/{id}/export
async fn export_workflow(
    State(state): State<AppState>,
    Path(id): Path<WorkflowId>,
) -> ApiResult<PortableWorkflow> {
    let workflow = state
        .storage
        .get(id)
        .await?
        .ok_or(ApiError::not_found(id))?;

    Ok(Json(PortableWorkflow {
        name: workflow.name,
        description: workflow.description,
        nodes: workflow.nodes,
        edges: workflow.edges,
    }))
}

/// POST /api/workflows/import
/// Body: { "name": "...", "nodes": [...], "edges": [...] }
async fn import_workflow(
    State(state): State<AppState>,
    Json(payload): Json<PortableWorkflow>,
) -> ApiResult<WorkflowDocument> {
    validate_workflow(&payload.name, &payload.nodes, &payload.edges)?;

    let workflow = state
        .storage
        .create(
            payload.name.trim(),
            payload.description.as_deref(),
            payload.nodes,
            payload.edges,
        )
        .await?;

    tracing::info!("📥 Imported workflow {:?} ({})", workflow.id, workflow.name);
    Ok(Json(workflow))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::{
        catalog::{NodeConfig, NodeKind},
        types::{EdgeKind, Position},
    };

    fn node(id: &str) -> Node {
        Node::new(id, Position::new(0.0, 0.0), NodeConfig::defaults(NodeKind::Notify))
    }

    fn edge(source: &str, target: &str) -> Edge {
        Edge {
            id: format!("edge_{source}-{target}"),
            source: source.to_string(),
            target: target.to_string(),
            source_handle: None,
            target_handle: None,
            kind: EdgeKind::Insertable,
            animated: true,
        }
    }

    #[test]
    fn validation_checks_name_ids_and_endpoints() {
        assert!(validate_workflow("Ok", &[node("a"), node("b")], &[edge("a", "b")]).is_ok());

        let err = validate_workflow("  ", &[], &[]).unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);

        assert!(validate_workflow("Dup", &[node("a"), node("a")], &[]).is_err());
        assert!(validate_workflow("Dangling", &[node("a")], &[edge("a", "z")]).is_err());
    }
}
