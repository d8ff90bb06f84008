/// Workflow listing surface
///
/// Reads go through the cache; every successful mutation invalidates it so the next
/// read refetches from the service.

use crate::{
    editor::controller::Route,
    error::{EditorError, ValidationError},
    gateway::WorkflowCache,
    workflow::types::{CreateWorkflow, WorkflowId, WorkflowSummary},
};
use std::sync::Arc;

#[derive(Clone)]
pub struct Dashboard {
    cache: Arc<WorkflowCache>,
}

impl Dashboard {
    pub fn new(cache: Arc<WorkflowCache>) -> Self {
        Self { cache }
    }

    pub async fn list(&self) -> Result<Arc<Vec<WorkflowSummary>>, EditorError> {
        Ok(self.cache.list().await?)
    }

    /// Create an empty workflow and return the route to its editor
    pub async fn create(&self, name: &str) -> Result<Route, EditorError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyName.into());
        }

        let created = self
            .cache
            .gateway()
            .create(CreateWorkflow {
                name: name.to_string(),
                description: None,
            })
            .await?;
        let id = created
            .id
            .ok_or_else(|| EditorError::Transport("created workflow has no id".to_string()))?;

        self.cache.invalidate_listing();
        tracing::info!("🆕 Created workflow {} '{}'", id, name);
        Ok(Route::EditWorkflow(id))
    }

    pub async fn delete(&self, id: WorkflowId) -> Result<(), EditorError> {
        self.cache.gateway().delete(id).await?;
        self.cache.invalidate_listing();
        self.cache.invalidate_document(id);
        tracing::info!("🗑️ Deleted workflow {}", id);
        Ok(())
    }

    /// Toggle a workflow from the listing
    pub async fn set_active(&self, id: WorkflowId, active: bool) -> Result<(), EditorError> {
        let gateway = self.cache.gateway();
        if active {
            gateway.activate(id).await?;
        } else {
            gateway.deactivate(id).await?;
        }

        self.cache.invalidate_listing();
        self.cache.invalidate_document(id);
        Ok(())
    }
}
