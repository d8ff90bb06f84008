/// SQLite persistence layer for workflow storage
///
/// Handles workflow CRUD operations for the reference backend. The graph (nodes and
/// edges) is stored as a JSON column while the listing fields stay queryable.

use crate::workflow::types::{
    Edge, ExecutionStatus, Node, UpdateWorkflow, WorkflowDocument, WorkflowId, WorkflowSummary,
};
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{
    sqlite::{SqlitePool, SqliteRow},
    Row,
};

/// JSON payload of the `definition` column
#[derive(Debug, Default, Serialize, Deserialize)]
struct Definition {
    #[serde(default)]
    nodes: Vec<Node>,
    #[serde(default)]
    edges: Vec<Edge>,
}

/// SQLite-based workflow storage manager
#[derive(Debug, Clone)]
pub struct WorkflowStorage {
    /// SQLite connection pool for the workflow database
    pool: SqlitePool,
}

impl WorkflowStorage {
    /// Create new storage instance with database connection
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Initialize the workflow storage schema
    ///
    /// Safe to call multiple times (uses IF NOT EXISTS).
    pub async fn init_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS workflows (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                description TEXT,
                definition JSON NOT NULL,
                is_active INTEGER NOT NULL DEFAULT 0,
                last_execution_status TEXT NOT NULL DEFAULT 'none',
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_workflows_updated_at
            ON workflows(updated_at)
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// List all workflows, most recently updated first
    pub async fn list(&self) -> Result<Vec<WorkflowSummary>> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, description, is_active, last_execution_status, updated_at
            FROM workflows ORDER BY updated_at DESC, id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(summary_from_row).collect()
    }

    /// Retrieve a workflow by id
    pub async fn get(&self, id: WorkflowId) -> Result<Option<WorkflowDocument>> {
        let row = sqlx::query(
            r#"
            SELECT id, name, description, definition, is_active, last_execution_status, updated_at
            FROM workflows WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(document_from_row).transpose()
    }

    /// Insert a new workflow and return it with its assigned id
    pub async fn create(
        &self,
        name: &str,
        description: Option<&str>,
        nodes: Vec<Node>,
        edges: Vec<Edge>,
    ) -> Result<WorkflowDocument> {
        let definition = serde_json::to_string(&Definition { nodes, edges })?;
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO workflows (name, description, definition, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(name)
        .bind(description)
        .bind(&definition)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        self.get(id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Workflow {} vanished after insert", id))
    }

    /// Replace name, description and graph; `None` when the id is unknown
    pub async fn update(
        &self,
        id: WorkflowId,
        request: &UpdateWorkflow,
    ) -> Result<Option<WorkflowDocument>> {
        let definition = serde_json::to_string(&Definition {
            nodes: request.nodes.clone(),
            edges: request.edges.clone(),
        })?;

        let result = sqlx::query(
            r#"
            UPDATE workflows
            SET name = ?, description = ?, definition = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&request.name)
        .bind(request.description.as_deref())
        .bind(&definition)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get(id).await
    }

    /// Delete a workflow by id
    pub async fn delete(&self, id: WorkflowId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM workflows WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Set the active flag; setting the current value is a successful no-op
    pub async fn set_active(&self, id: WorkflowId, active: bool) -> Result<bool> {
        let result = sqlx::query("UPDATE workflows SET is_active = ?, updated_at = ? WHERE id = ?")
            .bind(active)
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Record the status of the latest run
    pub async fn set_execution_status(&self, id: WorkflowId, status: ExecutionStatus) -> Result<bool> {
        let result = sqlx::query("UPDATE workflows SET last_execution_status = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

fn summary_from_row(row: &SqliteRow) -> Result<WorkflowSummary> {
    let status: String = row.try_get("last_execution_status")?;
    let updated_at: DateTime<Utc> = row.try_get("updated_at")?;

    Ok(WorkflowSummary {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        is_active: row.try_get("is_active")?,
        last_execution_status: ExecutionStatus::parse(&status),
        updated_at,
    })
}

fn document_from_row(row: &SqliteRow) -> Result<WorkflowDocument> {
    let definition: String = row.try_get("definition")?;
    let definition: Definition = serde_json::from_str(&definition)?;
    let status: String = row.try_get("last_execution_status")?;
    let updated_at: DateTime<Utc> = row.try_get("updated_at")?;

    Ok(WorkflowDocument {
        id: Some(row.try_get("id")?),
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        nodes: definition.nodes,
        edges: definition.edges,
        is_active: row.try_get("is_active")?,
        last_execution_status: ExecutionStatus::parse(&status),
        updated_at: Some(updated_at),
    })
}
