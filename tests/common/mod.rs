//! Common test utilities: a scripted in-memory workflow service.
#![allow(dead_code)]

use chrono::Utc;
use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};
use tokio::sync::Notify;
use tradeflow::{
    editor::EditorController,
    gateway::{GatewayError, WorkflowCache, WorkflowGateway},
    workflow::{
        catalog::{NodeConfig, NodeKind},
        types::{
            CreateWorkflow, Edge, EdgeKind, ExecutionReport, LogEntry, LogLevel, Node,
            PortableWorkflow, Position, RunOutcome, UpdateWorkflow, WorkflowDocument, WorkflowId,
            WorkflowSummary,
        },
    },
};

#[derive(Default)]
struct Inner {
    workflows: HashMap<WorkflowId, WorkflowDocument>,
    next_id: WorkflowId,
    calls: Vec<&'static str>,
    failures: HashMap<&'static str, GatewayError>,
    report: Option<ExecutionReport>,
}

/// In-memory gateway that records every call
///
/// Failures can be injected per operation, and any operation can be held open on a
/// gate until the test releases it.
#[derive(Default)]
pub struct FakeGateway {
    inner: Mutex<Inner>,
    gates: Mutex<HashMap<&'static str, Arc<Notify>>>,
}

impl FakeGateway {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Store a workflow directly, bypassing the call log
    pub fn seed(&self, name: &str, nodes: Vec<Node>, edges: Vec<Edge>) -> WorkflowId {
        let mut inner = self.inner.lock().unwrap();
        inner.next_id += 1;
        let id = inner.next_id;
        inner.workflows.insert(
            id,
            WorkflowDocument {
                id: Some(id),
                name: name.to_string(),
                description: None,
                nodes,
                edges,
                is_active: false,
                last_execution_status: Default::default(),
                updated_at: Some(Utc::now()),
            },
        );
        id
    }

    pub fn stored(&self, id: WorkflowId) -> Option<WorkflowDocument> {
        self.inner.lock().unwrap().workflows.get(&id).cloned()
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.inner.lock().unwrap().calls.clone()
    }

    pub fn call_count(&self, operation: &str) -> usize {
        self.calls().iter().filter(|call| **call == operation).count()
    }

    /// Make the next call of `operation` fail with `error`
    pub fn fail_next(&self, operation: &'static str, error: GatewayError) {
        self.inner.lock().unwrap().failures.insert(operation, error);
    }

    pub fn set_report(&self, report: ExecutionReport) {
        self.inner.lock().unwrap().report = Some(report);
    }

    /// Hold every call of `operation` until the returned gate is notified
    pub fn hold(&self, operation: &'static str) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.gates.lock().unwrap().insert(operation, Arc::clone(&gate));
        gate
    }

    async fn enter(&self, operation: &'static str) -> Result<(), GatewayError> {
        self.inner.lock().unwrap().calls.push(operation);

        let gate = self.gates.lock().unwrap().get(operation).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        match self.inner.lock().unwrap().failures.remove(operation) {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn insert(&self, name: String, nodes: Vec<Node>, edges: Vec<Edge>) -> Result<WorkflowDocument, GatewayError> {
        if name.trim().is_empty() {
            return Err(GatewayError::Validation("Workflow name is required".to_string()));
        }
        let id = self.seed(&name, nodes, edges);
        self.stored(id).ok_or(GatewayError::NotFound)
    }

    fn with_workflow<T>(
        &self,
        id: WorkflowId,
        f: impl FnOnce(&mut WorkflowDocument) -> T,
    ) -> Result<T, GatewayError> {
        let mut inner = self.inner.lock().unwrap();
        inner.workflows.get_mut(&id).map(f).ok_or(GatewayError::NotFound)
    }
}

#[async_trait::async_trait]
impl WorkflowGateway for FakeGateway {
    async fn list(&self) -> Result<Vec<WorkflowSummary>, GatewayError> {
        self.enter("list").await?;
        let inner = self.inner.lock().unwrap();
        let mut listing: Vec<WorkflowSummary> = inner
            .workflows
            .values()
            .map(|doc| WorkflowSummary {
                id: doc.id.unwrap_or_default(),
                name: doc.name.clone(),
                description: doc.description.clone(),
                is_active: doc.is_active,
                last_execution_status: doc.last_execution_status,
                updated_at: doc.updated_at.unwrap_or_else(Utc::now),
            })
            .collect();
        listing.sort_by_key(|summary| summary.id);
        Ok(listing)
    }

    async fn get(&self, id: WorkflowId) -> Result<WorkflowDocument, GatewayError> {
        self.enter("get").await?;
        self.stored(id).ok_or(GatewayError::NotFound)
    }

    async fn create(&self, request: CreateWorkflow) -> Result<WorkflowDocument, GatewayError> {
        self.enter("create").await?;
        self.insert(request.name, Vec::new(), Vec::new())
    }

    async fn update(
        &self,
        id: WorkflowId,
        request: UpdateWorkflow,
    ) -> Result<WorkflowDocument, GatewayError> {
        self.enter("update").await?;
        self.with_workflow(id, |doc| {
            doc.name = request.name;
            doc.description = request.description;
            doc.nodes = request.nodes;
            doc.edges = request.edges;
            doc.updated_at = Some(Utc::now());
            doc.clone()
        })
    }

    async fn delete(&self, id: WorkflowId) -> Result<(), GatewayError> {
        self.enter("delete").await?;
        self.inner
            .lock()
            .unwrap()
            .workflows
            .remove(&id)
            .map(|_| ())
            .ok_or(GatewayError::NotFound)
    }

    async fn activate(&self, id: WorkflowId) -> Result<(), GatewayError> {
        self.enter("activate").await?;
        self.with_workflow(id, |doc| doc.is_active = true)
    }

    async fn deactivate(&self, id: WorkflowId) -> Result<(), GatewayError> {
        self.enter("deactivate").await?;
        self.with_workflow(id, |doc| doc.is_active = false)
    }

    async fn execute(&self, id: WorkflowId) -> Result<ExecutionReport, GatewayError> {
        self.enter("execute").await?;
        self.with_workflow(id, |_| ())?;
        let report = self.inner.lock().unwrap().report.clone();
        Ok(report.unwrap_or_else(|| ExecutionReport {
            status: RunOutcome::Success,
            message: "ok".to_string(),
            logs: vec![LogEntry::now(LogLevel::Info, "step done")],
        }))
    }

    async fn export(&self, id: WorkflowId) -> Result<PortableWorkflow, GatewayError> {
        self.enter("export").await?;
        self.with_workflow(id, |doc| PortableWorkflow {
            name: doc.name.clone(),
            description: doc.description.clone(),
            nodes: doc.nodes.clone(),
            edges: doc.edges.clone(),
        })
    }

    async fn import(&self, document: PortableWorkflow) -> Result<WorkflowDocument, GatewayError> {
        self.enter("import").await?;
        self.insert(document.name, document.nodes, document.edges)
    }
}

/// Controller and cache over the given gateway
pub fn editor(gateway: &Arc<FakeGateway>) -> (EditorController, Arc<WorkflowCache>) {
    let cache = Arc::new(WorkflowCache::new(gateway.clone()));
    (EditorController::new(Arc::clone(&cache)), cache)
}

pub fn node(id: &str, kind: NodeKind) -> Node {
    Node::new(id, Position::new(0.0, 0.0), NodeConfig::defaults(kind))
}

pub fn edge(source: &str, target: &str) -> Edge {
    Edge {
        id: format!("edge_{source}-{target}"),
        source: source.to_string(),
        target: target.to_string(),
        source_handle: None,
        target_handle: None,
        kind: EdgeKind::Default,
        animated: false,
    }
}
