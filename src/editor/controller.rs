/// Lifecycle controller for the workflow editor
///
/// Composes the graph model with the persistence gateway. Every remote operation
/// suspends only itself: state lives in a `RefCell` that is never borrowed across an
/// await, so the graph stays editable while a save or run is in flight. Responses
/// are reconciled against the dirty tracker's checkpoint and epoch, which keeps a
/// late reply from clobbering newer edits or a different workflow.
///
/// The controller is single-threaded by construction (`!Sync`), matching the
/// cooperative model of an editor surface.

use crate::{
    editor::{
        export::ExportFile,
        graph::GraphModel,
        import::parse_import,
        log::{ExecutionLog, RunStatus},
        shortcuts::{resolve, KeyEvent, ShortcutAction, ShortcutContext},
    },
    error::{EditorError, Operation, ValidationError},
    gateway::{GatewayError, WorkflowCache, WorkflowGateway},
    workflow::types::{CreateWorkflow, WorkflowId},
};
use std::{
    cell::RefCell,
    collections::HashSet,
    sync::Arc,
};

/// Navigation target of the editor shell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Route {
    #[default]
    Workflows,
    NewWorkflow,
    EditWorkflow(WorkflowId),
}

/// Coarse lifecycle phase of the editor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    /// Nothing loaded
    #[default]
    Empty,
    Loading,
    /// A draft or persisted workflow is open
    Ready,
}

#[derive(Debug, Default)]
struct EditorState {
    /// Lifecycle phase shown by the shell
    phase: Phase,
    /// `None` while editing an unsaved draft
    workflow_id: Option<WorkflowId>,
    /// Last activation flag confirmed by the service
    is_active: bool,
    /// The open graph with its dirty tracker and id allocator
    graph: GraphModel,
    /// Status and entries of the most recent run
    log: ExecutionLog,
    /// Operations awaiting a reply; activate and deactivate share a slot
    in_flight: HashSet<Operation>,
    /// Whether the shortcut help overlay is shown
    help_open: bool,
    /// Where the shell should navigate
    route: Route,
}

/// Releases an in-flight operation slot when dropped
struct InFlightGuard<'a> {
    state: &'a RefCell<EditorState>,
    operation: Operation,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.state.borrow_mut().in_flight.remove(&self.operation);
    }
}

pub struct EditorController {
    cache: Arc<WorkflowCache>,
    state: RefCell<EditorState>,
}

impl EditorController {
    pub fn new(cache: Arc<WorkflowCache>) -> Self {
        Self {
            cache,
            state: RefCell::new(EditorState::default()),
        }
    }

    fn gateway(&self) -> &Arc<dyn WorkflowGateway> {
        self.cache.gateway()
    }

    /// Claim an operation slot, refusing duplicates
    ///
    /// Activate and deactivate share one slot since they race on the same flag.
    fn begin(&self, operation: Operation) -> Result<InFlightGuard<'_>, EditorError> {
        let mut state = self.state.borrow_mut();
        let busy = match operation {
            Operation::Activate | Operation::Deactivate => {
                state.in_flight.contains(&Operation::Activate)
                    || state.in_flight.contains(&Operation::Deactivate)
            }
            other => state.in_flight.contains(&other),
        };
        if busy {
            tracing::debug!("⏳ Ignoring duplicate {} request", operation);
            return Err(EditorError::InFlight(operation));
        }

        state.in_flight.insert(operation);
        Ok(InFlightGuard {
            state: &self.state,
            operation,
        })
    }

    fn require_id(&self) -> Result<WorkflowId, EditorError> {
        self.state.borrow().workflow_id.ok_or(EditorError::NotLoaded)
    }

    /// Mutate the graph model synchronously
    pub fn edit<R>(&self, f: impl FnOnce(&mut GraphModel) -> R) -> R {
        f(&mut self.state.borrow_mut().graph)
    }

    /// Read the graph model
    pub fn view<R>(&self, f: impl FnOnce(&GraphModel) -> R) -> R {
        f(&self.state.borrow().graph)
    }

    pub fn phase(&self) -> Phase {
        self.state.borrow().phase
    }

    pub fn workflow_id(&self) -> Option<WorkflowId> {
        self.state.borrow().workflow_id
    }

    pub fn is_active(&self) -> bool {
        self.state.borrow().is_active
    }

    pub fn is_dirty(&self) -> bool {
        self.state.borrow().graph.is_dirty()
    }

    pub fn run_status(&self) -> RunStatus {
        self.state.borrow().log.status()
    }

    /// Snapshot of the execution log
    pub fn log(&self) -> ExecutionLog {
        self.state.borrow().log.clone()
    }

    pub fn help_open(&self) -> bool {
        self.state.borrow().help_open
    }

    pub fn route(&self) -> Route {
        self.state.borrow().route
    }

    pub fn is_in_flight(&self, operation: Operation) -> bool {
        self.state.borrow().in_flight.contains(&operation)
    }

    /// Open a persisted workflow
    pub async fn load(&self, id: WorkflowId) -> Result<(), EditorError> {
        let _guard = self.begin(Operation::Load)?;
        let previous = std::mem::replace(&mut self.state.borrow_mut().phase, Phase::Loading);

        let document = match self.cache.document(id).await {
            Ok(document) => document,
            Err(err) => {
                tracing::warn!("❌ Failed to load workflow {}: {}", id, err);
                self.state.borrow_mut().phase = previous;
                return Err(err.into());
            }
        };

        let mut state = self.state.borrow_mut();
        state.graph.set_workflow(&document);
        state.workflow_id = Some(id);
        state.is_active = document.is_active;
        state.log = ExecutionLog::new();
        state.phase = Phase::Ready;
        state.route = Route::EditWorkflow(id);

        tracing::info!(
            "📂 Loaded workflow {} '{}' ({} nodes, active: {})",
            id,
            document.name,
            document.nodes.len(),
            document.is_active
        );
        Ok(())
    }

    /// Start an empty unsaved draft
    pub fn new_draft(&self) {
        let mut state = self.state.borrow_mut();
        state.graph.reset();
        state.workflow_id = None;
        state.is_active = false;
        state.log = ExecutionLog::new();
        state.help_open = false;
        state.phase = Phase::Ready;
        state.route = Route::NewWorkflow;
        tracing::info!("📝 Started a new workflow draft");
    }

    /// Discard the open workflow, e.g. on navigating away
    pub fn reset_workflow(&self) {
        let mut state = self.state.borrow_mut();
        state.graph.reset();
        state.workflow_id = None;
        state.is_active = false;
        state.log = ExecutionLog::new();
        state.help_open = false;
        state.phase = Phase::Empty;
        state.route = Route::Workflows;
    }

    /// Persist name, description, nodes and edges
    ///
    /// A draft is created first and adopts the new id. Edits made while the request
    /// is in flight leave the model dirty afterwards.
    pub async fn save(&self) -> Result<WorkflowId, EditorError> {
        let _guard = self.begin(Operation::Save)?;

        let (existing, request, checkpoint) = {
            let state = self.state.borrow();
            if state.phase != Phase::Ready {
                return Err(EditorError::NotLoaded);
            }
            (state.workflow_id, state.graph.to_update(), state.graph.checkpoint())
        };
        if request.name.trim().is_empty() {
            return Err(ValidationError::EmptyName.into());
        }

        let id = match existing {
            Some(id) => id,
            None => {
                let created = self
                    .gateway()
                    .create(CreateWorkflow {
                        name: request.name.clone(),
                        description: request.description.clone(),
                    })
                    .await
                    .inspect_err(|err| tracing::warn!("❌ Failed to create workflow: {}", err))?;
                let id = created.id.ok_or_else(|| {
                    EditorError::Transport("created workflow has no id".to_string())
                })?;

                let mut state = self.state.borrow_mut();
                if state.graph.epoch() == checkpoint.epoch() {
                    state.workflow_id = Some(id);
                    state.route = Route::EditWorkflow(id);
                }
                self.cache.invalidate_listing();
                id
            }
        };

        if let Err(err) = self.gateway().update(id, request).await {
            tracing::warn!("❌ Failed to save workflow {}: {}", id, err);
            return Err(err.into());
        }

        let clean = self.state.borrow_mut().graph.acknowledge(checkpoint);
        self.cache.invalidate_listing();
        self.cache.invalidate_document(id);

        tracing::info!("💾 Saved workflow {} (clean: {})", id, clean);
        Ok(id)
    }

    pub async fn activate(&self) -> Result<(), EditorError> {
        self.set_active(true).await
    }

    pub async fn deactivate(&self) -> Result<(), EditorError> {
        self.set_active(false).await
    }

    async fn set_active(&self, active: bool) -> Result<(), EditorError> {
        let operation = if active {
            Operation::Activate
        } else {
            Operation::Deactivate
        };
        let _guard = self.begin(operation)?;
        let id = self.require_id()?;

        let result = if active {
            self.gateway().activate(id).await
        } else {
            self.gateway().deactivate(id).await
        };
        if let Err(err) = result {
            tracing::warn!("❌ Failed to {} workflow {}: {}", operation, id, err);
            return Err(err.into());
        }

        {
            let mut state = self.state.borrow_mut();
            if state.workflow_id == Some(id) {
                state.is_active = active;
            }
        }
        self.cache.invalidate_document(id);
        self.cache.invalidate_listing();

        tracing::info!(
            "{} Workflow {} is now {}",
            if active { "▶️" } else { "⏸️" },
            id,
            if active { "active" } else { "inactive" }
        );
        Ok(())
    }

    /// Run the persisted workflow once
    ///
    /// The log flips to running and is cleared before the request goes out. A reply
    /// that arrives after a different workflow was opened is discarded.
    pub async fn execute(&self) -> Result<RunStatus, EditorError> {
        let _guard = self.begin(Operation::Execute)?;
        let id = self.require_id()?;

        let epoch = {
            let mut state = self.state.borrow_mut();
            state.log.begin();
            state.graph.epoch()
        };
        tracing::info!("🚀 Executing workflow {}", id);

        let result = self.gateway().execute(id).await;
        self.cache.invalidate_listing();
        self.cache.invalidate_document(id);

        let mut state = self.state.borrow_mut();
        let current = state.graph.epoch() == epoch && state.workflow_id == Some(id);

        match result {
            Ok(report) => {
                if !current {
                    tracing::debug!("Discarding run report for workflow {}", id);
                    return Ok(state.log.status());
                }
                tracing::info!(
                    "✅ Workflow {} finished with {:?}: {}",
                    id,
                    report.status,
                    report.message
                );
                state.log.complete(report);
                Ok(state.log.status())
            }
            Err(err) => {
                tracing::warn!("❌ Execution of workflow {} failed: {}", id, err);
                if current {
                    state.log.fail(failure_message(&err));
                }
                Err(err.into())
            }
        }
    }

    /// Fetch the portable document of the persisted workflow
    pub async fn export(&self) -> Result<ExportFile, EditorError> {
        let _guard = self.begin(Operation::Export)?;
        let id = self.require_id()?;

        let document = self
            .gateway()
            .export(id)
            .await
            .inspect_err(|err| tracing::warn!("❌ Failed to export workflow {}: {}", id, err))?;
        let file = ExportFile::from_portable(&document)
            .map_err(|e| EditorError::Transport(e.to_string()))?;

        tracing::info!("📤 Exported workflow {} as {}", id, file.file_name);
        Ok(file)
    }

    /// Validate locally, create from the document, and navigate to it
    ///
    /// Validation failures return before any gateway call.
    pub async fn import(&self, text: &str) -> Result<WorkflowId, EditorError> {
        let _guard = self.begin(Operation::Import)?;
        let document = parse_import(text)?;
        let name = document.name.clone();

        let created = self
            .gateway()
            .import(document)
            .await
            .inspect_err(|err| tracing::warn!("❌ Failed to import '{}': {}", name, err))?;
        let id = created
            .id
            .ok_or_else(|| EditorError::Transport("imported workflow has no id".to_string()))?;

        self.cache.invalidate_listing();
        self.state.borrow_mut().route = Route::EditWorkflow(id);

        tracing::info!("📥 Imported workflow '{}' as {}", name, id);
        Ok(id)
    }

    /// Dispatch a key press, returning the action that ran
    pub async fn handle_key(&self, event: KeyEvent) -> Result<Option<ShortcutAction>, EditorError> {
        let context = {
            let state = self.state.borrow();
            ShortcutContext {
                has_selection: state.graph.has_selection(),
                dirty: state.graph.is_dirty(),
                saving: state.in_flight.contains(&Operation::Save),
            }
        };

        let Some(action) = resolve(&event, &context) else {
            return Ok(None);
        };

        match action {
            ShortcutAction::DeleteSelected => {
                self.state.borrow_mut().graph.delete_selected();
            }
            ShortcutAction::Save => {
                self.save().await?;
            }
            ShortcutAction::ClearSelection => {
                let mut state = self.state.borrow_mut();
                state.graph.clear_selection();
                state.help_open = false;
            }
            ShortcutAction::ToggleHelp => {
                let mut state = self.state.borrow_mut();
                state.help_open = !state.help_open;
            }
        }
        Ok(Some(action))
    }
}

fn failure_message(err: &GatewayError) -> String {
    match err {
        GatewayError::NotFound => "Workflow not found".to_string(),
        GatewayError::Validation(message) | GatewayError::Transport(message) => message.clone(),
    }
}
