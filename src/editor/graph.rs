/// In-memory workflow graph edited by the canvas
///
/// Owns nodes, edges and selection for one open workflow together with its id
/// allocator and dirty tracker. All mutation goes through the methods here; none of
/// them perform I/O.

use crate::{
    editor::{
        dirty::{DirtyTracker, SaveCheckpoint},
        ids::IdAllocator,
    },
    error::ValidationError,
    workflow::{
        catalog::{NodeConfig, NodeKind},
        types::{Connection, Edge, EdgeKind, Node, Position, UpdateWorkflow, WorkflowDocument},
    },
};

/// Name a new, never-saved draft starts with
pub const DEFAULT_WORKFLOW_NAME: &str = "Untitled Workflow";

/// Kind and animation applied to edges created or loaded by the editor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeDefaults {
    pub kind: EdgeKind,
    pub animated: bool,
}

impl Default for EdgeDefaults {
    fn default() -> Self {
        Self {
            kind: EdgeKind::Insertable,
            animated: true,
        }
    }
}

/// At most one node or one edge is selected
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Selection {
    #[default]
    None,
    Node(String),
    Edge(String),
}

/// Delta emitted by direct manipulation of nodes on the canvas
#[derive(Debug, Clone, PartialEq)]
pub enum NodeChange {
    /// Drag update; `position` is `None` for drag start/stop notifications
    Position {
        id: String,
        position: Option<Position>,
        dragging: bool,
    },
    /// Size update; `resizing` is false when the renderer merely measured the node
    Dimensions {
        id: String,
        width: f64,
        height: f64,
        resizing: bool,
    },
    Select { id: String, selected: bool },
    Remove { id: String },
}

impl NodeChange {
    /// Whether applying this change alters persisted content
    pub fn is_content_change(&self) -> bool {
        match self {
            NodeChange::Position { position, .. } => position.is_some(),
            NodeChange::Dimensions { resizing, .. } => *resizing,
            NodeChange::Select { .. } => false,
            NodeChange::Remove { .. } => true,
        }
    }
}

/// Delta emitted by direct manipulation of edges on the canvas
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EdgeChange {
    Select { id: String, selected: bool },
    Remove { id: String },
}

impl EdgeChange {
    pub fn is_content_change(&self) -> bool {
        matches!(self, EdgeChange::Remove { .. })
    }
}

/// Graph of one open workflow
#[derive(Debug, Clone)]
pub struct GraphModel {
    /// Workflow name, edited in place
    name: String,
    /// Optional free-text description
    description: Option<String>,
    /// Nodes in insertion order
    nodes: Vec<Node>,
    /// Edges; both endpoints always exist in `nodes`
    edges: Vec<Edge>,
    /// At most one selected node or edge
    selection: Selection,
    /// Source of fresh `node_<N>` ids
    ids: IdAllocator,
    /// Revision counter behind `is_dirty`
    dirty: DirtyTracker,
    /// Kind and animation applied to every new or loaded edge
    edge_defaults: EdgeDefaults,
}

impl Default for GraphModel {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphModel {
    pub fn new() -> Self {
        Self::with_edge_defaults(EdgeDefaults::default())
    }

    pub fn with_edge_defaults(edge_defaults: EdgeDefaults) -> Self {
        Self {
            name: DEFAULT_WORKFLOW_NAME.to_string(),
            description: None,
            nodes: Vec::new(),
            edges: Vec::new(),
            selection: Selection::None,
            ids: IdAllocator::new(),
            dirty: DirtyTracker::new(),
            edge_defaults,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|node| node.id == id)
    }

    pub fn edge(&self, id: &str) -> Option<&Edge> {
        self.edges.iter().find(|edge| edge.id == id)
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn selected_node(&self) -> Option<&Node> {
        match &self.selection {
            Selection::Node(id) => self.node(id),
            _ => None,
        }
    }

    pub fn selected_edge(&self) -> Option<&Edge> {
        match &self.selection {
            Selection::Edge(id) => self.edge(id),
            _ => None,
        }
    }

    pub fn has_selection(&self) -> bool {
        self.selection != Selection::None
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty.is_dirty()
    }

    /// Suffix the next [`add_node`](Self::add_node) will use
    pub fn next_node_number(&self) -> Option<u64> {
        self.ids.peek()
    }

    /// Insert a node of `kind` with a fresh id and the kind's default payload
    pub fn add_node(&mut self, kind: NodeKind, position: Position) -> String {
        let nodes = &self.nodes;
        let id = self.ids.next_id(|id| nodes.iter().any(|node| node.id == id));
        self.nodes
            .push(Node::new(id.clone(), position, NodeConfig::defaults(kind)));
        self.dirty.mark();

        tracing::debug!("➕ Added node '{}' ({})", id, kind);
        id
    }

    /// Apply a batch of node deltas
    ///
    /// Removing a node also removes every edge touching it. Returns whether the batch
    /// changed persisted content (and therefore marked the model dirty).
    pub fn apply_node_changes(&mut self, changes: impl IntoIterator<Item = NodeChange>) -> bool {
        let mut content_changed = false;

        for change in changes {
            let is_content = change.is_content_change();
            let applied = match change {
                NodeChange::Position { id, position, .. } => match (self.node_mut(&id), position) {
                    (Some(node), Some(position)) => {
                        node.position = position;
                        true
                    }
                    _ => false,
                },
                NodeChange::Dimensions {
                    id, width, height, ..
                } => match self.node_mut(&id) {
                    Some(node) => {
                        node.width = Some(width);
                        node.height = Some(height);
                        true
                    }
                    None => false,
                },
                NodeChange::Select { id, selected } => {
                    if selected {
                        self.select_node(Some(&id));
                    } else if self.selection == Selection::Node(id) {
                        self.selection = Selection::None;
                    }
                    true
                }
                NodeChange::Remove { id } => self.remove_node(&id),
            };
            content_changed |= applied && is_content;
        }

        if content_changed {
            self.dirty.mark();
        }
        content_changed
    }

    /// Apply a batch of edge deltas; returns whether content changed
    pub fn apply_edge_changes(&mut self, changes: impl IntoIterator<Item = EdgeChange>) -> bool {
        let mut content_changed = false;

        for change in changes {
            match change {
                EdgeChange::Select { id, selected } => {
                    if selected {
                        self.select_edge(Some(&id));
                    } else if self.selection == Selection::Edge(id) {
                        self.selection = Selection::None;
                    }
                }
                EdgeChange::Remove { id } => content_changed |= self.remove_edge(&id),
            }
        }

        if content_changed {
            self.dirty.mark();
        }
        content_changed
    }

    /// Connect two existing, distinct nodes
    ///
    /// Returns the new edge id, or `None` (leaving the model untouched) for a
    /// self-loop, a missing endpoint or a connection that already exists.
    pub fn connect(&mut self, connection: Connection) -> Option<String> {
        if connection.source == connection.target {
            tracing::debug!("🚫 Rejected self-loop on '{}'", connection.source);
            return None;
        }
        if self.node(&connection.source).is_none() || self.node(&connection.target).is_none() {
            tracing::debug!(
                "🚫 Rejected connection with unknown endpoint: '{}' → '{}'",
                connection.source,
                connection.target
            );
            return None;
        }

        let id = connection.edge_id();
        if self.edge(&id).is_some() {
            return None;
        }

        self.edges.push(Edge {
            id: id.clone(),
            source: connection.source,
            target: connection.target,
            source_handle: connection.source_handle,
            target_handle: connection.target_handle,
            kind: self.edge_defaults.kind,
            animated: self.edge_defaults.animated,
        });
        self.dirty.mark();

        tracing::debug!("🔗 Connected edge '{}'", id);
        Some(id)
    }

    /// Split an insertable edge with a new node of `kind` placed at its midpoint
    ///
    /// The outer ends keep their original ports. Returns the new node id.
    pub fn insert_node_on_edge(&mut self, edge_id: &str, kind: NodeKind) -> Option<String> {
        let edge = self.edge(edge_id)?.clone();
        if edge.kind != EdgeKind::Insertable {
            return None;
        }

        let source_position = self.node(&edge.source)?.position;
        let target_position = self.node(&edge.target)?.position;

        let nodes = &self.nodes;
        let node_id = self.ids.next_id(|id| nodes.iter().any(|node| node.id == id));
        self.nodes.push(Node::new(
            node_id.clone(),
            source_position.midpoint(&target_position),
            NodeConfig::defaults(kind),
        ));
        self.edges.retain(|e| e.id != edge.id);
        if self.selection == Selection::Edge(edge.id.clone()) {
            self.selection = Selection::None;
        }

        let upstream = Connection::new(edge.source.clone(), node_id.clone())
            .with_handles(edge.source_handle.as_deref(), None);
        let downstream = Connection::new(node_id.clone(), edge.target.clone())
            .with_handles(None, edge.target_handle.as_deref());
        for connection in [upstream, downstream] {
            self.edges.push(Edge {
                id: connection.edge_id(),
                source: connection.source,
                target: connection.target,
                source_handle: connection.source_handle,
                target_handle: connection.target_handle,
                kind: self.edge_defaults.kind,
                animated: self.edge_defaults.animated,
            });
        }
        self.dirty.mark();

        tracing::debug!("➕ Inserted node '{}' ({}) on edge '{}'", node_id, kind, edge.id);
        Some(node_id)
    }

    /// Replace a node's configuration payload after validating it
    pub fn update_node_config(&mut self, id: &str, config: NodeConfig) -> Result<(), ValidationError> {
        let node = self.node_mut(id).ok_or_else(|| ValidationError::InvalidNode {
            node_id: id.to_string(),
            reason: "node does not exist".to_string(),
        })?;

        if node.config.type_name() != config.type_name() {
            return Err(ValidationError::KindMismatch {
                node_id: id.to_string(),
                expected: node.config.type_name().to_string(),
                actual: config.type_name().to_string(),
            });
        }
        config.validate(id)?;

        node.config = config;
        self.dirty.mark();
        Ok(())
    }

    /// Select a node (clearing any edge selection); `None` clears everything
    ///
    /// Returns `false` when the id is unknown, leaving the selection unchanged.
    pub fn select_node(&mut self, id: Option<&str>) -> bool {
        match id {
            None => {
                self.selection = Selection::None;
                true
            }
            Some(id) if self.node(id).is_some() => {
                self.selection = Selection::Node(id.to_string());
                true
            }
            Some(_) => false,
        }
    }

    /// Select an edge (clearing any node selection); `None` clears everything
    pub fn select_edge(&mut self, id: Option<&str>) -> bool {
        match id {
            None => {
                self.selection = Selection::None;
                true
            }
            Some(id) if self.edge(id).is_some() => {
                self.selection = Selection::Edge(id.to_string());
                true
            }
            Some(_) => false,
        }
    }

    pub fn clear_selection(&mut self) {
        self.selection = Selection::None;
    }

    /// Remove whatever is selected; a node takes its edges with it
    ///
    /// Returns `false` and changes nothing when the selection is empty.
    pub fn delete_selected(&mut self) -> bool {
        let removed = match std::mem::take(&mut self.selection) {
            Selection::None => false,
            Selection::Node(id) => self.remove_node(&id),
            Selection::Edge(id) => self.remove_edge(&id),
        };

        if removed {
            self.dirty.mark();
        }
        removed
    }

    /// Replace the whole graph with a freshly loaded document
    ///
    /// Edges are re-tagged with the editor's edge defaults, edges whose endpoints are
    /// missing are dropped, the id allocator is reseeded and the model comes out clean.
    pub fn set_workflow(&mut self, document: &WorkflowDocument) {
        self.name = document.name.clone();
        self.description = document.description.clone();
        self.nodes = document.nodes.clone();

        let nodes = &self.nodes;
        let defaults = self.edge_defaults;
        self.edges = document
            .edges
            .iter()
            .filter(|edge| {
                let known = nodes.iter().any(|n| n.id == edge.source)
                    && nodes.iter().any(|n| n.id == edge.target);
                if !known {
                    tracing::warn!("⚠️ Dropping edge '{}' with a missing endpoint", edge.id);
                }
                known
            })
            .map(|edge| Edge {
                kind: defaults.kind,
                animated: defaults.animated,
                ..edge.clone()
            })
            .collect();

        self.selection = Selection::None;
        self.ids.reseed(self.nodes.iter().map(|node| node.id.as_str()));
        self.dirty.reset();

        tracing::debug!(
            "📥 Loaded graph '{}' with {} nodes and {} edges (next suffix {:?})",
            self.name,
            self.nodes.len(),
            self.edges.len(),
            self.ids.peek()
        );
    }

    /// Return to the empty initial state
    pub fn reset(&mut self) {
        self.name = DEFAULT_WORKFLOW_NAME.to_string();
        self.description = None;
        self.nodes.clear();
        self.edges.clear();
        self.selection = Selection::None;
        self.ids = IdAllocator::new();
        self.dirty.reset();
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
        self.dirty.mark();
    }

    pub fn set_description(&mut self, description: Option<String>) {
        self.description = description;
        self.dirty.mark();
    }

    /// Capture the current revision before persisting
    pub fn checkpoint(&self) -> SaveCheckpoint {
        self.dirty.checkpoint()
    }

    /// Identifies the currently loaded document; changes on load and reset
    pub fn epoch(&self) -> u64 {
        self.dirty.epoch()
    }

    /// Record that the snapshot taken at `checkpoint` was persisted
    pub fn acknowledge(&mut self, checkpoint: SaveCheckpoint) -> bool {
        self.dirty.acknowledge(checkpoint)
    }

    pub fn mark_saved(&mut self) {
        self.dirty.mark_saved();
    }

    /// Snapshot of the persisted fields in `update` shape
    pub fn to_update(&self) -> UpdateWorkflow {
        UpdateWorkflow {
            name: self.name.clone(),
            description: self.description.clone(),
            nodes: self.nodes.clone(),
            edges: self.edges.clone(),
        }
    }

    fn node_mut(&mut self, id: &str) -> Option<&mut Node> {
        self.nodes.iter_mut().find(|node| node.id == id)
    }

    fn remove_node(&mut self, id: &str) -> bool {
        let before = self.nodes.len();
        self.nodes.retain(|node| node.id != id);
        if self.nodes.len() == before {
            return false;
        }

        let selection = &mut self.selection;
        self.edges.retain(|edge| {
            let keep = !edge.touches(id);
            if !keep && *selection == Selection::Edge(edge.id.clone()) {
                *selection = Selection::None;
            }
            keep
        });
        if self.selection == Selection::Node(id.to_string()) {
            self.selection = Selection::None;
        }
        true
    }

    fn remove_edge(&mut self, id: &str) -> bool {
        let before = self.edges.len();
        self.edges.retain(|edge| edge.id != id);
        if self.selection == Selection::Edge(id.to_string()) {
            self.selection = Selection::None;
        }
        self.edges.len() != before
    }
}
