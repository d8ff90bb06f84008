/// Tradeflow: visual editor core for trading-automation workflows
///
/// This library provides the workflow graph model and its lifecycle against a remote
/// workflow service, plus a small reference implementation of that service.

// Core configuration and setup
pub mod config;

// Error taxonomy shared by the editor and the gateway
pub mod error;

// Workflow documents, node catalog and SQLite storage
pub mod workflow;

// Graph model, dirty tracking and the lifecycle controller
pub mod editor;

// Persistence gateway contract, HTTP client and cache
pub mod gateway;

// Dry-run execution engine - petgraph ordering of workflow steps
pub mod runtime;

// HTTP API layer - REST endpoints of the reference workflow service
pub mod api;

// Server setup and initialization
pub mod server;

// Re-export commonly used types for external consumers
pub use editor::{Dashboard, EditorController, GraphModel};
pub use error::{EditorError, ValidationError};
pub use gateway::{GatewayError, HttpGateway, WorkflowCache, WorkflowGateway};
pub use server::start_server;
pub use workflow::{Edge, Node, NodeKind, WorkflowDocument};
