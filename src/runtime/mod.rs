/// Runtime Execution Engine
///
/// Dry-run execution of stored workflows for the reference backend:
/// - Converting workflows to petgraph graphs
/// - Topological ordering with cycle detection
/// - One log entry per planned step

// Dry-run engine using petgraph for ordering
pub mod engine;

pub use engine::ExecutionEngine;
