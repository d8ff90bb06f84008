/// Petgraph-based dry-run engine
///
/// Converts a stored workflow into a directed graph and walks it in topological
/// order, emitting one log entry per node describing what the step would do. No
/// orders are placed: the real trading engine is a separate service.

use crate::workflow::{
    catalog::NodeConfig,
    types::{Edge, ExecutionReport, LogEntry, LogLevel, Node, RunOutcome, WorkflowDocument},
};
use anyhow::Result;
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::HashMap;

/// Dry-run execution engine
#[derive(Debug, Default, Clone)]
pub struct ExecutionEngine;

/// Internal representation of a workflow as a petgraph graph
#[derive(Debug)]
struct WorkflowGraph<'a> {
    graph: DiGraph<&'a Node, ()>,
}

impl ExecutionEngine {
    pub fn new() -> Self {
        Self
    }

    /// Run a workflow once and report the outcome
    ///
    /// Never fails: structural problems become a `failure` report with an error entry.
    pub fn execute(&self, workflow: &WorkflowDocument) -> ExecutionReport {
        let workflow_start_time = std::time::Instant::now();
        tracing::info!("🚀 Starting dry run of workflow '{}'", workflow.name);

        let mut logs = vec![LogEntry::now(
            LogLevel::Info,
            format!("Starting workflow '{}'", workflow.name),
        )];

        if workflow.nodes.is_empty() {
            logs.push(LogEntry::now(LogLevel::Warn, "Workflow has no nodes"));
            return failure(logs, "Workflow has no nodes to execute");
        }

        let graph = match self.build_workflow_graph(&workflow.nodes, &workflow.edges) {
            Ok(graph) => graph,
            Err(e) => {
                let message = e.to_string();
                logs.push(LogEntry::now(LogLevel::Error, message.clone()));
                return failure(logs, message);
            }
        };

        tracing::debug!("🔄 Computing topological execution order");
        let order = match toposort(&graph.graph, None) {
            Ok(order) => order,
            Err(cycle) => {
                let node = graph.graph[cycle.node_id()];
                let message = format!("Workflow contains a cycle through node '{}'", node.id);
                tracing::error!("❌ {}", message);
                logs.push(LogEntry::now(LogLevel::Error, message.clone()));
                return failure(logs, message);
            }
        };

        for (step, &index) in order.iter().enumerate() {
            let node = graph.graph[index];
            tracing::debug!("📍 Step {}/{}: '{}' ({})", step + 1, order.len(), node.id, node.config.type_name());
            logs.push(LogEntry::now(
                LogLevel::Info,
                format!("[{}] {}", node.id, describe(&node.config)),
            ));
        }

        let message = format!("Dry run completed: {} steps", order.len());
        logs.push(LogEntry::now(LogLevel::Info, message.clone()));
        tracing::info!(
            "🎉 Workflow '{}' dry run completed in {:?}",
            workflow.name,
            workflow_start_time.elapsed()
        );

        ExecutionReport {
            status: RunOutcome::Success,
            message,
            logs,
        }
    }

    /// Build a petgraph DiGraph from the workflow's nodes and edges
    fn build_workflow_graph<'a>(
        &self,
        nodes: &'a [Node],
        edges: &'a [Edge],
    ) -> Result<WorkflowGraph<'a>> {
        let mut graph = DiGraph::new();
        let mut node_id_to_index: HashMap<&str, NodeIndex> = HashMap::new();

        for node in nodes {
            let index = graph.add_node(node);
            node_id_to_index.insert(node.id.as_str(), index);
        }

        for edge in edges {
            let from = node_id_to_index
                .get(edge.source.as_str())
                .ok_or_else(|| anyhow::anyhow!("Edge '{}' references unknown node: {}", edge.id, edge.source))?;
            let to = node_id_to_index
                .get(edge.target.as_str())
                .ok_or_else(|| anyhow::anyhow!("Edge '{}' references unknown node: {}", edge.id, edge.target))?;
            graph.add_edge(*from, *to, ());
        }

        tracing::debug!("🏗️ Built graph with {} nodes and {} edges", nodes.len(), edges.len());
        Ok(WorkflowGraph { graph })
    }
}

fn failure(logs: Vec<LogEntry>, message: impl Into<String>) -> ExecutionReport {
    ExecutionReport {
        status: RunOutcome::Failure,
        message: message.into(),
        logs,
    }
}

/// What a node would do, in one line
fn describe(config: &NodeConfig) -> String {
    match config {
        NodeConfig::Start(c) => format!("Start: {}", c.label),
        NodeConfig::TimeTrigger(c) => format!(
            "Time trigger at {}{}",
            c.time,
            if c.weekdays_only { " on weekdays" } else { "" }
        ),
        NodeConfig::PriceAlert(c) => format!(
            "Price alert: {} ({:?}) {:?} {}",
            c.symbol, c.exchange, c.comparison, c.price
        ),
        NodeConfig::PriceCondition(c) => format!(
            "Price condition: {} ({:?}) {:?} {}",
            c.symbol, c.exchange, c.comparison, c.value
        ),
        NodeConfig::TimeWindow(c) => format!("Time window {}-{}", c.start, c.end),
        NodeConfig::PlaceOrder(c) => format!(
            "Would place {:?} {} x {} ({:?}, {}, {:?})",
            c.action,
            c.symbol,
            c.quantity,
            c.exchange,
            c.price_type.as_str(),
            c.product
        ),
        NodeConfig::CancelAllOrders(_) => "Would cancel all open orders".to_string(),
        NodeConfig::ClosePositions(_) => "Would close all open positions".to_string(),
        NodeConfig::Delay(c) => format!("Delay {}s (skipped in dry run)", c.seconds),
        NodeConfig::Notify(c) => format!("Notify: {}", c.message),
        NodeConfig::Unknown { kind, .. } => format!("Unrecognised node type '{kind}' (skipped)"),
    }
}
