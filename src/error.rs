/// Error taxonomy for the editor core
///
/// Validation failures are raised locally and never reach the gateway. Gateway
/// failures are folded into [`EditorError`] so callers handle one type.

use crate::gateway::GatewayError;
use std::fmt;
use thiserror::Error;

/// Locally detected problem with user input or an imported document
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("invalid JSON: {0}")]
    MalformedJson(String),

    #[error("workflow document must be a JSON object")]
    NotAnObject,

    #[error("workflow name is required")]
    EmptyName,

    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("field '{field}' must be {expected}")]
    WrongType {
        field: &'static str,
        expected: &'static str,
    },

    #[error("node {node_id}: {reason}")]
    InvalidNode { node_id: String, reason: String },

    #[error("edge {edge_id}: {reason}")]
    InvalidEdge { edge_id: String, reason: String },

    #[error("rejected by workflow service: {0}")]
    Rejected(String),

    #[error("node {node_id} is a {actual} node, not {expected}")]
    KindMismatch {
        node_id: String,
        expected: String,
        actual: String,
    },
}

/// Controller operation that guards against duplicate submissions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Load,
    Save,
    Activate,
    Deactivate,
    Execute,
    Export,
    Import,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Load => "load",
            Operation::Save => "save",
            Operation::Activate => "activate",
            Operation::Deactivate => "deactivate",
            Operation::Execute => "execute",
            Operation::Export => "export",
            Operation::Import => "import",
        };
        f.write_str(name)
    }
}

/// Failure of an editor or dashboard operation
///
/// None of these are fatal: the editor stays usable after every variant.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EditorError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("workflow not found")]
    NotFound,

    #[error("request failed: {0}")]
    Transport(String),

    #[error("{0} already in progress")]
    InFlight(Operation),

    #[error("no persisted workflow is loaded")]
    NotLoaded,
}

impl From<GatewayError> for EditorError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::NotFound => EditorError::NotFound,
            GatewayError::Validation(message) => {
                EditorError::Validation(ValidationError::Rejected(message))
            }
            GatewayError::Transport(message) => EditorError::Transport(message),
        }
    }
}
