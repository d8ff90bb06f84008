/// Local validation of pasted or uploaded workflow documents
///
/// Structural checks (JSON, a non-empty name, `nodes` and `edges` arrays) run first
/// and short-circuit before any network call. Nodes are then parsed into the typed
/// catalog and their payloads validated; node types the catalog does not know are
/// passed through for the service to judge.

use crate::{
    error::ValidationError,
    workflow::types::{Edge, Node, PortableWorkflow},
};
use serde_json::{Map, Value};

/// Parse and validate an import document
pub fn parse_import(text: &str) -> Result<PortableWorkflow, ValidationError> {
    let value: Value =
        serde_json::from_str(text).map_err(|e| ValidationError::MalformedJson(e.to_string()))?;
    let object = value.as_object().ok_or(ValidationError::NotAnObject)?;

    let name = match object.get("name") {
        None | Some(Value::Null) => return Err(ValidationError::MissingField("name")),
        Some(Value::String(name)) => name.trim(),
        Some(_) => {
            return Err(ValidationError::WrongType {
                field: "name",
                expected: "a string",
            })
        }
    };
    if name.is_empty() {
        return Err(ValidationError::EmptyName);
    }

    let raw_nodes = required_array(object, "nodes")?;
    let raw_edges = required_array(object, "edges")?;

    let description = object
        .get("description")
        .and_then(Value::as_str)
        .map(str::to_string)
        .filter(|d| !d.trim().is_empty());

    let nodes = raw_nodes
        .iter()
        .enumerate()
        .map(|(index, raw)| parse_node(index, raw))
        .collect::<Result<Vec<_>, _>>()?;

    let edges = raw_edges
        .iter()
        .enumerate()
        .map(|(index, raw)| {
            serde_json::from_value::<Edge>(raw.clone()).map_err(|e| ValidationError::InvalidEdge {
                edge_id: label(raw, index),
                reason: e.to_string(),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(PortableWorkflow {
        name: name.to_string(),
        description,
        nodes,
        edges,
    })
}

fn required_array<'a>(
    object: &'a Map<String, Value>,
    field: &'static str,
) -> Result<&'a Vec<Value>, ValidationError> {
    match object.get(field) {
        None | Some(Value::Null) => Err(ValidationError::MissingField(field)),
        Some(Value::Array(items)) => Ok(items),
        Some(_) => Err(ValidationError::WrongType {
            field,
            expected: "an array",
        }),
    }
}

fn parse_node(index: usize, raw: &Value) -> Result<Node, ValidationError> {
    let node: Node = serde_json::from_value(raw.clone()).map_err(|e| ValidationError::InvalidNode {
        node_id: label(raw, index),
        reason: e.to_string(),
    })?;
    node.config.validate(&node.id)?;
    Ok(node)
}

/// `id` of a raw element, or its position when it has none
fn label(raw: &Value, index: usize) -> String {
    raw.get("id")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| format!("#{index}"))
}
