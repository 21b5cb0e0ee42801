use crate::{DynamicError, NodeDefinition};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Name of the skeleton's entry node.
pub const START_NODE: &str = "Start";

/// The only connection kind the skeleton wires.
pub const MAIN_CONNECTION: &str = "main";

const BUILTIN_SKELETON: &str = include_str!("../assets/sub_workflow_template.json");

/// One edge endpoint: `{ node, type, index }`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConnectionTarget {
    pub node: String,

    #[serde(rename = "type", default = "default_connection_type")]
    pub connection_type: String,

    #[serde(default)]
    pub index: u32,
}

impl ConnectionTarget {
    pub fn main(node: impl Into<String>) -> Self {
        Self {
            node: node.into(),
            connection_type: MAIN_CONNECTION.to_string(),
            index: 0,
        }
    }
}

fn default_connection_type() -> String {
    MAIN_CONNECTION.to_string()
}

/// Fan-out lists per output index.
pub type PortConnections = Vec<Vec<ConnectionTarget>>;

/// Source node name → output kind → fan-out lists.
pub type ConnectionGraph = BTreeMap<String, BTreeMap<String, PortConnections>>;

/// A complete workflow document as handed to the execution engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkflowDocument {
    #[serde(default)]
    pub nodes: Vec<NodeDefinition>,

    #[serde(default)]
    pub connections: ConnectionGraph,

    /// Skeleton-level fields such as `name` or `settings`.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl WorkflowDocument {
    pub fn find_node(&self, name: &str) -> Option<&NodeDefinition> {
        self.nodes.iter().find(|n| n.name == name)
    }

    pub fn node_names(&self) -> impl Iterator<Item = &str> {
        self.nodes.iter().map(|n| n.name.as_str())
    }

    /// Target of the `Start` node's first outbound connection, if any.
    pub fn entry_target(&self) -> Option<&str> {
        self.connections
            .get(START_NODE)?
            .get(MAIN_CONNECTION)?
            .first()?
            .first()
            .map(|t| t.node.as_str())
    }
}

/// The fixed minimal workflow every sub-execution is built from.
///
/// The skeleton is immutable; [`WorkflowSkeleton::instantiate`] hands out
/// deep copies for assembly.
#[derive(Debug, Clone)]
pub struct WorkflowSkeleton {
    document: WorkflowDocument,
}

impl WorkflowSkeleton {
    /// The bundled `Start`-only template.
    pub fn builtin() -> Result<Self, DynamicError> {
        Self::from_json_str(BUILTIN_SKELETON)
    }

    pub fn from_json_str(json: &str) -> Result<Self, DynamicError> {
        let value: Value = serde_json::from_str(json)
            .map_err(|e| DynamicError::Skeleton(format!("not valid JSON: {}", e)))?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self, DynamicError> {
        let document: WorkflowDocument = serde_json::from_value(value)
            .map_err(|e| DynamicError::Skeleton(e.to_string()))?;

        if document.find_node(START_NODE).is_none() {
            return Err(DynamicError::Skeleton(format!(
                "no `{}` node in template",
                START_NODE
            )));
        }

        Ok(Self { document })
    }

    pub fn document(&self) -> &WorkflowDocument {
        &self.document
    }

    /// Fresh copy of the template for one sub-execution.
    pub fn instantiate(&self) -> WorkflowDocument {
        self.document.clone()
    }
}
