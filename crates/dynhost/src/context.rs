use dyncore::{ContextAccessor, ParameterAccessor, ParentExecution};
use serde_json::{Map, Value};
use std::collections::HashMap;
use uuid::Uuid;

/// Parent context with fixed identifiers for every item
#[derive(Debug, Clone)]
pub struct StaticContext {
    parent: ParentExecution,
}

impl StaticContext {
    pub fn new(execution_id: impl Into<String>, workflow_id: impl Into<String>) -> Self {
        Self {
            parent: ParentExecution {
                execution_id: execution_id.into(),
                workflow_id: workflow_id.into(),
            },
        }
    }

    /// Fresh random identifiers, for standalone runs without a parent
    pub fn generated() -> Self {
        Self::new(Uuid::new_v4().to_string(), Uuid::new_v4().to_string())
    }
}

impl ContextAccessor for StaticContext {
    fn proxy_for(&self, _item_index: usize) -> ParentExecution {
        self.parent.clone()
    }
}

/// Node parameters held in memory; the same value applies to every item
#[derive(Debug, Clone, Default)]
pub struct MapParameters {
    values: HashMap<String, Value>,
}

impl MapParameters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }
}

impl From<Map<String, Value>> for MapParameters {
    fn from(map: Map<String, Value>) -> Self {
        Self {
            values: map.into_iter().collect(),
        }
    }
}

impl ParameterAccessor for MapParameters {
    fn get_parameter(&self, name: &str, _item_index: usize) -> Option<Value> {
        self.values.get(name).cloned()
    }
}
