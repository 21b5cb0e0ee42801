use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Fields that only exist in exported workflows and must never be embedded
/// into a synthesized document.
pub const EXPORT_ONLY_FIELDS: [&str; 3] = ["connections", "pinData", "meta"];

/// User-supplied node JSON, either still as text or already parsed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum RawInput {
    Text(String),
    Value(Value),
}

impl From<&str> for RawInput {
    fn from(text: &str) -> Self {
        RawInput::Text(text.to_string())
    }
}

impl From<String> for RawInput {
    fn from(text: String) -> Self {
        RawInput::Text(text)
    }
}

impl From<Value> for RawInput {
    fn from(value: Value) -> Self {
        match value {
            Value::String(text) => RawInput::Text(text),
            other => RawInput::Value(other),
        }
    }
}

impl Default for RawInput {
    fn default() -> Self {
        RawInput::Value(Value::Object(Map::new()))
    }
}

/// Canvas position, serialized as `[x, y]`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Position(pub f64, pub f64);

impl Position {
    /// Accepts exactly two numeric components.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value.as_array()?.as_slice() {
            [x, y] => Some(Position(x.as_f64()?, y.as_f64()?)),
            _ => None,
        }
    }
}

/// A single node as it appears in a workflow document.
///
/// Only `name`, `parameters`, `id` and `position` are interpreted; every
/// other field (`type`, `typeVersion`, `credentials`, ...) is carried
/// through untouched in `extra`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NodeDefinition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    pub name: String,

    #[serde(default)]
    pub parameters: Map<String, Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl NodeDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            parameters: Map::new(),
            position: None,
            extra: Map::new(),
        }
    }

    pub fn with_parameter(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }

    pub fn node_type(&self) -> Option<&str> {
        self.extra.get("type").and_then(Value::as_str)
    }
}
