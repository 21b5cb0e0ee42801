use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One record flowing through the node: a JSON payload plus optional
/// binary attachments.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub json: Map<String, Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub binary: Option<Map<String, Value>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paired_item: Option<Value>,
}

impl Item {
    pub fn new(json: Map<String, Value>) -> Self {
        Self {
            json,
            binary: None,
            paired_item: None,
        }
    }

    /// Build an item from any JSON value. Objects become the payload as-is,
    /// anything else is stored under a `value` key.
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::Object(map) => Self::new(map),
            other => {
                let mut map = Map::new();
                map.insert("value".to_string(), other);
                Self::new(map)
            }
        }
    }

    /// Interpret one entry of an engine result port.
    ///
    /// Entries already in `{ json: {...} }` form deserialize directly; bare
    /// objects are wrapped. Non-objects yield `None`.
    pub fn from_result_entry(entry: Value) -> Option<Self> {
        let Value::Object(map) = entry else {
            return None;
        };
        if matches!(map.get("json"), Some(Value::Object(_))) {
            if let Ok(item) = serde_json::from_value::<Item>(Value::Object(map.clone())) {
                return Some(item);
            }
        }
        Some(Self::new(map))
    }
}

impl From<Map<String, Value>> for Item {
    fn from(json: Map<String, Value>) -> Self {
        Self::new(json)
    }
}

/// Ordered output of one invocation.
pub type ResultCollection = Vec<Item>;
