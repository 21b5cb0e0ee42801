use serde_json::Value;
use std::fmt;

/// Everything an execution engine may hand back, classified.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionOutcome {
    /// `[[...], [...]]`: one list of result entries per output port. A port
    /// that produced nothing may be `null`.
    Ports(Vec<Value>),
    /// `{ data: ... }`, with `data` not yet inspected.
    Wrapped(Value),
    /// `null` or no value at all.
    Absent,
    /// Any other shape.
    Other(Value),
    /// Fire-and-forget dispatch; nothing was collected.
    NotCollected,
}

impl ExecutionOutcome {
    /// Classify a raw engine response. `None` stands for "undefined".
    pub fn classify(raw: Option<Value>) -> Self {
        match raw {
            None | Some(Value::Null) => ExecutionOutcome::Absent,
            Some(Value::Array(ports)) if is_port_list(&ports) => ExecutionOutcome::Ports(ports),
            Some(Value::Object(mut map)) if map.contains_key("data") => {
                ExecutionOutcome::Wrapped(map.remove("data").unwrap_or(Value::Null))
            }
            Some(other) => ExecutionOutcome::Other(other),
        }
    }

    pub fn shape(&self) -> OutcomeShape<'_> {
        OutcomeShape(self)
    }
}

/// True when every element is a port: a list of entries or `null`.
pub fn is_port_list(ports: &[Value]) -> bool {
    ports.iter().all(|port| port.is_array() || port.is_null())
}

/// Short human description of an outcome's shape, for diagnostics.
pub struct OutcomeShape<'a>(&'a ExecutionOutcome);

impl fmt::Display for OutcomeShape<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            ExecutionOutcome::Ports(ports) => write!(f, "{} output port(s)", ports.len()),
            ExecutionOutcome::Wrapped(data) => write!(f, "wrapped object with {} data", kind(data)),
            ExecutionOutcome::Absent => write!(f, "no result"),
            ExecutionOutcome::Other(value) => write!(f, "unexpected {}", kind(value)),
            ExecutionOutcome::NotCollected => write!(f, "not collected"),
        }
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
