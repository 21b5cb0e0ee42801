use dyncore::{
    ConnectionGraph, DynamicError, NodeDefinition, Position, RawInput, EXPORT_ONLY_FIELDS,
};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Suffix appended to every injected node's name.
pub const NAME_SUFFIX: &str = " - Dynamic Node";

/// Where injected nodes land when the input has no usable position.
const DEFAULT_X: f64 = 450.0;
const DEFAULT_Y: f64 = 300.0;
const COLUMN_WIDTH: f64 = 220.0;

/// How many definitions to take from a full workflow export.
///
/// The mode also picks the injected name: `Single` gives
/// `"<name> - Dynamic Node"`, `All` appends the 1-based export position as
/// `" [n]"`. Per-item execution does not change the name, so every per-item
/// document of a single definition carries the plain suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NormalizeMode {
    /// First node only; the export's connections are ignored.
    #[default]
    Single,
    /// Every node plus the export's connection graph.
    All,
}

/// Validated definitions ready for assembly.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedInput {
    pub definitions: Vec<NodeDefinition>,
    /// Connections between the definitions, still keyed by original names.
    pub graph: ConnectionGraph,
    /// Original name → injected name.
    pub renames: BTreeMap<String, String>,
}

impl NormalizedInput {
    pub fn first(&self) -> Option<&NodeDefinition> {
        self.definitions.first()
    }

    /// Copy with every definition transformed; graph and renames are kept.
    pub fn map_definitions<F>(&self, f: F) -> Self
    where
        F: FnMut(&NodeDefinition) -> NodeDefinition,
    {
        Self {
            definitions: self.definitions.iter().map(f).collect(),
            graph: self.graph.clone(),
            renames: self.renames.clone(),
        }
    }
}

/// Parse and validate user-supplied node JSON.
///
/// Accepts either a single node definition or a full workflow export
/// (`{ nodes, connections }`). Each definition is stripped of export-only
/// fields, renamed with [`NAME_SUFFIX`], given a fresh id and a position.
pub fn normalize(raw: &RawInput, mode: NormalizeMode) -> Result<NormalizedInput, DynamicError> {
    let value = match raw {
        RawInput::Text(text) => serde_json::from_str::<Value>(text)
            .map_err(|_| DynamicError::InvalidInput("must be valid JSON".to_string()))?,
        RawInput::Value(value) => value.clone(),
    };

    let Value::Object(mut root) = value else {
        return Err(DynamicError::InvalidInput("must be an object".to_string()));
    };

    let (entries, graph) = match root.remove("nodes") {
        Some(Value::Array(nodes)) if !nodes.is_empty() => match mode {
            NormalizeMode::Single => (
                nodes.into_iter().take(1).collect(),
                ConnectionGraph::new(),
            ),
            NormalizeMode::All => (nodes, parse_graph(root.remove("connections"))?),
        },
        other => {
            // Not an export, so `nodes` is just another field of the definition.
            if let Some(nodes) = other {
                root.insert("nodes".to_string(), nodes);
            }
            (vec![Value::Object(root)], ConnectionGraph::new())
        }
    };

    let mut definitions = Vec::with_capacity(entries.len());
    let mut renames = BTreeMap::new();

    for (ordinal, entry) in entries.into_iter().enumerate() {
        let Value::Object(fields) = entry else {
            return Err(DynamicError::InvalidInput(format!(
                "node #{} must be an object",
                ordinal + 1
            )));
        };

        let (original, definition) = normalize_definition(fields, ordinal, mode)?;
        renames.entry(original).or_insert_with(|| definition.name.clone());
        definitions.push(definition);
    }

    Ok(NormalizedInput {
        definitions,
        graph,
        renames,
    })
}

/// Single-definition convenience wrapper around [`normalize`].
pub fn normalize_single(raw: &RawInput) -> Result<NodeDefinition, DynamicError> {
    normalize(raw, NormalizeMode::Single)?
        .definitions
        .into_iter()
        .next()
        .ok_or_else(|| DynamicError::MissingField("name".to_string()))
}

fn normalize_definition(
    mut fields: Map<String, Value>,
    ordinal: usize,
    mode: NormalizeMode,
) -> Result<(String, NodeDefinition), DynamicError> {
    for field in EXPORT_ONLY_FIELDS {
        fields.remove(field);
    }

    let original = match fields.remove("name") {
        Some(Value::String(name)) if !name.trim().is_empty() => name,
        _ => return Err(DynamicError::MissingField("name".to_string())),
    };

    let parameters = match fields.remove("parameters") {
        None | Some(Value::Null) => Map::new(),
        Some(Value::Object(parameters)) => parameters,
        Some(_) => {
            return Err(DynamicError::InvalidInput(
                "`parameters` must be an object".to_string(),
            ))
        }
    };

    let position = fields
        .remove("position")
        .and_then(|p| Position::from_value(&p))
        .unwrap_or_else(|| default_position(ordinal));

    fields.remove("id");

    let name = match mode {
        NormalizeMode::Single => format!("{}{}", original, NAME_SUFFIX),
        NormalizeMode::All => format!("{}{} [{}]", original, NAME_SUFFIX, ordinal + 1),
    };

    let definition = NodeDefinition {
        id: Some(Uuid::new_v4().to_string()),
        name,
        parameters,
        position: Some(position),
        extra: fields,
    };

    Ok((original, definition))
}

fn default_position(ordinal: usize) -> Position {
    Position(DEFAULT_X + COLUMN_WIDTH * ordinal as f64, DEFAULT_Y)
}

fn parse_graph(raw: Option<Value>) -> Result<ConnectionGraph, DynamicError> {
    let mut raw = match raw {
        None | Some(Value::Null) => return Ok(ConnectionGraph::new()),
        Some(raw) => raw,
    };

    // Exports may hold `null` where an output has no connections.
    if let Value::Object(sources) = &mut raw {
        for ports in sources.values_mut().filter_map(Value::as_object_mut) {
            for fan_outs in ports.values_mut().filter_map(Value::as_array_mut) {
                for fan_out in fan_outs.iter_mut().filter(|f| f.is_null()) {
                    *fan_out = Value::Array(Vec::new());
                }
            }
        }
    }

    serde_json::from_value(raw)
        .map_err(|e| DynamicError::InvalidInput(format!("has invalid `connections`: {}", e)))
}
