use dyncore::{DiagnosticSink, ExpressionEvaluator, Item, NodeDefinition};
use serde_json::Value;

/// Strings containing this are handed to the expression evaluator.
pub const EXPRESSION_MARKER: &str = "{{";

/// Field of a collection parameter that holds `{ name, value }` pairs.
const PAIR_LIST_FIELD: &str = "parameters";

pub fn is_expression(text: &str) -> bool {
    text.contains(EXPRESSION_MARKER)
}

/// Resolve expressions in a definition's parameters against one item.
///
/// Top-level string parameters are evaluated, as is every `value` in a
/// `{ "parameters": [{ "name", "value" }] }` collection. A failing
/// expression is reported and left as written; the rest still resolve.
pub fn substitute(
    definition: &NodeDefinition,
    item: &Item,
    item_index: usize,
    evaluator: &dyn ExpressionEvaluator,
    sink: &dyn DiagnosticSink,
) -> NodeDefinition {
    let mut working = definition.clone();

    for (key, value) in working.parameters.iter_mut() {
        let resolved = match value {
            Value::String(expression) if is_expression(expression) => {
                evaluate(key, expression, item, item_index, evaluator, sink)
            }
            Value::Object(_) => {
                substitute_pairs(key, value, item, item_index, evaluator, sink);
                None
            }
            _ => None,
        };

        if let Some(resolved) = resolved {
            *value = resolved;
        }
    }

    working
}

fn substitute_pairs(
    parameter: &str,
    value: &mut Value,
    item: &Item,
    item_index: usize,
    evaluator: &dyn ExpressionEvaluator,
    sink: &dyn DiagnosticSink,
) {
    let Some(pairs) = value.get_mut(PAIR_LIST_FIELD).and_then(Value::as_array_mut) else {
        return;
    };

    for pair in pairs.iter_mut().filter_map(Value::as_object_mut) {
        let resolved = match pair.get("value") {
            Some(Value::String(expression)) if is_expression(expression) => {
                let label = match pair.get("name").and_then(Value::as_str) {
                    Some(name) => format!("{}.{}", parameter, name),
                    None => parameter.to_string(),
                };
                evaluate(&label, expression, item, item_index, evaluator, sink)
            }
            _ => None,
        };

        if let Some(resolved) = resolved {
            pair.insert("value".to_string(), resolved);
        }
    }
}

fn evaluate(
    parameter: &str,
    expression: &str,
    item: &Item,
    item_index: usize,
    evaluator: &dyn ExpressionEvaluator,
    sink: &dyn DiagnosticSink,
) -> Option<Value> {
    match evaluator.evaluate(expression, item, item_index) {
        Ok(value) => Some(value),
        Err(e) => {
            sink.warn(&format!(
                "Could not evaluate parameter '{}' for item {}: {}",
                parameter, item_index, e
            ));
            None
        }
    }
}
