use dyncore::{ExpressionError, ExpressionEvaluator, Item};
use minijinja::{Environment, ErrorKind, UndefinedBehavior};
use serde::Serialize;
use serde_json::{Map, Value};

/// Evaluator for `{{ $json... }}` and `{{ $itemIndex }}` templates
///
/// Block contents are compiled as minijinja expressions with `$json` and
/// `$itemIndex` in scope, so member access, indexing and operators all work.
/// A template that is exactly one `{{ ... }}` block resolves to the typed
/// value; mixed text is interpolated into a string. A leading `=` is ignored.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonPathEvaluator;

/// Variables visible inside a block
#[derive(Serialize)]
struct Scope<'a> {
    json: &'a Map<String, Value>,
    #[serde(rename = "itemIndex")]
    item_index: usize,
}

impl ExpressionEvaluator for JsonPathEvaluator {
    fn evaluate(
        &self,
        expression: &str,
        item: &Item,
        item_index: usize,
    ) -> Result<Value, ExpressionError> {
        let template = expression.strip_prefix('=').unwrap_or(expression);
        let scope = Scope {
            json: &item.json,
            item_index,
        };

        if let Some(inner) = template
            .trim()
            .strip_prefix("{{")
            .and_then(|s| s.strip_suffix("}}"))
        {
            if !inner.contains("{{") && !inner.contains("}}") {
                return eval_block(inner, &scope);
            }
        }

        let mut rendered = String::new();
        let mut rest = template;
        while let Some(open) = rest.find("{{") {
            rendered.push_str(&rest[..open]);
            let after = &rest[open + 2..];
            let close = after.find("}}").ok_or_else(|| ExpressionError::Invalid {
                expression: expression.to_string(),
                reason: "unclosed `{{`".to_string(),
            })?;

            match eval_block(&after[..close], &scope)? {
                Value::String(text) => rendered.push_str(&text),
                other => rendered.push_str(&other.to_string()),
            }
            rest = &after[close + 2..];
        }
        rendered.push_str(rest);

        Ok(Value::String(rendered))
    }
}

fn eval_block(block: &str, scope: &Scope<'_>) -> Result<Value, ExpressionError> {
    let block = block.trim();
    let source = block
        .replace("$json", "json")
        .replace("$itemIndex", "itemIndex");

    let mut env = Environment::new();
    env.set_undefined_behavior(UndefinedBehavior::Chainable);

    let invalid = |reason: String| ExpressionError::Invalid {
        expression: block.to_string(),
        reason,
    };
    let unresolved = || ExpressionError::Unresolved(block.to_string());

    let compiled = env
        .compile_expression(&source)
        .map_err(|e| invalid(e.to_string()))?;

    let value = compiled.eval(scope).map_err(|e| match e.kind() {
        ErrorKind::UndefinedError => unresolved(),
        _ => invalid(e.to_string()),
    })?;

    if value.is_undefined() {
        return Err(unresolved());
    }

    serde_json::to_value(&value).map_err(|e| invalid(e.to_string()))
}
