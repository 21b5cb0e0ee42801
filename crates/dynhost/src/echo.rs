use async_trait::async_trait;
use dyncore::{EngineError, ExecuteOptions, ExecutionEngine, Item, WorkflowDocument};
use serde_json::Value;

/// Engine stand-in that returns its input items on port 0
///
/// Useful for dry runs: the document is checked for an entry connection
/// but never executed. Fire-and-forget calls return nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct EchoEngine;

#[async_trait]
impl ExecutionEngine for EchoEngine {
    async fn execute_workflow(
        &self,
        document: &WorkflowDocument,
        items: Vec<Item>,
        options: ExecuteOptions,
    ) -> Result<Option<Value>, EngineError> {
        let entry = document.entry_target().ok_or_else(|| {
            EngineError::ExecutionFailed("workflow has no entry connection".to_string())
        })?;

        tracing::debug!(
            "Echoing {} item(s) through '{}' (parent execution {})",
            items.len(),
            entry,
            options.parent_execution.execution_id
        );

        if options.do_not_wait_to_finish {
            return Ok(None);
        }

        let port = serde_json::to_value(items)
            .map_err(|e| EngineError::ExecutionFailed(format!("Cannot serialize items: {}", e)))?;
        Ok(Some(Value::Array(vec![port])))
    }
}
