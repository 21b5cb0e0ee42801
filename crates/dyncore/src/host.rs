//! Contracts for the host services the dynamic node depends on.
//!
//! None of these are implemented here. The runtime only ever talks to them
//! through these traits.

use crate::{EngineError, ExpressionError, Item, WorkflowDocument};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Reads configured node parameters.
pub trait ParameterAccessor: Send + Sync {
    fn get_parameter(&self, name: &str, item_index: usize) -> Option<Value>;
}

/// Resolves a template expression against one item.
pub trait ExpressionEvaluator: Send + Sync {
    fn evaluate(
        &self,
        expression: &str,
        item: &Item,
        item_index: usize,
    ) -> Result<Value, ExpressionError>;
}

/// Identifiers of the invocation that spawned a sub-execution.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ParentExecution {
    pub execution_id: String,
    pub workflow_id: String,
}

/// Gives access to the parent's `$execution` / `$workflow` context.
pub trait ContextAccessor: Send + Sync {
    fn proxy_for(&self, item_index: usize) -> ParentExecution;
}

/// Options forwarded with every sub-execution.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteOptions {
    pub parent_execution: ParentExecution,
    pub do_not_wait_to_finish: bool,
}

/// Runs a synthesized workflow document.
///
/// `Ok(None)` means the engine produced no value at all, which is distinct
/// from an explicit JSON `null`.
#[async_trait]
pub trait ExecutionEngine: Send + Sync {
    async fn execute_workflow(
        &self,
        document: &WorkflowDocument,
        items: Vec<Item>,
        options: ExecuteOptions,
    ) -> Result<Option<Value>, EngineError>;
}

/// Receives non-fatal diagnostics. Must never fail or block.
pub trait DiagnosticSink: Send + Sync {
    fn warn(&self, message: &str);
}

/// Sink that only writes to the `tracing` log.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn warn(&self, message: &str) {
        tracing::warn!("{}", message);
    }
}
