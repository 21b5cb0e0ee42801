use chrono::Utc;
use dyncore::{
    ContextAccessor, EngineError, EventEmitter, ExecuteOptions, ExecutionEngine, ExecutionEvent,
    ExecutionOutcome, Item, WorkflowDocument,
};
use std::sync::Arc;
use std::time::Instant;

/// Hands assembled documents to the execution engine
pub struct Dispatcher {
    engine: Arc<dyn ExecutionEngine>,
    context: Arc<dyn ContextAccessor>,
}

impl Dispatcher {
    pub fn new(engine: Arc<dyn ExecutionEngine>, context: Arc<dyn ContextAccessor>) -> Self {
        Self { engine, context }
    }

    /// Run one sub-execution.
    ///
    /// `item_index` is the parent item the sub-execution belongs to, or
    /// `None` for a batch dispatch. With `wait == false` the engine is only
    /// asked to schedule the run and the outcome is
    /// [`ExecutionOutcome::NotCollected`].
    pub async fn dispatch(
        &self,
        document: &WorkflowDocument,
        items: Vec<Item>,
        item_index: Option<usize>,
        wait: bool,
        emitter: &EventEmitter,
    ) -> Result<ExecutionOutcome, EngineError> {
        let invocation_id = emitter.invocation_id();
        let options = ExecuteOptions {
            parent_execution: self.context.proxy_for(item_index.unwrap_or(0)),
            do_not_wait_to_finish: !wait,
        };

        emitter.emit(ExecutionEvent::SubExecutionStarted {
            invocation_id,
            item_index,
            entry_node: document.entry_target().unwrap_or_default().to_string(),
            item_count: items.len(),
            timestamp: Utc::now(),
        });

        tracing::debug!(
            "Dispatching sub-execution (item {:?}, {} item(s), wait: {})",
            item_index,
            items.len(),
            wait
        );

        let start = Instant::now();
        let raw = match self.engine.execute_workflow(document, items, options).await {
            Ok(raw) => raw,
            Err(e) => {
                tracing::error!("Sub-execution for item {:?} failed: {}", item_index, e);
                emitter.emit(ExecutionEvent::SubExecutionFailed {
                    invocation_id,
                    item_index,
                    error: e.to_string(),
                    timestamp: Utc::now(),
                });
                return Err(e);
            }
        };

        if !wait {
            emitter.emit(ExecutionEvent::SubExecutionScheduled {
                invocation_id,
                item_index,
                timestamp: Utc::now(),
            });
            return Ok(ExecutionOutcome::NotCollected);
        }

        let duration_ms = start.elapsed().as_millis() as u64;
        tracing::debug!("Sub-execution for item {:?} finished in {}ms", item_index, duration_ms);

        emitter.emit(ExecutionEvent::SubExecutionCompleted {
            invocation_id,
            item_index,
            duration_ms,
            timestamp: Utc::now(),
        });

        Ok(ExecutionOutcome::classify(raw))
    }
}
