use crate::assembler::assemble;
use crate::config::{BatchExpressions, DynamicNodeConfig};
use crate::dispatcher::Dispatcher;
use crate::normalizer::{normalize, NormalizedInput};
use crate::reducer::reduce;
use crate::substitution::substitute;
use chrono::Utc;
use dyncore::{
    ContextAccessor, DiagnosticSink, DynamicError, EventBus, EventEmitter, ExecutionEngine,
    ExecutionEvent, ExpressionEvaluator, InvocationId, Item, ResultCollection, TracingSink,
    WorkflowDocument, WorkflowSkeleton,
};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::broadcast;
use uuid::Uuid;

/// Runs arbitrary node JSON as a sub-workflow
///
/// Every invocation normalizes the configured node JSON, builds a fresh
/// document from the skeleton (once per item, or once for the batch),
/// dispatches it and reduces the engine's answer into one item list.
pub struct DynamicNode {
    skeleton: Arc<WorkflowSkeleton>,
    dispatcher: Dispatcher,
    evaluator: Arc<dyn ExpressionEvaluator>,
    sink: Arc<dyn DiagnosticSink>,
    event_bus: Arc<EventBus>,
}

impl DynamicNode {
    /// Create a node around the bundled skeleton
    pub fn new(
        engine: Arc<dyn ExecutionEngine>,
        evaluator: Arc<dyn ExpressionEvaluator>,
        context: Arc<dyn ContextAccessor>,
    ) -> Result<Self, DynamicError> {
        Ok(Self::with_skeleton(
            WorkflowSkeleton::builtin()?,
            engine,
            evaluator,
            context,
        ))
    }

    /// Create a node around a custom skeleton
    pub fn with_skeleton(
        skeleton: WorkflowSkeleton,
        engine: Arc<dyn ExecutionEngine>,
        evaluator: Arc<dyn ExpressionEvaluator>,
        context: Arc<dyn ContextAccessor>,
    ) -> Self {
        Self {
            skeleton: Arc::new(skeleton),
            dispatcher: Dispatcher::new(engine, context),
            evaluator,
            sink: Arc::new(TracingSink),
            event_bus: Arc::new(EventBus::default()),
        }
    }

    /// Route diagnostics to `sink` instead of the log
    pub fn with_diagnostics(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Subscribe to execution events
    pub fn subscribe_events(&self) -> broadcast::Receiver<ExecutionEvent> {
        self.event_bus.subscribe()
    }

    /// Execute the configured node JSON over `items`
    ///
    /// Validation errors fail the whole invocation before anything is
    /// dispatched. In per-item mode a failing sub-execution only costs that
    /// item's results.
    pub async fn execute(
        &self,
        items: Vec<Item>,
        config: &DynamicNodeConfig,
    ) -> Result<ResultCollection, DynamicError> {
        let invocation_id = InvocationId::new_v4();
        let emitter = self.event_bus.create_emitter(invocation_id, self.sink.clone());
        let start_time = Instant::now();

        emitter.emit(ExecutionEvent::InvocationStarted {
            invocation_id,
            item_count: items.len(),
            per_item: config.execute_individually,
            timestamp: Utc::now(),
        });

        tracing::info!(
            "Starting dynamic node invocation {} over {} item(s)",
            invocation_id,
            items.len()
        );

        let result = self.run(items, config, &emitter).await;

        let duration_ms = start_time.elapsed().as_millis() as u64;
        let result_count = result.as_ref().map(Vec::len).unwrap_or(0);

        match &result {
            Ok(_) => tracing::info!(
                "Invocation {} produced {} item(s) in {}ms",
                invocation_id,
                result_count,
                duration_ms
            ),
            Err(e) => tracing::error!("Invocation {} failed: {}", invocation_id, e),
        }

        emitter.emit(ExecutionEvent::InvocationCompleted {
            invocation_id,
            success: result.is_ok(),
            result_count,
            duration_ms,
            timestamp: Utc::now(),
        });

        result
    }

    /// Build the documents `execute` would dispatch, without dispatching
    pub fn preview(
        &self,
        items: &[Item],
        config: &DynamicNodeConfig,
    ) -> Result<Vec<WorkflowDocument>, DynamicError> {
        let input = self.validate(items, config)?;
        let sink = self.sink.as_ref();

        if config.execute_individually {
            items
                .iter()
                .enumerate()
                .map(|(index, item)| {
                    let scoped = self.scope_to_item(&input, item, index, sink);
                    Ok(assemble(&self.skeleton, &scoped, sink)?)
                })
                .collect()
        } else {
            let input = self.scope_to_batch(input, items, config, sink);
            Ok(vec![assemble(&self.skeleton, &input, sink)?])
        }
    }

    async fn run(
        &self,
        items: Vec<Item>,
        config: &DynamicNodeConfig,
        emitter: &EventEmitter,
    ) -> Result<ResultCollection, DynamicError> {
        let input = self.validate(&items, config)?;

        if config.execute_individually {
            self.run_per_item(input, items, config, emitter).await
        } else {
            self.run_batch(input, items, config, emitter).await
        }
    }

    fn validate(
        &self,
        items: &[Item],
        config: &DynamicNodeConfig,
    ) -> Result<NormalizedInput, DynamicError> {
        let input = normalize(&config.node_json, config.normalize_mode())?;

        if config.require_single_item && items.len() != 1 {
            return Err(DynamicError::ItemCount {
                expected: 1,
                actual: items.len(),
            });
        }

        Ok(input)
    }

    async fn run_per_item(
        &self,
        input: NormalizedInput,
        items: Vec<Item>,
        config: &DynamicNodeConfig,
        emitter: &EventEmitter,
    ) -> Result<ResultCollection, DynamicError> {
        let wait = !config.do_not_wait_to_finish;
        let selection = config.port_selection();
        let mut results = Vec::new();

        for (index, item) in items.into_iter().enumerate() {
            let scoped = self.scope_to_item(&input, &item, index, emitter);
            let document = assemble(&self.skeleton, &scoped, emitter)?;

            match self
                .dispatcher
                .dispatch(&document, vec![item], Some(index), wait, emitter)
                .await
            {
                Ok(outcome) => results.extend(reduce(outcome, selection, emitter)),
                Err(e) => {
                    emitter.warn(&format!("Sub-execution for item {} failed: {}", index, e));
                }
            }
        }

        Ok(results)
    }

    async fn run_batch(
        &self,
        input: NormalizedInput,
        items: Vec<Item>,
        config: &DynamicNodeConfig,
        emitter: &EventEmitter,
    ) -> Result<ResultCollection, DynamicError> {
        let input = self.scope_to_batch(input, &items, config, emitter);
        let document = assemble(&self.skeleton, &input, emitter)?;

        let outcome = self
            .dispatcher
            .dispatch(&document, items, None, !config.do_not_wait_to_finish, emitter)
            .await?;

        Ok(reduce(outcome, config.port_selection(), emitter))
    }

    /// Definitions for one item's sub-execution, each with a fresh id.
    fn scope_to_item(
        &self,
        input: &NormalizedInput,
        item: &Item,
        index: usize,
        sink: &dyn DiagnosticSink,
    ) -> NormalizedInput {
        input.map_definitions(|definition| {
            let mut scoped = substitute(definition, item, index, self.evaluator.as_ref(), sink);
            scoped.id = Some(Uuid::new_v4().to_string());
            scoped
        })
    }

    fn scope_to_batch(
        &self,
        input: NormalizedInput,
        items: &[Item],
        config: &DynamicNodeConfig,
        sink: &dyn DiagnosticSink,
    ) -> NormalizedInput {
        match (config.batch_expressions, items.first()) {
            (BatchExpressions::FirstItem, Some(first)) => {
                self.scope_to_item(&input, first, 0, sink)
            }
            _ => input,
        }
    }
}
