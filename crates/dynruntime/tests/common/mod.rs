// Shared test doubles for the runtime tests.
#![allow(dead_code)]

use async_trait::async_trait;
use dyncore::{
    ContextAccessor, DiagnosticSink, EngineError, ExecuteOptions, ExecutionEngine,
    ExpressionError, ExpressionEvaluator, Item, ParentExecution, WorkflowDocument,
};
use serde_json::{json, Map, Value};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Initialize tracing for tests
pub fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};
    let _ = fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
        )
        .with_test_writer()
        .try_init();
}

pub fn item(json: Value) -> Item {
    Item::from_json(json)
}

/// Collects every diagnostic it receives
#[derive(Default)]
pub struct RecordingSink {
    messages: Mutex<Vec<String>>,
}

impl RecordingSink {
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }

    pub fn count(&self) -> usize {
        self.messages.lock().unwrap().len()
    }
}

impl DiagnosticSink for RecordingSink {
    fn warn(&self, message: &str) {
        self.messages.lock().unwrap().push(message.to_string());
    }
}

/// One recorded engine call
#[derive(Debug, Clone)]
pub struct EngineCall {
    pub document: WorkflowDocument,
    pub items: Vec<Item>,
    pub options: ExecuteOptions,
}

/// What the engine answers to one call
pub enum Response {
    /// Echo the items back on port 0
    Echo,
    Raw(Option<Value>),
    Fail(String),
}

/// Engine double that records calls and replays scripted responses.
/// Once the script is exhausted every call is echoed.
#[derive(Default)]
pub struct RecordingEngine {
    calls: Mutex<Vec<EngineCall>>,
    script: Mutex<VecDeque<Response>>,
}

impl RecordingEngine {
    pub fn scripted(responses: Vec<Response>) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            script: Mutex::new(responses.into()),
        }
    }

    pub fn calls(&self) -> Vec<EngineCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ExecutionEngine for RecordingEngine {
    async fn execute_workflow(
        &self,
        document: &WorkflowDocument,
        items: Vec<Item>,
        options: ExecuteOptions,
    ) -> Result<Option<Value>, EngineError> {
        self.calls.lock().unwrap().push(EngineCall {
            document: document.clone(),
            items: items.clone(),
            options,
        });

        let response = self.script.lock().unwrap().pop_front().unwrap_or(Response::Echo);
        match response {
            Response::Echo => Ok(Some(json!([serde_json::to_value(&items).unwrap()]))),
            Response::Raw(value) => Ok(value),
            Response::Fail(message) => Err(EngineError::ExecutionFailed(message)),
        }
    }
}

/// Resolves `{{$json.key}}` (single level); anything mentioning `boom` fails
pub struct KeyEvaluator;

impl ExpressionEvaluator for KeyEvaluator {
    fn evaluate(
        &self,
        expression: &str,
        item: &Item,
        _item_index: usize,
    ) -> Result<Value, ExpressionError> {
        if expression.contains("boom") {
            return Err(ExpressionError::Invalid {
                expression: expression.to_string(),
                reason: "boom".to_string(),
            });
        }

        let key = expression
            .trim_start_matches('=')
            .trim()
            .trim_start_matches("{{")
            .trim_end_matches("}}")
            .trim()
            .trim_start_matches("$json.");

        item.json
            .get(key)
            .cloned()
            .ok_or_else(|| ExpressionError::Unresolved(expression.to_string()))
    }
}

pub struct FixedContext;

impl ContextAccessor for FixedContext {
    fn proxy_for(&self, _item_index: usize) -> ParentExecution {
        ParentExecution {
            execution_id: "exec-1".to_string(),
            workflow_id: "wf-1".to_string(),
        }
    }
}

pub fn context() -> Arc<FixedContext> {
    Arc::new(FixedContext)
}

pub fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => panic!("expected an object"),
    }
}
