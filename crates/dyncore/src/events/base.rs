use crate::DiagnosticSink;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;
use uuid::Uuid;

pub type InvocationId = Uuid;

/// Events emitted while a dynamic node invocation runs
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum ExecutionEvent {
    InvocationStarted {
        invocation_id: InvocationId,
        item_count: usize,
        per_item: bool,
        timestamp: DateTime<Utc>,
    },
    InvocationCompleted {
        invocation_id: InvocationId,
        success: bool,
        result_count: usize,
        duration_ms: u64,
        timestamp: DateTime<Utc>,
    },
    SubExecutionStarted {
        invocation_id: InvocationId,
        /// `None` for a batch dispatch
        item_index: Option<usize>,
        entry_node: String,
        item_count: usize,
        timestamp: DateTime<Utc>,
    },
    SubExecutionCompleted {
        invocation_id: InvocationId,
        item_index: Option<usize>,
        duration_ms: u64,
        timestamp: DateTime<Utc>,
    },
    SubExecutionScheduled {
        invocation_id: InvocationId,
        item_index: Option<usize>,
        timestamp: DateTime<Utc>,
    },
    SubExecutionFailed {
        invocation_id: InvocationId,
        item_index: Option<usize>,
        error: String,
        timestamp: DateTime<Utc>,
    },
    Diagnostic {
        invocation_id: InvocationId,
        message: String,
        timestamp: DateTime<Utc>,
    },
}

impl ExecutionEvent {
    pub fn invocation_id(&self) -> InvocationId {
        match self {
            ExecutionEvent::InvocationStarted { invocation_id, .. }
            | ExecutionEvent::InvocationCompleted { invocation_id, .. }
            | ExecutionEvent::SubExecutionStarted { invocation_id, .. }
            | ExecutionEvent::SubExecutionCompleted { invocation_id, .. }
            | ExecutionEvent::SubExecutionScheduled { invocation_id, .. }
            | ExecutionEvent::SubExecutionFailed { invocation_id, .. }
            | ExecutionEvent::Diagnostic { invocation_id, .. } => *invocation_id,
        }
    }
}

/// Per-invocation handle for emitting events and diagnostics
#[derive(Clone)]
pub struct EventEmitter {
    invocation_id: InvocationId,
    sender: broadcast::Sender<ExecutionEvent>,
    sink: Arc<dyn DiagnosticSink>,
}

impl EventEmitter {
    pub fn new(
        invocation_id: InvocationId,
        sender: broadcast::Sender<ExecutionEvent>,
        sink: Arc<dyn DiagnosticSink>,
    ) -> Self {
        Self {
            invocation_id,
            sender,
            sink,
        }
    }

    pub fn invocation_id(&self) -> InvocationId {
        self.invocation_id
    }

    /// Broadcast an event; having no subscribers is fine.
    pub fn emit(&self, event: ExecutionEvent) {
        let _ = self.sender.send(event);
    }
}

impl DiagnosticSink for EventEmitter {
    fn warn(&self, message: &str) {
        self.sink.warn(message);
        self.emit(ExecutionEvent::Diagnostic {
            invocation_id: self.invocation_id,
            message: message.to_string(),
            timestamp: Utc::now(),
        });
    }
}

/// Global event bus
pub struct EventBus {
    sender: broadcast::Sender<ExecutionEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ExecutionEvent> {
        self.sender.subscribe()
    }

    pub fn create_emitter(
        &self,
        invocation_id: InvocationId,
        sink: Arc<dyn DiagnosticSink>,
    ) -> EventEmitter {
        EventEmitter::new(invocation_id, self.sender.clone(), sink)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(1000)
    }
}
