mod base;

pub use base::{EventBus, EventEmitter, ExecutionEvent, InvocationId};
