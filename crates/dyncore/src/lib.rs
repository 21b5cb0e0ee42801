//! Core abstractions for the dynamic node
//!
//! This crate provides the data model shared by every other component:
//! node definitions, workflow documents and their skeleton, items, the
//! classified execution outcome, the error taxonomy and the traits for the
//! host services the runtime is wired to.

mod definition;
mod error;
pub mod events;
pub mod host;
mod item;
mod outcome;
mod workflow;

pub use definition::{NodeDefinition, Position, RawInput, EXPORT_ONLY_FIELDS};
pub use error::{AssemblyError, DynamicError, EngineError, ExpressionError};
pub use events::*;
pub use host::{
    ContextAccessor, DiagnosticSink, ExecuteOptions, ExecutionEngine, ExpressionEvaluator,
    ParameterAccessor, ParentExecution, TracingSink,
};
pub use item::{Item, ResultCollection};
pub use outcome::{is_port_list, ExecutionOutcome, OutcomeShape};
pub use workflow::{
    ConnectionGraph, ConnectionTarget, PortConnections, WorkflowDocument, WorkflowSkeleton,
    MAIN_CONNECTION, START_NODE,
};

/// Result type for dynamic node operations
pub type Result<T> = std::result::Result<T, DynamicError>;
