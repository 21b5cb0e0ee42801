use thiserror::Error;

/// Errors that abort a dynamic node invocation.
///
/// Everything here surfaces to the caller as a hard failure. Recoverable
/// conditions (expression failures, a single item's sub-execution failing,
/// odd outcome shapes) never become a `DynamicError`; they are reported
/// through a [`DiagnosticSink`](crate::DiagnosticSink) instead.
#[derive(Error, Debug)]
pub enum DynamicError {
    #[error("Node JSON {0}")]
    InvalidInput(String),

    #[error("Node JSON is missing required field `{0}`")]
    MissingField(String),

    #[error("Expected exactly {expected} input item(s), got {actual}")]
    ItemCount { expected: usize, actual: usize },

    #[error("Assembly error: {0}")]
    Assembly(#[from] AssemblyError),

    #[error("Sub-execution failed: {0}")]
    SubExecution(#[from] EngineError),

    #[error("Invalid workflow skeleton: {0}")]
    Skeleton(String),
}

impl DynamicError {
    /// True for the validation failures raised before anything is dispatched.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            DynamicError::InvalidInput(_)
                | DynamicError::MissingField(_)
                | DynamicError::ItemCount { .. }
        )
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AssemblyError {
    #[error("no node definitions to inject")]
    NoDefinitions,

    #[error("injected identity `{0}` is not unique within the workflow")]
    DuplicateIdentity(String),
}

/// Failure reported by the external execution engine.
#[derive(Error, Debug, Clone)]
pub enum EngineError {
    #[error("Execution failed: {0}")]
    ExecutionFailed(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Engine returned status {status}: {body}")]
    Status { status: u16, body: String },
}

/// Failure reported by the external expression evaluator.
#[derive(Error, Debug, Clone)]
pub enum ExpressionError {
    #[error("Invalid expression `{expression}`: {reason}")]
    Invalid { expression: String, reason: String },

    #[error("Cannot resolve `{0}`")]
    Unresolved(String),
}
