//! Dynamic node runtime
//!
//! This crate turns user-supplied node JSON into a runnable sub-workflow,
//! dispatches it to the execution engine and folds the engine's answer
//! back into a single list of items.

mod assembler;
mod config;
mod dispatcher;
mod node;
mod normalizer;
mod reducer;
mod substitution;

pub use assembler::assemble;
pub use config::{
    BatchExpressions, DynamicNodeConfig, PARAM_BATCH_EXPRESSIONS, PARAM_DO_NOT_WAIT,
    PARAM_EXECUTE_INDIVIDUALLY, PARAM_IMPORT_ALL_NODES, PARAM_NODE_JSON,
    PARAM_REQUIRE_SINGLE_ITEM,
};
pub use dispatcher::Dispatcher;
pub use node::DynamicNode;
pub use normalizer::{normalize, normalize_single, NormalizeMode, NormalizedInput, NAME_SUFFIX};
pub use reducer::{reduce, PortSelection};
pub use substitution::{is_expression, substitute, EXPRESSION_MARKER};
