//! Reference host services
//!
//! Ready-made implementations of the `dyncore` host traits for running the
//! dynamic node outside a full workflow platform.

mod context;
mod echo;
mod evaluator;
mod http;

pub use context::{MapParameters, StaticContext};
pub use echo::EchoEngine;
pub use evaluator::JsonPathEvaluator;
pub use http::HttpExecutionEngine;
