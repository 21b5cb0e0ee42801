use crate::normalizer::NormalizeMode;
use crate::reducer::PortSelection;
use dyncore::{ParameterAccessor, RawInput};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const PARAM_NODE_JSON: &str = "nodeJson";
pub const PARAM_EXECUTE_INDIVIDUALLY: &str = "executeIndividually";
pub const PARAM_DO_NOT_WAIT: &str = "doNotWaitToFinish";
pub const PARAM_IMPORT_ALL_NODES: &str = "importAllNodes";
pub const PARAM_REQUIRE_SINGLE_ITEM: &str = "requireSingleItem";
pub const PARAM_BATCH_EXPRESSIONS: &str = "batchExpressions";

/// Expression handling when all items share one sub-execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BatchExpressions {
    /// Leave expressions to the engine's own per-item context
    #[default]
    Deferred,
    /// Resolve against the first item before dispatch
    FirstItem,
}

/// Per-invocation configuration of the dynamic node
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DynamicNodeConfig {
    #[serde(default)]
    pub node_json: RawInput,

    /// One sub-execution per item instead of one for the whole batch
    #[serde(default = "default_true")]
    pub execute_individually: bool,

    /// Schedule sub-executions without collecting their results
    #[serde(default)]
    pub do_not_wait_to_finish: bool,

    /// Inject every node of a full workflow export, with its connections
    #[serde(default)]
    pub import_all_nodes: bool,

    /// Reject invocations that do not carry exactly one item
    #[serde(default)]
    pub require_single_item: bool,

    #[serde(default)]
    pub batch_expressions: BatchExpressions,
}

fn default_true() -> bool {
    true
}

impl DynamicNodeConfig {
    pub fn new(node_json: impl Into<RawInput>) -> Self {
        Self {
            node_json: node_json.into(),
            execute_individually: true,
            do_not_wait_to_finish: false,
            import_all_nodes: false,
            require_single_item: false,
            batch_expressions: BatchExpressions::default(),
        }
    }

    /// Read the configuration from node parameters (item 0).
    pub fn from_parameters(parameters: &dyn ParameterAccessor) -> Self {
        let flag = |name: &str, default: bool| {
            parameters
                .get_parameter(name, 0)
                .and_then(|v| v.as_bool())
                .unwrap_or(default)
        };

        let batch_expressions = parameters
            .get_parameter(PARAM_BATCH_EXPRESSIONS, 0)
            .and_then(|v| serde_json::from_value(v).ok())
            .unwrap_or_default();

        Self {
            node_json: parameters
                .get_parameter(PARAM_NODE_JSON, 0)
                .map(RawInput::from)
                .unwrap_or_default(),
            execute_individually: flag(PARAM_EXECUTE_INDIVIDUALLY, true),
            do_not_wait_to_finish: flag(PARAM_DO_NOT_WAIT, false),
            import_all_nodes: flag(PARAM_IMPORT_ALL_NODES, false),
            require_single_item: flag(PARAM_REQUIRE_SINGLE_ITEM, false),
            batch_expressions,
        }
    }

    pub fn batch(mut self) -> Self {
        self.execute_individually = false;
        self
    }

    pub fn without_waiting(mut self) -> Self {
        self.do_not_wait_to_finish = true;
        self
    }

    pub fn with_all_nodes(mut self) -> Self {
        self.import_all_nodes = true;
        self
    }

    pub fn single_item_only(mut self) -> Self {
        self.require_single_item = true;
        self
    }

    pub fn with_batch_expressions(mut self, mode: BatchExpressions) -> Self {
        self.batch_expressions = mode;
        self
    }

    pub fn normalize_mode(&self) -> NormalizeMode {
        if self.import_all_nodes {
            NormalizeMode::All
        } else {
            NormalizeMode::Single
        }
    }

    pub fn port_selection(&self) -> PortSelection {
        if self.import_all_nodes {
            PortSelection::Flatten
        } else {
            PortSelection::First
        }
    }
}

impl Default for DynamicNodeConfig {
    fn default() -> Self {
        Self::new(Value::Object(Default::default()))
    }
}
