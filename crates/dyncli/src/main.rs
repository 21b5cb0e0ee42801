// crates/dyncli/src/main.rs

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use dyncore::{ExecutionEngine, ExecutionEvent, Item, RawInput, WorkflowSkeleton};
use dynhost::{EchoEngine, HttpExecutionEngine, JsonPathEvaluator, StaticContext};
use dynruntime::{normalize, BatchExpressions, DynamicNode, DynamicNodeConfig};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "dynflow")]
#[command(about = "Run arbitrary node JSON as a sub-workflow", long_about = None)]
struct Cli {
    /// Show debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute node JSON over a list of items
    Run {
        #[command(flatten)]
        node: NodeArgs,

        /// Base URL of the execution engine; items are echoed back when omitted
        #[arg(long)]
        engine_url: Option<String>,

        /// Bearer token sent to the execution engine
        #[arg(long, requires = "engine_url")]
        token: Option<String>,

        /// Schedule sub-executions without collecting results
        #[arg(long)]
        no_wait: bool,
    },

    /// Print the workflow documents that would be dispatched
    Assemble {
        #[command(flatten)]
        node: NodeArgs,
    },

    /// Print the normalized node definitions
    Normalize {
        /// Path to the node JSON (single node or full export)
        #[arg(short, long)]
        node: PathBuf,

        /// Keep every node of a full export
        #[arg(long)]
        all_nodes: bool,
    },

    /// Print the bundled workflow skeleton
    Skeleton,
}

#[derive(Args)]
struct NodeArgs {
    /// Path to the node JSON (single node or full export)
    #[arg(short, long)]
    node: PathBuf,

    /// Path to a JSON array of input items
    #[arg(short, long)]
    items: Option<PathBuf>,

    /// One sub-execution for all items instead of one per item
    #[arg(long)]
    batch: bool,

    /// Keep every node of a full export, with its connections
    #[arg(long)]
    all_nodes: bool,

    /// Fail unless exactly one item is supplied
    #[arg(long)]
    single_item: bool,

    /// Expression handling in batch mode
    #[arg(long, value_enum, default_value_t = BatchExpressionsArg::Deferred)]
    batch_expressions: BatchExpressionsArg,

    /// Custom workflow skeleton
    #[arg(long)]
    skeleton: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
enum BatchExpressionsArg {
    Deferred,
    FirstItem,
}

impl From<BatchExpressionsArg> for BatchExpressions {
    fn from(arg: BatchExpressionsArg) -> Self {
        match arg {
            BatchExpressionsArg::Deferred => BatchExpressions::Deferred,
            BatchExpressionsArg::FirstItem => BatchExpressions::FirstItem,
        }
    }
}

impl NodeArgs {
    fn config(&self) -> Result<DynamicNodeConfig> {
        let mut config = DynamicNodeConfig::new(read_node_json(&self.node)?)
            .with_batch_expressions(self.batch_expressions.into());
        config.execute_individually = !self.batch;
        config.import_all_nodes = self.all_nodes;
        config.require_single_item = self.single_item;
        Ok(config)
    }

    fn items(&self) -> Result<Vec<Item>> {
        match &self.items {
            Some(path) => load_items(path),
            // A single empty item, so per-item mode still dispatches once.
            None => Ok(vec![Item::default()]),
        }
    }

    fn skeleton(&self) -> Result<WorkflowSkeleton> {
        match &self.skeleton {
            Some(path) => {
                let json = std::fs::read_to_string(path)
                    .with_context(|| format!("reading skeleton {}", path.display()))?;
                Ok(WorkflowSkeleton::from_json_str(&json)?)
            }
            None => Ok(WorkflowSkeleton::builtin()?),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Run {
            node,
            engine_url,
            token,
            no_wait,
        } => {
            let engine: Arc<dyn ExecutionEngine> = match engine_url {
                Some(url) => {
                    let mut engine = HttpExecutionEngine::new(url);
                    if let Some(token) = token {
                        engine = engine.with_bearer_token(token);
                    }
                    tracing::info!("Dispatching sub-executions to {}", engine.endpoint());
                    Arc::new(engine)
                }
                None => Arc::new(EchoEngine),
            };
            run(node, engine, no_wait).await?;
        }

        Commands::Assemble { node } => {
            assemble(node)?;
        }

        Commands::Normalize { node, all_nodes } => {
            let config = DynamicNodeConfig::new(read_node_json(&node)?);
            let config = if all_nodes { config.with_all_nodes() } else { config };
            let input = normalize(&config.node_json, config.normalize_mode())?;
            println!("{}", serde_json::to_string_pretty(&input.definitions)?);
        }

        Commands::Skeleton => {
            let skeleton = WorkflowSkeleton::builtin()?;
            println!("{}", serde_json::to_string_pretty(skeleton.document())?);
        }
    }

    Ok(())
}

async fn run(args: NodeArgs, engine: Arc<dyn ExecutionEngine>, no_wait: bool) -> Result<()> {
    let mut config = args.config()?;
    config.do_not_wait_to_finish = no_wait;
    let items = args.items()?;
    tracing::info!("Running {} over {} item(s)", args.node.display(), items.len());

    let node = DynamicNode::with_skeleton(
        args.skeleton()?,
        engine,
        Arc::new(JsonPathEvaluator),
        Arc::new(StaticContext::generated()),
    );

    let mut events = node.subscribe_events();
    let event_task = tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match event {
                ExecutionEvent::SubExecutionStarted {
                    item_index,
                    entry_node,
                    item_count,
                    ..
                } => {
                    eprintln!(
                        "  -> {} ({} item(s), item {:?})",
                        entry_node, item_count, item_index
                    );
                }
                ExecutionEvent::SubExecutionCompleted {
                    item_index,
                    duration_ms,
                    ..
                } => {
                    eprintln!("  ok item {:?} in {}ms", item_index, duration_ms);
                }
                ExecutionEvent::SubExecutionScheduled { item_index, .. } => {
                    eprintln!("  scheduled item {:?}", item_index);
                }
                ExecutionEvent::SubExecutionFailed {
                    item_index, error, ..
                } => {
                    eprintln!("  failed item {:?}: {}", item_index, error);
                }
                _ => {}
            }
        }
    });

    let result = node.execute(items, &config).await;
    event_task.abort();

    let results = result?;
    println!("{}", serde_json::to_string_pretty(&results)?);

    Ok(())
}

fn assemble(args: NodeArgs) -> Result<()> {
    let config = args.config()?;
    let items = args.items()?;

    let node = DynamicNode::with_skeleton(
        args.skeleton()?,
        Arc::new(EchoEngine),
        Arc::new(JsonPathEvaluator),
        Arc::new(StaticContext::generated()),
    );

    let documents = node.preview(&items, &config)?;
    println!("{}", serde_json::to_string_pretty(&documents)?);

    Ok(())
}

fn read_node_json(path: &Path) -> Result<RawInput> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading node JSON {}", path.display()))?;
    Ok(RawInput::Text(text))
}

fn load_items(path: &Path) -> Result<Vec<Item>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading items {}", path.display()))?;
    let json: serde_json::Value = serde_json::from_str(&text)?;

    let serde_json::Value::Array(entries) = json else {
        return Err(anyhow::anyhow!("Items must be a JSON array"));
    };

    Ok(entries
        .into_iter()
        .map(|entry| match entry {
            serde_json::Value::Object(_) => Item::from_result_entry(entry).unwrap_or_default(),
            other => Item::from_json(other),
        })
        .collect())
}
