//! schemagraph CLI - Inspect and lay out database schemas
//!
//! Usage:
//!   schemagraph tables <connection>
//!   schemagraph graph <connection>
//!   schemagraph layout <connection> [--format json|summary]
//!
//! Examples:
//!   schemagraph layout local --format summary
//!   schemagraph --snapshot fixtures/shop.json graph shop
//!   RUST_LOG=schemagraph=debug schemagraph --config ./dev.toml tables local

use clap::{Parser, Subcommand, ValueEnum};
use schemagraph::aggregate::MetadataAggregator;
use schemagraph::config::Settings;
use schemagraph::diagram::SchemaDiagram;
use schemagraph::graph::{GraphBuilder, GraphEdge, GraphNode};
use schemagraph::metadata::{MetadataProvider, StaticMetadataProvider};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "schemagraph")]
#[command(about = "schemagraph - Entity-relationship diagrams from database metadata")]
#[command(version)]
struct Cli {
    /// Config file (overrides discovery)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Read metadata from a JSON snapshot instead of configured connections
    #[arg(long, global = true)]
    snapshot: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List table names of a connection
    Tables {
        /// Connection name
        connection: String,
    },

    /// Print nodes and edges as JSON
    Graph {
        /// Connection name
        connection: String,
    },

    /// Run the full pipeline and print the diagram
    Layout {
        /// Connection name
        connection: String,

        /// Output format
        #[arg(short, long, default_value = "json")]
        format: OutputFormat,
    },
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Diagram as pretty JSON
    Json,
    /// One line per placed table and edge
    Summary,
}

/// Everything a command needs, resolved from flags and config.
struct Context {
    settings: Settings,
    provider: Arc<dyn MetadataProvider>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Error starting runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };

    runtime.block_on(run(cli))
}

async fn run(cli: Cli) -> ExitCode {
    let connection = match &cli.command {
        Commands::Tables { connection }
        | Commands::Graph { connection }
        | Commands::Layout { connection, .. } => connection.clone(),
    };

    let context = match resolve(&cli, &connection) {
        Ok(ctx) => ctx,
        Err(message) => {
            eprintln!("Error: {}", message);
            return ExitCode::FAILURE;
        }
    };

    match cli.command {
        Commands::Tables { connection } => cmd_tables(&context, &connection).await,
        Commands::Graph { connection } => cmd_graph(&context, &connection).await,
        Commands::Layout { connection, format } => {
            cmd_layout(&context, &connection, format).await
        }
    }
}

fn resolve(cli: &Cli, connection: &str) -> Result<Context, String> {
    let settings = match &cli.config {
        Some(path) => Settings::from_file(path),
        None => Settings::load(),
    }
    .map_err(|e| e.to_string())?;

    let provider: Arc<dyn MetadataProvider> = match &cli.snapshot {
        Some(path) => Arc::new(
            StaticMetadataProvider::from_file(connection, path).map_err(|e| e.to_string())?,
        ),
        None => settings
            .provider_for(connection)
            .map_err(|e| e.to_string())?,
    };

    Ok(Context { settings, provider })
}

fn aggregator(context: &Context) -> Result<MetadataAggregator<dyn MetadataProvider>, String> {
    let config = context
        .settings
        .aggregation
        .to_config()
        .map_err(|e| e.to_string())?;
    Ok(MetadataAggregator::new(Arc::clone(&context.provider)).with_config(config))
}

async fn cmd_tables(context: &Context, connection: &str) -> ExitCode {
    match context.provider.list_tables(connection).await {
        Ok(tables) => {
            for table in tables {
                println!("{}", table);
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error listing tables: {}", e);
            ExitCode::FAILURE
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GraphOutput<'a> {
    nodes: Vec<&'a GraphNode>,
    edges: Vec<&'a GraphEdge>,
    dangling_references: usize,
}

async fn cmd_graph(context: &Context, connection: &str) -> ExitCode {
    let aggregator = match aggregator(context) {
        Ok(a) => a,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let tables = match aggregator.load(connection).await {
        Ok(t) => t,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let graph = GraphBuilder::new(context.settings.layout.geometry()).build(&tables);
    let output = GraphOutput {
        nodes: graph.nodes().collect(),
        edges: graph.edges().collect(),
        dangling_references: graph.dangling_count(),
    };
    print_json(&output)
}

async fn cmd_layout(context: &Context, connection: &str, format: OutputFormat) -> ExitCode {
    let config = match context.settings.aggregation.to_config() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let pipeline = SchemaDiagram::new(Arc::clone(&context.provider))
        .with_aggregator_config(config)
        .with_layout_config(context.settings.layout.clone());

    match pipeline.refresh(connection).await {
        Ok(diagram) => match format {
            OutputFormat::Json => print_json(diagram.as_ref()),
            OutputFormat::Summary => {
                print!("{}", diagram.summary());
                ExitCode::SUCCESS
            }
        },
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> ExitCode {
    match serde_json::to_string_pretty(value) {
        Ok(json) => {
            println!("{}", json);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error serializing output: {}", e);
            ExitCode::FAILURE
        }
    }
}
