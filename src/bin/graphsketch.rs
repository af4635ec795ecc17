//! Command line front end for drawing-based graph queries.
#![forbid(unsafe_code)]

#[path = "graphsketch/ui.rs"]
mod ui;

use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use graphsketch::{
    error::GraphErrorWithCode, retrieve_metadata, CompilerOptions, GraphError, QueryCompiler,
    QueryHandler, Record, ReplayDatabase, ResultAssembler, Sketch, SketchConfig, SymmetryPolicy,
};
use serde::de::DeserializeOwned;
use tracing_subscriber::EnvFilter;

use ui::{Theme, Ui};

#[derive(Parser, Debug)]
#[command(
    name = "graphsketch",
    version,
    about = "Compile drawn property-graph patterns into Cypher and decode their results",
    disable_help_subcommand = true
)]
struct Cli {
    #[arg(
        long,
        global = true,
        value_enum,
        default_value_t = OutputFormat::Text,
        help = "Output format for structured responses"
    )]
    format: OutputFormat,

    #[arg(
        long,
        global = true,
        value_name = "FILE",
        help = "Config file (defaults to $GRAPHSKETCH_CONFIG or the user config dir)"
    )]
    config: Option<PathBuf>,

    #[arg(
        long,
        global = true,
        value_name = "POLICY",
        help = "Override the symmetry policy: break, preserve, or dedup"
    )]
    symmetry: Option<SymmetryPolicy>,

    #[arg(long, global = true, value_enum, default_value_t = Theme::Auto, help = "Color theme")]
    theme: Theme,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    #[command(about = "Validate a drawing and print its canonical graph")]
    Validate {
        #[arg(value_name = "DRAWING", help = "Drawing JSON file")]
        drawing: PathBuf,
    },

    #[command(about = "Compile a drawing into a Cypher query")]
    Compile {
        #[arg(value_name = "DRAWING", help = "Drawing JSON file")]
        drawing: PathBuf,

        #[arg(
            long,
            value_name = "FIXTURE",
            help = "Replay fixture whose catalog enables label pruning"
        )]
        replay: Option<PathBuf>,
    },

    #[command(about = "Run a drawing against a replayed database")]
    Search {
        #[arg(value_name = "DRAWING", help = "Drawing JSON file")]
        drawing: PathBuf,

        #[arg(long, value_name = "FIXTURE", help = "Replay fixture JSON file")]
        replay: PathBuf,
    },

    #[command(about = "Print the catalog of a replayed database")]
    Metadata {
        #[arg(long, value_name = "FIXTURE", help = "Replay fixture JSON file")]
        replay: PathBuf,
    },

    #[command(about = "Decode a raw result row into a result graph")]
    Assemble {
        #[arg(value_name = "RECORD", help = "Record JSON file")]
        record: PathBuf,
    },
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn main() {
    init_tracing();
    let cli = Cli::parse();
    let ui = Ui::new(cli.theme);
    if let Err(err) = run(cli, &ui) {
        match err.downcast_ref::<GraphError>() {
            Some(graph_err) => ui.error(&format!("error: {}", GraphErrorWithCode(graph_err))),
            None => ui.error(&format!("error: {err}")),
        }
        std::process::exit(1);
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("GRAPHSKETCH_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn run(cli: Cli, ui: &Ui) -> Result<(), Box<dyn Error>> {
    let config = SketchConfig::load(cli.config.clone()).map_err(GraphError::from)?;
    let mut options: CompilerOptions = config.compiler;
    if let Some(policy) = cli.symmetry {
        options.symmetry = policy;
    }

    match cli.command {
        Command::Validate { drawing } => {
            let sketch: Sketch = read_json(&drawing)?;
            let graph = sketch.to_graph()?;
            emit(cli.format, &graph, || {
                ui.success(&format!(
                    "valid drawing: {} node(s), {} relation(s)",
                    graph.node_count(),
                    graph.relation_count()
                ));
                println!("{graph}");
            })?;
        }
        Command::Compile { drawing, replay } => {
            let sketch: Sketch = read_json(&drawing)?;
            let graph = sketch.to_graph()?;
            let mut compiler = QueryCompiler::new(options);
            if let Some(fixture) = replay {
                let db = ReplayDatabase::from_path(&fixture)?;
                compiler = compiler.with_metadata(Arc::new(retrieve_metadata(&db)?));
            }
            let query = compiler.translate(&graph);
            emit(cli.format, &query, || println!("{query}"))?;
        }
        Command::Search { drawing, replay } => {
            let sketch: Sketch = read_json(&drawing)?;
            let mut handler = QueryHandler::new(options);
            handler.load_database(ReplayDatabase::from_path(&replay)?)?;
            let results = handler.exact_search(&sketch.vertices, &sketch.edges)?;
            emit(cli.format, &results, || {
                if let Some(query) = handler.last_query() {
                    ui.block("Query", query.text());
                }
                ui.section(
                    "Matches",
                    [
                        ("embeddings", results.len()),
                        (
                            "nodes",
                            results.graph.as_ref().map_or(0, |g| g.node_count()),
                        ),
                        (
                            "relations",
                            results.graph.as_ref().map_or(0, |g| g.relation_count()),
                        ),
                    ],
                );
                println!("{results}");
            })?;
            handler.disconnect();
        }
        Command::Metadata { replay } => {
            let db = ReplayDatabase::from_path(&replay)?;
            let metadata = retrieve_metadata(&db)?;
            emit(cli.format, &metadata, || println!("{metadata}"))?;
        }
        Command::Assemble { record } => {
            let record: Record = read_json(&record)?;
            let results = ResultAssembler::new(options.symmetry).assemble(&record)?;
            emit(cli.format, &results, || println!("{results}"))?;
        }
    }
    Ok(())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, Box<dyn Error>> {
    let text = fs::read_to_string(path)
        .map_err(|err| format!("failed to read {}: {err}", path.display()))?;
    let value = serde_json::from_str(&text)
        .map_err(|err| format!("failed to parse {}: {err}", path.display()))?;
    Ok(value)
}

fn emit<T, F>(format: OutputFormat, value: &T, printer: F) -> Result<(), Box<dyn Error>>
where
    T: serde::Serialize,
    F: FnOnce(),
{
    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(value)?;
            println!("{json}");
        }
        OutputFormat::Text => printer(),
    }
    Ok(())
}
