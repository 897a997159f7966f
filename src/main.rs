use anyhow::{Context, Result};
use brain_graph::config::{resolve_memory_dir, GraphConfig};
use brain_graph::domain::{DocumentKind, RelationKind};
use brain_graph::ingestion::IngestionPipeline;
use brain_graph::memory::{KnowledgeGraph, KnowledgeGraphLoader};
use brain_graph::reasoning::{
    entities_by_type, ConnectionSuggester, ContextAssembler, GraphStats, PathExplainer,
    RelationQueryService,
};
use brain_graph::schedule::{default_jobs, launchd_label, render_crontab, render_launchd, ScheduleTarget};
use brain_graph::store::{MemoryStore, DEFAULT_STALE_TOLERANCE};
use brain_graph::{report, GraphError};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

const QUERY_MISS_HINT: usize = 10;

#[derive(Parser)]
#[command(name = "brain-graph", version, about = "Shared memory knowledge graph CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Memory store directory.
    #[arg(long, env = "SHARED_MEMORY_DIR", global = true)]
    memory_dir: Option<PathBuf>,
    /// TOML file overriding weights, limits and extraction patterns.
    #[arg(long, env = "BRAIN_GRAPH_CONFIG", global = true)]
    config: Option<PathBuf>,
    #[arg(long, default_value = "info", global = true)]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the memory store and any missing seed documents.
    Init {
        #[arg(long)]
        json: bool,
    },
    /// Rebuild the graph from the memory documents.
    Build {
        #[arg(long)]
        json: bool,
    },
    /// Rebuild only when the graph is missing or older than the history.
    Refresh {
        #[arg(long, default_value_t = DEFAULT_STALE_TOLERANCE.as_secs())]
        tolerance_secs: u64,
        #[arg(long)]
        json: bool,
    },
    /// Entities related to a topic.
    Query {
        topic: String,
        #[arg(long)]
        limit: Option<usize>,
        #[arg(long)]
        relation: Option<String>,
        #[arg(long)]
        json: bool,
    },
    /// Everything known about a topic.
    Context {
        topic: String,
        #[arg(long)]
        json: bool,
    },
    /// Pairs that share neighbours but are not linked.
    Suggest {
        #[arg(long)]
        min_common: Option<usize>,
        #[arg(long)]
        limit: Option<usize>,
        #[arg(long)]
        json: bool,
    },
    Stats {
        #[arg(long)]
        json: bool,
    },
    /// All entities grouped by type.
    List {
        #[arg(long)]
        json: bool,
    },
    /// Shortest chain of links between two topics.
    Explain {
        from: String,
        to: String,
        #[arg(long, default_value_t = 4)]
        max_depth: usize,
        #[arg(long)]
        json: bool,
    },
    /// Print schedule definitions for the automation scripts.
    Schedule {
        #[arg(long, value_enum, default_value_t = ScheduleFormat::Cron)]
        format: ScheduleFormat,
        /// Only this job.
        #[arg(long)]
        job: Option<String>,
        /// Directory holding the scripts. Defaults to the memory directory.
        #[arg(long)]
        script_dir: Option<PathBuf>,
        #[arg(long, default_value = "python3")]
        interpreter: String,
        /// Defaults to `logs/` inside the memory directory.
        #[arg(long)]
        log_dir: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ScheduleFormat {
    Cron,
    Launchd,
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            if let Some(GraphError::NotBuilt(_)) = err.downcast_ref::<GraphError>() {
                eprintln!("{}", err);
            } else {
                error!("{:#}", err);
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let memory_dir = resolve_memory_dir(cli.memory_dir)?;
    let config = GraphConfig::load(cli.config.as_deref())?;
    let store = MemoryStore::new(&memory_dir);
    let pipeline = IngestionPipeline::new(&store, &config);
    debug!(memory_dir = %memory_dir.display(), "resolved memory store");

    match cli.command {
        Commands::Init { json } => {
            let created = store.init()?;
            emit(json, &created, || report::init_report(&created))?;
        }
        Commands::Build { json } => {
            let outcome = pipeline.run()?;
            emit(json, &outcome, || report::build_outcome(&outcome))?;
        }
        Commands::Refresh {
            tolerance_secs,
            json,
        } => {
            let outcome = pipeline.refresh(Duration::from_secs(tolerance_secs))?;
            emit(json, &outcome, || report::refresh_outcome(&outcome))?;
        }
        Commands::Query {
            topic,
            limit,
            relation,
            json,
        } => {
            let graph = load_graph(&pipeline)?;
            let service = RelationQueryService::new(&graph);
            let limit = limit.unwrap_or(config.limits.related);
            let result = match relation {
                Some(name) => {
                    let kind = RelationKind::from_str(&name)?;
                    service.filter_by_kind(&topic, kind, limit)
                }
                None => service.related(&topic, limit),
            };
            if json {
                match &result {
                    Some(result) => print_json(result)?,
                    None => print_json(&serde_json::json!({ "query": topic, "related": [] }))?,
                }
            } else {
                let hint: Vec<String> = graph
                    .nodes()
                    .take(QUERY_MISS_HINT)
                    .map(|(id, _)| id.clone())
                    .collect();
                print!("{}", report::related(&topic, result.as_ref(), &hint));
            }
        }
        Commands::Context { topic, json } => {
            let graph = load_graph(&pipeline)?;
            let documents = store.load_all(DocumentKind::all())?;
            let context = ContextAssembler::new(&graph, &config.limits)
                .with_documents(&documents)
                .assemble(&topic);
            emit(json, &context, || report::context(&context))?;
        }
        Commands::Suggest {
            min_common,
            limit,
            json,
        } => {
            let graph = load_graph(&pipeline)?;
            let suggestions = ConnectionSuggester::new(&graph).suggest(
                min_common.unwrap_or(config.limits.suggest_min_common),
                limit.unwrap_or(config.limits.suggestions),
            );
            emit(json, &suggestions, || report::suggestions(&suggestions))?;
        }
        Commands::Stats { json } => {
            let graph = load_graph(&pipeline)?;
            let stats = GraphStats::collect(&graph);
            emit(json, &stats, || report::stats(&stats))?;
        }
        Commands::List { json } => {
            let graph = load_graph(&pipeline)?;
            let groups = entities_by_type(&graph);
            emit(json, &groups, || report::entity_list(&groups))?;
        }
        Commands::Explain {
            from,
            to,
            max_depth,
            json,
        } => {
            let graph = load_graph(&pipeline)?;
            let path = PathExplainer::new(&graph).explain(&from, &to, max_depth);
            emit(json, &path, || report::explanation(&from, &to, path.as_deref()))?;
        }
        Commands::Schedule {
            format,
            job,
            script_dir,
            interpreter,
            log_dir,
        } => {
            let target = ScheduleTarget::new(
                script_dir.unwrap_or_else(|| memory_dir.clone()),
                log_dir.unwrap_or_else(|| memory_dir.join("logs")),
            )
            .with_interpreter(interpreter);
            let mut jobs = default_jobs();
            if let Some(name) = job {
                jobs.retain(|candidate| candidate.name == name);
                anyhow::ensure!(!jobs.is_empty(), "unknown job: {}", name);
            }
            match format {
                ScheduleFormat::Cron => print!("{}", render_crontab(&jobs, &target)),
                ScheduleFormat::Launchd => {
                    for (index, job) in jobs.iter().enumerate() {
                        if jobs.len() > 1 {
                            if index > 0 {
                                println!();
                            }
                            println!("# {}.plist", launchd_label(job));
                        }
                        print!("{}", render_launchd(job, &target));
                    }
                }
            }
        }
    }
    Ok(())
}

fn load_graph(pipeline: &IngestionPipeline<'_>) -> Result<KnowledgeGraph> {
    let path = pipeline.graph_path();
    KnowledgeGraphLoader::load_from_path(&path)
}

fn emit<T, F>(json: bool, value: &T, text: F) -> Result<()>
where
    T: Serialize,
    F: FnOnce() -> String,
{
    if json {
        print_json(value)
    } else {
        print!("{}", text());
        Ok(())
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("failed to serialize output")?;
    println!("{}", rendered);
    Ok(())
}
