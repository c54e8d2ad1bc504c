use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};

use rollout_impact::Result;
use rollout_impact::catalog::{self, ReferenceTable, Resolver};
use rollout_impact::graph::ComponentGraph;
use rollout_impact::graph::snapshot::{load_graph, save_graph};
use rollout_impact::routine::{RoutineRegistry, load_manifest};
use rollout_impact::{diff, impact, report};

use anyhow::Context;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "rollout-impact")]
#[command(about = "Component graph drift and rollout impact analysis", long_about = None)]
struct Cli {
    /// Component catalog (YAML).
    #[arg(long, env = "ROLLOUT_CATALOG", default_value = "all_components.yaml", global = true)]
    catalog: PathBuf,

    /// Graph state saved by the previous run (JSON).
    #[arg(long, env = "ROLLOUT_STATE", default_value = "data.json", global = true)]
    state: PathBuf,

    /// Reference table backing `${ref:...}` placeholders (YAML string map).
    #[arg(long, env = "ROLLOUT_REFS", global = true)]
    refs: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compose the current graph and store it as the baseline state.
    Snapshot {
        /// Components to include (default: whole catalog).
        components: Vec<String>,
    },

    /// Print the topological order of the current graph.
    Order { components: Vec<String> },

    /// Compare the current graph against the saved state and report impact.
    Diff {
        components: Vec<String>,

        /// Routine manifest (YAML).
        #[arg(long, env = "ROLLOUT_ROUTINES")]
        routines: Option<PathBuf>,

        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,

        /// Overwrite the state file with the new baseline afterwards.
        #[arg(long)]
        save: bool,

        /// Resolve impact for this node only.
        #[arg(long)]
        node: Option<String>,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

fn main() -> Result<()> {
    // Logs go to stderr; stdout carries the report.
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "rollout_impact=info".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match &cli.cmd {
        Commands::Snapshot { components } => {
            let current = compose_current(&cli, components)?;
            save_graph(&cli.state, &current)?;
            println!("Wrote {}", cli.state.display());
        }

        Commands::Order { components } => {
            let current = compose_current(&cli, components)?;
            for name in current.topological_sort()? {
                println!("{}", name);
            }
        }

        Commands::Diff {
            components,
            routines,
            format,
            save,
            node,
        } => {
            // 1) Current graph from the catalog, previous from saved state.
            let current = compose_current(&cli, components)?;
            let previous = load_graph(&cli.state)?;

            // 2) Merge (fails unless both graphs sort identically).
            let merged = diff::merge(&previous, &current)
                .with_context(|| format!("compare against {}", cli.state.display()))?;

            // 3) Routines + impact plan.
            let registry = load_routines(routines.as_deref(), &merged)?;
            let impacts = match node.as_deref() {
                Some(name) => impact::impact_of(&merged, &registry, name)?
                    .into_iter()
                    .collect(),
                None => impact::plan(&merged, &registry)?,
            };

            // 4) Report.
            let data = report::build_report_data(&merged, &impacts, node.as_deref())?;
            let rendered = match format {
                Format::Text => report::render_text_report(&data),
                Format::Json => report::render_json_report(&data)?,
            };
            print!("{}", rendered);
            if *format == Format::Json {
                println!();
            }

            if *save {
                save_graph(&cli.state, &merged.settled())?;
            }
        }
    }

    Ok(())
}

fn compose_current(cli: &Cli, components: &[String]) -> Result<ComponentGraph> {
    let catalog = catalog::load_catalog(&cli.catalog)?;

    let mut resolver = Resolver::new()?;
    if let Some(path) = &cli.refs {
        resolver = resolver.with_scheme("ref", ReferenceTable::load(path)?);
    }

    let graph = catalog::compose(&catalog, components, &resolver)
        .with_context(|| format!("compose components from {}", cli.catalog.display()))?;
    tracing::debug!(nodes = graph.len(), "composed current graph");
    Ok(graph)
}

fn load_routines(path: Option<&Path>, graph: &ComponentGraph) -> Result<RoutineRegistry> {
    let Some(path) = path else {
        return Ok(RoutineRegistry::new());
    };
    let registry = load_manifest(path)?;
    for node in registry.nodes() {
        if !graph.contains(node) {
            tracing::warn!(node, manifest = %path.display(), "routines registered for a node absent from the graph");
        }
    }
    Ok(registry)
}
