//! bioresolve CLI - batch resolution of gene, protein and chemical names
//!
//! This binary provides the command-line interface for the bioresolve system.

#![deny(warnings)]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]

use anyhow::{bail, Context, Result};
use bioresolve::export::write_csv;
use bioresolve::input::read_entities;
use bioresolve::progress::forward_interrupts;
use bioresolve::run::{deep_search, resolve_batch, summarize};
use bioresolve::session_store::{load_session, save_session};
use bioresolve_core::config::Config;
use bioresolve_core::{EntityTypeHint, ResolutionContext};
use bioresolve_orchestrator::{Orchestrator, ResultRecord};
use clap::{Parser, Subcommand};
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Parser)]
#[command(name = "bioresolve")]
#[command(about = "Resolve biological and chemical entity names with an LLM backend")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve a list of entity names (one per line, `-` for stdin)
    Resolve {
        /// Input file
        input: PathBuf,

        /// Entity type hint (auto, gene, protein, chemical)
        #[arg(long = "type", value_name = "TYPE", default_value = "auto")]
        type_hint: EntityTypeHint,

        /// Background text passed to the backend (organism, experiment)
        #[arg(long)]
        background: Option<String>,

        /// Ontology to annotate against, e.g. GO or ChEBI
        #[arg(long, conflicts_with = "no_ontology")]
        ontology: Option<String>,

        /// Do not request ontology terms
        #[arg(long)]
        no_ontology: bool,

        /// Entities resolved concurrently per window
        #[arg(long)]
        concurrency: Option<usize>,

        /// Retry unresolved entities with deep search automatically
        #[arg(long)]
        deep_search: bool,

        /// CSV output path (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Save the session snapshot as JSON
        #[arg(long)]
        session: Option<PathBuf>,
    },
    /// Run deep search on a saved session
    DeepSearch {
        /// Session file written by `resolve --session`
        #[arg(long)]
        session: PathBuf,

        /// CSV output path
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Export a saved session as CSV
    Export {
        /// Session file
        #[arg(long)]
        session: PathBuf,

        /// CSV output path (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose)?;

    match cli.command {
        Commands::Resolve {
            input,
            type_hint,
            background,
            ontology,
            no_ontology,
            concurrency,
            deep_search,
            output,
            session,
        } => {
            let mut config = Config::load(cli.config.as_deref())?;
            if let Some(limit) = concurrency {
                config.batch.concurrency_limit = limit;
            }

            let defaults = config.resolution.to_context();
            let context = ResolutionContext::builder()
                .type_hint(type_hint)
                .background(background)
                .ontology(ontology.or(defaults.ontology))
                .ontology_enabled(defaults.ontology_enabled && !no_ontology)
                .build()?;

            let entities = read_entities(&input)?;
            let mut orchestrator = Orchestrator::from_config(&config)?;
            forward_interrupts(&orchestrator);
            let reports = resolve_batch(
                &mut orchestrator,
                entities,
                context,
                deep_search,
                show_progress(),
            )
            .await?;
            for report in &reports {
                eprintln!("{}", summarize(report));
            }

            if let Some(path) = &session {
                save_session(path, &orchestrator.snapshot())?;
                eprintln!("Session saved to {}", path.display());
            }
            export(orchestrator.results().records(), output.as_deref())
        }
        Commands::DeepSearch { session, output } => {
            let config = Config::load(cli.config.as_deref())?;
            let mut orchestrator = Orchestrator::from_config(&config)?;
            orchestrator.restore(load_session(&session)?);
            forward_interrupts(&orchestrator);

            let report = deep_search(&mut orchestrator, show_progress()).await?;
            eprintln!("{}", summarize(&report));

            save_session(&session, &orchestrator.snapshot())?;
            match output {
                Some(path) => export(orchestrator.results().records(), Some(&path)),
                None => Ok(()),
            }
        }
        Commands::Export { session, output } => {
            let snapshot = load_session(&session)?;
            if snapshot.results.is_empty() {
                bail!("Session {} has no results to export", session.display());
            }
            export(snapshot.results.records(), output.as_deref())
        }
    }
}

/// Initialize logging system
fn init_logging(verbose: bool) -> Result<()> {
    let level = if verbose { "debug" } else { "info" };

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "bioresolve={level},bioresolve_core={level},bioresolve_gateway={level},bioresolve_orchestrator={level}"
        ))
        .with_writer(std::io::stderr)
        .init();

    Ok(())
}

fn show_progress() -> bool {
    std::io::stderr().is_terminal()
}

fn export(records: &[ResultRecord], output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            let file = std::fs::File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            write_csv(records, file)?;
            info!("Wrote {} rows to {}", records.len(), path.display());
            Ok(())
        }
        None => write_csv(records, std::io::stdout().lock()),
    }
}
