use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use papertrawl_core::{Config, Pipeline, default_sources};

// ─── CLI Definition ─────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "papertrawl",
    about = "Bulk-download open-access papers and keep only the relevant ones",
    version,
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output in JSON format (for scripts and agents).
    /// Also enabled by setting PAPERTRAWL_JSON=1.
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full download-and-filter pipeline.
    Run {
        /// Queries to process; falls back to the queries in the config file.
        queries: Vec<String>,
    },

    /// Search backends and list their results, without downloading anything.
    Search {
        query: String,
        /// Backend name (arXiv, DOAJ, PMC, PLOS, CORE); omit for all.
        #[arg(long)]
        source: Option<String>,
        /// Cap on results per backend.
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Config management.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show the effective configuration as TOML.
    Show,
    /// Print the config file path.
    Path,
}

// ─── Main ────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("papertrawl=info")),
        )
        .init();

    let cli = Cli::parse();
    let json_output = cli.json || std::env::var("PAPERTRAWL_JSON").as_deref() == Ok("1");
    let config = Config::load().context("failed to load config")?;

    match cli.command {
        Commands::Run { queries } => run_pipeline(&config, queries, json_output).await,
        Commands::Search {
            query,
            source,
            limit,
        } => run_search(&config, &query, source.as_deref(), limit, json_output).await,
        Commands::Config { action } => match action {
            ConfigAction::Show => {
                print!("{}", toml::to_string_pretty(&config)?);
                Ok(())
            }
            ConfigAction::Path => {
                println!("{}", Config::config_path().display());
                Ok(())
            }
        },
    }
}

async fn run_pipeline(config: &Config, queries: Vec<String>, json_output: bool) -> Result<()> {
    let queries = if queries.is_empty() {
        config.queries.clone()
    } else {
        queries
    };
    if queries.is_empty() {
        bail!("no queries given on the command line or in the config file");
    }

    let pipeline = Pipeline::new(config);
    let query_pause = Duration::from_secs(config.pipeline.query_pause_secs);

    for (idx, query) in queries.iter().enumerate() {
        let report = pipeline
            .run_query(query)
            .await
            .with_context(|| format!("pipeline failed for query '{query}'"))?;

        if json_output {
            print_json(&serde_json::json!({"status": "ok", "data": report}))?;
        } else {
            println!("Results for '{}':", report.query);
            for source in &report.sources {
                println!(
                    "  {:<6} found {:>4}  kept {:>4}  rejected {:>4}  failed {:>4}",
                    source.source,
                    source.found,
                    source.tally.kept,
                    source.tally.rejected,
                    source.tally.failed
                );
            }
            let total = report.total();
            println!(
                "  TOTAL  kept {}  rejected {}  failed {}",
                total.kept, total.rejected, total.failed
            );
        }

        if idx + 1 < queries.len() {
            tokio::time::sleep(query_pause).await;
        }
    }
    Ok(())
}

async fn run_search(
    config: &Config,
    query: &str,
    source_filter: Option<&str>,
    limit: Option<usize>,
    json_output: bool,
) -> Result<()> {
    let sources = default_sources(&config.sources);

    let selected: Vec<_> = match source_filter {
        Some(name) => {
            let matched: Vec<_> = sources
                .into_iter()
                .filter(|s| s.name().eq_ignore_ascii_case(name))
                .collect();
            if matched.is_empty() {
                bail!("unknown source '{name}' (expected one of: arXiv, DOAJ, PMC, PLOS, CORE)");
            }
            matched
        }
        None => sources,
    };

    let mut sections = Vec::new();
    for source in &selected {
        let stubs = source.search(query, limit).await;
        if json_output {
            sections.push(serde_json::json!({
                "source": source.name(),
                "found": stubs.len(),
                "results": stubs,
            }));
        } else {
            println!("{}: {} result(s)", source.name(), stubs.len());
            for (i, stub) in stubs.iter().enumerate() {
                let url = stub.pdf_url.as_deref().unwrap_or("(no PDF URL)");
                println!("  {:>3}. {}", i + 1, stub.title);
                println!("       {url}");
            }
        }
    }
    if json_output {
        print_json(&serde_json::json!({"status": "ok", "query": query, "data": sections}))?;
    }
    Ok(())
}

fn print_json(val: &serde_json::Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(val)?);
    Ok(())
}
