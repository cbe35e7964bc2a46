use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pakrat_core::{
    create_extractor, load_config, validate_config, Config, Fetcher, HttpFetcher, JsonFileSink,
    RunOutcome, ScrapeRunner, Sink, SortKey,
};

#[derive(Parser)]
#[command(
    name = "pakrat",
    about = "Scrape npm package metadata beyond the registry API"
)]
struct Cli {
    /// Search query
    query: String,

    /// Maximum search pages to walk
    #[arg(long)]
    pages: Option<u32>,

    /// Sort key: size | date | downloads | dependents | relevance
    #[arg(long)]
    sort: Option<String>,

    /// Enrichment worker count
    #[arg(long)]
    workers: Option<usize>,

    /// Output directory for the JSON artifact
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Configuration file (TOML); PAKRAT_CONFIG is honored as well
    #[arg(long)]
    config: Option<PathBuf>,

    /// Suppress info logs (only warnings and errors)
    #[arg(short, long)]
    quiet: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {e:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let args = Cli::parse();

    let default_filter = if args.quiet {
        "warn"
    } else if args.verbose {
        "debug"
    } else {
        "info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = build_config(&args)?;
    validate_config(&config).context("Configuration validation failed")?;

    let cancel = CancellationToken::new();
    spawn_signal_handler(cancel.clone());

    let fetcher: Arc<dyn Fetcher> = Arc::new(HttpFetcher::new(&config.http, cancel.clone()));
    let extractor = create_extractor(config.extractor);
    let runner = ScrapeRunner::new(config.clone(), fetcher, extractor).with_cancellation(cancel);

    let outcome = runner.run().await;
    print_report(&outcome);

    let stem = config
        .output
        .artifact_stem(&config.scrape.query, config.scrape.sort);
    let sink = JsonFileSink::new(config.output.dir.clone());
    let path = sink
        .persist(&outcome.packages, &stem)
        .await
        .context("Failed to write artifact")?;
    info!("Results saved to {}", path.display());

    Ok(())
}

/// Resolve the run configuration: file/env layers first, CLI flags on top.
fn build_config(args: &Cli) -> Result<Config> {
    let config_path = args
        .config
        .clone()
        .or_else(|| std::env::var("PAKRAT_CONFIG").ok().map(PathBuf::from));

    let mut config = match config_path {
        Some(path) => load_config(&path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::default(),
    };

    config.scrape.query = args.query.clone();
    if let Some(pages) = args.pages {
        config.scrape.max_pages = pages;
    }
    if let Some(ref sort) = args.sort {
        config.scrape.sort = SortKey::parse(sort);
    }
    if let Some(workers) = args.workers {
        config.scrape.workers = workers;
    }
    if let Some(ref dir) = args.output_dir {
        config.output.dir = dir.clone();
    }

    Ok(config)
}

fn spawn_signal_handler(cancel: CancellationToken) {
    tokio::spawn(async move {
        shutdown_signal().await;
        warn!("Interrupt received, abandoning remaining work");
        cancel.cancel();
    });
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Console summary: run counters plus the top ten packages in final order.
fn print_report(outcome: &RunOutcome) {
    let summary = &outcome.summary;
    println!(
        "Enriched {} of {} packages across {} pages in {:.1}s",
        summary.enriched,
        summary.discovered,
        summary.pages_scraped,
        summary.duration_ms as f64 / 1000.0
    );
    if summary.cancelled {
        println!("(run was interrupted; results are partial)");
    }
    println!();

    for (i, package) in outcome.packages.iter().take(10).enumerate() {
        println!("{}. {} ({})", i + 1, package.name, package.version);
        println!("   Size: {} bytes, Files: {}", package.size, package.files);
        println!("   Downloads: {}/week", package.downloads_weekly);
        println!("   Dependents: {}", package.dependents);
        println!("   Published: {}", package.last_publish);
        println!();
    }
}
