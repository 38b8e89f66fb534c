//! Lumi main entry point
//!
//! This is the command-line interface for the Lumi image board downloader.

use anyhow::Context;
use clap::Parser;
use lumi::config::{load_config_with_hash, Config};
use lumi::crawler::{run_crawl, select_strategy};
use lumi::output::{print_statistics, CrawlStatistics, OutputLayout};
use lumi::server::{serve, ControlState};
use lumi::Coordinator;
use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Lumi: a tag-filtered image board downloader
///
/// Lumi searches an image board for up to two tags, filters posts by
/// required and ignored tags, and saves each matching image next to a
/// caption file listing its tags.
#[derive(Parser, Debug)]
#[command(name = "lumi")]
#[command(version = "1.0.0")]
#[command(about = "A tag-filtered image board downloader", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG", default_value = "lumi.toml")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Delete a project's output directory and exit
    #[arg(long, value_name = "PROJECT", conflicts_with_all = ["serve", "dry_run"])]
    clean: Option<String>,

    /// Do not write caption files
    #[arg(long)]
    no_text: bool,

    /// Start the HTTP control server instead of running the configured job
    #[arg(long, conflicts_with = "dry_run")]
    serve: bool,

    /// Port for the control server
    #[arg(long, default_value_t = 8080)]
    port: u16,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // The server and --clean can run on defaults; a crawl needs a job
    let needs_job = cli.clean.is_none() && !cli.serve;
    let mut config = if needs_job || cli.config.exists() {
        load(&cli.config)?
    } else {
        tracing::info!(
            "No configuration at {}, using defaults",
            cli.config.display()
        );
        Config::default()
    };

    if cli.no_text {
        config.crawler.captions = false;
    }

    if let Some(project) = cli.clean.as_deref() {
        handle_clean(&config, project)
    } else if cli.dry_run {
        handle_dry_run(&config)
    } else if cli.serve {
        handle_serve(config, cli.port).await
    } else {
        handle_crawl(config).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("lumi=info,warn"),
            1 => EnvFilter::new("lumi=debug,info"),
            2 => EnvFilter::new("lumi=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Loads and validates the configuration file
fn load(path: &std::path::Path) -> anyhow::Result<Config> {
    tracing::info!("Loading configuration from: {}", path.display());
    let (config, hash) = load_config_with_hash(path)
        .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", hash);
    Ok(config)
}

/// Handles --clean: removes a project's output directory
fn handle_clean(config: &Config, project: &str) -> anyhow::Result<()> {
    let layout = OutputLayout::new(&config.crawler.output_root);
    let dir = layout.project_dir(project);

    if layout.clean_project(project)? {
        println!("Deleted {}", dir.display());
    } else {
        println!("Nothing to delete at {}", dir.display());
    }
    Ok(())
}

/// Handles the --dry-run mode: validates config and shows what would be crawled
fn handle_dry_run(config: &Config) -> anyhow::Result<()> {
    let job = config.job()?;
    let settings = &config.crawler;

    println!("=== Lumi Dry Run ===\n");

    println!("Job:");
    println!("  Project: {}", job.project);
    println!("  Search tags: {}", job.tags.join(" "));
    println!("  Required tags: {:?}", job.and_tags);
    println!("  Ignored tags: {:?}", job.ignore_tags);
    println!("  Requested images: {}", job.requested_media);

    println!("\nCrawler:");
    println!("  Board: {}", settings.base_url);
    println!("  Page capacity: {}", settings.page_capacity);
    println!("  Page workers: {}", settings.page_workers);
    println!("  Link workers: {}", settings.link_workers);
    println!(
        "  Retries: {} attempts, {}-{}ms apart",
        settings.max_attempts, settings.min_delay_ms, settings.max_delay_ms
    );
    println!("  Captions: {}", settings.captions);

    println!("\nOutput:");
    println!(
        "  {}",
        std::path::Path::new(&settings.output_root)
            .join(&job.project)
            .display()
    );

    println!("\n✓ Configuration is valid");
    println!(
        "✓ Would start with {:?}",
        select_strategy(job.requested_media, settings.page_capacity)
    );

    Ok(())
}

/// Handles --serve: runs the control server until interrupted
async fn handle_serve(config: Config, port: u16) -> anyhow::Result<()> {
    let coordinator = Coordinator::new(config.crawler)?;
    let state = Arc::new(ControlState::new(coordinator));
    let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, port));

    serve(state, addr)
        .await
        .with_context(|| format!("Control server on port {} failed", port))
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config) -> anyhow::Result<()> {
    let progress = match run_crawl(config).await {
        Ok(progress) => progress,
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            return Err(e.into());
        }
    };

    let stats = CrawlStatistics::from_snapshot(&progress.snapshot(), chrono::Utc::now());
    println!();
    print_statistics(&stats);

    Ok(())
}
