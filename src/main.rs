//! social-harvest CLI - content collection command line interface.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use social_harvest::{
    platforms::registry,
    proxy::{default_sources, JsonFileStore, Prober, ProxyPool},
    Collector, FetchClient, HarvestConfig, KeywordTaxonomy, MemorySink, SearchAggregator,
};

/// social-harvest - best-effort social content collector
#[derive(Parser)]
#[command(name = "social-harvest")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a collection session
    Collect(CollectArgs),

    /// Discover and probe proxies, printing the working set
    Probe(ProbeArgs),

    /// List platforms and proxy sources
    Sources,
}

#[derive(Parser)]
struct CollectArgs {
    /// Stop after this many records
    #[arg(short, long, default_value = "100")]
    target: usize,

    /// Maximum concurrent query tasks
    #[arg(short, long, default_value = "10")]
    concurrency: usize,

    /// Result pages to fetch per query
    #[arg(short, long, default_value = "1")]
    pages: usize,

    /// Route requests through discovered proxies
    #[arg(long)]
    proxies: bool,

    /// Use a single manual proxy (e.g. http://127.0.0.1:8080)
    #[arg(long, conflicts_with = "proxies")]
    proxy: Option<String>,

    /// Output format
    #[arg(short, long, default_value = "text")]
    format: OutputFormat,
}

#[derive(Parser)]
struct ProbeArgs {
    /// Probe timeout in seconds
    #[arg(short, long, default_value = "5")]
    timeout: u64,

    /// Persist the working set to a JSON file
    #[arg(short, long)]
    output: Option<std::path::PathBuf>,

    /// Output format
    #[arg(short, long, default_value = "text")]
    format: OutputFormat,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Human-readable text output
    Text,
    /// JSON output
    Json,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.verbose {
        let subscriber = FmtSubscriber::builder()
            .with_max_level(Level::DEBUG)
            .finish();
        tracing::subscriber::set_global_default(subscriber)?;
    }

    match cli.command {
        Commands::Collect(args) => run_collect(args).await,
        Commands::Probe(args) => run_probe(args).await,
        Commands::Sources => list_sources(),
    }
}

async fn run_collect(args: CollectArgs) -> Result<()> {
    let mut config = HarvestConfig::new()
        .with_target_count(args.target)
        .with_concurrency(args.concurrency)
        .with_proxy_enabled(args.proxies || args.proxy.is_some());
    if let Some(proxy_url) = &args.proxy {
        config = config.with_manual_proxy(proxy_url);
    }

    let mut client = FetchClient::new(&config)?;

    let pool = if let Some(proxy_url) = &config.manual_proxy {
        Some(Arc::new(ProxyPool::manual(proxy_url)?))
    } else if config.proxy_enabled {
        let pool = ProxyPool::new()?
            .with_refresh_interval(config.proxy_refresh_interval)
            .with_prober(
                Prober::new()
                    .with_timeout(config.probe_timeout)
                    .with_concurrency(config.probe_concurrency),
            );
        Some(Arc::new(pool))
    } else {
        None
    };
    if let Some(pool) = &pool {
        client = client.with_pool(Arc::clone(pool));
    }

    let aggregator = Arc::new(SearchAggregator::new(Arc::new(client)));
    let taxonomy = KeywordTaxonomy::default_monitoring();
    let mut collector =
        Collector::new(aggregator, taxonomy, &config)?.with_pages_per_query(args.pages);
    if let Some(pool) = pool {
        // The session refreshes a stale pool once before scheduling.
        collector = collector.with_proxy_pool(pool);
    }

    let sink = MemorySink::new();
    let report = collector.run(&sink).await?;

    match args.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&sink.records())?);
        }
        OutputFormat::Text => {
            println!("\nCollection finished in {:.1}s", report.elapsed.as_secs_f64());
            println!("  records collected: {}", report.records_collected);
            println!("  records stored:    {}", report.records_stored);
            println!("  tasks completed:   {}", report.tasks_completed);
            println!("  tasks cancelled:   {}", report.tasks_cancelled);
            println!();
            for record in sink.records() {
                println!(
                    "[{}/{}] {}",
                    record.platform, record.content_type, record.title
                );
                println!("  {}", record.url);
                println!("  keywords: {}", record.keywords.join(", "));
            }
        }
    }

    Ok(())
}

async fn run_probe(args: ProbeArgs) -> Result<()> {
    let mut pool = ProxyPool::new()?
        .with_prober(Prober::new().with_timeout(Duration::from_secs(args.timeout)));
    if let Some(path) = &args.output {
        pool = pool.with_store(Arc::new(JsonFileStore::new(path)));
    }
    let working = pool.refresh().await;

    match args.format {
        OutputFormat::Json => {
            let snapshot = pool.snapshot().await;
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
        }
        OutputFormat::Text => {
            println!("{} working proxies", working);
            for candidate in pool.snapshot().await {
                println!(
                    "  {} ({}, tls: {})",
                    candidate.key(),
                    candidate.source,
                    candidate.supports_tls
                );
            }
        }
    }

    Ok(())
}

fn list_sources() -> Result<()> {
    println!("Platforms:");
    for platform in registry() {
        println!("  {}", platform.name());
    }
    println!();
    println!("Search backends (priority order):");
    for backend in social_harvest::engines::default_backends() {
        println!("  {}", backend.name());
    }
    println!();
    println!("Proxy sources:");
    for source in default_sources() {
        println!("  {}", source.name());
    }
    Ok(())
}
