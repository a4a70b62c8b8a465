//! Contact CLI
//!
//! Inspect and exercise the presence cache that throttles contact requests.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use rand::Rng;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use contact_cache::{CacheConfig, PresenceCache, RequestThrottle};
use contact_core::ContactError;

/// Contact - request throttle backed by a TTL presence cache
#[derive(Parser)]
#[command(name = "contact")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(flatten)]
    cache: CacheArgs,

    #[command(subcommand)]
    command: Commands,
}

/// Cache settings. Unset values fall back to the config file, or to the
/// `CONTACT_CACHE_*` environment (and `.env`) and built-in defaults.
#[derive(Args, Default)]
struct CacheArgs {
    /// JSON config file (`ttl_ms`, `reap_interval_ms`, `max_entries`)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Time-to-live in milliseconds
    #[arg(long, global = true)]
    ttl_ms: Option<u64>,
    /// Sweep period in milliseconds (defaults to ttl / 10 when --ttl-ms is given)
    #[arg(long, global = true)]
    reap_interval_ms: Option<u64>,
    /// Maximum remembered identities (0 = unbounded)
    #[arg(long, global = true)]
    max_entries: Option<usize>,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate and print the effective cache configuration
    Config,

    /// Push random identities through the request throttle
    Simulate {
        /// Number of requests to send
        #[arg(short, long, default_value = "1000")]
        requests: usize,
        /// Number of distinct identities
        #[arg(short, long, default_value = "50")]
        identities: usize,
        /// Delay between requests in milliseconds
        #[arg(short, long, default_value = "1")]
        spacing_ms: u64,
    },

    /// Time cache operations
    Bench {
        /// Number of operations per measurement
        #[arg(short, long, default_value = "100000")]
        count: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        "contact=debug,info"
    } else {
        "contact=info,warn"
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = resolve_config(&cli.cache)?;

    match cli.command {
        Commands::Config => cmd_config(&config),
        Commands::Simulate { requests, identities, spacing_ms } => {
            cmd_simulate(config, requests, identities, spacing_ms).await
        }
        Commands::Bench { count } => cmd_bench(config, count),
    }
}

/// Base config (file or environment) with command-line overrides applied,
/// validated once at the end.
fn resolve_config(args: &CacheArgs) -> Result<CacheConfig> {
    let base = match &args.config {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            CacheConfig::load_json(&raw).context("Failed to parse cache configuration")?
        }
        None => CacheConfig::load_env().context("Failed to load cache configuration")?,
    };

    let config = apply_overrides(base, args);
    config.validate().context("Invalid cache configuration")?;
    Ok(config)
}

fn apply_overrides(mut config: CacheConfig, args: &CacheArgs) -> CacheConfig {
    if let Some(ttl) = args.ttl_ms {
        config = CacheConfig::from_time_limit(Duration::from_millis(ttl))
            .with_max_entries(config.max_entries);
    }
    if let Some(reap) = args.reap_interval_ms {
        config = config.with_reap_interval(Duration::from_millis(reap));
    }
    if let Some(max) = args.max_entries {
        config = config.with_max_entries(max);
    }
    config
}

/// Print effective configuration
fn cmd_config(config: &CacheConfig) -> Result<()> {
    println!("{}", "⚙️  Cache configuration".cyan().bold());
    println!("{}", serde_json::to_string_pretty(config)?);
    println!("\n{}", "✅ Configuration is valid".green());
    Ok(())
}

/// Simulate request traffic
async fn cmd_simulate(
    config: CacheConfig,
    requests: usize,
    identities: usize,
    spacing_ms: u64,
) -> Result<()> {
    anyhow::ensure!(identities > 0, "--identities must be at least 1");

    println!(
        "{} {} requests from {} identities",
        "📨 Simulating".cyan().bold(),
        requests,
        identities
    );
    println!(
        "   {} ttl={:?} reap={:?} max_entries={}",
        "Cache:".dimmed(),
        config.ttl,
        config.reap_interval,
        config.max_entries
    );

    let cache = PresenceCache::with_config(config).context("Failed to create presence cache")?;
    let throttle = RequestThrottle::new(cache);

    let pb = ProgressBar::new(requests as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} ({eta})")?
            .progress_chars("#>-"),
    );

    let mut rng = rand::thread_rng();
    let mut admitted = 0usize;
    let mut throttled = 0usize;

    for _ in 0..requests {
        let identity = format!("user{}@example.com", rng.gen_range(0..identities));
        match throttle.admit(&identity) {
            Ok(()) => admitted += 1,
            Err(ContactError::Throttled(_)) => throttled += 1,
            Err(e) => return Err(e.into()),
        }
        pb.inc(1);
        if spacing_ms > 0 {
            tokio::time::sleep(Duration::from_millis(spacing_ms)).await;
        }
    }
    pb.finish();

    let stats = throttle.store().stats();
    throttle.store().destroy();

    println!("\n{}", "📈 Results:".green().bold());
    println!("   {} {}", "Admitted:".green(), admitted);
    println!("   {} {}", "Throttled:".yellow(), throttled);
    println!("\n{}", "Cache stats (JSON):".yellow().bold());
    println!("{}", serde_json::to_string_pretty(&stats)?);

    Ok(())
}

/// Run benchmarks
fn cmd_bench(config: CacheConfig, count: usize) -> Result<()> {
    println!("{} {} operations", "📊 Benchmarking with".cyan().bold(), count);

    let cache = PresenceCache::with_config(config).context("Failed to create presence cache")?;
    let keys: Vec<String> = (0..count).map(|i| format!("user{}@example.com", i)).collect();

    println!("\n{}", "1. Adding...".dimmed());
    let start = Instant::now();
    for key in &keys {
        cache.add(key);
    }
    let add_time = start.elapsed();
    println!("   ✓ {} adds: {:?}", count, add_time);

    println!("\n{}", "2. Looking up...".dimmed());
    let start = Instant::now();
    let hits = keys.iter().filter(|k| cache.exists(k)).count();
    let exists_time = start.elapsed();
    println!("   ✓ {} lookups ({} hits): {:?}", count, hits, exists_time);

    println!("\n{}", "3. Sweeping...".dimmed());
    let start = Instant::now();
    let removed = cache.reap_expired();
    println!("   ✓ Sweep removed {}: {:?}", removed, start.elapsed());

    cache.destroy();

    let per_op = |d: Duration| d.as_nanos() as f64 / count.max(1) as f64;
    println!("\n{}", "📈 Results:".green().bold());
    println!("   Add: {:.0} ns/op", per_op(add_time));
    println!("   Exists: {:.0} ns/op", per_op(exists_time));
    println!("   Final size: {} (capacity {})", cache.len(), cache.config().max_entries);

    Ok(())
}
