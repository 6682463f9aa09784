//! Catalog-Scout main entry point
//!
//! This is the command-line interface for the Catalog-Scout product page crawler.

use anyhow::Context;
use catalog_scout::config::{load_config_with_hash, Config};
use catalog_scout::crawler::{crawl, CrawlTask};
use catalog_scout::output::{handlers_from_config, write_outputs};
use catalog_scout::url::ProductClassifier;
use clap::Parser;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Catalog-Scout: a product page discovery crawler
///
/// Catalog-Scout walks the internal links of each seed site up to a fixed
/// depth and records every page whose URL looks like a product detail page.
#[derive(Parser, Debug)]
#[command(name = "catalog-scout")]
#[command(version = "1.0.0")]
#[command(about = "A product page discovery crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long)]
    dry_run: bool,

    /// Number of domains crawled at the same time
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u64).range(1..=64))]
    pool_size: Option<u64>,

    /// Maximum link depth for every seed, replacing per-seed depths
    #[arg(long, value_name = "N")]
    max_depth: Option<u32>,

    /// Write the JSON report here instead of the configured path
    #[arg(short, long, value_name = "PATH")]
    output: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (mut config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    apply_overrides(&mut config, &cli);

    if cli.dry_run {
        handle_dry_run(&config, cli.output.as_deref())
    } else {
        handle_crawl(config, config_hash, cli.output.as_deref()).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("catalog_scout=info,warn"),
            1 => EnvFilter::new("catalog_scout=debug,info"),
            2 => EnvFilter::new("catalog_scout=trace,debug"),
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

/// Applies command-line limits on top of the loaded configuration
fn apply_overrides(config: &mut Config, cli: &Cli) {
    if let Some(pool_size) = cli.pool_size {
        config.crawler.pool_size = pool_size as usize;
    }

    if let Some(max_depth) = cli.max_depth {
        config.crawler.max_depth = max_depth;
        for seed in &mut config.seeds {
            seed.max_depth = None;
        }
    }
}

/// Handles the --dry-run mode: validates config and shows what would be crawled
fn handle_dry_run(config: &Config, output_override: Option<&str>) -> anyhow::Result<()> {
    let classifier = ProductClassifier::from_config(config)?;
    let tasks = CrawlTask::from_config(config);

    println!("=== Catalog-Scout Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Max depth: {}", config.crawler.max_depth);
    println!("  Max retries: {}", config.crawler.max_retries);
    println!("  Base delay: {}ms", config.crawler.base_delay_ms);
    println!("  Fetch timeout: {}ms", config.crawler.fetch_timeout_ms);
    println!("  Pool size: {}", config.crawler.pool_size);
    println!("  Traversal: {:?}", config.crawler.traversal);
    println!("  Max in flight per domain: {}", config.crawler.max_in_flight);
    match config.crawler.domain_deadline_secs {
        Some(secs) => println!("  Domain deadline: {}s", secs),
        None => println!("  Domain deadline: none"),
    }

    println!("\nUser Agent:");
    println!("  {}", config.user_agent.header_value());
    println!("  Accept-Language: {}", config.user_agent.accept_language);

    println!("\nOutput:");
    println!(
        "  Report: {}{}",
        output_override.unwrap_or(&config.output.report_path),
        if config.output.flat { " (flat)" } else { "" }
    );
    if let Some(summary) = &config.output.summary_path {
        println!("  Summary: {}", summary);
    }

    println!("\nSeeds ({}):", tasks.len());
    for task in &tasks {
        let patterns = classifier.patterns_for(&task.report_key());
        println!(
            "  - {} (depth {}, patterns: {})",
            task.seed_url,
            task.max_depth,
            patterns.sources().join(", ")
        );
    }

    println!("\nDomain Patterns ({}):", classifier.entries().len());
    for (hostname, patterns) in classifier.entries() {
        println!("  - {}: {}", hostname, patterns.sources().join(", "));
    }
    println!(
        "  - (default): {}",
        classifier.default_patterns().sources().join(", ")
    );

    println!("\n✓ Configuration is valid");
    println!("✓ Would start crawling {} domains", tasks.len());

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(
    config: Config,
    config_hash: String,
    output_override: Option<&str>,
) -> anyhow::Result<()> {
    tracing::info!(
        "Seeds: {}, pool size: {}, traversal: {:?}",
        config.seeds.len(),
        config.crawler.pool_size,
        config.crawler.traversal
    );

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, stopping crawls and keeping partial results");
            interrupt.cancel();
        }
    });

    let handlers = handlers_from_config(&config.output, output_override);
    let report = crawl(&config, Some(config_hash), cancel)
        .await
        .context("crawl failed")?;

    write_outputs(&handlers, &report).context("failed to write report")?;

    println!(
        "Crawled {} domains ({} failed): {} product URLs",
        report.len(),
        report.failed_count(),
        report.total_products()
    );
    println!(
        "Report written to: {}",
        output_override.unwrap_or(&config.output.report_path)
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_overrides() {
        let cli = Cli::parse_from([
            "catalog-scout",
            "scout.toml",
            "-vv",
            "--pool-size",
            "2",
            "--max-depth",
            "1",
            "--output",
            "out.json",
        ]);

        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.pool_size, Some(2));
        assert_eq!(cli.max_depth, Some(1));
        assert_eq!(cli.output.as_deref(), Some("out.json"));
    }

    #[test]
    fn test_cli_rejects_zero_pool() {
        assert!(Cli::try_parse_from(["catalog-scout", "scout.toml", "--pool-size", "0"]).is_err());
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        assert!(Cli::try_parse_from(["catalog-scout", "scout.toml", "-q", "-v"]).is_err());
    }
}

