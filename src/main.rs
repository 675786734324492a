//! Homespace main entry point
//!
//! This is the command-line interface for the Homespace ad crawler. Records
//! are written to stdout as JSON lines; logs go to stderr.

use anyhow::Context;
use clap::Parser;
use homespace::config::{load_config_with_hash, Config};
use homespace::crawler::CrawlController;
use homespace::query::{Overrides, PageSelection};
use std::io::Write;
use std::path::PathBuf;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Homespace: a classified-ad crawler
///
/// Builds a search from the site configuration and the given overrides,
/// walks the listing pages and extracts one record per ad.
#[derive(Parser, Debug)]
#[command(name = "homespace")]
#[command(version = "1.0.0")]
#[command(about = "A classified-ad crawler", long_about = None)]
struct Cli {
    /// Path to TOML site configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Ad category to crawl (a [categories.<name>] table in the config)
    #[arg(short, long)]
    category: Option<String>,

    /// Override a query parameter, e.g. -a text=sneakers -a price-min=10
    #[arg(short = 'a', long = "arg", value_name = "KEY=VALUE", value_parser = parse_key_val)]
    args: Vec<(String, String)>,

    /// Request listing pages 1 through N
    #[arg(
        long,
        value_name = "N",
        conflicts_with = "page",
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pages: Option<u32>,

    /// Request this listing page (repeatable)
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u32).range(1..))]
    page: Vec<u32>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Show the listing URLs that would be requested and exit
    #[arg(long)]
    dry_run: bool,
}

fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", s))?;
    if key.trim().is_empty() {
        return Err(format!("empty key in '{}'", s));
    }
    Ok((key.trim().to_string(), value.to_string()))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", hash);

    let overrides: Overrides = cli.args.iter().cloned().collect();
    let pages = page_selection(&cli, &config);

    let controller = CrawlController::from_config(&config, cli.category.as_deref())?;

    if cli.dry_run {
        handle_dry_run(&controller, &overrides, &pages);
        return Ok(());
    }

    handle_crawl(&controller, &overrides, &pages).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("homespace=info,warn"),
            1 => EnvFilter::new("homespace=debug,info"),
            2 => EnvFilter::new("homespace=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Explicit page numbers win over `--pages`, which wins over the config
fn page_selection(cli: &Cli, config: &Config) -> PageSelection {
    if !cli.page.is_empty() {
        PageSelection::Pages(cli.page.clone())
    } else {
        PageSelection::Count(cli.pages.unwrap_or(config.query.page_count))
    }
}

/// Handles the --dry-run mode: prints the listing URLs
fn handle_dry_run(controller: &CrawlController, overrides: &Overrides, pages: &PageSelection) {
    println!("=== Homespace Dry Run ===\n");
    println!(
        "Category: {}",
        controller.profile().category().unwrap_or("(generic)")
    );
    println!("Record fields:");
    for (field, reducer) in controller.profile().schema().iter() {
        println!("  - {} ({})", field, reducer);
    }
    println!("\nListing pages:");
    for url in controller.listing_urls(overrides, pages) {
        println!("  {}", url);
    }
}

/// Handles the main crawl operation, streaming records to stdout
async fn handle_crawl(
    controller: &CrawlController,
    overrides: &Overrides,
    pages: &PageSelection,
) -> anyhow::Result<()> {
    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, finishing in-flight work");
            on_interrupt.cancel();
        }
    });

    let (tx, mut rx) = mpsc::unbounded_channel();

    let writer = async move {
        let stdout = std::io::stdout();
        while let Some(record) = rx.recv().await {
            let mut out = stdout.lock();
            serde_json::to_writer(&mut out, &record)?;
            writeln!(out)?;
        }
        anyhow::Ok(())
    };

    let (summary, written) = tokio::join!(controller.run(overrides, pages, tx, cancel), writer);
    written.context("Failed to write records")?;
    let summary = summary?;

    if summary.records_emitted == 0 {
        tracing::warn!("No records extracted; check the category selectors");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_key_val() {
        assert_eq!(
            parse_key_val("text=air max").unwrap(),
            ("text".to_string(), "air max".to_string())
        );
        assert_eq!(
            parse_key_val("price=10-50").unwrap(),
            ("price".to_string(), "10-50".to_string())
        );
        assert!(parse_key_val("text").is_err());
        assert!(parse_key_val("=x").is_err());
    }

    #[test]
    fn test_cli_parses() {
        let cli = Cli::try_parse_from([
            "homespace",
            "site.toml",
            "--category",
            "shoes",
            "-a",
            "text=boots",
            "--page",
            "2",
            "--page",
            "5",
        ])
        .unwrap();
        assert_eq!(cli.category.as_deref(), Some("shoes"));
        assert_eq!(cli.args.len(), 1);
        assert_eq!(cli.page, vec![2, 5]);

        assert!(Cli::try_parse_from(["homespace", "site.toml", "--pages", "2", "--page", "1"]).is_err());
    }

    #[test]
    fn test_page_zero_rejected() {
        assert!(Cli::try_parse_from(["homespace", "site.toml", "--pages", "0"]).is_err());
        assert!(Cli::try_parse_from(["homespace", "site.toml", "--page", "0"]).is_err());

        let cli = Cli::try_parse_from(["homespace", "site.toml", "--pages", "3"]).unwrap();
        assert_eq!(cli.pages, Some(3));
    }
}
