//! Topchart CLI - per-category App Store top-chart CSVs
//!
//! # Main Command
//!
//! ```bash
//! topchart run categories.csv          # Full pipeline, one CSV per category
//! ```
//!
//! # Debug Commands (for development)
//!
//! ```bash
//! topchart resolve "Food & Drink"      # Show the resolved genre id
//! topchart categories input.csv       # Show the parsed category list
//! topchart lookup 284882215            # Look up one app by id
//! ```

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;

use topchart::{
    genres, load_categories, DetailSource, Fetcher, LookupEnricher, RankMode, RetryPolicy,
    RunOptions, SourceMode,
};

#[derive(Parser)]
#[command(name = "topchart")]
#[command(about = "Assemble per-category App Store top-chart CSVs", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Full pipeline: category list -> ranked charts -> enriched CSVs
    Run {
        /// Input CSV with category labels
        input: PathBuf,

        /// Output directory for the per-category artifacts
        #[arg(short, long, default_value = "out")]
        out_dir: PathBuf,

        /// Two-letter storefront country code
        #[arg(short, long, default_value = "us")]
        country: String,

        /// Entries requested per category
        #[arg(short, long, default_value_t = 50)]
        limit: usize,

        /// Chart source variant
        #[arg(long, value_enum, default_value_t = SourceArg::Feeds)]
        source: SourceArg,

        /// Rank policy for entries without an app id
        #[arg(long, value_enum, default_value_t = RankArg::Compact)]
        rank_mode: RankArg,

        /// Minimum milliseconds between enrichment lookups
        #[arg(long, default_value_t = 400)]
        delay_ms: u64,

        /// Recover missing app ids via the search endpoint
        #[arg(long)]
        search_fallback: bool,
    },

    /// Resolve a category label to its genre id
    Resolve {
        /// Free-text category label
        category: String,
    },

    /// Parse an input file and list the categories it yields
    Categories {
        /// Input CSV with category labels
        input: PathBuf,
    },

    /// Look up one app by id and print its detail record
    Lookup {
        /// Marketplace app id
        app_id: String,

        /// Two-letter storefront country code
        #[arg(short, long, default_value = "us")]
        country: String,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum SourceArg {
    /// Genre feed with country-wide fallback
    Feeds,
    /// HTML chart page scrape
    Web,
}

#[derive(Clone, Copy, ValueEnum)]
enum RankArg {
    /// Contiguous ranks after dropping id-less entries
    Compact,
    /// Source positions preserved, gaps allowed
    SourceOrder,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "topchart=info".into()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            input,
            out_dir,
            country,
            limit,
            source,
            rank_mode,
            delay_ms,
            search_fallback,
        } => {
            cmd_run(
                &input,
                RunOptions {
                    country,
                    limit,
                    source_mode: match source {
                        SourceArg::Feeds => SourceMode::Feeds,
                        SourceArg::Web => SourceMode::Web,
                    },
                    rank_mode: match rank_mode {
                        RankArg::Compact => RankMode::Compact,
                        RankArg::SourceOrder => RankMode::SourceOrder,
                    },
                    enrich_delay: Duration::from_millis(delay_ms),
                    out_dir,
                    search_fallback,
                    retry: RetryPolicy::default(),
                },
            )
            .await
        }

        Commands::Resolve { category } => cmd_resolve(&category),

        Commands::Categories { input } => cmd_categories(&input),

        Commands::Lookup { app_id, country } => cmd_lookup(&app_id, &country).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn cmd_run(
    input: &std::path::Path,
    options: RunOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("Processing: {}", input.display());

    let summary = topchart::run(input, &options).await?;

    eprintln!();
    eprintln!("Categories processed: {}", summary.categories);
    eprintln!("Artifacts written:    {}", summary.artifacts.len());
    eprintln!("Rows written:         {}", summary.rows);
    if !summary.skipped.is_empty() {
        eprintln!("Skipped:              {}", summary.skipped.join(", "));
    }
    for path in &summary.artifacts {
        eprintln!("  {}", path.display());
    }
    eprintln!("Done.");

    Ok(())
}

fn cmd_resolve(category: &str) -> Result<(), Box<dyn std::error::Error>> {
    match genres::resolve(category) {
        Some(gid) => println!("{gid}"),
        None => {
            eprintln!("'{category}' does not resolve to a genre");
            std::process::exit(1);
        }
    }
    Ok(())
}

fn cmd_categories(input: &std::path::Path) -> Result<(), Box<dyn std::error::Error>> {
    let categories = load_categories(input)?;
    eprintln!("{} categories:", categories.len());
    for category in &categories {
        let genre = genres::resolve(category)
            .map(|gid| gid.to_string())
            .unwrap_or_else(|| "unresolved".to_string());
        println!("{category}\t{genre}");
    }
    Ok(())
}

async fn cmd_lookup(app_id: &str, country: &str) -> Result<(), Box<dyn std::error::Error>> {
    let fetcher = Fetcher::new(RetryPolicy::default())?;
    let enricher = LookupEnricher::new(&fetcher);

    match enricher.lookup(app_id, country).await {
        Some(detail) => {
            println!("{}", serde_json::to_string_pretty(&detail)?);
            Ok(())
        }
        None => {
            eprintln!("No detail record for app id {app_id}");
            std::process::exit(1);
        }
    }
}
