//! # Topchart - resilient App Store top-chart aggregation
//!
//! Topchart assembles per-category "top chart" rankings from several
//! unreliable, rate-limited public data sources and writes one CSV
//! artifact per category.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌───────────────┐   ┌─────────────┐
//! │ Category CSV │──▶│ GenreResolver│──▶│ Source chain  │──▶│ Enrichment  │
//! │ (auto-enc)   │   │ (fuzzy)      │   │ (first wins)  │   │ (lookup API)│
//! └──────────────┘   └──────────────┘   └───────────────┘   └──────┬──────┘
//!                                                                  │
//!                                                         ┌────────▼────────┐
//!                                                         │ topchart_*.csv  │
//!                                                         │ (one/category)  │
//!                                                         └─────────────────┘
//! ```
//!
//! Every upstream request goes through a retrying fetcher with
//! exponential backoff; every failure degrades to "no data" and the
//! run always completes.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use topchart::{run, RunOptions};
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() {
//!     let summary = run(Path::new("categories.csv"), &RunOptions::default())
//!         .await
//!         .unwrap();
//!     println!("{} artifacts written", summary.artifacts.len());
//! }
//! ```
//!
//! ## Modules
//!
//! - [`error`] - hierarchical error types
//! - [`fetch`] - retrying HTTP layer and request gate
//! - [`genres`] - canonical genre table and fuzzy resolver
//! - [`categories`] - category list input
//! - [`chart`] - chart sources and the fallback chain
//! - [`enrich`] - per-app detail lookup and the id search fallback
//! - [`output`] - row assembly and CSV artifacts
//! - [`pipeline`] - the sequential driver

// Core modules
pub mod error;
pub mod fetch;
pub mod genres;

// Input
pub mod categories;

// Chart sources
pub mod chart;

// Enrichment
pub mod enrich;

// Output
pub mod output;

// Driver
pub mod pipeline;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    ChartError, FetchError, InputError, LookupError, PipelineError, WriteError,
};

// =============================================================================
// Re-exports - Fetch layer
// =============================================================================

pub use fetch::{classify, Disposition, Fetcher, RequestGate, RetryPolicy};

// =============================================================================
// Re-exports - Genres
// =============================================================================

pub use genres::{resolve, GenreId, GENRE_TABLE};

// =============================================================================
// Re-exports - Input
// =============================================================================

pub use categories::{load_categories, parse_categories};

// =============================================================================
// Re-exports - Chart sources
// =============================================================================

pub use chart::{
    dedup_entries, first_non_empty, ChartEntry, ChartQuery, ChartSource,
    CountryTopFreeSource, GenreFeedSource, HttpSource, WebChartSource,
};

// =============================================================================
// Re-exports - Enrichment
// =============================================================================

pub use enrich::{
    AppDetail, DetailSource, IdResolver, LookupEnricher, NoFallback, SearchIdResolver,
};

// =============================================================================
// Re-exports - Output
// =============================================================================

pub use output::{assemble, safe_file_stem, write_category, OutputRow};

// =============================================================================
// Re-exports - Pipeline
// =============================================================================

pub use pipeline::{run, RankMode, RunOptions, RunSummary, SourceMode};
