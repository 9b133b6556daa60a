//! Pipeline driver: category iteration and per-category state machine.
//!
//! Per category: resolve genre, run the source chain, enrich each
//! entry under the request gate, assemble rows, persist one artifact.
//! A category with no entries from any source is skipped and logged;
//! nothing a single category does can abort the run. Execution is
//! strictly sequential - one category, one source attempt, one lookup
//! at a time - to respect upstream rate limits.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::categories;
use crate::chart::{self, ChartQuery, ChartSource, HttpSource};
use crate::enrich::{DetailSource, IdResolver, LookupEnricher, NoFallback, SearchIdResolver};
use crate::error::PipelineResult;
use crate::fetch::{Fetcher, RequestGate, RetryPolicy};
use crate::genres::{self, GenreId};
use crate::output::{self, OutputRow};

// =============================================================================
// Options
// =============================================================================

/// Which chart pipeline variant to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceMode {
    /// Genre feed with country-wide fallback.
    Feeds,
    /// HTML chart page scrape.
    Web,
}

/// How ranks behave when entries without a resolvable app id are
/// dropped. Upstream behavior is inconsistent, so this is surfaced as
/// configuration rather than guessed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankMode {
    /// Recompute ranks after dropping: contiguous 1..=n.
    Compact,
    /// Keep each entry's source position: gaps allowed.
    SourceOrder,
}

/// Run configuration.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Two-letter storefront country code.
    pub country: String,
    /// Entries requested per category.
    pub limit: usize,
    /// Chart pipeline variant.
    pub source_mode: SourceMode,
    /// Rank policy for entries without an app id.
    pub rank_mode: RankMode,
    /// Minimum spacing between enrichment lookups.
    pub enrich_delay: Duration,
    /// Directory artifacts are written to.
    pub out_dir: PathBuf,
    /// Enable the best-effort search-by-name id fallback.
    pub search_fallback: bool,
    /// Retry policy for every upstream request.
    pub retry: RetryPolicy,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            country: "us".to_string(),
            limit: 50,
            source_mode: SourceMode::Feeds,
            rank_mode: RankMode::Compact,
            enrich_delay: Duration::from_millis(400),
            out_dir: PathBuf::from("out"),
            search_fallback: false,
            retry: RetryPolicy::default(),
        }
    }
}

// =============================================================================
// Summary
// =============================================================================

/// What one category produced.
#[derive(Debug)]
pub struct CategoryReport {
    pub category: String,
    pub rows: usize,
    pub artifact: Option<PathBuf>,
}

/// Outcome of a whole run. The driver always completes; failures
/// show up here as skipped categories, never as an error.
#[derive(Debug, Default)]
pub struct RunSummary {
    /// Categories processed, skipped ones included.
    pub categories: usize,
    /// Total rows written across all artifacts.
    pub rows: usize,
    /// Artifacts written, one per non-empty category.
    pub artifacts: Vec<PathBuf>,
    /// Categories that produced no artifact.
    pub skipped: Vec<String>,
}

// =============================================================================
// Driver
// =============================================================================

/// Run the full pipeline over a category list file.
///
/// The only failures surfaced here happen before any network
/// activity: an unreadable category list, an unusable output
/// directory, or an unbuildable HTTP client.
pub async fn run(input: &Path, options: &RunOptions) -> PipelineResult<RunSummary> {
    let categories = categories::load_categories(input)?;
    std::fs::create_dir_all(&options.out_dir)?;
    let fetcher = Fetcher::new(options.retry.clone())?;

    info!(count = categories.len(), "loaded categories");

    let mut summary = RunSummary::default();
    for category in &categories {
        info!(category, "processing category");
        let report = process_category(&fetcher, category, options).await;

        summary.categories += 1;
        match report.artifact {
            Some(path) => {
                summary.rows += report.rows;
                summary.artifacts.push(path);
            }
            None => summary.skipped.push(category.clone()),
        }
    }

    Ok(summary)
}

/// One iteration of the per-category state machine.
async fn process_category(
    fetcher: &Fetcher,
    category: &str,
    options: &RunOptions,
) -> CategoryReport {
    let genre_id = genres::resolve(category);
    if genre_id.is_none() {
        info!(category, "no genre id resolved, genre-scoped sources disabled");
    }

    let sources = match options.source_mode {
        SourceMode::Feeds => HttpSource::feed_chain(fetcher),
        SourceMode::Web => HttpSource::web_chain(fetcher),
    };
    let enricher = LookupEnricher::new(fetcher);

    let rows = if options.search_fallback {
        let resolver = SearchIdResolver::new(fetcher);
        collect_rows(category, genre_id, &sources, &enricher, &resolver, options).await
    } else {
        collect_rows(category, genre_id, &sources, &enricher, &NoFallback, options).await
    };

    let artifact = persist(category, &rows, &options.out_dir);
    CategoryReport {
        category: category.to_string(),
        rows: if artifact.is_some() { rows.len() } else { 0 },
        artifact,
    }
}

/// Chain, enrich and assemble all rows for one category.
///
/// Generic over the source list, detail source and id resolver so the
/// state machine is exercisable without a network.
pub async fn collect_rows<S, D, R>(
    category: &str,
    genre_id: Option<GenreId>,
    sources: &[S],
    details: &D,
    resolver: &R,
    options: &RunOptions,
) -> Vec<OutputRow>
where
    S: ChartSource,
    D: DetailSource,
    R: IdResolver,
{
    let query = ChartQuery {
        country: options.country.clone(),
        genre_id,
        limit: options.limit,
    };

    let entries = chart::first_non_empty(sources, &query).await;
    if entries.is_empty() {
        return Vec::new();
    }
    let entries = chart::dedup_entries(entries);

    let mut gate = RequestGate::new(options.enrich_delay);
    let mut emitted = HashSet::new();
    let mut rows = Vec::new();

    for (index, entry) in entries.iter().enumerate() {
        let app_id = match &entry.app_id {
            Some(id) => id.clone(),
            None => {
                let Some(name) = entry.name.as_deref() else {
                    warn!(category, position = index + 1, "entry has no id and no name, dropped");
                    continue;
                };
                // The search request counts against the same pacing
                // budget as the lookups.
                gate.wait().await;
                match resolver.find_id(name, &options.country).await {
                    Some(id) => {
                        debug!(category, name, id = %id, "app id recovered via search fallback");
                        id
                    }
                    None => {
                        warn!(category, name, "no app id recoverable, entry dropped");
                        continue;
                    }
                }
            }
        };

        // A recovered id can collide with one the source already
        // supplied; one row per app id per category.
        if !emitted.insert(app_id.clone()) {
            warn!(category, id = %app_id, "duplicate app id after fallback resolution, entry dropped");
            continue;
        }

        let rank = match options.rank_mode {
            RankMode::Compact => rows.len() + 1,
            RankMode::SourceOrder => index + 1,
        };

        gate.wait().await;
        let detail = details.lookup(&app_id, &options.country).await;

        rows.push(output::assemble(
            &options.country,
            category,
            genre_id,
            rank,
            &app_id,
            entry,
            detail.as_ref(),
        ));
    }

    rows
}

/// Persist a category's rows, if any.
///
/// An empty category writes nothing; a write failure is logged and
/// degrades to a skip. Either way the run continues.
fn persist(category: &str, rows: &[OutputRow], out_dir: &Path) -> Option<PathBuf> {
    if rows.is_empty() {
        info!(category, "no entries from any source, category skipped");
        return None;
    }

    match output::write_category(out_dir, category, rows) {
        Ok(path) => {
            info!(category, rows = rows.len(), path = %path.display(), "artifact written");
            Some(path)
        }
        Err(e) => {
            warn!(category, error = %e, "artifact write failed, category skipped");
            None
        }
    }
}
