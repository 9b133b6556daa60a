//! Chart sources and the ordered fallback chain.
//!
//! Three heterogeneous sources can produce a ranked candidate list
//! for a category:
//!
//! - [`genre_feed::GenreFeedSource`] - genre-scoped ranked feed
//! - [`country_feed::CountryTopFreeSource`] - country-wide ranked feed
//! - [`web_scrape::WebChartSource`] - HTML chart page scrape
//!
//! The chain tries sources strictly in priority order and stops at
//! the first non-empty result; there is no merging across sources.
//! A source that errors is logged and treated like an empty one. If
//! every source comes back empty the category produces zero rows,
//! which is a defined outcome, not an error.

pub mod country_feed;
pub mod genre_feed;
pub mod web_scrape;

use std::collections::HashSet;

use tracing::{debug, info, warn};

use crate::error::ChartResult;
use crate::fetch::Fetcher;
use crate::genres::GenreId;

pub use country_feed::CountryTopFreeSource;
pub use genre_feed::GenreFeedSource;
pub use web_scrape::WebChartSource;

// =============================================================================
// Entry Model
// =============================================================================

/// One ranked candidate from a chart source.
///
/// Position in the source's returned list IS the rank; the pipeline
/// never reorders entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartEntry {
    /// Marketplace-unique identifier. Absent when the source exposed
    /// no id; potentially recoverable through the search fallback.
    pub app_id: Option<String>,
    /// Display name, when the source carries one.
    pub name: Option<String>,
    /// Direct listing URL, when the source carries one.
    pub url: Option<String>,
}

impl ChartEntry {
    /// Entry with id only (web scrape shape).
    pub fn from_id(app_id: impl Into<String>) -> Self {
        Self {
            app_id: Some(app_id.into()),
            name: None,
            url: None,
        }
    }
}

/// Scope of one chart request.
#[derive(Debug, Clone)]
pub struct ChartQuery {
    /// Two-letter storefront country code.
    pub country: String,
    /// Resolved genre, if any. Genre-scoped sources skip themselves
    /// when this is `None`.
    pub genre_id: Option<GenreId>,
    /// Maximum number of entries to return.
    pub limit: usize,
}

// =============================================================================
// Source Abstraction
// =============================================================================

/// Capability shared by all chart sources: produce ranked entries for
/// `(country, genre, limit)` from one upstream.
pub trait ChartSource {
    /// Short name used in diagnostics.
    fn label(&self) -> &'static str;

    /// Fetch the ranked candidate list. An `Ok(vec![])` is a defined
    /// empty outcome; an `Err` is a source failure the chain treats
    /// the same way after logging it.
    fn fetch(
        &self,
        query: &ChartQuery,
    ) -> impl std::future::Future<Output = ChartResult<Vec<ChartEntry>>>;
}

/// Production strategy list: the feed chain or the scrape variant,
/// tried in declaration order.
pub enum HttpSource<'a> {
    GenreFeed(GenreFeedSource<'a>),
    CountryTopFree(CountryTopFreeSource<'a>),
    WebChart(WebChartSource<'a>),
}

impl<'a> HttpSource<'a> {
    /// The feed-based chain: genre feed first, country-wide fallback.
    pub fn feed_chain(fetcher: &'a Fetcher) -> Vec<Self> {
        vec![
            HttpSource::GenreFeed(GenreFeedSource::new(fetcher)),
            HttpSource::CountryTopFree(CountryTopFreeSource::new(fetcher)),
        ]
    }

    /// The scrape pipeline variant: HTML chart page only.
    pub fn web_chain(fetcher: &'a Fetcher) -> Vec<Self> {
        vec![HttpSource::WebChart(WebChartSource::new(fetcher))]
    }
}

impl ChartSource for HttpSource<'_> {
    fn label(&self) -> &'static str {
        match self {
            HttpSource::GenreFeed(s) => s.label(),
            HttpSource::CountryTopFree(s) => s.label(),
            HttpSource::WebChart(s) => s.label(),
        }
    }

    async fn fetch(&self, query: &ChartQuery) -> ChartResult<Vec<ChartEntry>> {
        match self {
            HttpSource::GenreFeed(s) => s.fetch(query).await,
            HttpSource::CountryTopFree(s) => s.fetch(query).await,
            HttpSource::WebChart(s) => s.fetch(query).await,
        }
    }
}

// =============================================================================
// Chain
// =============================================================================

/// Try sources in order; the first non-empty result wins.
///
/// Returns an empty list when every source is empty or failed.
pub async fn first_non_empty<S: ChartSource>(
    sources: &[S],
    query: &ChartQuery,
) -> Vec<ChartEntry> {
    for source in sources {
        match source.fetch(query).await {
            Ok(entries) if !entries.is_empty() => {
                info!(
                    source = source.label(),
                    count = entries.len(),
                    "chart source selected"
                );
                return entries;
            }
            Ok(_) => {
                debug!(source = source.label(), "source empty, trying next");
            }
            Err(e) => {
                warn!(source = source.label(), error = %e, "source failed, trying next");
            }
        }
    }
    Vec::new()
}

/// Drop duplicate app ids, keeping the first occurrence.
///
/// Entries without an id are kept; they are resolved or dropped later
/// by the driver's rank policy.
pub fn dedup_entries(entries: Vec<ChartEntry>) -> Vec<ChartEntry> {
    let mut seen = HashSet::new();
    entries
        .into_iter()
        .filter(|entry| match &entry.app_id {
            Some(id) => seen.insert(id.clone()),
            None => true,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    /// Scripted source for chain tests: fixed result, call counter.
    struct Scripted {
        label: &'static str,
        result: ChartResult<Vec<ChartEntry>>,
        calls: Cell<u32>,
    }

    impl Scripted {
        fn entries(label: &'static str, ids: &[&str]) -> Self {
            Self {
                label,
                result: Ok(ids.iter().map(|id| ChartEntry::from_id(*id)).collect()),
                calls: Cell::new(0),
            }
        }

        fn empty(label: &'static str) -> Self {
            Self {
                label,
                result: Ok(Vec::new()),
                calls: Cell::new(0),
            }
        }

        fn failing(label: &'static str) -> Self {
            Self {
                label,
                result: Err(crate::error::ChartError::Malformed("bad json".into())),
                calls: Cell::new(0),
            }
        }
    }

    impl ChartSource for Scripted {
        fn label(&self) -> &'static str {
            self.label
        }

        async fn fetch(&self, _query: &ChartQuery) -> ChartResult<Vec<ChartEntry>> {
            self.calls.set(self.calls.get() + 1);
            match &self.result {
                Ok(entries) => Ok(entries.clone()),
                Err(_) => Err(crate::error::ChartError::Malformed("bad json".into())),
            }
        }
    }

    fn query() -> ChartQuery {
        ChartQuery {
            country: "us".into(),
            genre_id: Some(6001),
            limit: 50,
        }
    }

    #[tokio::test]
    async fn test_first_source_wins_and_second_is_never_called() {
        let sources = vec![
            Scripted::entries("genre-feed", &["1", "2"]),
            Scripted::entries("country-top-free", &["9"]),
        ];

        let entries = first_non_empty(&sources, &query()).await;

        assert_eq!(entries.len(), 2);
        assert_eq!(sources[0].calls.get(), 1);
        assert_eq!(sources[1].calls.get(), 0);
    }

    #[tokio::test]
    async fn test_empty_source_falls_through() {
        let sources = vec![
            Scripted::empty("genre-feed"),
            Scripted::entries("country-top-free", &["9"]),
        ];

        let entries = first_non_empty(&sources, &query()).await;

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].app_id.as_deref(), Some("9"));
        assert_eq!(sources[0].calls.get(), 1);
        assert_eq!(sources[1].calls.get(), 1);
    }

    #[tokio::test]
    async fn test_failing_source_falls_through() {
        let sources = vec![
            Scripted::failing("genre-feed"),
            Scripted::entries("country-top-free", &["9"]),
        ];

        let entries = first_non_empty(&sources, &query()).await;
        assert_eq!(entries.len(), 1);
    }

    #[tokio::test]
    async fn test_all_empty_yields_empty() {
        let sources = vec![
            Scripted::empty("genre-feed"),
            Scripted::failing("country-top-free"),
        ];

        let entries = first_non_empty(&sources, &query()).await;
        assert!(entries.is_empty());
    }

    #[test]
    fn test_dedup_keeps_first_occurrence() {
        let entries = vec![
            ChartEntry::from_id("1"),
            ChartEntry {
                app_id: Some("2".into()),
                name: Some("Two".into()),
                url: None,
            },
            ChartEntry::from_id("1"),
            ChartEntry {
                app_id: None,
                name: Some("no id".into()),
                url: None,
            },
        ];

        let deduped = dedup_entries(entries);
        assert_eq!(deduped.len(), 3);
        assert_eq!(deduped[0].app_id.as_deref(), Some("1"));
        assert_eq!(deduped[1].name.as_deref(), Some("Two"));
        assert!(deduped[2].app_id.is_none());
    }
}
