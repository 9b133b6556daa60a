//! Genre-scoped ranked feed source.
//!
//! Queries the marketing-tools RSS API for the top free apps of one
//! genre. Highest-priority source in the feed chain; skips itself
//! when the category's genre is unresolved.

use serde::Deserialize;
use tracing::debug;

use super::{ChartEntry, ChartQuery};
use crate::error::{ChartError, ChartResult};
use crate::fetch::Fetcher;

const DEFAULT_BASE: &str = "https://rss.applemarketingtools.com";

/// Feed payload: `{"feed": {"results": [{"id", "name", ...}]}}`.
#[derive(Debug, Deserialize)]
struct FeedDoc {
    #[serde(default)]
    feed: Option<Feed>,
}

#[derive(Debug, Default, Deserialize)]
struct Feed {
    #[serde(default)]
    results: Vec<FeedApp>,
}

#[derive(Debug, Deserialize)]
struct FeedApp {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    name: Option<String>,
}

/// Chart source backed by the genre-scoped feed.
pub struct GenreFeedSource<'a> {
    fetcher: &'a Fetcher,
    base: String,
}

impl<'a> GenreFeedSource<'a> {
    pub fn new(fetcher: &'a Fetcher) -> Self {
        Self {
            fetcher,
            base: DEFAULT_BASE.to_string(),
        }
    }

    /// Override the endpoint base URL.
    pub fn with_base(mut self, base: impl Into<String>) -> Self {
        self.base = base.into();
        self
    }

    pub fn label(&self) -> &'static str {
        "genre-feed"
    }

    pub async fn fetch(&self, query: &ChartQuery) -> ChartResult<Vec<ChartEntry>> {
        let Some(genre_id) = query.genre_id else {
            debug!("genre unresolved, skipping genre feed");
            return Ok(Vec::new());
        };

        let url = format!(
            "{}/api/v2/{}/apps/top-free/{}/genre/{}.json",
            self.base, query.country, query.limit, genre_id
        );

        let body = self.fetcher.get(&url).await?;
        let entries = parse_genre_feed(&body)?;
        Ok(entries.into_iter().take(query.limit).collect())
    }
}

/// Parse the feed body into chart entries, source order preserved.
pub fn parse_genre_feed(body: &str) -> ChartResult<Vec<ChartEntry>> {
    let doc: FeedDoc =
        serde_json::from_str(body).map_err(|e| ChartError::Malformed(e.to_string()))?;

    let results = doc.feed.unwrap_or_default().results;

    Ok(results
        .into_iter()
        .map(|app| ChartEntry {
            app_id: app.id.filter(|id| !id.is_empty()),
            name: app.name,
            url: None,
        })
        .collect())
}
