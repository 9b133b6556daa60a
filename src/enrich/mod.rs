//! Per-entry detail enrichment.
//!
//! Resolves canonical metadata for one app id through the lookup
//! endpoint. Every failure mode - fetch error, non-2xx, empty result
//! set, malformed payload - degrades to an absent detail record; the
//! chart entry's own fields then fill in whatever they can at row
//! assembly. Enrichment never fails a category.
//!
//! Also hosts the optional secondary collaborator: a best-effort
//! search by name used to recover missing app ids. Its failures never
//! propagate beyond an empty result.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{LookupError, LookupResult};
use crate::fetch::Fetcher;

const DEFAULT_BASE: &str = "https://itunes.apple.com";

// =============================================================================
// Detail Model
// =============================================================================

/// Authoritative metadata for one app, as returned by the lookup
/// endpoint. Every field is optional; absence is data, not an error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppDetail {
    #[serde(rename = "trackName", default)]
    pub name: Option<String>,

    #[serde(rename = "sellerName", default)]
    pub developer: Option<String>,

    #[serde(rename = "trackViewUrl", default)]
    pub url: Option<String>,

    #[serde(default)]
    pub price: Option<f64>,

    #[serde(rename = "averageUserRating", default)]
    pub rating: Option<f64>,

    #[serde(rename = "userRatingCount", default)]
    pub rating_count: Option<u64>,

    #[serde(rename = "primaryGenreName", default)]
    pub primary_genre_name: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(rename = "releaseDate", default)]
    pub release_date: Option<DateTime<Utc>>,

    #[serde(rename = "currentVersionReleaseDate", default)]
    pub update_date: Option<DateTime<Utc>>,
}

/// Lookup payload: `{"resultCount": N, "results": [...]}`.
#[derive(Debug, Deserialize)]
struct LookupResponse {
    #[serde(default)]
    results: Vec<AppDetail>,
}

/// Search payload used by the id fallback.
#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    #[serde(rename = "trackId", default)]
    track_id: Option<u64>,
}

// =============================================================================
// Detail Source
// =============================================================================

/// Capability contract of the enricher: one authoritative lookup per
/// app id, `None` on any failure.
pub trait DetailSource {
    fn lookup(
        &self,
        app_id: &str,
        country: &str,
    ) -> impl std::future::Future<Output = Option<AppDetail>>;
}

/// Enricher backed by the marketplace lookup endpoint.
pub struct LookupEnricher<'a> {
    fetcher: &'a Fetcher,
    base: String,
}

impl<'a> LookupEnricher<'a> {
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

    /// One lookup attempt, with the failure cause kept distinguishable
    /// for diagnostics.
    async fn try_lookup(&self, app_id: &str, country: &str) -> LookupResult<Option<AppDetail>> {
        let url = format!("{}/lookup?id={}&country={}", self.base, app_id, country);
        let body = self.fetcher.get(&url).await?;
        parse_lookup(&body)
    }
}

impl DetailSource for LookupEnricher<'_> {
    async fn lookup(&self, app_id: &str, country: &str) -> Option<AppDetail> {
        match self.try_lookup(app_id, country).await {
            Ok(Some(detail)) => Some(detail),
            Ok(None) => {
                debug!(app_id, "lookup returned no results");
                None
            }
            Err(e) => {
                warn!(app_id, error = %e, "detail lookup failed");
                None
            }
        }
    }
}

/// Parse a lookup body; the first result wins, an empty result set is
/// `Ok(None)`.
pub fn parse_lookup(body: &str) -> LookupResult<Option<AppDetail>> {
    let response: LookupResponse =
        serde_json::from_str(body).map_err(|e| LookupError::Malformed(e.to_string()))?;
    Ok(response.results.into_iter().next())
}

// =============================================================================
// Secondary Id Fallback
// =============================================================================

/// Optional collaborator: recover an app id from a display name.
/// Best-effort only; any failure is an empty result.
pub trait IdResolver {
    fn find_id(
        &self,
        name: &str,
        country: &str,
    ) -> impl std::future::Future<Output = Option<String>>;
}

/// Id fallback that never resolves anything; used when the secondary
/// source is disabled.
pub struct NoFallback;

impl IdResolver for NoFallback {
    async fn find_id(&self, _name: &str, _country: &str) -> Option<String> {
        None
    }
}

/// Id fallback backed by the marketplace search endpoint.
pub struct SearchIdResolver<'a> {
    fetcher: &'a Fetcher,
    base: String,
}

impl<'a> SearchIdResolver<'a> {
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
}

impl IdResolver for SearchIdResolver<'_> {
    async fn find_id(&self, name: &str, country: &str) -> Option<String> {
        let url = match reqwest::Url::parse_with_params(
            &format!("{}/search", self.base),
            &[
                ("term", name),
                ("country", country),
                ("entity", "software"),
                ("limit", "1"),
            ],
        ) {
            Ok(url) => url,
            Err(e) => {
                debug!(name, error = %e, "search URL construction failed");
                return None;
            }
        };

        let body = match self.fetcher.get(url.as_str()).await {
            Ok(body) => body,
            Err(e) => {
                debug!(name, error = %e, "search fallback failed");
                return None;
            }
        };

        match serde_json::from_str::<SearchResponse>(&body) {
            Ok(response) => response
                .results
                .into_iter()
                .next()
                .and_then(|hit| hit.track_id)
                .map(|id| id.to_string()),
            Err(e) => {
                debug!(name, error = %e, "search fallback returned malformed payload");
                None
            }
        }
    }
}
