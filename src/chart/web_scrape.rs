//! HTML chart page scrape source.
//!
//! The pipeline variant that reads the public chart page for a genre
//! instead of the feeds. App identifiers are pulled from listing
//! links in order of first appearance in the document, deduplicated,
//! and capped at the requested limit. Only the id is known at this
//! stage; name and URL come from enrichment.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use tracing::debug;

use super::{ChartEntry, ChartQuery};
use crate::error::ChartResult;
use crate::fetch::Fetcher;

const DEFAULT_BASE: &str = "https://apps.apple.com";

/// Listing links look like `/us/app/some-name/id1234567890`.
static APP_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/app(?:/[^/\s'\x22]+)?/id(\d+)").expect("valid app id pattern"));

static ANCHOR_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a[href]").expect("valid anchor selector"));

/// Chart source backed by the public HTML chart page.
pub struct WebChartSource<'a> {
    fetcher: &'a Fetcher,
    base: String,
}

impl<'a> WebChartSource<'a> {
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
        "web-chart"
    }

    pub async fn fetch(&self, query: &ChartQuery) -> ChartResult<Vec<ChartEntry>> {
        let Some(genre_id) = query.genre_id else {
            debug!("genre unresolved, skipping web chart");
            return Ok(Vec::new());
        };

        let url = format!(
            "{}/{}/charts/iphone/top-free-apps/{}",
            self.base, query.country, genre_id
        );

        let body = self.fetcher.get(&url).await?;
        Ok(extract_chart_ids(&body, query.limit)
            .into_iter()
            .map(ChartEntry::from_id)
            .collect())
    }
}

/// Extract app ids from a chart page, first appearance order,
/// deduplicated, capped at `limit`.
///
/// Ids are read from anchor hrefs; if the page carries no listing
/// anchors (ids embedded in script payloads instead), the raw markup
/// is scanned as a fallback.
pub fn extract_chart_ids(html: &str, limit: usize) -> Vec<String> {
    let document = Html::parse_document(html);

    let mut seen = HashSet::new();
    let mut ids = Vec::new();

    for anchor in document.select(&ANCHOR_SELECTOR) {
        if ids.len() >= limit {
            return ids;
        }
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        if let Some(caps) = APP_ID_RE.captures(href) {
            let id = caps[1].to_string();
            if seen.insert(id.clone()) {
                ids.push(id);
            }
        }
    }

    if ids.is_empty() {
        for caps in APP_ID_RE.captures_iter(html) {
            if ids.len() >= limit {
                break;
            }
            let id = caps[1].to_string();
            if seen.insert(id.clone()) {
                ids.push(id);
            }
        }
    }

    ids
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_in_document_order() {
        let html = r#"<html><body>
            <a href="/us/app/first-app/id111">First</a>
            <a href="/us/app/second-app/id222">Second</a>
            <a href="/us/app/third-app/id333">Third</a>
        </body></html>"#;

        assert_eq!(extract_chart_ids(html, 50), vec!["111", "222", "333"]);
    }

    #[test]
    fn test_extract_dedupes_keeping_first() {
        let html = r#"<html><body>
            <a href="/us/app/first-app/id111">First</a>
            <a href="/us/app/second-app/id222">Second</a>
            <a href="/us/app/first-app/id111">First again</a>
        </body></html>"#;

        assert_eq!(extract_chart_ids(html, 50), vec!["111", "222"]);
    }

    #[test]
    fn test_extract_caps_at_limit() {
        let html = r#"<html><body>
            <a href="/us/app/a/id1">a</a>
            <a href="/us/app/b/id2">b</a>
            <a href="/us/app/c/id3">c</a>
        </body></html>"#;

        assert_eq!(extract_chart_ids(html, 2), vec!["1", "2"]);
    }

    #[test]
    fn test_extract_ignores_unrelated_links() {
        let html = r#"<html><body>
            <a href="/us/developer/someone/id999?see-all=apps">dev</a>
            <a href="https://example.com/about">about</a>
            <a href="/us/app/real-app/id42">app</a>
        </body></html>"#;

        // Developer pages also use /idNNN but not under /app/.
        assert_eq!(extract_chart_ids(html, 50), vec!["42"]);
    }

    #[test]
    fn test_extract_absolute_urls() {
        let html =
            r#"<a href="https://apps.apple.com/us/app/some-app/id777?mt=8">x</a>"#;
        assert_eq!(extract_chart_ids(html, 50), vec!["777"]);
    }

    #[test]
    fn test_script_embedded_ids_fallback() {
        let html = r#"<html><head><script>
            {"apps": ["https://apps.apple.com/us/app/one/id11", "https://apps.apple.com/us/app/two/id22"]}
        </script></head><body></body></html>"#;

        assert_eq!(extract_chart_ids(html, 50), vec!["11", "22"]);
    }

    #[test]
    fn test_no_ids_yields_empty() {
        assert!(extract_chart_ids("<html><body>nothing here</body></html>", 50).is_empty());
    }
}
