//! Country-wide top-free feed source.
//!
//! Queries the legacy storefront RSS feed for the country's overall
//! top free apps. Used when the genre feed yields nothing: genre
//! unresolved, upstream empty, or request failed.
//!
//! The legacy feed is loosely shaped: `feed.entry` may be an array or
//! a single object, and `link` may be one link or a list. Both forms
//! must parse.

use serde::Deserialize;

use super::{ChartEntry, ChartQuery};
use crate::error::{ChartError, ChartResult};
use crate::fetch::Fetcher;

const DEFAULT_BASE: &str = "https://itunes.apple.com";

#[derive(Debug, Deserialize)]
struct FeedDoc {
    #[serde(default)]
    feed: Option<Feed>,
}

#[derive(Debug, Default, Deserialize)]
struct Feed {
    #[serde(default)]
    entry: Entries,
}

/// `entry` is an array normally, a bare object when the feed holds a
/// single app.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Entries {
    Many(Vec<Entry>),
    One(Box<Entry>),
}

impl Default for Entries {
    fn default() -> Self {
        Entries::Many(Vec::new())
    }
}

impl Entries {
    fn into_vec(self) -> Vec<Entry> {
        match self {
            Entries::Many(v) => v,
            Entries::One(e) => vec![*e],
        }
    }
}

#[derive(Debug, Deserialize)]
struct Entry {
    #[serde(default)]
    id: Option<EntryId>,
    #[serde(rename = "im:name", default)]
    name: Option<Label>,
    #[serde(default)]
    link: Option<LinkField>,
}

#[derive(Debug, Deserialize)]
struct EntryId {
    #[serde(default)]
    attributes: Option<IdAttributes>,
}

#[derive(Debug, Deserialize)]
struct IdAttributes {
    #[serde(rename = "im:id", default)]
    im_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Label {
    #[serde(default)]
    label: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum LinkField {
    One(Link),
    Many(Vec<Link>),
}

#[derive(Debug, Deserialize)]
struct Link {
    #[serde(default)]
    attributes: Option<LinkAttributes>,
}

#[derive(Debug, Deserialize)]
struct LinkAttributes {
    #[serde(default)]
    href: Option<String>,
}

impl Entry {
    fn app_id(&self) -> Option<String> {
        self.id
            .as_ref()
            .and_then(|id| id.attributes.as_ref())
            .and_then(|a| a.im_id.clone())
            .filter(|id| !id.is_empty())
    }

    fn app_name(&self) -> Option<String> {
        self.name.as_ref().and_then(|n| n.label.clone())
    }

    fn listing_url(&self) -> Option<String> {
        let first = match self.link.as_ref()? {
            LinkField::One(link) => Some(link),
            LinkField::Many(links) => links.first(),
        }?;
        first.attributes.as_ref()?.href.clone()
    }
}

/// Chart source backed by the country-wide feed.
pub struct CountryTopFreeSource<'a> {
    fetcher: &'a Fetcher,
    base: String,
}

impl<'a> CountryTopFreeSource<'a> {
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
        "country-top-free"
    }

    pub async fn fetch(&self, query: &ChartQuery) -> ChartResult<Vec<ChartEntry>> {
        let url = format!(
            "{}/{}/rss/topfreeapplications/limit={}/json",
            self.base, query.country, query.limit
        );

        let body = self.fetcher.get(&url).await?;
        let entries = parse_country_feed(&body)?;
        Ok(entries.into_iter().take(query.limit).collect())
    }
}

/// Parse the legacy feed body into chart entries.
pub fn parse_country_feed(body: &str) -> ChartResult<Vec<ChartEntry>> {
    let doc: FeedDoc =
        serde_json::from_str(body).map_err(|e| ChartError::Malformed(e.to_string()))?;

    let entries = doc.feed.unwrap_or_default().entry.into_vec();

    Ok(entries
        .into_iter()
        .map(|entry| ChartEntry {
            app_id: entry.app_id(),
            name: entry.app_name(),
            url: entry.listing_url(),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_entry_array() {
        let body = r#"{
            "feed": {
                "entry": [
                    {
                        "id": {"attributes": {"im:id": "201"}},
                        "im:name": {"label": "Alpha"},
                        "link": {"attributes": {"href": "https://apps.example/id201"}}
                    },
                    {
                        "id": {"attributes": {"im:id": "202"}},
                        "im:name": {"label": "Beta"}
                    }
                ]
            }
        }"#;

        let entries = parse_country_feed(body).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].app_id.as_deref(), Some("201"));
        assert_eq!(entries[0].name.as_deref(), Some("Alpha"));
        assert_eq!(entries[0].url.as_deref(), Some("https://apps.example/id201"));
        assert!(entries[1].url.is_none());
    }

    #[test]
    fn test_parse_single_entry_object() {
        let body = r#"{
            "feed": {
                "entry": {
                    "id": {"attributes": {"im:id": "300"}},
                    "im:name": {"label": "Solo"}
                }
            }
        }"#;

        let entries = parse_country_feed(body).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].app_id.as_deref(), Some("300"));
    }

    #[test]
    fn test_parse_link_list_takes_first() {
        let body = r#"{
            "feed": {
                "entry": [{
                    "id": {"attributes": {"im:id": "400"}},
                    "link": [
                        {"attributes": {"href": "https://apps.example/first"}},
                        {"attributes": {"href": "https://apps.example/second"}}
                    ]
                }]
            }
        }"#;

        let entries = parse_country_feed(body).unwrap();
        assert_eq!(entries[0].url.as_deref(), Some("https://apps.example/first"));
    }

    #[test]
    fn test_parse_missing_id_kept_as_none() {
        let body = r#"{"feed": {"entry": [{"im:name": {"label": "Ghost"}}]}}"#;
        let entries = parse_country_feed(body).unwrap();
        assert_eq!(entries.len(), 1);
        assert!(entries[0].app_id.is_none());
        assert_eq!(entries[0].name.as_deref(), Some("Ghost"));
    }

    #[test]
    fn test_parse_empty_and_absent_feed() {
        assert!(parse_country_feed(r#"{"feed": {"entry": []}}"#)
            .unwrap()
            .is_empty());
        assert!(parse_country_feed(r#"{"feed": {}}"#).unwrap().is_empty());
        assert!(parse_country_feed(r#"{}"#).unwrap().is_empty());
    }

    #[test]
    fn test_parse_malformed_is_an_error() {
        assert!(matches!(
            parse_country_feed("not json at all"),
            Err(ChartError::Malformed(_))
        ));
    }
}
