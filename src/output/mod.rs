//! Row assembly and per-category CSV artifacts.
//!
//! One row = one chart entry merged with its (possibly absent) detail
//! record. The merge is field by field: each detail field falls back
//! independently to what the chart entry already carried, then to an
//! empty cell. The schema is fixed-width regardless of which source
//! or fallback path supplied the entry.
//!
//! Writing is all-or-nothing per category: rows are serialized to an
//! in-memory buffer and persisted in a single write, so no partial
//! artifact can exist.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::chart::ChartEntry;
use crate::enrich::AppDetail;
use crate::error::{WriteError, WriteResult};
use crate::genres::GenreId;

/// Artifact filename template; `{}` is the sanitized category label.
const ARTIFACT_TEMPLATE: &str = "topchart_{}.csv";

// =============================================================================
// Output Row
// =============================================================================

/// The final persisted unit. Field order here defines the CSV header:
/// country, category, genre_id, rank, app_id, app_name, developer,
/// url, price, rating, rating_count, primary_genre_name, description,
/// launch_date, update_date.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputRow {
    pub country: String,
    pub category: String,
    pub genre_id: Option<GenreId>,
    pub rank: usize,
    pub app_id: String,
    pub app_name: Option<String>,
    pub developer: Option<String>,
    pub url: Option<String>,
    pub price: Option<f64>,
    pub rating: Option<f64>,
    pub rating_count: Option<u64>,
    pub primary_genre_name: Option<String>,
    pub description: Option<String>,
    pub launch_date: Option<DateTime<Utc>>,
    pub update_date: Option<DateTime<Utc>>,
}

/// Merge a chart entry with its detail record into a row.
///
/// `app_id` is passed resolved because the entry's own id may have
/// come from the search fallback.
#[allow(clippy::too_many_arguments)]
pub fn assemble(
    country: &str,
    category: &str,
    genre_id: Option<GenreId>,
    rank: usize,
    app_id: &str,
    entry: &ChartEntry,
    detail: Option<&AppDetail>,
) -> OutputRow {
    OutputRow {
        country: country.to_string(),
        category: category.to_string(),
        genre_id,
        rank,
        app_id: app_id.to_string(),
        app_name: detail
            .and_then(|d| d.name.clone())
            .or_else(|| entry.name.clone()),
        developer: detail.and_then(|d| d.developer.clone()),
        url: detail
            .and_then(|d| d.url.clone())
            .or_else(|| entry.url.clone()),
        price: detail.and_then(|d| d.price),
        rating: detail.and_then(|d| d.rating),
        rating_count: detail.and_then(|d| d.rating_count),
        primary_genre_name: detail.and_then(|d| d.primary_genre_name.clone()),
        description: detail.and_then(|d| d.description.clone()),
        launch_date: detail.and_then(|d| d.release_date),
        update_date: detail.and_then(|d| d.update_date),
    }
}

// =============================================================================
// Writer
// =============================================================================

/// Sanitize a category label into a stable file stem: alphanumerics,
/// space, `-`, `_` survive (everything else becomes `_`), then spaces
/// become `_`.
pub fn safe_file_stem(category: &str) -> String {
    category
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == ' ' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect::<String>()
        .replace(' ', "_")
}

/// Path of the artifact for a category.
pub fn artifact_path(out_dir: &Path, category: &str) -> PathBuf {
    out_dir.join(ARTIFACT_TEMPLATE.replace("{}", &safe_file_stem(category)))
}

/// Persist all rows of one category as a single CSV artifact.
///
/// The rows are serialized into memory first and written with one
/// filesystem call; a failure leaves no partial file behind.
pub fn write_category(out_dir: &Path, category: &str, rows: &[OutputRow]) -> WriteResult<PathBuf> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for row in rows {
        writer.serialize(row)?;
    }

    let buffer = writer
        .into_inner()
        .map_err(|e| WriteError::Buffer(e.to_string()))?;

    let path = artifact_path(out_dir, category);
    fs::write(&path, buffer)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(app_id: &str, name: Option<&str>) -> ChartEntry {
        ChartEntry {
            app_id: Some(app_id.to_string()),
            name: name.map(str::to_string),
            url: None,
        }
    }

    #[test]
    fn test_safe_file_stem() {
        assert_eq!(safe_file_stem("Weather"), "Weather");
        assert_eq!(safe_file_stem("Food & Drink"), "Food___Drink");
        assert_eq!(safe_file_stem("Photo/Video!"), "Photo_Video_");
        assert_eq!(safe_file_stem("already_safe-name"), "already_safe-name");
    }

    #[test]
    fn test_assemble_with_absent_detail_falls_back_to_entry() {
        let e = entry("123", Some("X"));
        let row = assemble("us", "Weather", Some(6001), 1, "123", &e, None);

        assert_eq!(row.app_id, "123");
        assert_eq!(row.app_name.as_deref(), Some("X"));
        // Detail-only fields must be null, never an error.
        assert!(row.developer.is_none());
        assert!(row.price.is_none());
        assert!(row.rating.is_none());
        assert!(row.rating_count.is_none());
        assert!(row.description.is_none());
        assert!(row.launch_date.is_none());
        assert!(row.update_date.is_none());
    }

    #[test]
    fn test_assemble_detail_wins_field_by_field() {
        let e = ChartEntry {
            app_id: Some("123".into()),
            name: Some("Feed Name".into()),
            url: Some("https://feed.example/id123".into()),
        };
        // Detail knows the canonical name but carries no URL: the
        // entry's URL must survive the merge.
        let detail = AppDetail {
            name: Some("Canonical Name".into()),
            developer: Some("Dev Co".into()),
            ..AppDetail::default()
        };

        let row = assemble("us", "Weather", Some(6001), 3, "123", &e, Some(&detail));

        assert_eq!(row.app_name.as_deref(), Some("Canonical Name"));
        assert_eq!(row.developer.as_deref(), Some("Dev Co"));
        assert_eq!(row.url.as_deref(), Some("https://feed.example/id123"));
        assert_eq!(row.rank, 3);
    }

    #[test]
    fn test_write_category_header_and_rows() {
        let dir = tempfile::tempdir().unwrap();

        let rows = vec![
            assemble("us", "Weather", Some(6001), 1, "1", &entry("1", Some("A")), None),
            assemble("us", "Weather", Some(6001), 2, "2", &entry("2", Some("B")), None),
        ];

        let path = write_category(dir.path(), "Weather", &rows).unwrap();
        assert_eq!(path.file_name().unwrap(), "topchart_Weather.csv");

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[0],
            "country,category,genre_id,rank,app_id,app_name,developer,url,\
             price,rating,rating_count,primary_genre_name,description,\
             launch_date,update_date"
        );
        assert!(lines[1].starts_with("us,Weather,6001,1,1,A,"));
        assert!(lines[2].starts_with("us,Weather,6001,2,2,B,"));
    }

    #[test]
    fn test_absent_fields_serialize_as_empty_cells() {
        let dir = tempfile::tempdir().unwrap();
        let rows = vec![assemble(
            "us",
            "News",
            None,
            1,
            "7",
            &entry("7", None),
            None,
        )];

        let path = write_category(dir.path(), "News", &rows).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        let data_line = content.lines().nth(1).unwrap();
        // genre_id and all detail fields empty.
        assert_eq!(data_line, "us,News,,1,7,,,,,,,,,,");
    }

    #[test]
    fn test_deterministic_artifact_path() {
        let dir = Path::new("/tmp/out");
        assert_eq!(
            artifact_path(dir, "Food & Drink"),
            dir.join("topchart_Food___Drink.csv")
        );
        // Same label, same path, every run.
        assert_eq!(
            artifact_path(dir, "Food & Drink"),
            artifact_path(dir, "Food & Drink")
        );
    }
}
