//! Category list loader with encoding and delimiter auto-detection.
//!
//! The input collaborator of the pipeline: reads a delimited file of
//! category labels, tolerating header-bearing and header-less layouts,
//! and returns distinct non-empty labels in first-seen order.
//!
//! Column selection, first rule that applies wins:
//!
//! 1. A header cell equal to `category` (case-insensitive) selects
//!    that column; the header row is consumed.
//! 2. In multi-column input, a header cell containing `cat` or `name`
//!    selects that column; the header row is consumed.
//! 3. Otherwise the input is treated as header-less and the first
//!    column is used, first row included.

use std::collections::HashSet;
use std::path::Path;

use tracing::debug;

use crate::error::{InputError, InputResult};

/// Detect the encoding of raw bytes using chardet.
pub fn detect_encoding(bytes: &[u8]) -> String {
    let (charset, _, _) = chardet::detect(bytes);

    match charset.to_lowercase().as_str() {
        "ascii" | "utf-8" | "utf8" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        other => other.to_string(),
    }
}

/// Decode bytes to a string using the detected encoding.
pub fn decode_content(bytes: &[u8], encoding: &str) -> String {
    match encoding {
        "iso-8859-1" => encoding_rs::ISO_8859_15.decode(bytes).0.to_string(),
        "windows-1252" => encoding_rs::WINDOWS_1252.decode(bytes).0.to_string(),
        _ => String::from_utf8_lossy(bytes).to_string(),
    }
}

/// Detect the delimiter by counting occurrences in the first line.
pub fn detect_delimiter(content: &str) -> char {
    let first_line = content.lines().next().unwrap_or("");

    let separators = [',', ';', '\t', '|'];
    let mut best_sep = ',';
    let mut best_count = 0;

    for &sep in &separators {
        let count = first_line.matches(sep).count();
        if count > best_count {
            best_count = count;
            best_sep = sep;
        }
    }

    best_sep
}

/// Load the category list from a file.
///
/// This is the only operation whose failure aborts a run.
pub fn load_categories(path: impl AsRef<Path>) -> InputResult<Vec<String>> {
    let bytes = std::fs::read(path.as_ref())?;
    parse_categories(&bytes)
}

/// Parse a category list from raw bytes.
pub fn parse_categories(bytes: &[u8]) -> InputResult<Vec<String>> {
    let encoding = detect_encoding(bytes);
    let content = decode_content(bytes, &encoding);
    let delimiter = detect_delimiter(&content);
    debug!(%encoding, %delimiter, "category input detected");

    let rows: Vec<Vec<String>> = content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            line.split(delimiter)
                .map(|cell| cell.trim().trim_matches('"').to_string())
                .collect()
        })
        .collect();

    if rows.is_empty() {
        return Err(InputError::EmptyFile);
    }

    let (column, skip_header) = select_column(&rows[0]);
    let data = if skip_header { &rows[1..] } else { &rows[..] };

    let mut seen = HashSet::new();
    let mut categories = Vec::new();
    for row in data {
        let Some(value) = row.get(column) else {
            continue;
        };
        let value = value.trim();
        if value.is_empty() {
            continue;
        }
        // Dedup is case-insensitive: labels differing only in case
        // resolve to the same genre and would produce one redundant
        // artifact per variant.
        if seen.insert(value.to_lowercase()) {
            categories.push(value.to_string());
        }
    }

    if categories.is_empty() {
        return Err(InputError::NoCategories);
    }

    Ok(categories)
}

/// Pick the category column from the first row.
///
/// Returns `(column index, consume first row as header)`.
fn select_column(first_row: &[String]) -> (usize, bool) {
    let lowered: Vec<String> = first_row.iter().map(|c| c.to_lowercase()).collect();

    if let Some(i) = lowered.iter().position(|c| c == "category") {
        return (i, true);
    }

    if lowered.len() > 1 {
        if let Some(i) = lowered
            .iter()
            .position(|c| c.contains("cat") || c.contains("name"))
        {
            return (i, true);
        }
    }

    // Header-less: first column, keep the first row as data.
    (0, false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_bearing_category_column() {
        let input = b"category\nWeather\nTravel\nNews\n";
        let cats = parse_categories(input).unwrap();
        assert_eq!(cats, vec!["Weather", "Travel", "News"]);
    }

    #[test]
    fn test_category_column_among_others() {
        let input = b"id,category,notes\n1,Weather,x\n2,Travel,y\n";
        let cats = parse_categories(input).unwrap();
        assert_eq!(cats, vec!["Weather", "Travel"]);
    }

    #[test]
    fn test_fuzzy_header_match() {
        let input = b"id;cat_name\n1;Finance\n2;Sports\n";
        let cats = parse_categories(input).unwrap();
        assert_eq!(cats, vec!["Finance", "Sports"]);
    }

    #[test]
    fn test_headerless_single_column() {
        let input = b"Weather\nTravel\n";
        let cats = parse_categories(input).unwrap();
        // No recognizable header: the first row is data.
        assert_eq!(cats, vec!["Weather", "Travel"]);
    }

    #[test]
    fn test_dedup_preserves_first_seen_order() {
        let input = b"category\nTravel\nWeather\ntravel\nWeather\nNews\n";
        let cats = parse_categories(input).unwrap();
        assert_eq!(cats, vec!["Travel", "Weather", "News"]);
    }

    #[test]
    fn test_blank_rows_and_cells_skipped() {
        let input = b"category\nWeather\n\n   \nTravel\n";
        let cats = parse_categories(input).unwrap();
        assert_eq!(cats, vec!["Weather", "Travel"]);
    }

    #[test]
    fn test_quoted_values() {
        let input = b"category\n\"Food & Drink\"\n\"Photo & Video\"\n";
        let cats = parse_categories(input).unwrap();
        assert_eq!(cats, vec!["Food & Drink", "Photo & Video"]);
    }

    #[test]
    fn test_empty_file_errors() {
        assert!(matches!(
            parse_categories(b""),
            Err(InputError::EmptyFile)
        ));
    }

    #[test]
    fn test_header_only_errors() {
        assert!(matches!(
            parse_categories(b"category\n"),
            Err(InputError::NoCategories)
        ));
    }

    #[test]
    fn test_detect_delimiter_variants() {
        assert_eq!(detect_delimiter("a,b,c\n1,2,3"), ',');
        assert_eq!(detect_delimiter("a;b;c\n1;2;3"), ';');
        assert_eq!(detect_delimiter("a\tb\tc"), '\t');
        assert_eq!(detect_delimiter("a|b|c"), '|');
        // Single column defaults to comma, which splits nothing.
        assert_eq!(detect_delimiter("category"), ',');
    }

    #[test]
    fn test_latin1_decoding() {
        // "Qualité" in ISO-8859-1.
        let bytes: &[u8] = b"category\nQualit\xe9\n";
        let cats = parse_categories(bytes).unwrap();
        assert_eq!(cats.len(), 1);
        assert!(cats[0].starts_with("Qualit"));
    }
}
