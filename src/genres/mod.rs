//! Canonical genre taxonomy and fuzzy category resolution.
//!
//! Maps free-text category labels ("Food & Drink") to the
//! marketplace's numeric genre identifiers. Resolution is three
//! phases, first match wins:
//!
//! 1. Exact match (case-insensitive, trimmed).
//! 2. Match with `&` normalized to `and` on both sides.
//! 3. Substring match in either direction, iterated in table order.
//!
//! The substring phase is ambiguous by design: a label containing two
//! genre names resolves to whichever appears first in the table. This
//! is a known limitation, kept deterministic rather than fixed.

/// Numeric marketplace taxonomy identifier.
pub type GenreId = u32;

/// Canonical genre table.
///
/// Declaration order matters: the substring phase of [`resolve`]
/// iterates this slice top to bottom.
pub const GENRE_TABLE: &[(&str, GenreId)] = &[
    ("books", 6018),
    ("business", 6000),
    ("developer tools", 6026),
    ("education", 6017),
    ("entertainment", 6016),
    ("finance", 6015),
    ("food & drink", 6023),
    ("graphics & design", 6027),
    ("health & fitness", 6013),
    ("lifestyle", 6012),
    ("kids", 36),
    ("magazines & newspapers", 6021),
    ("medical", 6020),
    ("music", 6011),
    ("navigation", 6010),
    ("news", 6009),
    ("photo & video", 6008),
    ("productivity", 6007),
    ("reference", 6006),
    ("safari extensions", 1460),
    ("shopping", 6024),
    ("social networking", 6005),
    ("sports", 6004),
    ("travel", 6003),
    ("utilities", 6002),
    ("weather", 6001),
];

/// Rewrite `&` as `and` for the normalized comparison phase.
fn normalize_ampersand(s: &str) -> String {
    s.replace('&', "and")
}

/// Resolve a free-text category label to a genre id.
///
/// Returns `None` when the label matches nothing; unresolved
/// categories pass through the pipeline with no genre-scoped source
/// attempted.
pub fn resolve(category: &str) -> Option<GenreId> {
    let key = category.trim().to_lowercase();
    if key.is_empty() {
        return None;
    }

    // Phase 1: exact.
    for &(name, gid) in GENRE_TABLE {
        if name == key {
            return Some(gid);
        }
    }

    // Phase 2: '&' rewritten to 'and' on both sides.
    let key_norm = normalize_ampersand(&key);
    for &(name, gid) in GENRE_TABLE {
        if normalize_ampersand(name) == key_norm {
            return Some(gid);
        }
    }

    // Phase 3: substring in either direction, table order wins.
    for &(name, gid) in GENRE_TABLE {
        if key.contains(name) || name.contains(&key) {
            return Some(gid);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_match() {
        assert_eq!(resolve("weather"), Some(6001));
        assert_eq!(resolve("food & drink"), Some(6023));
    }

    #[test]
    fn test_case_and_whitespace_insensitive() {
        assert_eq!(resolve("  Weather "), Some(6001));
        assert_eq!(resolve("FOOD & DRINK"), Some(6023));
    }

    #[test]
    fn test_ampersand_normalization() {
        // "food & drink", "food and drink" and the substring "food"
        // must all land on the same id.
        let canonical = resolve("food & drink");
        assert_eq!(canonical, Some(6023));
        assert_eq!(resolve("food and drink"), canonical);
        assert_eq!(resolve("food"), canonical);
    }

    #[test]
    fn test_substring_both_directions() {
        // Input inside a genre name.
        assert_eq!(resolve("navig"), Some(6010));
        // Genre name inside the input.
        assert_eq!(resolve("local weather forecasts"), Some(6001));
    }

    #[test]
    fn test_ambiguous_label_resolves_in_table_order() {
        // Contains both "music" and "news"; "music" comes first in
        // the table, so it wins. Pins the documented fuzziness.
        assert_eq!(resolve("music news"), Some(6011));
    }

    #[test]
    fn test_unresolved() {
        assert_eq!(resolve("definitely not a genre"), None);
        assert_eq!(resolve(""), None);
        assert_eq!(resolve("   "), None);
    }
}
