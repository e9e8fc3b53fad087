//! Text normalization for deduplication comparison

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Potency values that mean "not specified"
const UNSPECIFIED_POTENCY: [&str; 6] = ["", "n/a", "na", "unknown", "varied", "not applicable"];

/// Normalize free text for comparison
///
/// - Converts to lowercase
/// - Drops apostrophes (`nature's` -> `natures`)
/// - Removes diacritics
/// - Drops everything outside `[a-z0-9\s]`, so `B-12` stays one token `b12`
/// - Collapses whitespace and trims
///
/// Total: never fails, empty input gives an empty string.
pub fn normalize_text(text: &str) -> String {
    let cleaned: String = text
        .to_lowercase()
        // Unicode normalize (NFKD to separate combining characters)
        .nfkd()
        .filter(|c| !is_combining_mark(*c) && !is_apostrophe(*c))
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c.is_whitespace())
        .collect();

    collapse_whitespace(&cleaned)
}

/// Normalize a potency/strength value
///
/// Returns an empty string for values that mean "unspecified", which keeps the
/// record out of bucketing.
pub fn normalize_potency(raw: &str) -> String {
    let lowered = raw.to_lowercase();
    let collapsed = collapse_whitespace(&lowered);

    if UNSPECIFIED_POTENCY.contains(&collapsed.as_str()) {
        return String::new();
    }

    // мкг before мг, the latter is a suffix of the former
    collapsed.replace("мкг", "mcg").replace("мг", "mg")
}

fn is_apostrophe(c: char) -> bool {
    matches!(c, '\'' | '\u{2018}' | '\u{2019}' | '`')
}

/// Collapse runs of whitespace into a single space and trim the ends
fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_text() {
        assert_eq!(normalize_text("NOW Foods Vitamin D3"), "now foods vitamin d3");
        assert_eq!(normalize_text("  Omega-3   Fish Oil "), "omega3 fish oil");
        assert_eq!(normalize_text(""), "");
    }

    #[test]
    fn test_normalize_text_apostrophes() {
        assert_eq!(normalize_text("Nature's Way"), "natures way");
        assert_eq!(normalize_text("Doctor\u{2019}s Best"), "doctors best");
    }

    #[test]
    fn test_normalize_text_diacritics_and_symbols() {
        assert_eq!(normalize_text("Crème Brûlée®"), "creme brulee");
        assert_eq!(normalize_text("B-Complex (100)"), "bcomplex 100");
        assert_eq!(normalize_text("Vitamin B-12, 1000mcg"), "vitamin b12 1000mcg");
    }

    #[test]
    fn test_normalize_text_keeps_hyphenated_variants_distinct() {
        assert_eq!(normalize_text("Omega-3"), normalize_text("Omega3"));
        assert_ne!(normalize_text("Omega-3"), normalize_text("Omega-6"));
        assert_ne!(normalize_text("Vitamin B-12"), normalize_text("Vitamin D-3"));
    }

    #[test]
    fn test_normalize_potency() {
        assert_eq!(normalize_potency("500MG"), "500mg");
        assert_eq!(normalize_potency(" 5000   IU "), "5000 iu");
        assert_eq!(normalize_potency("500 мг"), "500 mg");
        assert_eq!(normalize_potency("50 мкг"), "50 mcg");
    }

    #[test]
    fn test_normalize_potency_unspecified() {
        for raw in ["N/A", "na", "Unknown", "VARIED", "Not   Applicable", "", "   "] {
            assert_eq!(normalize_potency(raw), "", "{raw:?} should be unspecified");
        }
    }
}
