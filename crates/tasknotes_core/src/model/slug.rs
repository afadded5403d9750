//! Slug derivation for titled records.

use once_cell::sync::Lazy;
use regex::Regex;

static NON_ALNUM_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-z0-9]+").expect("valid slug separator regex"));

const EMPTY_SLUG: &str = "n-a";

/// Derives a URL-safe slug from a title.
///
/// Deterministic: the same title always yields the same slug.
/// - ASCII letters are lowercased, digits are kept.
/// - Every other run of characters collapses into one `-`.
/// - Leading/trailing separators are trimmed.
/// - Titles with nothing slug-worthy map to `n-a`.
pub fn slugify(title: &str) -> String {
    let lowered = title.to_ascii_lowercase();
    let joined = NON_ALNUM_RE.replace_all(&lowered, "-");
    let trimmed = joined.trim_matches('-');
    if trimmed.is_empty() {
        EMPTY_SLUG.to_string()
    } else {
        trimmed.to_string()
    }
}
