//! Field constraints shared by all forms. Each returns the violation
//! message, or `None` when the value is acceptable.

use once_cell::sync::Lazy;
use regex::Regex;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email regex")
});

pub fn not_blank(value: &str) -> Option<String> {
    if value.trim().is_empty() {
        Some("This value should not be blank.".to_string())
    } else {
        None
    }
}

/// Character-length bounds, inclusive, on the trimmed value.
pub fn length(value: &str, min: usize, max: usize) -> Option<String> {
    char_bounds(value.trim().chars().count(), min, max)
}

/// Like [`length`], but counts surrounding whitespace too. Used for secrets,
/// which are stored as typed.
pub fn untrimmed_length(value: &str, min: usize, max: usize) -> Option<String> {
    char_bounds(value.chars().count(), min, max)
}

fn char_bounds(count: usize, min: usize, max: usize) -> Option<String> {
    if count < min {
        Some(format!(
            "This value is too short. It should have {min} characters or more."
        ))
    } else if count > max {
        Some(format!(
            "This value is too long. It should have {max} characters or less."
        ))
    } else {
        None
    }
}

pub fn email(value: &str) -> Option<String> {
    if EMAIL_RE.is_match(value.trim()) {
        None
    } else {
        Some("This value is not a valid email address.".to_string())
    }
}
