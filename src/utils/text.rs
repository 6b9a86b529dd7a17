//! Text normalization and display casing
//!
//! Roster comparison and certificate display both work on
//! whitespace-delimited words. Normalization is the matching key; the casing
//! helpers produce what ends up on the page.

/// Normalize a name for comparison
///
/// Trims, lowercases and collapses every internal whitespace run to a single
/// space. Idempotent: `normalize(&normalize(s)) == normalize(s)`.
pub fn normalize(value: &str) -> String {
    value
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Uppercase every word and join with single spaces ("team  alpha" -> "TEAM ALPHA")
pub fn to_upper_words(value: &str) -> String {
    value
        .split_whitespace()
        .map(str::to_uppercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Title-case every word: first character upper, remainder lower
///
/// Hyphens, apostrophes and acronyms get no special treatment, so
/// "MIT-WPU" becomes "Mit-wpu".
pub fn to_title_words(value: &str) -> String {
    value
        .split_whitespace()
        .map(title_case_word)
        .collect::<Vec<_>>()
        .join(" ")
}

fn title_case_word(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

/// Whether a value is blank once surrounding whitespace is removed
pub fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}
