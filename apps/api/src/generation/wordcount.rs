//! Locale-aware word counting.
//!
//! Chinese text does not use whitespace between words, so a token count
//! would land near the sentence count. For `zh` locales every
//! non-whitespace character counts as a word; everything else counts
//! whitespace-separated tokens.

/// Counts words in `text` according to the document language.
pub fn word_count(text: &str, language: &str) -> i32 {
    if language.starts_with("zh") {
        text.chars().filter(|c| !c.is_whitespace()).count() as i32
    } else {
        text.split_whitespace().count() as i32
    }
}
