//! Sentence segmentation using Unicode (UAX #29) sentence boundaries.

use unicode_segmentation::UnicodeSegmentation;

/// Split text into trimmed, non-empty sentences in reading order.
///
/// Fragments that are blank after trimming are dropped; punctuation-only ones are kept.
pub fn split_sentences(text: &str) -> Vec<String> {
    text.unicode_sentences().map(str::trim).filter(|s| !s.is_empty()).map(str::to_string).collect()
}
