// crates/places-core/src/text.rs

//! # Text Normalization
//!
//! Diacritic folding and tokenization shared by the index, the query path
//! and the highlighter, so that `Zürich`, `zurich` and `ZURICH` all meet on
//! the same terms.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;
use unicode_segmentation::UnicodeSegmentation;

/// Strips diacritics by canonical decomposition (NFD) and removal of
/// combining marks.
///
/// Case is preserved and empty input is returned unchanged. The function is
/// idempotent.
///
/// # Examples
///
/// ```rust
/// use places_core::text::normalize;
///
/// assert_eq!(normalize("Zürich"), "Zurich");
/// assert_eq!(normalize("Île-de-France"), "Ile-de-France");
/// assert_eq!(normalize(""), "");
/// ```
pub fn normalize(s: &str) -> String {
    s.nfd().filter(|c| !is_combining_mark(*c)).collect()
}

/// [`normalize`] followed by lowercasing. Used for comparisons.
pub fn fold_key(s: &str) -> String {
    normalize(s).to_lowercase()
}

/// Splits text into lowercase words on Unicode word boundaries.
///
/// Indexing and querying go through this same function so that both sides
/// agree on where terms start and end.
pub fn tokenize(s: &str) -> Vec<String> {
    s.unicode_words().map(str::to_lowercase).collect()
}

/// A folded (diacritic-free, lowercase) view over a display string that
/// remembers where each folded char came from.
///
/// Matches found in the folded view map back to byte ranges of the source,
/// so emphasis can be inserted into the untouched display value even when
/// folding changed the length of the text.
#[derive(Debug)]
pub(crate) struct FoldedText {
    chars: Vec<char>,
    /// Source byte range that produced each folded char.
    spans: Vec<(usize, usize)>,
}

impl FoldedText {
    pub(crate) fn new(source: &str) -> Self {
        let mut chars = Vec::with_capacity(source.len());
        let mut spans: Vec<(usize, usize)> = Vec::with_capacity(source.len());

        for (start, ch) in source.char_indices() {
            let end = start + ch.len_utf8();
            let before = chars.len();
            for folded in std::iter::once(ch)
                .nfd()
                .filter(|c| !is_combining_mark(*c))
                .flat_map(char::to_lowercase)
            {
                chars.push(folded);
                spans.push((start, end));
            }
            // A bare combining mark folds to nothing; keep it attached to
            // the previous char so emphasis never splits them.
            if chars.len() == before {
                if let Some(last) = spans.last_mut() {
                    last.1 = end;
                }
            }
        }

        Self { chars, spans }
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.chars.len()
    }

    /// Folded-char positions where `needle` starts, in order.
    pub(crate) fn find_all<'a>(&'a self, needle: &'a [char]) -> impl Iterator<Item = usize> + 'a {
        let last_start = if needle.is_empty() || needle.len() > self.chars.len() {
            0
        } else {
            self.chars.len() - needle.len() + 1
        };
        (0..last_start).filter(move |&i| self.chars[i..i + needle.len()] == *needle)
    }

    /// Source byte range covered by folded chars `start..end`.
    pub(crate) fn source_range(&self, start: usize, end: usize) -> (usize, usize) {
        debug_assert!(start < end && end <= self.spans.len());
        (self.spans[start].0, self.spans[end - 1].1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_diacritics_and_keeps_case() {
        assert_eq!(normalize("São Paulo"), "Sao Paulo");
        assert_eq!(normalize("Kraków"), "Krakow");
        assert_eq!(normalize("Ñuñoa"), "Nunoa");
    }

    #[test]
    fn normalize_is_idempotent() {
        for s in ["Zürich", "Île-de-France", "Đà Nẵng", "plain", "", "e\u{301}"] {
            let once = normalize(s);
            assert_eq!(normalize(&once), once, "not idempotent for {s:?}");
        }
    }

    #[test]
    fn fold_key_lowercases() {
        assert_eq!(fold_key("MÜNCHEN"), "munchen");
    }

    #[test]
    fn tokenize_splits_on_punctuation() {
        assert_eq!(tokenize("Saint-Denis, Île"), vec!["saint", "denis", "île"]);
        assert_eq!(tokenize("  New   York "), vec!["new", "york"]);
        assert!(tokenize(" , ").is_empty());
    }

    #[test]
    fn folded_text_maps_back_to_source_bytes() {
        let folded = FoldedText::new("Zürich");
        let needle: Vec<char> = "uri".chars().collect();
        let hit = folded.find_all(&needle).next().unwrap();
        let (start, end) = folded.source_range(hit, hit + needle.len());
        assert_eq!(&"Zürich"[start..end], "üri");
    }

    #[test]
    fn folded_text_keeps_combining_marks_with_base() {
        let source = "Cafe\u{301} Noir";
        let folded = FoldedText::new(source);
        let needle: Vec<char> = "cafe".chars().collect();
        let (start, end) = folded.source_range(0, needle.len());
        assert_eq!(start, 0);
        assert_eq!(&source[start..end], "Cafe\u{301}");
        assert_eq!(folded.len(), "cafe noir".chars().count());
    }
}
