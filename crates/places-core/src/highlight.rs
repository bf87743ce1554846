// crates/places-core/src/highlight.rs

//! # Highlighting
//!
//! Builds the `_highlightResult` of a hit from the query and the index's
//! match report.
//!
//! The final query token is treated as still being typed: a matched term that
//! starts with the same letter but is longer than that token only gets the
//! typed prefix emphasized (`terr` → `Northern <em>Terr</em>itory`). Every
//! other matched term is emphasized whole.
//!
//! Emphasis is located on a folded (lowercase, diacritic-free) view of the
//! display value and applied to the untouched original, so `orleans` marks
//! up `Orléans` correctly.

use crate::index::MatchReport;
use crate::model::{DisplayField, PlaceRecord};
use crate::text::{fold_key, tokenize, FoldedText};
use serde::Serialize;

pub const EM_OPEN: &str = "<em>";
pub const EM_CLOSE: &str = "</em>";

/// How well a field matched. Ordered so that a level can only be raised.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchLevel {
    #[default]
    None,
    Partial,
    Full,
}

/// Highlight state of one display field.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HighlightField {
    pub value: String,
    pub match_level: MatchLevel,
    pub matched_words: Vec<String>,
    /// Absent until at least one term matched the field.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fully_highlighted: Option<bool>,
}

/// Per-field highlights. `admin` and `city` are list-shaped on the wire.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HighlightResult {
    pub country: HighlightField,
    pub admin: Vec<HighlightField>,
    pub city: Vec<HighlightField>,
}

impl HighlightResult {
    pub fn field(&self, field: DisplayField) -> &HighlightField {
        match field {
            DisplayField::Country => &self.country,
            DisplayField::Admin => &self.admin[0],
            DisplayField::City => &self.city[0],
        }
    }
}

/// Accumulates emphasis for one field before it is rendered.
struct FieldMarkup<'a> {
    source: &'a str,
    folded: FoldedText,
    /// Folded-char ranges already emphasized.
    spans: Vec<(usize, usize)>,
    level: MatchLevel,
    words: Vec<String>,
    fully: Option<bool>,
}

impl<'a> FieldMarkup<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            folded: FoldedText::new(source),
            spans: Vec::new(),
            level: MatchLevel::None,
            words: Vec::new(),
            fully: None,
        }
    }

    /// Emphasizes the first free occurrence of `needle`, `len` chars long.
    fn mark(&mut self, needle: &[char], len: usize) {
        let spans = &self.spans;
        let free = self
            .folded
            .find_all(needle)
            .find(|&start| spans.iter().all(|&(s, e)| start + len <= s || start >= e));
        if let Some(start) = free {
            self.spans.push((start, start + len));
        }
    }

    fn finish(mut self) -> HighlightField {
        self.spans.sort_unstable();

        let mut value = String::with_capacity(self.source.len() + self.spans.len() * 9);
        let mut cursor = 0;
        for (start, end) in self.spans {
            let (from, to) = self.folded.source_range(start, end);
            if from < cursor {
                continue;
            }
            value.push_str(&self.source[cursor..from]);
            value.push_str(EM_OPEN);
            value.push_str(&self.source[from..to]);
            value.push_str(EM_CLOSE);
            cursor = to;
        }
        value.push_str(&self.source[cursor..]);

        HighlightField {
            value,
            match_level: self.level,
            matched_words: self.words,
            fully_highlighted: self.fully,
        }
    }
}

/// Computes the highlight of `record` for `query`.
///
/// Pure: the record and report are only read.
pub fn highlight(query: &str, record: &PlaceRecord, matches: &MatchReport) -> HighlightResult {
    let mut city = FieldMarkup::new(&record.city);
    let mut admin = FieldMarkup::new(&record.admin);
    let mut country = FieldMarkup::new(&record.country);

    let final_token = tokenize(query).pop().unwrap_or_default();
    let final_folded: Vec<char> = fold_key(&final_token).chars().collect();

    for (term, fields) in matches.iter() {
        let term_folded: Vec<char> = fold_key(term).chars().collect();
        if term_folded.is_empty() {
            continue;
        }

        let full = final_folded.first() == term_folded.first();
        let fully = !full || final_folded.len() >= term_folded.len();
        let emphasized = if fully { term_folded.len() } else { final_folded.len() };
        let level = if full { MatchLevel::Full } else { MatchLevel::Partial };
        let word: String = if fully { term_folded.iter().collect() } else { final_token.clone() };

        let mut seen: Vec<DisplayField> = Vec::with_capacity(3);
        for field in fields {
            let display = field.display();
            if seen.contains(&display) {
                continue;
            }
            seen.push(display);

            let markup = match display {
                DisplayField::City => &mut city,
                DisplayField::Admin => &mut admin,
                DisplayField::Country => &mut country,
            };
            markup.mark(&term_folded, emphasized);
            markup.level = markup.level.max(level);
            markup.fully = Some(markup.fully.unwrap_or(true) && fully);
            markup.words.push(word.clone());
        }
    }

    HighlightResult {
        country: country.finish(),
        admin: vec![admin.finish()],
        city: vec![city.finish()],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CountryMap, Field};

    fn record(city: &str, admin: &str, iso2: &str) -> PlaceRecord {
        let countries: CountryMap = [("au", "Australia"), ("fr", "France"), ("gb", "United Kingdom")]
            .into_iter()
            .collect();
        PlaceRecord::new("1".into(), iso2, city, admin, 0.0, 0.0, &countries)
    }

    fn report(pairs: &[(&str, Field)]) -> MatchReport {
        let mut report = MatchReport::new();
        for (term, field) in pairs {
            report.add(term, *field);
        }
        report
    }

    #[test]
    fn final_token_highlights_typed_prefix_only() {
        let r = record("Darwin", "Northern Territory", "au");
        let h = highlight("terr", &r, &report(&[("territory", Field::AdminNorm)]));
        let admin = &h.admin[0];
        assert_eq!(admin.value, "Northern <em>Terr</em>itory");
        assert_eq!(admin.match_level, MatchLevel::Full);
        assert_eq!(admin.fully_highlighted, Some(false));
        assert_eq!(admin.matched_words, vec!["terr"]);
    }

    #[test]
    fn unmatched_fields_stay_untouched() {
        let r = record("Darwin", "Northern Territory", "au");
        let h = highlight("darwin", &r, &report(&[("darwin", Field::City)]));
        assert_eq!(h.city[0].value, "<em>Darwin</em>");
        let country = h.field(DisplayField::Country);
        assert_eq!(country.value, "Australia");
        assert_eq!(country.match_level, MatchLevel::None);
        assert_eq!(country.fully_highlighted, None);
        assert!(country.matched_words.is_empty());
    }

    #[test]
    fn different_first_letter_is_partial_and_whole() {
        let r = record("Marseille", "", "fr");
        let h = highlight("narseille", &r, &report(&[("marseille", Field::CityNorm)]));
        let city = &h.city[0];
        assert_eq!(city.match_level, MatchLevel::Partial);
        assert_eq!(city.fully_highlighted, Some(true));
        assert_eq!(city.value, "<em>Marseille</em>");
    }

    #[test]
    fn level_only_upgrades_in_either_order() {
        let r = record("Newport Beach", "", "gb");
        for pairs in [
            [("beach", Field::City), ("newport", Field::City)],
            [("newport", Field::City), ("beach", Field::City)],
        ] {
            let h = highlight("beach new", &r, &report(&pairs));
            let city = &h.city[0];
            assert_eq!(city.match_level, MatchLevel::Full, "order {pairs:?}");
            assert_eq!(city.value, "<em>New</em>port <em>Beach</em>");
            assert_eq!(city.fully_highlighted, Some(false));
        }
    }

    #[test]
    fn norm_and_display_field_count_once() {
        let r = record("Orléans", "", "fr");
        let h = highlight(
            "orleans",
            &r,
            &report(&[("orleans", Field::CityNorm), ("orleans", Field::City)]),
        );
        let city = &h.city[0];
        assert_eq!(city.value, "<em>Orléans</em>");
        assert_eq!(city.matched_words, vec!["orleans"]);
    }

    #[test]
    fn markers_never_nest_or_match_themselves() {
        let r = record("Emmen", "", "gb");
        let h = highlight(
            "em emmen",
            &r,
            &report(&[("emmen", Field::City), ("em", Field::City)]),
        );
        assert_eq!(h.city[0].value, "<em>Emmen</em>");
    }

    #[test]
    fn serializes_with_wire_names() {
        let r = record("Paris", "Ile-de-France", "fr");
        let h = highlight("par", &r, &report(&[("paris", Field::City)]));
        let json = serde_json::to_value(&h).unwrap();
        assert_eq!(json["city"][0]["matchLevel"], "full");
        assert_eq!(json["city"][0]["fullyHighlighted"], false);
        assert_eq!(json["city"][0]["matchedWords"][0], "par");
        assert_eq!(json["country"]["matchLevel"], "none");
        assert!(json["country"].get("fullyHighlighted").is_none());
    }
}
