// crates/places-core/src/index.rs

//! # Text Index
//!
//! An in-memory inverted index over the searchable fields of every
//! [`PlaceRecord`]. Query terms are expanded three ways before scoring:
//!
//! - **exact**: the index term equals the query term
//! - **prefix**: the index term starts with the query term
//! - **fuzzy**: the index term is within `round(0.3 × len)` edits
//!
//! Scores combine field weight, term frequency, inverse document frequency
//! and field-length normalization; prefix and fuzzy expansions are
//! penalised by their weighted distance. Every result carries a
//! [`MatchReport`] naming which index terms matched in which fields.

use crate::boost::Boost;
use crate::model::{Field, PlaceRecord};
use crate::text::tokenize;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Edit tolerance as a fraction of the query term length.
pub const FUZZY_RATIO: f64 = 0.3;
const PREFIX_WEIGHT: f64 = 0.75;
const FUZZY_WEIGHT: f64 = 0.9;

#[derive(Debug, Clone, Copy)]
struct Posting {
    slot: u32,
    tf: u32,
}

/// Postings of one term, split by field.
#[derive(Debug, Clone, Default)]
struct TermEntry {
    fields: [Vec<Posting>; 4],
}

/// Which index terms matched which fields, in discovery order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchReport {
    entries: Vec<(String, Vec<Field>)>,
}

impl MatchReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, term: &str, field: Field) {
        match self.entries.iter_mut().find(|(t, _)| t == term) {
            Some((_, fields)) => {
                if !fields.contains(&field) {
                    fields.push(field);
                }
            }
            None => self.entries.push((term.to_owned(), vec![field])),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Field])> {
        self.entries.iter().map(|(t, f)| (t.as_str(), f.as_slice()))
    }

    pub fn terms(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(t, _)| t.as_str())
    }

    pub fn fields(&self, term: &str) -> Option<&[Field]> {
        self.entries
            .iter()
            .find(|(t, _)| t == term)
            .map(|(_, f)| f.as_slice())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A scored candidate. Query-scoped; the record itself is shared.
#[derive(Debug, Clone)]
pub struct SearchResult {
    pub record: Arc<PlaceRecord>,
    pub score: f64,
    pub boost: Option<Boost>,
    pub matches: MatchReport,
    slot: u32,
}

impl SearchResult {
    pub fn new(record: Arc<PlaceRecord>, score: f64) -> Self {
        Self {
            record,
            score,
            boost: None,
            matches: MatchReport::new(),
            slot: 0,
        }
    }
}

/// Inverted index over `city_norm`, `city`, `admin_norm` and `country`.
#[derive(Debug, Clone, Default)]
pub struct TextIndex {
    records: Vec<Arc<PlaceRecord>>,
    terms: BTreeMap<String, TermEntry>,
    field_lengths: Vec<[u32; 4]>,
    total_field_lengths: [u64; 4],
}

struct Expansion<'a> {
    term: &'a str,
    entry: &'a TermEntry,
    weight: f64,
    distance: f64,
}

impl TextIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds every record's indexed fields.
    pub fn index<I>(&mut self, records: I)
    where
        I: IntoIterator<Item = Arc<PlaceRecord>>,
    {
        for record in records {
            self.insert(record);
        }
    }

    fn insert(&mut self, record: Arc<PlaceRecord>) {
        let slot = self.records.len() as u32;
        let mut lengths = [0u32; 4];

        for field in Field::ALL {
            let tokens = tokenize(record.field(field));
            lengths[field.slot()] = tokens.len() as u32;
            self.total_field_lengths[field.slot()] += tokens.len() as u64;

            let mut freqs: Vec<(String, u32)> = Vec::new();
            for token in tokens {
                match freqs.iter_mut().find(|(t, _)| *t == token) {
                    Some((_, n)) => *n += 1,
                    None => freqs.push((token, 1)),
                }
            }
            for (term, tf) in freqs {
                self.terms.entry(term).or_default().fields[field.slot()].push(Posting { slot, tf });
            }
        }

        self.field_lengths.push(lengths);
        self.records.push(record);
    }

    /// Drops everything.
    pub fn remove_all(&mut self) {
        *self = Self::default();
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of distinct index terms.
    pub fn term_count(&self) -> usize {
        self.terms.len()
    }

    pub fn records(&self) -> impl Iterator<Item = &Arc<PlaceRecord>> {
        self.records.iter()
    }

    /// Runs `query` against the index.
    ///
    /// `predicate` sees each scored candidate before ranking; it may adjust
    /// the score and boost, and returning `false` drops the candidate.
    /// Results are ordered by descending score, ties by insertion order.
    pub fn search<P>(&self, query: &str, mut predicate: P) -> Vec<SearchResult>
    where
        P: FnMut(&mut SearchResult) -> bool,
    {
        let query_terms = tokenize(query);
        if query_terms.is_empty() || self.records.is_empty() {
            return Vec::new();
        }

        let mut candidates: HashMap<u32, (f64, MatchReport)> = HashMap::new();

        for query_term in &query_terms {
            for expansion in self.expand(query_term) {
                self.accumulate(&expansion, &mut candidates);
            }
        }

        let mut results: Vec<SearchResult> = candidates
            .into_iter()
            .filter_map(|(slot, (score, matches))| {
                let mut result = SearchResult {
                    record: Arc::clone(&self.records[slot as usize]),
                    score,
                    boost: None,
                    matches,
                    slot,
                };
                predicate(&mut result).then_some(result)
            })
            .collect();

        results.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then(a.slot.cmp(&b.slot))
        });
        results
    }

    /// Exact, prefix and fuzzy index terms for one query term.
    fn expand<'a>(&'a self, query_term: &str) -> Vec<Expansion<'a>> {
        let mut out = Vec::new();
        let q_len = query_term.chars().count();

        if let Some((term, entry)) = self.terms.get_key_value(query_term) {
            out.push(Expansion {
                term,
                entry,
                weight: 1.0,
                distance: 0.0,
            });
        }

        for (term, entry) in self
            .terms
            .range::<str, _>((std::ops::Bound::Excluded(query_term), std::ops::Bound::Unbounded))
            .take_while(|(t, _)| t.starts_with(query_term))
        {
            let t_len = term.chars().count();
            out.push(Expansion {
                term,
                entry,
                weight: PREFIX_WEIGHT,
                distance: FUZZY_RATIO * (t_len - q_len) as f64 / t_len as f64,
            });
        }

        let max_edits = (q_len as f64 * FUZZY_RATIO).round() as usize;
        if max_edits > 0 {
            for (term, entry) in &self.terms {
                let t_len = term.chars().count();
                if t_len.abs_diff(q_len) > max_edits {
                    continue;
                }
                let edits = strsim::levenshtein(query_term, term);
                if edits > 0 && edits <= max_edits {
                    out.push(Expansion {
                        term,
                        entry,
                        weight: FUZZY_WEIGHT,
                        distance: edits as f64 / t_len as f64,
                    });
                }
            }
        }

        out
    }

    fn accumulate(&self, expansion: &Expansion<'_>, candidates: &mut HashMap<u32, (f64, MatchReport)>) {
        let doc_count = self.records.len() as f64;

        for field in Field::ALL {
            let postings = &expansion.entry.fields[field.slot()];
            if postings.is_empty() {
                continue;
            }

            let idf = (1.0 + doc_count / postings.len() as f64).ln();
            let avg_len = self.total_field_lengths[field.slot()] as f64 / doc_count;
            let boost = field.boost();
            let field_weight = boost / (1.0 + 0.333 * boost * expansion.distance);

            for posting in postings {
                let len = self.field_lengths[posting.slot as usize][field.slot()] as f64;
                let norm_len = if avg_len > 0.0 { len / avg_len } else { 1.0 };
                let score = expansion.weight * field_weight * posting.tf as f64 * idf / norm_len.max(f64::EPSILON);

                let (total, matches) = candidates.entry(posting.slot).or_default();
                *total += score;
                matches.add(expansion.term, field);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CountryMap;

    fn place(iso2: &str, city: &str, admin: &str) -> Arc<PlaceRecord> {
        let countries: CountryMap = [("gb", "United Kingdom"), ("fr", "France"), ("au", "Australia")]
            .into_iter()
            .collect();
        Arc::new(PlaceRecord::new(city.to_lowercase(), iso2, city, admin, 0.0, 0.0, &countries))
    }

    fn index_of(places: Vec<Arc<PlaceRecord>>) -> TextIndex {
        let mut index = TextIndex::new();
        index.index(places);
        index
    }

    fn ids(results: &[SearchResult]) -> Vec<&str> {
        results.iter().map(|r| r.record.id.as_str()).collect()
    }

    #[test]
    fn empty_query_yields_nothing() {
        let index = index_of(vec![place("gb", "London", "")]);
        assert!(index.search("", |_| true).is_empty());
        assert!(index.search(" ,, ", |_| true).is_empty());
    }

    #[test]
    fn prefix_match_prefers_shorter_completion() {
        let index = index_of(vec![place("gb", "Londonderry", ""), place("gb", "London", "")]);
        let results = index.search("lond", |_| true);
        assert_eq!(ids(&results), vec!["london", "londonderry"]);
    }

    #[test]
    fn fuzzy_match_tolerates_typos() {
        let index = index_of(vec![place("fr", "Marseille", ""), place("fr", "Paris", "")]);
        let results = index.search("marseile", |_| true);
        assert_eq!(ids(&results), vec!["marseille"]);
        assert!(results[0].matches.fields("marseille").is_some());
    }

    #[test]
    fn diacritics_do_not_block_matches() {
        let index = index_of(vec![place("fr", "Orléans", "")]);
        let results = index.search("orleans", |_| true);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].matches.fields("orleans"), Some(&[Field::CityNorm][..]));
    }

    #[test]
    fn city_outranks_country_and_admin_mentions() {
        let index = index_of(vec![
            place("au", "Darwin", "Northern Territory"),
            place("gb", "Northampton", ""),
        ]);
        let results = index.search("north", |_| true);
        assert_eq!(ids(&results), vec!["northampton", "darwin"]);
        assert_eq!(
            results[1].matches.fields("northern"),
            Some(&[Field::AdminNorm][..])
        );
    }

    #[test]
    fn predicate_filters_and_rescales() {
        let index = index_of(vec![place("gb", "London", ""), place("gb", "Londonderry", "")]);
        let results = index.search("lond", |r| {
            if r.record.id == "londonderry" {
                r.score *= 100.0;
            }
            true
        });
        assert_eq!(ids(&results), vec!["londonderry", "london"]);

        let results = index.search("lond", |r| r.record.id != "london");
        assert_eq!(ids(&results), vec!["londonderry"]);
    }

    #[test]
    fn ties_keep_insertion_order() {
        let index = index_of(vec![place("gb", "Newport", ""), place("au", "Newport", "")]);
        let results = index.search("newport", |_| true);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].record.country_code, "gb");
        assert_eq!(results[1].record.country_code, "au");
    }

    #[test]
    fn remove_all_clears_terms_and_records() {
        let mut index = index_of(vec![place("gb", "London", "")]);
        assert!(index.term_count() > 0);
        index.remove_all();
        assert!(index.is_empty());
        assert_eq!(index.term_count(), 0);
        assert!(index.search("london", |_| true).is_empty());
    }
}
