//! Whole-term matching with phrase priority.
//!
//! # Responsibility
//! - Match configured terms on word boundaries over normalized text.
//! - Let longer phrases claim their span so shorter terms inside them do not
//!   count twice.
//!
//! # Invariants
//! - A normalized term has exactly one owner; duplicates keep the entry with
//!   the lowest rank.
//! - Output order is `(owner, ordinal)` and independent of match order.

use regex::Regex;
use std::collections::BTreeMap;

/// One term declaration fed into [`TermMatcher::build`].
#[derive(Debug, Clone)]
pub struct TermSpec {
    pub term: String,
    /// Index of the owning group (cluster index, or 0 for flat lists).
    pub owner: usize,
    /// Lower rank wins when the same term is declared by several owners.
    pub rank: usize,
    /// Declaration order, used for stable output ordering.
    pub ordinal: usize,
}

/// A term that fired at least once outside spans claimed by longer terms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermHit {
    pub term: String,
    pub owner: usize,
}

#[derive(Debug, Clone)]
struct CompiledTerm {
    term: String,
    owner: usize,
    ordinal: usize,
    regex: Regex,
}

/// Compiled, priority-ordered term set.
#[derive(Debug, Clone, Default)]
pub struct TermMatcher {
    terms: Vec<CompiledTerm>,
}

impl TermMatcher {
    /// Normalizes, deduplicates and compiles term declarations.
    ///
    /// Returns the offending term and regex message on failure.
    pub fn build(specs: impl IntoIterator<Item = TermSpec>) -> Result<Self, (String, String)> {
        let mut winners: BTreeMap<String, TermSpec> = BTreeMap::new();
        for spec in specs {
            let normalized = normalize_term(&spec.term);
            if normalized.is_empty() {
                continue;
            }
            let replace = match winners.get(&normalized) {
                Some(existing) => (spec.rank, spec.ordinal) < (existing.rank, existing.ordinal),
                None => true,
            };
            if replace {
                winners.insert(
                    normalized.clone(),
                    TermSpec {
                        term: normalized,
                        ..spec
                    },
                );
            }
        }

        let mut terms = Vec::with_capacity(winners.len());
        for (term, spec) in winners {
            let regex = Regex::new(&term_pattern(&term)).map_err(|err| (term.clone(), err.to_string()))?;
            terms.push(CompiledTerm {
                term,
                owner: spec.owner,
                ordinal: spec.ordinal,
                regex,
            });
        }

        // Longest phrases claim text first; the term itself breaks remaining ties.
        terms.sort_by(|a, b| {
            word_count(&b.term)
                .cmp(&word_count(&a.term))
                .then_with(|| b.term.len().cmp(&a.term.len()))
                .then_with(|| a.term.cmp(&b.term))
        });

        Ok(Self { terms })
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// Returns distinct terms present in `text`, which must already be
    /// normalized with [`normalize_text`].
    pub fn find(&self, text: &str) -> Vec<TermHit> {
        let mut claimed: Vec<(usize, usize)> = Vec::new();
        let mut hits: Vec<(usize, usize, &str)> = Vec::new();

        for compiled in &self.terms {
            let mut fired = false;
            for found in compiled.regex.find_iter(text) {
                let span = (found.start(), found.end());
                if claimed
                    .iter()
                    .any(|&(start, end)| span.0 < end && start < span.1)
                {
                    continue;
                }
                claimed.push(span);
                fired = true;
            }
            if fired {
                hits.push((compiled.owner, compiled.ordinal, compiled.term.as_str()));
            }
        }

        hits.sort_by_key(|&(owner, ordinal, _)| (owner, ordinal));
        hits.into_iter()
            .map(|(owner, _, term)| TermHit {
                term: term.to_string(),
                owner,
            })
            .collect()
    }
}

/// Lowercases text and folds typographic apostrophes.
pub fn normalize_text(text: &str) -> String {
    text.to_lowercase().replace(['\u{2019}', '\u{2018}'], "'")
}

fn normalize_term(term: &str) -> String {
    normalize_text(term)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn word_count(term: &str) -> usize {
    term.split(' ').count()
}

fn term_pattern(term: &str) -> String {
    let body = term
        .split(' ')
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(r"\s+");
    let starts_word = term.chars().next().is_some_and(is_word_char);
    let ends_word = term.chars().last().is_some_and(is_word_char);
    format!(
        "{}{}{}",
        if starts_word { r"\b" } else { "" },
        body,
        if ends_word { r"\b" } else { "" }
    )
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

#[cfg(test)]
mod tests {
    use super::{normalize_text, TermMatcher, TermSpec};

    fn spec(term: &str, owner: usize, rank: usize, ordinal: usize) -> TermSpec {
        TermSpec {
            term: term.to_string(),
            owner,
            rank,
            ordinal,
        }
    }

    #[test]
    fn phrase_claims_span_before_single_word() {
        let matcher = TermMatcher::build(vec![
            spec("model", 0, 0, 0),
            spec("business model", 1, 1, 1),
        ])
        .unwrap();

        let hits = matcher.find(&normalize_text("Our Business Model is simple."));
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].term, "business model");
        assert_eq!(hits[0].owner, 1);

        let hits = matcher.find(&normalize_text("business model, and a mental model"));
        let terms: Vec<_> = hits.iter().map(|hit| hit.term.as_str()).collect();
        assert_eq!(terms, vec!["model", "business model"]);
    }

    #[test]
    fn matches_whole_words_only() {
        let matcher = TermMatcher::build(vec![spec("fun", 0, 0, 0)]).unwrap();
        assert!(matcher.find(&normalize_text("fundamental shift")).is_empty());
        assert_eq!(matcher.find(&normalize_text("just for fun.")).len(), 1);
    }

    #[test]
    fn duplicate_term_goes_to_lowest_rank() {
        let matcher = TermMatcher::build(vec![
            spec("leverage", 3, 2, 0),
            spec("Leverage", 1, 0, 5),
        ])
        .unwrap();
        assert_eq!(matcher.len(), 1);
        let hits = matcher.find("leverage");
        assert_eq!(hits[0].owner, 1);
    }

    #[test]
    fn phrase_matches_across_line_breaks_and_curly_apostrophes() {
        let matcher = TermMatcher::build(vec![spec("founder's dilemma", 0, 0, 0)]).unwrap();
        let text = normalize_text("the founder\u{2019}s\ndilemma again");
        assert_eq!(matcher.find(&text).len(), 1);
    }

    #[test]
    fn terms_ending_in_symbols_still_match() {
        let matcher = TermMatcher::build(vec![spec("c++", 0, 0, 0)]).unwrap();
        assert_eq!(matcher.find("we used c++ here").len(), 1);
    }
}
