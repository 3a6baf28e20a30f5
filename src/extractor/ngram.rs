use std::collections::HashSet;

use ahash::RandomState;

use crate::config::ExtractorConfig;
use crate::extractor::frequency::FrequencyCounter;
use crate::extractor::span::TokenSpan;

/// Joins the tokens of an n-gram, and the two n-grams of a combination.
pub const NGRAM_GLUE: &str = "_";

/// Number of tokens of an n-gram term
#[inline]
pub fn token_count(ngram: &str) -> usize {
    ngram.split(NGRAM_GLUE).count()
}

/// Per-window filters applied before a window becomes a term.
#[derive(Debug, Clone)]
pub struct TermFilter {
    pub lower_case: bool,
    pub stop_terms: HashSet<String, RandomState>,
    /// drop a window if any token is a stop term, instead of only when all are
    pub partial_stopword_match: bool,
    /// in chars
    pub min_token_length: usize,
}

impl Default for TermFilter {
    fn default() -> Self {
        Self {
            lower_case: true,
            stop_terms: HashSet::with_hasher(RandomState::new()),
            partial_stopword_match: false,
            min_token_length: 1,
        }
    }
}

impl TermFilter {
    /// Stop terms are folded too when lower-casing is on, so they compare
    /// against folded tokens.
    pub fn with_stop_terms<T>(mut self, stop_terms: &[T]) -> Self
    where
        T: AsRef<str>,
    {
        let lower_case = self.lower_case;
        self.stop_terms.extend(stop_terms.iter().map(|t| {
            if lower_case {
                t.as_ref().to_lowercase()
            } else {
                t.as_ref().to_string()
            }
        }));
        self
    }

    pub fn from_config(config: &ExtractorConfig) -> Self {
        TermFilter {
            lower_case: config.lower_case,
            partial_stopword_match: config.partial_stopword_match,
            min_token_length: config.min_token_length,
            ..TermFilter::default()
        }
        .with_stop_terms(&config.stop_terms)
    }

    /// Whether a window of already folded tokens survives the stop-term filter
    fn passes_stop_terms(&self, window: &[String], joined: &str) -> bool {
        if self.stop_terms.is_empty() {
            return true;
        }
        if self.partial_stopword_match {
            !window.iter().any(|t| self.stop_terms.contains(t))
        } else {
            !self.stop_terms.contains(joined) && !window.iter().all(|t| self.stop_terms.contains(t))
        }
    }
}

/// NgramGenerator
/// Turns token spans into counted n-gram terms.
///
/// # Examples
/// ```
/// use ngram_pair_features::{NgramGenerator, TermFilter, TokenSpan};
/// let generator = NgramGenerator::new(TermFilter::default());
/// let span = TokenSpan::from_whitespace("Cats eat mice");
/// let ngrams = generator.ngrams(&[span], 1, 2);
/// assert_eq!(ngrams.count("cats_eat"), 1);
/// assert_eq!(ngrams.distinct(), 5);
/// ```
#[derive(Debug, Clone, Default)]
pub struct NgramGenerator {
    filter: TermFilter,
}

impl NgramGenerator {
    pub fn new(filter: TermFilter) -> Self {
        Self { filter }
    }

    pub fn filter(&self) -> &TermFilter {
        &self.filter
    }

    /// Count every surviving window of length `min_n..=max_n` over all spans.
    pub fn ngrams(&self, spans: &[TokenSpan], min_n: usize, max_n: usize) -> FrequencyCounter {
        let mut counter = FrequencyCounter::new();
        for span in spans {
            self.add_span_ngrams(&mut counter, span, min_n, max_n);
        }
        counter
    }

    /// Windows are emitted in token order, shorter windows first at each start.
    pub fn add_span_ngrams(
        &self,
        counter: &mut FrequencyCounter,
        span: &TokenSpan,
        min_n: usize,
        max_n: usize,
    ) {
        let tokens: Vec<String> = span
            .texts()
            .map(|t| {
                if self.filter.lower_case {
                    t.to_lowercase()
                } else {
                    t.to_string()
                }
            })
            .collect();
        // too-short tokens poison every window that contains them
        let short: Vec<bool> = tokens
            .iter()
            .map(|t| t.chars().count() < self.filter.min_token_length)
            .collect();

        let min_n = min_n.max(1);
        for start in 0..tokens.len() {
            for n in min_n..=max_n {
                let end = start + n;
                if end > tokens.len() {
                    break;
                }
                if short[start..end].iter().any(|&s| s) {
                    continue;
                }
                let window = &tokens[start..end];
                let joined = window.join(NGRAM_GLUE);
                if self.filter.passes_stop_terms(window, &joined) {
                    counter.inc(&joined);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(text: &str) -> TokenSpan {
        TokenSpan::from_whitespace(text)
    }

    #[test]
    fn unigrams_to_trigrams() {
        let g = NgramGenerator::default();
        let c = g.ngrams(&[span("a b c")], 1, 3);
        let terms: Vec<&str> = c.terms().collect();
        assert_eq!(terms, vec!["a", "a_b", "a_b_c", "b", "b_c", "c"]);
    }

    #[test]
    fn case_folding_merges_terms() {
        let g = NgramGenerator::default();
        let c = g.ngrams(&[span("Cats chase cats")], 1, 1);
        assert_eq!(c.count("cats"), 2);

        let keep_case = NgramGenerator::new(TermFilter {
            lower_case: false,
            ..TermFilter::default()
        });
        let c = keep_case.ngrams(&[span("Cats chase cats")], 1, 1);
        assert_eq!(c.count("Cats"), 1);
        assert_eq!(c.count("cats"), 1);
    }

    #[test]
    fn windows_do_not_cross_spans() {
        let g = NgramGenerator::default();
        let c = g.ngrams(&[span("a b"), span("c d")], 2, 2);
        assert!(c.contains("a_b"));
        assert!(c.contains("c_d"));
        assert!(!c.contains("b_c"));
    }

    #[test]
    fn stop_terms_whole_window_mode() {
        let g = NgramGenerator::new(TermFilter::default().with_stop_terms(&["The", "of"]));
        let c = g.ngrams(&[span("the united states of america")], 1, 2);
        assert!(!c.contains("the"));
        assert!(!c.contains("of"));
        // mixed windows survive
        assert!(c.contains("the_united"));
        assert!(c.contains("states_of"));
    }

    #[test]
    fn stop_terms_whole_window_mode_drops_all_stop_windows() {
        let g = NgramGenerator::new(TermFilter::default().with_stop_terms(&["of", "the"]));
        let c = g.ngrams(&[span("of the sea")], 2, 2);
        assert!(!c.contains("of_the"));
        assert!(c.contains("the_sea"));
    }

    #[test]
    fn stop_terms_partial_mode() {
        let filter = TermFilter {
            partial_stopword_match: true,
            ..TermFilter::default()
        }
        .with_stop_terms(&["of"]);
        let g = NgramGenerator::new(filter);
        let c = g.ngrams(&[span("states of america")], 1, 3);
        let terms: Vec<&str> = c.terms().collect();
        assert_eq!(terms, vec!["states", "america"]);
    }

    #[test]
    fn short_tokens_drop_their_windows() {
        let g = NgramGenerator::new(TermFilter {
            min_token_length: 3,
            ..TermFilter::default()
        });
        let c = g.ngrams(&[span("cats eat a mouse")], 1, 2);
        assert!(c.contains("cats_eat"));
        assert!(!c.contains("a"));
        assert!(!c.contains("eat_a"));
        assert!(!c.contains("a_mouse"));
        assert!(c.contains("mouse"));
    }

    #[test]
    fn repeated_calls_are_identical() {
        let g = NgramGenerator::default();
        let s = [span("to be or not to be")];
        let run = || -> Vec<(String, u64)> {
            g.ngrams(&s, 1, 3).iter().map(|(t, c)| (t.to_string(), c)).collect()
        };
        let first = run();
        let second = run();
        assert_eq!(first, second);
        assert_eq!(g.ngrams(&s, 1, 3).count("to_be"), 2);
    }

    #[test]
    fn token_count_counts_segments() {
        assert_eq!(token_count("cats"), 1);
        assert_eq!(token_count("cats_eat_mice"), 3);
    }
}
