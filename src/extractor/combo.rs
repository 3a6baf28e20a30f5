//! Cross-document n-gram combinations.
//!
//! `combine` is O(|left| x |right|). Callers bound both inputs beforehand,
//! normally by restricting each side to its own field vocabulary (see
//! [`bound_to_vocabulary`]); inputs above the configured cap are rejected
//! instead of being multiplied out.
//!
//! The glue joining two n-grams is the one joining tokens, so distinct pairs
//! can build the same term (`new_york` + `city`, `new` + `york_city`).
//! Screening therefore judges each pair before its count is merged into the
//! term, never the merged term.

use indexmap::IndexMap;

use crate::config::ComboBounds;
use crate::error::{FeatureError, Result};
use crate::extractor::frequency::FrequencyCounter;
use crate::extractor::ngram::{token_count, NGRAM_GLUE};
use crate::extractor::vocabulary::Vocabulary;

/// Join two n-grams into a combination term
#[inline]
pub fn combo_term(left: &str, right: &str) -> String {
    let mut term = String::with_capacity(left.len() + NGRAM_GLUE.len() + right.len());
    term.push_str(left);
    term.push_str(NGRAM_GLUE);
    term.push_str(right);
    term
}

/// One combination term with the first pair of n-grams that built it.
/// The parts are kept because the joined term cannot be split back
/// unambiguously (the same glue joins tokens and n-grams).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Combination {
    pub left: String,
    pub right: String,
    pub count: u64,
}

impl Combination {
    /// `token_count(left) + token_count(right)`
    pub fn size(&self) -> usize {
        token_count(&self.left) + token_count(&self.right)
    }
}

/// Counted combination terms of one document pair.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CombinationSet {
    combos: IndexMap<String, Combination>,
}

impl CombinationSet {
    fn emit(&mut self, left: &str, right: &str, count: u64, binary: bool) {
        let term = combo_term(left, right);
        match self.combos.get_mut(&term) {
            Some(existing) => {
                if !binary {
                    existing.count += count;
                }
            }
            None => {
                self.combos.insert(
                    term,
                    Combination {
                        left: left.to_string(),
                        right: right.to_string(),
                        count: if binary { 1 } else { count },
                    },
                );
            }
        }
    }

    pub fn len(&self) -> usize {
        self.combos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.combos.is_empty()
    }

    pub fn count(&self, term: &str) -> u64 {
        self.combos.get(term).map_or(0, |c| c.count)
    }

    pub fn get(&self, term: &str) -> Option<&Combination> {
        self.combos.get(term)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Combination)> {
        self.combos.iter().map(|(t, c)| (t.as_str(), c))
    }

    pub fn to_counter(&self) -> FrequencyCounter {
        self.combos.iter().map(|(t, c)| (t.as_str(), c.count)).collect()
    }
}

/// Combination generator settings.
#[derive(Debug, Clone, Copy)]
pub struct Combiner {
    pub bounds: ComboBounds,
    pub symmetric: bool,
    /// every emitted combination counts 1 instead of `count(a) * count(b)`
    pub binary: bool,
    /// largest accepted size of either input
    pub max_input_terms: usize,
}

impl Combiner {
    /// Every `a_b` with `a` from `left`, `b` from `right` and a combined size
    /// within bounds; with `symmetric` also `b_a`.
    ///
    /// Both inputs must already be bounded (see module docs);
    /// `ComboInputTooLarge` otherwise.
    pub fn combine(
        &self,
        left: &FrequencyCounter,
        right: &FrequencyCounter,
    ) -> Result<CombinationSet> {
        self.combine_with(left, right, None)
    }

    /// Like [`Combiner::combine`], keeping only the pairs passing `screening`.
    /// A reversed `b_a` (symmetric mode) is screened as `b` from view one and
    /// `a` from view two.
    pub fn combine_screened(
        &self,
        left: &FrequencyCounter,
        right: &FrequencyCounter,
        screening: &Screening<'_>,
    ) -> Result<CombinationSet> {
        self.combine_with(left, right, Some(screening))
    }

    fn combine_with(
        &self,
        left: &FrequencyCounter,
        right: &FrequencyCounter,
        screening: Option<&Screening<'_>>,
    ) -> Result<CombinationSet> {
        self.check_input("left", left)?;
        self.check_input("right", right)?;
        let passes = |a: &str, b: &str| screening.map_or(true, |s| s.passes(a, b));

        let right_sizes: Vec<(&str, u64, usize)> =
            right.iter().map(|(t, c)| (t, c, token_count(t))).collect();
        let mut set = CombinationSet::default();
        for (a, count_a) in left.iter() {
            let size_a = token_count(a);
            for &(b, count_b, size_b) in &right_sizes {
                if !self.bounds.contains(size_a + size_b) {
                    continue;
                }
                let count = count_a * count_b;
                if passes(a, b) {
                    set.emit(a, b, count, self.binary);
                }
                if self.symmetric && a != b && passes(b, a) {
                    set.emit(b, a, count, self.binary);
                }
            }
        }
        Ok(set)
    }

    fn check_input(&self, side: &'static str, ngrams: &FrequencyCounter) -> Result<()> {
        if ngrams.distinct() > self.max_input_terms {
            return Err(FeatureError::ComboInputTooLarge {
                side,
                size: ngrams.distinct(),
                cap: self.max_input_terms,
            });
        }
        Ok(())
    }
}

/// `ngrams` restricted to the terms of `vocabulary`, counts unchanged
pub fn bound_to_vocabulary(ngrams: &FrequencyCounter, vocabulary: &Vocabulary) -> FrequencyCounter {
    ngrams.filtered(|t| vocabulary.contains(t))
}

/// Screening
/// A combination `a_b` passes iff `a` is in the view-one and combined
/// vocabularies, `b` is in the view-two and combined vocabularies, and the
/// combined size is within bounds.
#[derive(Debug, Clone, Copy)]
pub struct Screening<'a> {
    pub view1: &'a Vocabulary,
    pub view2: &'a Vocabulary,
    pub combined: &'a Vocabulary,
    pub bounds: ComboBounds,
}

impl Screening<'_> {
    pub fn passes(&self, left: &str, right: &str) -> bool {
        self.view1.contains(left)
            && self.combined.contains(left)
            && self.view2.contains(right)
            && self.combined.contains(right)
            && self.bounds.contains(token_count(left) + token_count(right))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::ngram::NgramGenerator;
    use crate::extractor::span::TokenSpan;

    fn unigrams(text: &str) -> FrequencyCounter {
        NgramGenerator::default().ngrams(&[TokenSpan::from_whitespace(text)], 1, 1)
    }

    fn combiner(min_n: usize, max_n: usize, symmetric: bool, binary: bool) -> Combiner {
        Combiner {
            bounds: ComboBounds::new(min_n, max_n).unwrap(),
            symmetric,
            binary,
            max_input_terms: 1000,
        }
    }

    fn vocabulary(field: &str, terms: &[&str]) -> Vocabulary {
        let c: FrequencyCounter = terms.iter().map(|t| (*t, 1u64)).collect();
        Vocabulary::select(field, &c, terms.len().max(1), None)
    }

    #[test]
    fn cats_and_birds_binary_non_symmetric() {
        let set = combiner(2, 3, false, true)
            .combine(&unigrams("Cats eat mice"), &unigrams("Birds chase cats"))
            .unwrap();
        let terms: Vec<&str> = set.iter().map(|(t, _)| t).collect();
        assert_eq!(
            terms,
            vec![
                "cats_birds", "cats_chase", "cats_cats",
                "eat_birds", "eat_chase", "eat_cats",
                "mice_birds", "mice_chase", "mice_cats",
            ]
        );
        assert!(set.iter().all(|(_, c)| c.count == 1));
        assert!(set.iter().all(|(_, c)| c.size() == 2));
        assert_eq!(set.count("birds_cats"), 0);
    }

    #[test]
    fn symmetric_emits_both_orders() {
        let set = combiner(2, 2, true, true)
            .combine(&unigrams("cats"), &unigrams("birds"))
            .unwrap();
        assert_eq!(set.count("cats_birds"), 1);
        assert_eq!(set.count("birds_cats"), 1);
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn symmetric_does_not_double_self_pairs() {
        let set = combiner(2, 2, true, false)
            .combine(&unigrams("cats"), &unigrams("cats"))
            .unwrap();
        assert_eq!(set.len(), 1);
        assert_eq!(set.count("cats_cats"), 1);
    }

    #[test]
    fn counts_are_products() {
        let left = unigrams("cats cats eat");
        let right = unigrams("mice mice mice");
        let set = combiner(2, 2, false, false).combine(&left, &right).unwrap();
        assert_eq!(set.count("cats_mice"), 6);
        assert_eq!(set.count("eat_mice"), 3);
        assert_eq!(set.to_counter().total(), 9);
    }

    #[test]
    fn every_combination_is_within_bounds() {
        let g = NgramGenerator::default();
        let left = g.ngrams(&[TokenSpan::from_whitespace("a b c d")], 1, 3);
        let right = g.ngrams(&[TokenSpan::from_whitespace("e f g")], 1, 3);
        let set = combiner(3, 4, true, true).combine(&left, &right).unwrap();
        assert!(!set.is_empty());
        for (_, c) in set.iter() {
            assert!((3..=4).contains(&c.size()), "{c:?}");
        }
        assert!(set.get("a_b_e").is_some());
        assert!(set.get("a_e").is_none());
        assert!(set.get("a_b_c_e_f").is_none());
    }

    #[test]
    fn oversized_input_fails_fast() {
        let big: FrequencyCounter = (0..20).map(|i| (format!("t{i}"), 1u64)).collect();
        let c = Combiner {
            max_input_terms: 10,
            ..combiner(2, 2, false, true)
        };
        match c.combine(&unigrams("a"), &big) {
            Err(FeatureError::ComboInputTooLarge { side, size, cap }) => {
                assert_eq!((side, size, cap), ("right", 20, 10));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn screening_requires_all_memberships() {
        let v1 = vocabulary("part-one", &["cats", "eat"]);
        let v2 = vocabulary("part-two", &["birds", "cats"]);
        let all = vocabulary("combined", &["cats", "birds"]);
        let screening = Screening {
            view1: &v1,
            view2: &v2,
            combined: &all,
            bounds: ComboBounds::new(2, 3).unwrap(),
        };
        assert!(screening.passes("cats", "birds"));
        // eat is not in the combined vocabulary
        assert!(!screening.passes("eat", "birds"));
        // birds is not in the view-one vocabulary
        assert!(!screening.passes("birds", "cats"));

        let set = combiner(2, 3, false, false)
            .combine_screened(&unigrams("cats cats eat"), &unigrams("birds cats"), &screening)
            .unwrap();
        let terms: Vec<&str> = set.iter().map(|(t, _)| t).collect();
        assert_eq!(terms, vec!["cats_birds", "cats_cats"]);
        assert_eq!(set.count("cats_birds"), 2);
    }

    #[test]
    fn bounding_keeps_only_vocabulary_terms() {
        let v = vocabulary("part-one", &["cats"]);
        let bounded = bound_to_vocabulary(&unigrams("cats cats mice"), &v);
        assert_eq!(bounded.distinct(), 1);
        assert_eq!(bounded.count("cats"), 2);
    }

    fn counter(terms: &[&str]) -> FrequencyCounter {
        terms.iter().map(|t| (*t, 1u64)).collect()
    }

    #[test]
    fn screening_judges_each_pair_of_a_shared_term() {
        let v1 = vocabulary("part-one", &["new_york", "new"]);
        let v2 = vocabulary("part-two", &["city", "york_city"]);
        let all = vocabulary("combined", &["new_york", "city"]);
        let screening = Screening {
            view1: &v1,
            view2: &v2,
            combined: &all,
            bounds: ComboBounds::new(2, 4).unwrap(),
        };
        let right = counter(&["city", "york_city"]);
        // (new_york, city) and (new, york_city) both build new_york_city;
        // only the first pair passes, whatever the insertion order
        for left in [counter(&["new_york", "new"]), counter(&["new", "new_york"])] {
            let set = combiner(2, 4, false, false)
                .combine_screened(&left, &right, &screening)
                .unwrap();
            assert_eq!(set.count("new_york_city"), 1);
            assert_eq!(set.len(), 1);
            let kept = set.get("new_york_city").unwrap();
            assert_eq!((kept.left.as_str(), kept.right.as_str()), ("new_york", "city"));
        }
    }

    #[test]
    fn reversed_pairs_are_screened_with_swapped_views() {
        let v1 = vocabulary("part-one", &["cats"]);
        let v2 = vocabulary("part-two", &["birds"]);
        let all = vocabulary("combined", &["cats", "birds"]);
        let screening = Screening {
            view1: &v1,
            view2: &v2,
            combined: &all,
            bounds: ComboBounds::new(2, 2).unwrap(),
        };
        let set = combiner(2, 2, true, true)
            .combine_screened(&unigrams("cats"), &unigrams("birds"), &screening)
            .unwrap();
        assert_eq!(set.count("cats_birds"), 1);
        // birds is not a view-one term, cats not a view-two term
        assert_eq!(set.count("birds_cats"), 0);
    }
}
