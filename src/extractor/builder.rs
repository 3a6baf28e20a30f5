use rayon::prelude::*;

use crate::config::{ExtractorConfig, NgramConfig};
use crate::error::Result;
use crate::extractor::combo::{bound_to_vocabulary, CombinationSet, Combiner, Screening};
use crate::extractor::frequency::FrequencyCounter;
use crate::extractor::ngram::{NgramGenerator, TermFilter};
use crate::extractor::span::{Document, TokenSpan};
use crate::extractor::vocabulary::{Vocabulary, VocabularySet};
use crate::{COMBINED, COMBO, PART_ONE, PART_TWO};

/// VocabularyBuilder
/// One full pass over a corpus for one field, then top-K selection.
///
/// Documents are counted in parallel into per-thread counters which are
/// merged pairwise; merging sums counts, so the result does not depend on
/// how rayon splits the corpus. Documents lacking the field are skipped.
#[derive(Debug, Clone, Copy)]
pub struct VocabularyBuilder<'a> {
    generator: &'a NgramGenerator,
}

impl<'a> VocabularyBuilder<'a> {
    pub fn new(generator: &'a NgramGenerator) -> Self {
        Self { generator }
    }

    /// Corpus-wide counter of the n-grams of `field`
    pub fn count_field(
        &self,
        corpus: &[Document],
        field: &str,
        min_n: usize,
        max_n: usize,
    ) -> FrequencyCounter {
        corpus
            .par_iter()
            .fold(FrequencyCounter::new, |mut acc, doc| {
                match doc.field(field) {
                    Some(spans) => {
                        for span in spans {
                            self.generator.add_span_ngrams(&mut acc, span, min_n, max_n);
                        }
                    }
                    None => log::debug!("document `{}` has no field `{}`, skipped", doc.id, field),
                }
                acc
            })
            .reduce(FrequencyCounter::new, FrequencyCounter::merge)
    }

    /// Build the vocabulary of one field
    pub fn build(
        &self,
        corpus: &[Document],
        field: &str,
        config: &NgramConfig,
    ) -> Result<Vocabulary> {
        config.validate(field)?;
        let counter = self.count_field(corpus, field, config.min_n, config.max_n);
        Ok(Vocabulary::select(field, &counter, config.top_k, config.min_rel_freq))
    }
}

/// Per-document n-grams of both views of a pair, plus their union.
#[derive(Debug, Clone, Default)]
pub struct PairNgrams {
    pub view1: FrequencyCounter,
    pub view2: FrequencyCounter,
    /// both views with the combined-field bounds, summed
    pub combined: FrequencyCounter,
    /// view-one n-grams with the combined-field bounds
    pub view1_combined: FrequencyCounter,
    /// view-two n-grams with the combined-field bounds
    pub view2_combined: FrequencyCounter,
}

impl PairNgrams {
    /// N-grams of the two views' spans
    pub fn from_views(
        generator: &NgramGenerator,
        config: &ExtractorConfig,
        view1: &[TokenSpan],
        view2: &[TokenSpan],
    ) -> Self {
        let combined_n = (config.combined.min_n, config.combined.max_n);
        let view1_combined = generator.ngrams(view1, combined_n.0, combined_n.1);
        let view2_combined = generator.ngrams(view2, combined_n.0, combined_n.1);
        let mut combined = view1_combined.clone();
        combined.merge_from(&view2_combined);
        PairNgrams {
            view1: generator.ngrams(view1, config.view1.min_n, config.view1.max_n),
            view2: generator.ngrams(view2, config.view2.min_n, config.view2.max_n),
            combined,
            view1_combined,
            view2_combined,
        }
    }

    /// A view the document lacks counts as empty
    pub fn collect(generator: &NgramGenerator, config: &ExtractorConfig, doc: &Document) -> Self {
        let view1 = doc.field(PART_ONE).unwrap_or_default();
        let view2 = doc.field(PART_TWO).unwrap_or_default();
        Self::from_views(generator, config, view1, view2)
    }
}

#[derive(Debug, Clone, Default)]
struct PairCounters {
    view1: FrequencyCounter,
    view2: FrequencyCounter,
    combined: FrequencyCounter,
}

impl PairCounters {
    fn merge(mut self, other: PairCounters) -> PairCounters {
        self.view1 = FrequencyCounter::merge(self.view1, other.view1);
        self.view2 = FrequencyCounter::merge(self.view2, other.view2);
        self.combined = FrequencyCounter::merge(self.combined, other.combined);
        self
    }
}

/// Combinations of one document pair, each side pre-bounded to its own field
/// vocabulary and optionally screened.
pub(crate) fn bounded_combinations(
    combiner: &Combiner,
    view1: &FrequencyCounter,
    view2: &FrequencyCounter,
    vocabularies: (&Vocabulary, &Vocabulary, &Vocabulary),
    use_screening: bool,
) -> Result<CombinationSet> {
    let (v1, v2, all) = vocabularies;
    let left = bound_to_vocabulary(view1, v1);
    let right = bound_to_vocabulary(view2, v2);
    if use_screening {
        let screening = Screening {
            view1: v1,
            view2: v2,
            combined: all,
            bounds: combiner.bounds,
        };
        combiner.combine_screened(&left, &right, &screening)
    } else {
        combiner.combine(&left, &right)
    }
}

/// PairVocabularyBuilder
/// Builds the `part-one`, `part-two`, `combined` and (when combinations are
/// enabled) `combo` vocabularies of a pair corpus.
///
/// The combination vocabulary needs the three field vocabularies to bound its
/// inputs, so it takes a second pass.
#[derive(Debug, Clone)]
pub struct PairVocabularyBuilder {
    config: ExtractorConfig,
    generator: NgramGenerator,
}

impl PairVocabularyBuilder {
    pub fn new(config: ExtractorConfig) -> Result<Self> {
        config.validate()?;
        let generator = NgramGenerator::new(TermFilter::from_config(&config));
        Ok(Self { config, generator })
    }

    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    pub fn build(&self, corpus: &[Document]) -> Result<VocabularySet> {
        let config = &self.config;
        let counters = corpus
            .par_iter()
            .fold(PairCounters::default, |mut acc, doc| {
                if doc.field(PART_ONE).is_none() || doc.field(PART_TWO).is_none() {
                    log::debug!("document `{}` lacks a view, counting what it has", doc.id);
                }
                let pair = PairNgrams::collect(&self.generator, config, doc);
                acc.view1.merge_from(&pair.view1);
                acc.view2.merge_from(&pair.view2);
                acc.combined.merge_from(&pair.combined);
                acc
            })
            .reduce(PairCounters::default, PairCounters::merge);

        let mut set = VocabularySet::new();
        set.insert(select(PART_ONE, &counters.view1, &config.view1));
        set.insert(select(PART_TWO, &counters.view2, &config.view2));
        set.insert(select(COMBINED, &counters.combined, &config.combined));

        if config.use_combo_ngrams {
            let combo = self.count_combinations(corpus, &set)?;
            set.insert(Vocabulary::select(
                COMBO,
                &combo,
                config.combo.top_k,
                config.combo.min_rel_freq,
            ));
        }
        Ok(set)
    }

    /// Second pass: corpus counts of bounded combinations. Corpus counts are
    /// products of the per-document n-gram counts regardless of
    /// `binary_feature_values`, which only concerns feature values.
    fn count_combinations(
        &self,
        corpus: &[Document],
        set: &VocabularySet,
    ) -> Result<FrequencyCounter> {
        let config = &self.config;
        let vocabularies = (
            set.require(PART_ONE)?,
            set.require(PART_TWO)?,
            set.require(COMBINED)?,
        );
        let combiner = Combiner {
            bounds: config.combo.bounds(),
            symmetric: config.combo.symmetric,
            binary: false,
            max_input_terms: config.combo.max_input_terms,
        };
        corpus
            .par_iter()
            .try_fold(FrequencyCounter::new, |mut acc, doc| {
                let (Some(view1), Some(view2)) = (doc.field(PART_ONE), doc.field(PART_TWO)) else {
                    return Ok(acc);
                };
                let view1 = self.generator.ngrams(view1, config.view1.min_n, config.view1.max_n);
                let view2 = self.generator.ngrams(view2, config.view2.min_n, config.view2.max_n);
                let combos = bounded_combinations(
                    &combiner,
                    &view1,
                    &view2,
                    vocabularies,
                    config.combo.use_screening,
                )?;
                for (term, combo) in combos.iter() {
                    acc.add(term, combo.count);
                }
                Ok(acc)
            })
            .try_reduce(FrequencyCounter::new, |a, b| Ok(FrequencyCounter::merge(a, b)))
    }
}

fn select(field: &str, counter: &FrequencyCounter, config: &NgramConfig) -> Vocabulary {
    Vocabulary::select(field, counter, config.top_k, config.min_rel_freq)
}
