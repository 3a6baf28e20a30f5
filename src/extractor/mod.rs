pub mod assemble;
pub mod builder;
pub mod combo;
pub mod frequency;
pub mod ngram;
pub mod span;
pub mod vocabulary;

use std::sync::Arc;

use rayon::prelude::*;

use crate::config::{ExtractorConfig, NgramConfig};
use crate::error::{FeatureError, Result};
use crate::extractor::assemble::assemble;
use crate::extractor::builder::{
    bounded_combinations, PairNgrams, PairVocabularyBuilder, VocabularyBuilder,
};
use crate::extractor::combo::Combiner;
use crate::extractor::ngram::{NgramGenerator, TermFilter};
use crate::extractor::span::Document;
use crate::extractor::vocabulary::{Vocabulary, VocabularySet};
use crate::feature::store::FeatureStore;
use crate::feature::{Feature, Instance};
use crate::{COMBINED, COMBO, PART_ONE, PART_TWO};

/// FeatureExtractor Trait
/// Turns one document into features. Implementations only read shared,
/// frozen state, so one extractor serves all documents in parallel.
pub trait FeatureExtractor: Send + Sync {
    fn extract(&self, doc: &Document) -> Result<Vec<Feature>>;
}

/// Single-field n-gram features, prefix `ngram`.
#[derive(Debug, Clone)]
pub struct NgramFeatureExtractor {
    field: String,
    config: NgramConfig,
    generator: NgramGenerator,
    vocabulary: Arc<Vocabulary>,
    binary: bool,
}

impl NgramFeatureExtractor {
    pub const PREFIX: &'static str = "ngram";

    /// Build the field vocabulary from `corpus`
    pub fn train(
        corpus: &[Document],
        field: &str,
        config: NgramConfig,
        filter: TermFilter,
        binary: bool,
    ) -> Result<Self> {
        let generator = NgramGenerator::new(filter);
        let vocabulary = VocabularyBuilder::new(&generator).build(corpus, field, &config)?;
        Ok(Self {
            field: field.to_string(),
            config,
            generator,
            vocabulary: Arc::new(vocabulary),
            binary,
        })
    }

    /// Reuse a vocabulary built earlier, e.g. one read back from disk
    pub fn with_vocabulary(
        vocabulary: Arc<Vocabulary>,
        config: NgramConfig,
        filter: TermFilter,
        binary: bool,
    ) -> Result<Self> {
        config.validate(vocabulary.field())?;
        Ok(Self {
            field: vocabulary.field().to_string(),
            config,
            generator: NgramGenerator::new(filter),
            vocabulary,
            binary,
        })
    }

    pub fn vocabulary(&self) -> &Arc<Vocabulary> {
        &self.vocabulary
    }
}

impl FeatureExtractor for NgramFeatureExtractor {
    fn extract(&self, doc: &Document) -> Result<Vec<Feature>> {
        let spans = doc.require_field(&self.field)?;
        let observed = self.generator.ngrams(spans, self.config.min_n, self.config.max_n);
        assemble(Self::PREFIX, &self.vocabulary, &observed, self.binary)
    }
}

/// PairNgramExtractor
/// N-gram and combination features of a document pair (`part-one` and
/// `part-two` fields), against frozen vocabularies.
///
/// Feature groups, each enabled by the config:
/// - `view1NG`, `view2NG`: each view against its own vocabulary
/// - `allNG`: both views together against the combined vocabulary, or
///   `view1allNG` / `view2allNG` when marking the local view
/// - `comboNG`: cross-view combinations against the combination vocabulary
///
/// The vocabularies are shared through an `Arc`; cloning an extractor is cheap.
#[derive(Debug, Clone)]
pub struct PairNgramExtractor {
    config: ExtractorConfig,
    generator: NgramGenerator,
    vocabularies: Arc<VocabularySet>,
}

impl PairNgramExtractor {
    pub const VIEW1_PREFIX: &'static str = "view1NG";
    pub const VIEW2_PREFIX: &'static str = "view2NG";
    pub const VIEW_BLIND_PREFIX: &'static str = "allNG";
    pub const VIEW1_MARKED_PREFIX: &'static str = "view1allNG";
    pub const VIEW2_MARKED_PREFIX: &'static str = "view2allNG";
    pub const COMBO_PREFIX: &'static str = "comboNG";

    /// Build all vocabularies from the training corpus
    pub fn train(config: ExtractorConfig, corpus: &[Document]) -> Result<Self> {
        let builder = PairVocabularyBuilder::new(config)?;
        let vocabularies = builder.build(corpus)?;
        Self::with_vocabularies(builder.config().clone(), Arc::new(vocabularies))
    }

    /// Reuse vocabularies built earlier. Every vocabulary the config needs
    /// must be present.
    pub fn with_vocabularies(
        config: ExtractorConfig,
        vocabularies: Arc<VocabularySet>,
    ) -> Result<Self> {
        config.validate()?;
        vocabularies.require(PART_ONE)?;
        vocabularies.require(PART_TWO)?;
        vocabularies.require(COMBINED)?;
        if config.use_combo_ngrams {
            vocabularies.require(COMBO)?;
        }
        let generator = NgramGenerator::new(TermFilter::from_config(&config));
        Ok(Self {
            config,
            generator,
            vocabularies,
        })
    }

    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    pub fn vocabularies(&self) -> &Arc<VocabularySet> {
        &self.vocabularies
    }

    fn vocabulary(&self, field: &str) -> Result<&Vocabulary> {
        self.vocabularies.require(field)
    }

    fn combiner(&self) -> Combiner {
        Combiner {
            bounds: self.config.combo.bounds(),
            symmetric: self.config.combo.symmetric,
            binary: self.config.binary_feature_values,
            max_input_terms: self.config.combo.max_input_terms,
        }
    }
}

impl FeatureExtractor for PairNgramExtractor {
    fn extract(&self, doc: &Document) -> Result<Vec<Feature>> {
        let view1 = doc.require_field(PART_ONE)?;
        let view2 = doc.require_field(PART_TWO)?;
        let config = &self.config;
        let binary = config.binary_feature_values;
        let pair = PairNgrams::from_views(&self.generator, config, view1, view2);

        let mut features = Vec::new();
        if config.use_view1_ngrams {
            let vocabulary = self.vocabulary(PART_ONE)?;
            features.extend(assemble(Self::VIEW1_PREFIX, vocabulary, &pair.view1, binary)?);
        }
        if config.use_view2_ngrams {
            let vocabulary = self.vocabulary(PART_TWO)?;
            features.extend(assemble(Self::VIEW2_PREFIX, vocabulary, &pair.view2, binary)?);
        }
        if config.use_view_blind_ngrams {
            let combined = self.vocabulary(COMBINED)?;
            if config.mark_view_blind_with_local_view {
                let (one, two) = (&pair.view1_combined, &pair.view2_combined);
                features.extend(assemble(Self::VIEW1_MARKED_PREFIX, combined, one, binary)?);
                features.extend(assemble(Self::VIEW2_MARKED_PREFIX, combined, two, binary)?);
            } else {
                let all = &pair.combined;
                features.extend(assemble(Self::VIEW_BLIND_PREFIX, combined, all, binary)?);
            }
        }
        if config.use_combo_ngrams {
            let vocabularies = (
                self.vocabulary(PART_ONE)?,
                self.vocabulary(PART_TWO)?,
                self.vocabulary(COMBINED)?,
            );
            let combos = bounded_combinations(
                &self.combiner(),
                &pair.view1,
                &pair.view2,
                vocabularies,
                config.combo.use_screening,
            )?;
            features.extend(assemble(
                Self::COMBO_PREFIX,
                self.vocabulary(COMBO)?,
                &combos.to_counter(),
                binary,
            )?);
        }
        Ok(features)
    }
}

/// All features of `doc` from every extractor, as one instance carrying the
/// document's outcomes, weight and sequence position.
pub fn extract_instance(extractors: &[&dyn FeatureExtractor], doc: &Document) -> Result<Instance> {
    let mut features = Vec::new();
    for extractor in extractors {
        features.extend(extractor.extract(doc)?);
    }
    Ok(Instance::with_features(features, doc.outcomes.clone())?
        .with_weight(doc.weight)
        .with_sequence(doc.sequence_id, doc.sequence_position))
}

/// A document whose extraction failed, with the reason.
#[derive(Debug)]
pub struct ExtractionFailure {
    pub doc_id: String,
    pub error: FeatureError,
}

/// Extract every document in parallel and add the instances to `store` in
/// document order.
///
/// A failing document is reported and skipped; whether that should abort the
/// batch is the caller's decision. Store errors and feature name collisions
/// are not per-document and abort immediately: the store then holds the
/// instances of the documents before the one at fault, and the failures
/// collected so far are dropped.
pub fn extract_into<S>(
    store: &mut S,
    extractors: &[&dyn FeatureExtractor],
    docs: &[Document],
) -> Result<Vec<ExtractionFailure>>
where
    S: FeatureStore + ?Sized,
{
    let results: Vec<Result<Instance>> = docs
        .par_iter()
        .map(|doc| extract_instance(extractors, doc))
        .collect();

    let mut failures = Vec::new();
    for (doc, result) in docs.iter().zip(results) {
        match result {
            Ok(instance) => store.add_instance(instance)?,
            Err(error @ FeatureError::EscapeCollision { .. }) => return Err(error),
            Err(error) => failures.push(ExtractionFailure {
                doc_id: doc.id.clone(),
                error,
            }),
        }
    }
    if !failures.is_empty() {
        log::debug!("{} of {} documents failed extraction", failures.len(), docs.len());
    }
    Ok(failures)
}
