/// This crate extracts n-gram and cross-view combination features from
/// document pairs, for pair classification.
pub mod config;
pub mod error;
pub mod extractor;
pub mod feature;
pub mod utils;

/// Field holding the first view of a pair
pub const PART_ONE: &str = "part-one";
/// Field holding the second view of a pair
pub const PART_TWO: &str = "part-two";
/// Vocabulary over both views together
pub const COMBINED: &str = "combined";
/// Vocabulary of cross-view combinations
pub const COMBO: &str = "combo";

/// Extractor Configuration
/// N-gram bounds and vocabulary sizes per field, combination settings, term
/// filtering and the feature groups to emit.
/// Loadable from JSON; every key is optional and falls back to its default.
pub use config::{ComboBounds, ComboConfig, ExtractorConfig, NgramConfig};

/// Error type of this crate
/// Configuration problems are reported before any corpus pass, per-document
/// problems name the document field at fault.
pub use error::{FeatureError, Result};

/// Frequency Counter
/// Occurrence count per n-gram, in insertion order, plus the total count.
/// Counters merge by summing, which makes parallel corpus passes
/// deterministic.
pub use extractor::frequency::FrequencyCounter;

/// N-gram Generation
/// Windows of `min_n..=max_n` tokens inside each span, joined with `_`,
/// after lowercasing and stop-term filtering.
pub use extractor::ngram::{NgramGenerator, TermFilter};

/// Input Documents
/// A document carries named fields of token spans (usually sentences), and
/// the outcomes, weight and sequence position of the instance it becomes.
pub use extractor::span::{Document, Token, TokenSpan};

/// Vocabularies
/// The top-K n-grams of a field by corpus count, ties broken by term.
/// A `VocabularySet` holds one vocabulary per field and persists as CBOR
/// or JSON, so test data is extracted against the training vocabularies.
pub use extractor::vocabulary::{Vocabulary, VocabularySet};

/// Vocabulary Builders
/// - `VocabularyBuilder`: one field, one parallel pass
/// - `PairVocabularyBuilder`: `part-one`, `part-two`, `combined` and `combo`
///   vocabularies of a pair corpus
pub use extractor::builder::{PairVocabularyBuilder, VocabularyBuilder};

/// Combinations
/// Cross-view products `a_b` of the n-grams of both views, bounded by the
/// total token count and screened against the field vocabularies.
pub use extractor::combo::{Combination, CombinationSet, Combiner, Screening};

/// Feature Assembly
/// One feature per vocabulary term, so every document of a run shares the
/// same feature names.
pub use extractor::assemble::assemble;

/// Feature Extractors
/// - `NgramFeatureExtractor`: n-grams of one field
/// - `PairNgramExtractor`: view, view-blind and combination groups of a pair
///
/// `extract_into` extracts a batch in parallel and fills a feature store in
/// document order, reporting failed documents instead of aborting.
pub use extractor::{
    extract_instance, extract_into, ExtractionFailure, FeatureExtractor, NgramFeatureExtractor,
    PairNgramExtractor,
};

/// Features and Instances
/// Feature names are escaped to `[A-Za-z0-9_]` on construction.
pub use feature::{Feature, FeatureValue, Instance};

/// Feature Name Escaping
/// Process-wide, cached and thread-safe. Two distinct names escaping to the
/// same name fail with `EscapeCollision`.
pub use feature::escape::{escape_feature_name, FeatureNameEscaper};

/// Feature Stores
/// - `DenseFeatureStore`: the first instance fixes the schema
/// - `SparseFeatureStore`: keeps non-default values only, feature space can
///   be fixed once
pub use feature::store::{DenseFeatureStore, FeatureStore, SparseFeatureStore};
