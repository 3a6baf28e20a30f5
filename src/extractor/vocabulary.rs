use std::io::{Read, Write};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{FeatureError, Result};
use crate::extractor::frequency::FrequencyCounter;
use crate::utils::top_k::TopK;

/// Vocabulary
/// The frozen top-K term selection of one field, the feature schema of every
/// extraction against that field.
///
/// Terms iterate by descending corpus count, ties by ascending term. The
/// order is part of the schema: it fixes the feature order of every instance.
/// There is no mutating API; a vocabulary is made once by [`Vocabulary::select`]
/// (or deserialized) and only read afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vocabulary {
    field: String,
    terms: IndexMap<String, u64>,
    /// distinct terms seen in the corpus pass, before selection
    seen_terms: usize,
}

impl Vocabulary {
    /// An empty vocabulary; every presence check against it is false.
    pub fn empty(field: &str) -> Self {
        Self {
            field: field.to_string(),
            terms: IndexMap::new(),
            seen_terms: 0,
        }
    }

    /// Select the `top_k` most frequent terms of `counter`.
    ///
    /// With `min_rel_freq`, terms whose share of the field total falls below
    /// the floor are discarded first. Selection runs through a bounded heap of
    /// capacity `top_k`, never a full sort of the counter.
    pub fn select(
        field: &str,
        counter: &FrequencyCounter,
        top_k: usize,
        min_rel_freq: Option<f64>,
    ) -> Self {
        let total = counter.total() as f64;
        let mut top = TopK::new(top_k);
        for (term, count) in counter.iter() {
            if let Some(floor) = min_rel_freq {
                if total == 0.0 || (count as f64 / total) < floor {
                    continue;
                }
            }
            top.offer(term, count);
        }
        let terms: IndexMap<String, u64> = top.into_sorted_vec().into_iter().collect();
        log::info!(
            "vocabulary `{}`: taking {} of {} terms",
            field,
            terms.len(),
            counter.distinct()
        );
        Self {
            field: field.to_string(),
            terms,
            seen_terms: counter.distinct(),
        }
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    #[inline]
    pub fn contains(&self, term: &str) -> bool {
        self.terms.contains_key(term)
    }

    /// Corpus count the term was selected with, `None` if not in the vocabulary
    pub fn corpus_count(&self, term: &str) -> Option<u64> {
        self.terms.get(term).copied()
    }

    /// Terms in schema order
    pub fn terms(&self) -> impl Iterator<Item = &str> {
        self.terms.keys().map(|t| t.as_str())
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn seen_terms(&self) -> usize {
        self.seen_terms
    }
}

/// Vocabularies of all fields of one training run, keyed by field name.
///
/// # Serialization
/// Supported. `write_cbor`/`read_cbor` is the persistence format used to carry
/// training vocabularies over to test-time extraction; JSON is available for
/// inspection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VocabularySet {
    vocabularies: IndexMap<String, Vocabulary>,
}

impl VocabularySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a vocabulary under its own field name, replacing an older one
    pub fn insert(&mut self, vocabulary: Vocabulary) {
        self.vocabularies.insert(vocabulary.field().to_string(), vocabulary);
    }

    pub fn get(&self, field: &str) -> Option<&Vocabulary> {
        self.vocabularies.get(field)
    }

    /// `MissingVocabulary` if the field was never built
    pub fn require(&self, field: &str) -> Result<&Vocabulary> {
        self.get(field).ok_or_else(|| FeatureError::MissingVocabulary {
            field: field.to_string(),
        })
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.vocabularies.keys().map(|f| f.as_str())
    }

    pub fn len(&self) -> usize {
        self.vocabularies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vocabularies.is_empty()
    }

    pub fn write_cbor<W: Write>(&self, writer: W) -> Result<()> {
        serde_cbor::to_writer(writer, self)?;
        Ok(())
    }

    pub fn read_cbor<R: Read>(reader: R) -> Result<Self> {
        Ok(serde_cbor::from_reader(reader)?)
    }

    pub fn to_cbor_vec(&self) -> Result<Vec<u8>> {
        Ok(serde_cbor::to_vec(self)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

impl FromIterator<Vocabulary> for VocabularySet {
    fn from_iter<I: IntoIterator<Item = Vocabulary>>(iter: I) -> Self {
        let mut set = VocabularySet::new();
        for vocabulary in iter {
            set.insert(vocabulary);
        }
        set
    }
}
