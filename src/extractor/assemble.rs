use crate::error::Result;
use crate::extractor::frequency::FrequencyCounter;
use crate::extractor::ngram::NGRAM_GLUE;
use crate::extractor::vocabulary::Vocabulary;
use crate::feature::Feature;

/// Name of the feature for `term` under `prefix`
#[inline]
pub fn feature_name(prefix: &str, term: &str) -> String {
    format!("{prefix}{NGRAM_GLUE}{term}")
}

/// Exactly one feature per vocabulary term, in vocabulary order.
///
/// With `binary` the value is 1 for an observed term and 0 otherwise; without
/// it, the observed count (0 if absent). Observed terms outside the
/// vocabulary are dropped.
pub fn assemble(
    prefix: &str,
    vocabulary: &Vocabulary,
    observed: &FrequencyCounter,
    binary: bool,
) -> Result<Vec<Feature>> {
    vocabulary
        .terms()
        .map(|term| {
            let count = observed.count(term);
            let value = if binary { u64::from(count > 0) } else { count };
            Feature::new(&feature_name(prefix, term), value)
        })
        .collect()
}
