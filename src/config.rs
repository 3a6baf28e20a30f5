use serde::{Deserialize, Serialize};

use crate::error::{FeatureError, Result};

/// Window bounds and vocabulary cap for one field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NgramConfig {
    /// smallest window length
    pub min_n: usize,
    /// largest window length
    pub max_n: usize,
    /// vocabulary cap
    pub top_k: usize,
    /// relative frequency floor applied before truncation to `top_k`
    pub min_rel_freq: Option<f64>,
}

impl Default for NgramConfig {
    fn default() -> Self {
        Self {
            min_n: 1,
            max_n: 3,
            top_k: 500,
            min_rel_freq: None,
        }
    }
}

impl NgramConfig {
    pub fn new(min_n: usize, max_n: usize, top_k: usize) -> Self {
        Self {
            min_n,
            max_n,
            top_k,
            min_rel_freq: None,
        }
    }

    pub fn with_min_rel_freq(mut self, min_rel_freq: f64) -> Self {
        self.min_rel_freq = Some(min_rel_freq);
        self
    }

    /// Check the bounds of this field.
    /// `field` is only used to name the field in the error.
    pub fn validate(&self, field: &str) -> Result<()> {
        if self.min_n == 0 || self.min_n > self.max_n {
            return Err(FeatureError::InvalidNgramRange {
                field: field.to_string(),
                min: self.min_n,
                max: self.max_n,
            });
        }
        if self.top_k == 0 {
            return Err(FeatureError::InvalidConfig(format!(
                "top_k of field `{field}` must be at least 1"
            )));
        }
        validate_rel_freq(field, self.min_rel_freq)
    }
}

/// Bounds and policy for cross-document combinations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComboConfig {
    /// smallest combined token count of a combination
    pub min_n: usize,
    /// largest combined token count of a combination
    pub max_n: usize,
    /// combination vocabulary cap
    pub top_k: usize,
    pub min_rel_freq: Option<f64>,
    /// emit `b_a` as well as `a_b`
    pub symmetric: bool,
    /// restrict combinations to in-vocabulary constituents
    pub use_screening: bool,
    /// largest n-gram set accepted on either side of a combination
    pub max_input_terms: usize,
}

impl Default for ComboConfig {
    fn default() -> Self {
        Self {
            min_n: 2,
            max_n: 4,
            top_k: 500,
            min_rel_freq: None,
            symmetric: false,
            use_screening: true,
            max_input_terms: 10_000,
        }
    }
}

impl ComboConfig {
    pub fn validate(&self) -> Result<()> {
        if self.min_n > self.max_n {
            return Err(FeatureError::InvalidComboRange {
                min: self.min_n,
                max: self.max_n,
            });
        }
        if self.top_k == 0 {
            return Err(FeatureError::InvalidConfig(
                "combo top_k must be at least 1".to_string(),
            ));
        }
        if self.max_input_terms == 0 {
            return Err(FeatureError::InvalidConfig(
                "combo max_input_terms must be at least 1".to_string(),
            ));
        }
        validate_rel_freq("combo", self.min_rel_freq)
    }

    /// Size bounds of this configuration.
    pub fn bounds(&self) -> ComboBounds {
        ComboBounds {
            min_n: self.min_n,
            max_n: self.max_n,
        }
    }
}

/// Inclusive bounds on `token_count(a) + token_count(b)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComboBounds {
    pub min_n: usize,
    pub max_n: usize,
}

impl ComboBounds {
    pub fn new(min_n: usize, max_n: usize) -> Result<Self> {
        if min_n > max_n {
            return Err(FeatureError::InvalidComboRange { min: min_n, max: max_n });
        }
        Ok(Self { min_n, max_n })
    }

    #[inline]
    pub fn contains(&self, size: usize) -> bool {
        self.min_n <= size && size <= self.max_n
    }
}

/// Full option surface of the pair extractor.
///
/// Every constructor that takes a config validates it first, so an invalid
/// config never reaches a corpus pass.
///
/// # Examples
/// ```
/// use ngram_pair_features::ExtractorConfig;
/// let json = r#"{ "lower_case": false, "combo": { "symmetric": true } }"#;
/// let config = ExtractorConfig::from_json(json).unwrap();
/// assert!(!config.lower_case);
/// assert!(config.combo.symmetric);
/// assert_eq!(config.combo.min_n, 2);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    pub view1: NgramConfig,
    pub view2: NgramConfig,
    pub combined: NgramConfig,
    pub combo: ComboConfig,
    pub lower_case: bool,
    pub stop_terms: Vec<String>,
    pub partial_stopword_match: bool,
    /// in chars
    pub min_token_length: usize,
    pub binary_feature_values: bool,
    pub use_view1_ngrams: bool,
    pub use_view2_ngrams: bool,
    pub use_view_blind_ngrams: bool,
    pub use_combo_ngrams: bool,
    pub mark_view_blind_with_local_view: bool,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            view1: NgramConfig::default(),
            view2: NgramConfig::default(),
            combined: NgramConfig::default(),
            combo: ComboConfig::default(),
            lower_case: true,
            stop_terms: Vec::new(),
            partial_stopword_match: false,
            min_token_length: 1,
            binary_feature_values: true,
            use_view1_ngrams: true,
            use_view2_ngrams: true,
            use_view_blind_ngrams: true,
            use_combo_ngrams: true,
            mark_view_blind_with_local_view: false,
        }
    }
}

impl ExtractorConfig {
    /// Parse a config from JSON; missing options take their defaults.
    /// The result is validated.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.view1.validate(crate::PART_ONE)?;
        self.view2.validate(crate::PART_TWO)?;
        self.combined.validate(crate::COMBINED)?;
        self.combo.validate()?;
        if self.mark_view_blind_with_local_view && !self.use_view_blind_ngrams {
            return Err(FeatureError::InvalidConfig(
                "mark_view_blind_with_local_view requires use_view_blind_ngrams".to_string(),
            ));
        }
        Ok(())
    }
}

fn validate_rel_freq(field: &str, min_rel_freq: Option<f64>) -> Result<()> {
    match min_rel_freq {
        Some(f) if !(0.0..=1.0).contains(&f) => Err(FeatureError::InvalidConfig(format!(
            "min_rel_freq of `{field}` must be within [0, 1], got {f}"
        ))),
        _ => Ok(()),
    }
}
