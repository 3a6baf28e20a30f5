pub mod escape;
pub mod store;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{FeatureError, Result};

/// Value of one feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FeatureValue {
    Integer(i64),
    Real(f64),
    Category(String),
}

impl FeatureValue {
    /// The neutral value a feature takes when absent: 0, 0.0 or the empty category
    pub fn is_neutral(&self) -> bool {
        match self {
            FeatureValue::Integer(v) => *v == 0,
            FeatureValue::Real(v) => *v == 0.0,
            FeatureValue::Category(v) => v.is_empty(),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FeatureValue::Integer(v) => Some(*v as f64),
            FeatureValue::Real(v) => Some(*v),
            FeatureValue::Category(_) => None,
        }
    }
}

impl From<i64> for FeatureValue {
    fn from(v: i64) -> Self {
        FeatureValue::Integer(v)
    }
}

impl From<u64> for FeatureValue {
    fn from(v: u64) -> Self {
        FeatureValue::Integer(i64::try_from(v).unwrap_or(i64::MAX))
    }
}

impl From<f64> for FeatureValue {
    fn from(v: f64) -> Self {
        FeatureValue::Real(v)
    }
}

impl From<&str> for FeatureValue {
    fn from(v: &str) -> Self {
        FeatureValue::Category(v.to_string())
    }
}

impl fmt::Display for FeatureValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureValue::Integer(v) => write!(f, "{v}"),
            FeatureValue::Real(v) => write!(f, "{v}"),
            FeatureValue::Category(v) => write!(f, "{v}"),
        }
    }
}

/// One named feature value.
/// The name is escaped when the feature is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    name: String,
    value: FeatureValue,
    is_default: bool,
}

impl Feature {
    /// Feature whose default is the neutral value of its type
    pub fn new(name: &str, value: impl Into<FeatureValue>) -> Result<Self> {
        let value = value.into();
        let is_default = value.is_neutral();
        Ok(Self {
            name: escape::escape_feature_name(name)?,
            value,
            is_default,
        })
    }

    /// Feature with an explicit default value
    pub fn with_default(
        name: &str,
        value: impl Into<FeatureValue>,
        default: &FeatureValue,
    ) -> Result<Self> {
        let value = value.into();
        let is_default = &value == default;
        Ok(Self {
            name: escape::escape_feature_name(name)?,
            value,
            is_default,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &FeatureValue {
        &self.value
    }

    pub fn is_default(&self) -> bool {
        self.is_default
    }
}

/// Instance
/// Name-sorted features with unique names, the outcomes, an optional
/// sequence id/position and a weight.
/// Built feature by feature; a feature store takes ownership and only hands
/// out shared references afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instance {
    features: Vec<Feature>,
    outcomes: Vec<String>,
    weight: f64,
    sequence_id: Option<u32>,
    sequence_position: Option<u32>,
}

impl Default for Instance {
    fn default() -> Self {
        Self {
            features: Vec::new(),
            outcomes: Vec::new(),
            weight: 1.0,
            sequence_id: None,
            sequence_position: None,
        }
    }
}

impl Instance {
    pub fn new() -> Self {
        Self::default()
    }

    /// `DuplicateFeature` if a feature of that name is already present
    pub fn with_features<I>(features: I, outcomes: Vec<String>) -> Result<Self>
    where
        I: IntoIterator<Item = Feature>,
    {
        let mut instance = Instance {
            outcomes,
            ..Instance::default()
        };
        instance.add_features(features)?;
        Ok(instance)
    }

    /// Insert keeping name order; `DuplicateFeature` on a repeated name
    pub fn add_feature(&mut self, feature: Feature) -> Result<()> {
        match self
            .features
            .binary_search_by(|f| f.name.as_str().cmp(feature.name()))
        {
            Ok(_) => Err(FeatureError::DuplicateFeature { name: feature.name }),
            Err(pos) => {
                self.features.insert(pos, feature);
                Ok(())
            }
        }
    }

    pub fn add_features<I>(&mut self, features: I) -> Result<()>
    where
        I: IntoIterator<Item = Feature>,
    {
        let mut incoming: Vec<Feature> = features.into_iter().collect();
        if self.features.is_empty() {
            // bulk path: one sort instead of n inserts
            incoming.sort_by(|a, b| a.name.cmp(&b.name));
            if let Some(dup) = incoming.windows(2).find(|w| w[0].name == w[1].name) {
                return Err(FeatureError::DuplicateFeature { name: dup[0].name.clone() });
            }
            self.features = incoming;
            return Ok(());
        }
        for feature in incoming {
            self.add_feature(feature)?;
        }
        Ok(())
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    pub fn with_sequence(mut self, id: Option<u32>, position: Option<u32>) -> Self {
        self.sequence_id = id;
        self.sequence_position = position;
        self
    }

    pub fn add_outcome(&mut self, outcome: impl Into<String>) {
        self.outcomes.push(outcome.into());
    }

    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    pub fn feature(&self, name: &str) -> Option<&Feature> {
        self.features
            .binary_search_by(|f| f.name.as_str().cmp(name))
            .ok()
            .map(|i| &self.features[i])
    }

    pub fn feature_names(&self) -> impl Iterator<Item = &str> {
        self.features.iter().map(|f| f.name())
    }

    pub fn outcomes(&self) -> &[String] {
        &self.outcomes
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }

    pub fn sequence_id(&self) -> Option<u32> {
        self.sequence_id
    }

    pub fn sequence_position(&self) -> Option<u32> {
        self.sequence_position
    }

    /// Drop features for which `keep` is false
    pub(crate) fn retain_features<F>(&mut self, keep: F)
    where
        F: FnMut(&Feature) -> bool,
    {
        self.features.retain(keep);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_flag_follows_neutral_value() {
        assert!(Feature::new("f", 0i64).unwrap().is_default());
        assert!(!Feature::new("f", 2u64).unwrap().is_default());
        assert!(Feature::new("f", 0.0).unwrap().is_default());
        assert!(!Feature::new("f", "red").unwrap().is_default());
        let d = FeatureValue::Category("none".into());
        assert!(Feature::with_default("f", "none", &d).unwrap().is_default());
    }

    #[test]
    fn names_are_escaped_on_construction() {
        let f = Feature::new("allNG_a b", 1i64).unwrap();
        assert_eq!(f.name(), "allNG_au000020b");
    }

    #[test]
    fn instance_keeps_features_sorted_and_unique() {
        let mut instance = Instance::with_features(
            vec![Feature::new("b", 1i64).unwrap(), Feature::new("a", 0i64).unwrap()],
            vec!["yes".into()],
        )
        .unwrap();
        instance.add_feature(Feature::new("c", 3i64).unwrap()).unwrap();
        assert_eq!(instance.feature_names().collect::<Vec<_>>(), vec!["a", "b", "c"]);
        assert_eq!(instance.feature("c").unwrap().value(), &FeatureValue::Integer(3));
        assert!(matches!(
            instance.add_feature(Feature::new("a", 5i64).unwrap()),
            Err(FeatureError::DuplicateFeature { name }) if name == "a"
        ));
        assert_eq!(instance.weight(), 1.0);
    }

    #[test]
    fn bulk_duplicates_are_rejected() {
        let res = Instance::with_features(
            vec![Feature::new("x", 1i64).unwrap(), Feature::new("x", 2i64).unwrap()],
            Vec::new(),
        );
        assert!(res.is_err());
    }
}
