use std::collections::{BTreeSet, HashSet};

use crate::error::{FeatureError, Result};
use crate::feature::Instance;

/// FeatureStore Trait
/// Collection of instances handed to the encoder of a classifier.
pub trait FeatureStore {
    /// Take ownership of an instance
    fn add_instance(&mut self, instance: Instance) -> Result<()>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn instance(&self, index: usize) -> Option<&Instance>;

    fn instances(&self) -> Box<dyn Iterator<Item = &Instance> + '_>;

    /// Union of all outcomes, sorted
    fn unique_outcomes(&self) -> BTreeSet<String> {
        self.instances()
            .flat_map(|i| i.outcomes().iter().cloned())
            .collect()
    }

    fn outcomes(&self, index: usize) -> Option<&[String]> {
        self.instance(index).map(|i| i.outcomes())
    }

    fn weight(&self, index: usize) -> Option<f64> {
        self.instance(index).map(|i| i.weight())
    }

    /// Union of all feature names, sorted
    fn feature_names(&self) -> &BTreeSet<String>;

    fn is_setting_feature_names_allowed(&self) -> bool;

    /// Fix the feature space, e.g. test data to the training feature space
    fn set_feature_names(&mut self, names: BTreeSet<String>) -> Result<()>;

    fn supports_sparse_features(&self) -> bool;
}

/// Dense store: the first instance fixes the schema and every later instance
/// must carry exactly the same feature names.
#[derive(Debug, Clone, Default)]
pub struct DenseFeatureStore {
    instances: Vec<Instance>,
    feature_names: BTreeSet<String>,
}

impl DenseFeatureStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FeatureStore for DenseFeatureStore {
    fn add_instance(&mut self, instance: Instance) -> Result<()> {
        if self.instances.is_empty() {
            self.feature_names = instance.feature_names().map(str::to_string).collect();
        } else {
            let names: HashSet<&str> = instance.feature_names().collect();
            let mut mismatch: Vec<String> = names
                .iter()
                .filter(|n| !self.feature_names.contains(**n))
                .map(|n| n.to_string())
                .collect();
            mismatch.extend(
                self.feature_names
                    .iter()
                    .filter(|n| !names.contains(n.as_str()))
                    .cloned(),
            );
            if !mismatch.is_empty() {
                mismatch.sort();
                return Err(FeatureError::SchemaMismatch { features: mismatch });
            }
        }
        self.instances.push(instance);
        Ok(())
    }

    fn len(&self) -> usize {
        self.instances.len()
    }

    fn instance(&self, index: usize) -> Option<&Instance> {
        self.instances.get(index)
    }

    fn instances(&self) -> Box<dyn Iterator<Item = &Instance> + '_> {
        Box::new(self.instances.iter())
    }

    fn feature_names(&self) -> &BTreeSet<String> {
        &self.feature_names
    }

    fn is_setting_feature_names_allowed(&self) -> bool {
        false
    }

    fn set_feature_names(&mut self, _names: BTreeSet<String>) -> Result<()> {
        Err(FeatureError::FeatureNamesFixed)
    }

    fn supports_sparse_features(&self) -> bool {
        false
    }
}

/// Sparse store: keeps only non-default feature values and the union of all
/// feature names seen. The feature names can be set once, which also freezes
/// the store.
#[derive(Debug, Clone, Default)]
pub struct SparseFeatureStore {
    instances: Vec<Instance>,
    feature_names: BTreeSet<String>,
    non_default_count: usize,
    frozen: bool,
}

impl SparseFeatureStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Share (0-1) of non-default cells in the instance x feature matrix
    pub fn sparsity_ratio(&self) -> f64 {
        let matrix = self.feature_names.len() * self.instances.len();
        if matrix == 0 {
            return 0.0;
        }
        self.non_default_count as f64 / matrix as f64
    }
}

impl FeatureStore for SparseFeatureStore {
    fn add_instance(&mut self, mut instance: Instance) -> Result<()> {
        if self.frozen {
            return Err(FeatureError::StoreFrozen);
        }
        self.feature_names
            .extend(instance.feature_names().map(str::to_string));
        instance.retain_features(|f| !f.is_default());
        self.non_default_count += instance.features().len();
        self.instances.push(instance);
        Ok(())
    }

    fn len(&self) -> usize {
        self.instances.len()
    }

    fn instance(&self, index: usize) -> Option<&Instance> {
        self.instances.get(index)
    }

    fn instances(&self) -> Box<dyn Iterator<Item = &Instance> + '_> {
        Box::new(self.instances.iter())
    }

    fn feature_names(&self) -> &BTreeSet<String> {
        &self.feature_names
    }

    fn is_setting_feature_names_allowed(&self) -> bool {
        !self.frozen
    }

    fn set_feature_names(&mut self, names: BTreeSet<String>) -> Result<()> {
        if self.frozen {
            return Err(FeatureError::FeatureNamesFixed);
        }
        if names.is_empty() {
            return Err(FeatureError::EmptyFeatureSpace);
        }
        let removed = self.feature_names.difference(&names).count();
        log::debug!(
            "{} features not in the given feature space, removing them from the store",
            removed
        );
        let mut non_default_count = 0;
        for instance in &mut self.instances {
            instance.retain_features(|f| names.contains(f.name()));
            non_default_count += instance.features().len();
        }
        self.non_default_count = non_default_count;
        self.feature_names = names;
        self.frozen = true;
        Ok(())
    }

    fn supports_sparse_features(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature::Feature;

    fn instance(features: &[(&str, i64)], outcome: &str) -> Instance {
        Instance::with_features(
            features.iter().map(|(n, v)| Feature::new(n, *v).unwrap()),
            vec![outcome.to_string()],
        )
        .unwrap()
    }

    #[test]
    fn dense_store_enforces_first_schema() {
        let mut store = DenseFeatureStore::new();
        store.add_instance(instance(&[("a", 1), ("b", 0)], "x")).unwrap();
        store.add_instance(instance(&[("b", 2), ("a", 0)], "y")).unwrap();
        match store.add_instance(instance(&[("a", 1), ("c", 1)], "x")) {
            Err(FeatureError::SchemaMismatch { features }) => {
                assert_eq!(features, vec!["b".to_string(), "c".to_string()]);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(store.len(), 2);
        assert_eq!(
            store.unique_outcomes().into_iter().collect::<Vec<_>>(),
            vec!["x".to_string(), "y".to_string()]
        );
        assert!(!store.is_setting_feature_names_allowed());
        assert!(store.set_feature_names(BTreeSet::from(["a".to_string()])).is_err());
    }

    #[test]
    fn sparse_store_drops_defaults_and_tracks_names() {
        let mut store = SparseFeatureStore::new();
        store.add_instance(instance(&[("a", 1), ("b", 0)], "x")).unwrap();
        store.add_instance(instance(&[("b", 2), ("c", 0)], "x")).unwrap();
        assert_eq!(
            store.feature_names().iter().cloned().collect::<Vec<_>>(),
            vec!["a", "b", "c"]
        );
        assert_eq!(store.instance(0).unwrap().feature_names().collect::<Vec<_>>(), vec!["a"]);
        // 2 non-default cells of 2 x 3
        assert!((store.sparsity_ratio() - 2.0 / 6.0).abs() < 1e-12);
        assert!(store.supports_sparse_features());
    }

    #[test]
    fn sparse_store_feature_names_are_set_once() {
        let mut store = SparseFeatureStore::new();
        store.add_instance(instance(&[("a", 1), ("b", 3)], "x")).unwrap();
        assert!(matches!(
            store.set_feature_names(BTreeSet::new()),
            Err(FeatureError::EmptyFeatureSpace)
        ));
        store
            .set_feature_names(BTreeSet::from(["a".to_string(), "z".to_string()]))
            .unwrap();
        assert_eq!(store.instance(0).unwrap().feature_names().collect::<Vec<_>>(), vec!["a"]);
        assert!(store.feature_names().contains("z"));
        assert!(matches!(
            store.set_feature_names(BTreeSet::from(["a".to_string()])),
            Err(FeatureError::FeatureNamesFixed)
        ));
        assert!(matches!(
            store.add_instance(instance(&[("a", 1)], "y")),
            Err(FeatureError::StoreFrozen)
        ));
    }

    #[test]
    fn weights_are_kept_per_instance() {
        let mut store = SparseFeatureStore::new();
        store.add_instance(instance(&[("a", 1)], "x").with_weight(0.5)).unwrap();
        assert_eq!(store.weight(0), Some(0.5));
        assert_eq!(store.outcomes(0), Some(&["x".to_string()][..]));
        assert_eq!(store.weight(3), None);
    }
}
