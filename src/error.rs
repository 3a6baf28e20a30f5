//! Error types

/// Errors raised while configuring, building vocabularies, extracting
/// features or storing instances.
#[derive(Debug, thiserror::Error)]
pub enum FeatureError {
    /// n-gram window bounds of a field are unusable.
    #[error("invalid n-gram range for field `{field}`: min_n={min} max_n={max}")]
    InvalidNgramRange {
        field: String,
        min: usize,
        max: usize,
    },

    /// combination size bounds are unusable.
    #[error("invalid combination range: min_n={min} max_n={max}")]
    InvalidComboRange { min: usize, max: usize },

    /// any other option that fails validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// a document does not carry a field the extractor needs.
    #[error("document has no field `{field}`")]
    MissingField { field: String },

    /// one side of a combination exceeds the configured input cap.
    #[error("combination input `{side}` has {size} terms, cap is {cap}")]
    ComboInputTooLarge {
        side: &'static str,
        size: usize,
        cap: usize,
    },

    /// two distinct raw feature names escape to the same name.
    #[error("feature name escaping collision: `{first}` and `{second}` both escape to `{escaped}`")]
    EscapeCollision {
        escaped: String,
        first: String,
        second: String,
    },

    /// a feature name occurs more than once in one instance.
    #[error("feature `{name}` is defined multiple times in one instance")]
    DuplicateFeature { name: String },

    /// an instance does not match the feature schema of the store.
    #[error("instance features do not match the store schema: {}", features.join(", "))]
    SchemaMismatch { features: Vec<String> },

    /// the store does not allow its feature names to be set (again).
    #[error("feature names of this store are already fixed")]
    FeatureNamesFixed,

    /// an empty feature space was offered to a store.
    #[error("cannot set an empty feature space")]
    EmptyFeatureSpace,

    /// the store schema has been frozen; no more instances can be added.
    #[error("feature store is frozen, no more instances can be added")]
    StoreFrozen,

    /// a vocabulary set lacks a field an extractor depends on.
    #[error("no vocabulary for field `{field}`")]
    MissingVocabulary { field: String },

    #[error(transparent)]
    Cbor(#[from] serde_cbor::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Result type for feature extraction operations.
pub type Result<T> = core::result::Result<T, FeatureError>;
