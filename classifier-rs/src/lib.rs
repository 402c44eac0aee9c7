//! classifier-rs/lib.rs
//! Plant-growth sustainability classifier
//!
//! Maps a four-value environmental feature vector to one of three ordinal
//! sustainability classes. The model is built exactly once, either by
//! loading a persisted artifact or by fitting the built-in training set,
//! and is read-only afterwards.

pub mod artifact;
pub mod class;
pub mod error;
pub mod features;
pub mod training;

use std::path::Path;

use aprender::traits::Transformer;

pub use aprender::preprocessing::StandardScaler;
pub use aprender::tree::{DecisionTreeClassifier, RandomForestClassifier};
pub use artifact::{Model, ModelArtifact, DEFAULT_MODEL_PATH};
pub use class::{SustainabilityClass, CLASS_NAMES};
pub use error::{ClassifierError, Result};
pub use features::{feature_matrix, FeatureField, FeatureSchema, FeatureVector, N_FEATURES};

/// Immutable, fitted classifier shared across request handlers.
#[derive(Debug, Clone)]
pub struct Classifier {
    schema: FeatureSchema,
    model: Model,
    scaler: Option<StandardScaler>,
}

impl Classifier {
    /// Loads a persisted model for the given schema.
    pub fn from_artifact<P: AsRef<Path>>(schema: FeatureSchema, path: P) -> Result<Self> {
        let artifact = ModelArtifact::load(path)?;
        Ok(Self {
            schema,
            model: artifact.model,
            scaler: artifact.scaler,
        })
    }

    /// Fits the greenhouse decision tree and scaler from the built-in rows.
    pub fn fit_builtin() -> Result<Self> {
        let (scaler, tree) = training::fit_builtin_model()?;
        let artifact = ModelArtifact::new(Model::DecisionTree(tree), Some(scaler));
        artifact.validate()?;
        Ok(Self {
            schema: FeatureSchema::Greenhouse,
            model: artifact.model,
            scaler: artifact.scaler,
        })
    }

    pub fn schema(&self) -> FeatureSchema {
        self.schema
    }

    pub fn model_kind(&self) -> &'static str {
        self.model.kind()
    }

    pub fn is_scaled(&self) -> bool {
        self.scaler.is_some()
    }

    /// Pure mapping from features to class. The model and scaler were
    /// validated when the classifier was built, so an error here means the
    /// backend itself misbehaved.
    pub fn classify(&self, features: &FeatureVector) -> Result<SustainabilityClass> {
        let raw = features.to_matrix()?;
        match &self.scaler {
            Some(scaler) => self.model.predict(&scaler.transform(&raw)?),
            None => self.model.predict(&raw),
        }
    }
}
