//! Persisted model artifacts.
//!
//! Artifacts are JSON documents holding a fitted model plus an optional
//! scaler. They are read once at startup and never written by the service
//! itself.

use aprender::preprocessing::StandardScaler;
use aprender::primitives::Matrix;
use aprender::traits::Transformer;
use aprender::tree::{DecisionTreeClassifier, RandomForestClassifier};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::Path;

use crate::class::{SustainabilityClass, CLASS_NAMES};
use crate::error::{ClassifierError, Result};
use crate::features::N_FEATURES;

/// Default artifact location, relative to the working directory.
pub const DEFAULT_MODEL_PATH: &str = "static/rfc_model.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Model {
    DecisionTree(DecisionTreeClassifier),
    RandomForest(RandomForestClassifier),
}

impl Model {
    /// Predicts the class of the first row of `x`.
    ///
    /// A label outside the three classes is an `InvalidModel` error; models
    /// that went through [`ModelArtifact::validate`] never produce one.
    pub fn predict(&self, x: &Matrix<f32>) -> Result<SustainabilityClass> {
        let code = match self {
            Model::DecisionTree(tree) => tree.predict(x).first().copied(),
            Model::RandomForest(forest) => majority_vote(&forest.predict_proba(x)),
        }
        .ok_or_else(|| ClassifierError::InvalidModel("model produced no prediction".to_string()))?;

        SustainabilityClass::from_code(code).ok_or_else(|| {
            ClassifierError::InvalidModel(format!(
                "model predicted label {}, expected one of {} classes",
                code,
                CLASS_NAMES.len()
            ))
        })
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Model::DecisionTree(_) => "decision_tree",
            Model::RandomForest(_) => "random_forest",
        }
    }
}

/// Most-voted class of the first row; ties go to the lower class code.
fn majority_vote(proba: &Matrix<f32>) -> Option<usize> {
    let (rows, n_classes) = proba.shape();
    if rows == 0 {
        return None;
    }
    (0..n_classes).fold(None, |best: Option<usize>, class| match best {
        Some(current) if proba.get(0, current) >= proba.get(0, class) => Some(current),
        _ => Some(class),
    })
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub model: Model,
    #[serde(default)]
    pub scaler: Option<StandardScaler>,
    pub n_features: usize,
}

impl ModelArtifact {
    pub fn new(model: Model, scaler: Option<StandardScaler>) -> Self {
        Self {
            model,
            scaler,
            n_features: N_FEATURES,
        }
    }

    /// Reads and validates an artifact.
    ///
    /// # Errors
    ///
    /// I/O and JSON failures, an unfitted model or scaler, a feature count
    /// other than four, or leaves predicting labels outside the three
    /// sustainability classes.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path)?;
        let artifact: ModelArtifact = serde_json::from_slice(&bytes)?;
        artifact.validate()?;
        log::info!(
            "Loaded {} model from {} ({} features, scaler: {})",
            artifact.model.kind(),
            path.display(),
            artifact.n_features,
            artifact.scaler.is_some()
        );
        Ok(artifact)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_vec_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Checks everything `Model::predict` relies on, so prediction on a
    /// validated artifact cannot fail or panic.
    pub fn validate(&self) -> Result<()> {
        if self.n_features != N_FEATURES {
            return Err(ClassifierError::InvalidModel(format!(
                "artifact declares {} features, expected {}",
                self.n_features, N_FEATURES
            )));
        }
        if let Some(scaler) = &self.scaler {
            let zeros = Matrix::from_vec(1, N_FEATURES, vec![0.0; N_FEATURES])
                .map_err(aprender::error::AprenderError::from)?;
            scaler.transform(&zeros).map_err(|err| {
                ClassifierError::InvalidModel(format!("unusable scaler: {}", err))
            })?;
        }

        // The fitted tree structure is private to aprender; inspect it
        // through its serialized form instead.
        let document = serde_json::to_value(&self.model)?;
        match &self.model {
            Model::DecisionTree(_) => validate_tree(&document),
            Model::RandomForest(_) => validate_forest(&document),
        }
    }
}

fn invalid(message: impl Into<String>) -> ClassifierError {
    ClassifierError::InvalidModel(message.into())
}

fn validate_forest(forest: &Value) -> Result<()> {
    let trees = forest
        .get("trees")
        .and_then(Value::as_array)
        .filter(|trees| !trees.is_empty())
        .ok_or_else(|| invalid("random forest has no fitted trees"))?;
    for tree in trees {
        validate_tree(tree)?;
    }

    // Vote counting is sized from the training labels.
    let labels = forest
        .get("y_train")
        .and_then(Value::as_array)
        .filter(|labels| !labels.is_empty())
        .ok_or_else(|| invalid("random forest is missing its training labels"))?;
    labels.iter().try_for_each(validate_label)
}

fn validate_tree(tree: &Value) -> Result<()> {
    if let Some(n_features) = tree.get("n_features").and_then(Value::as_u64) {
        if n_features as usize != N_FEATURES {
            return Err(invalid(format!(
                "model takes {} features, expected {}",
                n_features, N_FEATURES
            )));
        }
    }
    match tree.get("tree") {
        Some(root) if !root.is_null() => validate_node(root),
        _ => Err(invalid("decision tree is not fitted")),
    }
}

fn validate_node(node: &Value) -> Result<()> {
    if let Some(leaf) = node.get("Leaf") {
        return leaf
            .get("class_label")
            .ok_or_else(|| invalid("leaf without a class label"))
            .and_then(validate_label);
    }

    let split = node
        .get("Node")
        .ok_or_else(|| invalid("unrecognised tree node"))?;
    let feature = split
        .get("feature_idx")
        .and_then(Value::as_u64)
        .ok_or_else(|| invalid("split without a feature index"))?;
    if feature as usize >= N_FEATURES {
        return Err(invalid(format!(
            "split on feature {}, expected fewer than {}",
            feature, N_FEATURES
        )));
    }
    for side in ["left", "right"] {
        let child = split
            .get(side)
            .ok_or_else(|| invalid(format!("split without a {} branch", side)))?;
        validate_node(child)?;
    }
    Ok(())
}

fn validate_label(label: &Value) -> Result<()> {
    let code = label
        .as_u64()
        .ok_or_else(|| invalid(format!("class label {} is not an integer", label)))?;
    match SustainabilityClass::from_code(code as usize) {
        Some(_) => Ok(()),
        None => Err(invalid(format!(
            "model predicts label {}, expected one of {} classes",
            code,
            CLASS_NAMES.len()
        ))),
    }
}
