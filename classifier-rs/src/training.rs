//! Built-in greenhouse training set, fitted in-process at startup.

use aprender::preprocessing::StandardScaler;
use aprender::primitives::Matrix;
use aprender::traits::Transformer;
use aprender::tree::DecisionTreeClassifier;

use crate::class::SustainabilityClass;
use crate::error::Result;
use crate::features::{feature_matrix, FeatureVector};

/// temperature °C, humidity %, light lux, CO2 ppm; two rows per class.
pub const TRAINING_ROWS: [([f64; 4], SustainabilityClass); 6] = [
    ([20.0, 50.0, 5000.0, 400.0], SustainabilityClass::Unsustainable),
    ([22.0, 55.0, 5500.0, 450.0], SustainabilityClass::Unsustainable),
    ([25.0, 60.0, 6000.0, 500.0], SustainabilityClass::Moderate),
    ([27.0, 65.0, 6500.0, 550.0], SustainabilityClass::Moderate),
    ([30.0, 70.0, 7000.0, 600.0], SustainabilityClass::Sustainable),
    ([32.0, 75.0, 7500.0, 650.0], SustainabilityClass::Sustainable),
];

pub fn training_set() -> Result<(Matrix<f32>, Vec<usize>)> {
    let (rows, labels): (Vec<FeatureVector>, Vec<usize>) = TRAINING_ROWS
        .iter()
        .map(|(row, class)| (FeatureVector::new(*row), class.code()))
        .unzip();
    Ok((feature_matrix(&rows)?, labels))
}

/// Fits the scaler on the raw rows, then the tree on the scaled rows.
///
/// CART split search is exhaustive, so the fitted tree is the same on
/// every run.
pub fn fit_builtin_model() -> Result<(StandardScaler, DecisionTreeClassifier)> {
    let (x, y) = training_set()?;
    let mut scaler = StandardScaler::new();
    let scaled = scaler.fit_transform(&x)?;
    let mut tree = DecisionTreeClassifier::new();
    tree.fit(&scaled, &y)?;
    log::debug!("Fitted built-in decision tree on {} rows", y.len());
    Ok((scaler, tree))
}
