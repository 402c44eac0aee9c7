//! Feature schemas and the fixed-shape feature vector fed to the model.
//!
//! Two schemas exist for the same product. They are selected explicitly at
//! startup and never mixed: the model is shape-sensitive, so a vector is
//! only meaningful together with the schema that produced it.

use aprender::error::AprenderError;
use aprender::primitives::Matrix;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::error::{ClassifierError, Result};

/// Number of features every schema carries.
pub const N_FEATURES: usize = 4;

/// One named input column with its human-readable label and unit suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureField {
    /// JSON key in request bodies.
    pub key: &'static str,
    pub label: &'static str,
    /// Appended verbatim after the value when rendering prompts.
    pub unit: &'static str,
}

const SOIL_FIELDS: [FeatureField; N_FEATURES] = [
    FeatureField { key: "temperature", label: "Temperature", unit: "°C" },
    FeatureField { key: "soil_type", label: "Soil Type", unit: "" },
    FeatureField { key: "annual_rainfall", label: "Annual Rainfall", unit: " mm" },
    FeatureField { key: "dry_season_duration", label: "Dry Season Duration", unit: " months" },
];

const GREENHOUSE_FIELDS: [FeatureField; N_FEATURES] = [
    FeatureField { key: "temperature", label: "Temperature", unit: "°C" },
    FeatureField { key: "humidity", label: "Humidity", unit: "%" },
    FeatureField { key: "light_intensity", label: "Light Intensity", unit: " lux" },
    FeatureField { key: "co2_level", label: "CO2 Level", unit: " ppm" },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeatureSchema {
    /// temperature, soil_type, annual_rainfall, dry_season_duration
    Soil,
    /// temperature, humidity, light_intensity, co2_level
    Greenhouse,
}

impl FeatureSchema {
    pub fn fields(self) -> &'static [FeatureField; N_FEATURES] {
        match self {
            FeatureSchema::Soil => &SOIL_FIELDS,
            FeatureSchema::Greenhouse => &GREENHOUSE_FIELDS,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FeatureSchema::Soil => "soil",
            FeatureSchema::Greenhouse => "greenhouse",
        }
    }

    /// Extract the feature vector from a JSON request body.
    ///
    /// Every field must be present and be a JSON number; strings holding
    /// numbers are rejected. Unknown keys are ignored.
    pub fn parse_features(self, body: &Value) -> Result<FeatureVector> {
        let object = body.as_object().ok_or_else(|| {
            ClassifierError::MalformedInput("request body must be a JSON object".to_string())
        })?;

        let mut values = [0.0f64; N_FEATURES];
        for (slot, field) in values.iter_mut().zip(self.fields()) {
            let raw = object.get(field.key).ok_or_else(|| {
                ClassifierError::MalformedInput(format!("missing field '{}'", field.key))
            })?;
            *slot = raw.as_f64().ok_or_else(|| {
                ClassifierError::MalformedInput(format!("field '{}' must be a number", field.key))
            })?;
        }

        Ok(FeatureVector::new(values))
    }
}

impl fmt::Display for FeatureSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FeatureSchema {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "soil" => Ok(FeatureSchema::Soil),
            "greenhouse" => Ok(FeatureSchema::Greenhouse),
            other => Err(format!(
                "unknown feature schema '{}', expected 'soil' or 'greenhouse'",
                other
            )),
        }
    }
}

/// Ordered 4-tuple of raw feature values. Positional, not named.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector([f64; N_FEATURES]);

impl FeatureVector {
    pub fn new(values: [f64; N_FEATURES]) -> Self {
        Self(values)
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn values(&self) -> [f64; N_FEATURES] {
        self.0
    }

    /// Single-row model input.
    pub fn to_matrix(&self) -> Result<Matrix<f32>> {
        feature_matrix(std::slice::from_ref(self))
    }
}

/// Stacks feature vectors into an `n x 4` matrix of the model's `f32` inputs.
pub fn feature_matrix(rows: &[FeatureVector]) -> Result<Matrix<f32>> {
    let data = rows
        .iter()
        .flat_map(|row| row.0.iter().map(|&value| value as f32))
        .collect();
    Ok(Matrix::from_vec(rows.len(), N_FEATURES, data).map_err(AprenderError::from)?)
}

impl From<[f64; N_FEATURES]> for FeatureVector {
    fn from(values: [f64; N_FEATURES]) -> Self {
        Self(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_greenhouse_body() {
        let body = json!({
            "temperature": 25,
            "humidity": 60.5,
            "light_intensity": 6000,
            "co2_level": 500,
            "prediction": "Moderate"
        });
        let features = FeatureSchema::Greenhouse.parse_features(&body).unwrap();
        assert_eq!(features.values(), [25.0, 60.5, 6000.0, 500.0]);
    }

    #[test]
    fn test_parse_preserves_schema_order() {
        let body = json!({
            "dry_season_duration": 4,
            "annual_rainfall": 1200,
            "soil_type": 2,
            "temperature": 18
        });
        let features = FeatureSchema::Soil.parse_features(&body).unwrap();
        assert_eq!(features.values(), [18.0, 2.0, 1200.0, 4.0]);
    }

    #[test]
    fn test_missing_field_is_malformed() {
        let body = json!({ "temperature": 25, "humidity": 60, "light_intensity": 6000 });
        let err = FeatureSchema::Greenhouse.parse_features(&body).unwrap_err();
        assert!(matches!(err, ClassifierError::MalformedInput(_)));
        assert_eq!(err.to_string(), "missing field 'co2_level'");
        assert!(!err.is_startup_failure());
    }

    #[test]
    fn test_non_numeric_field_is_malformed() {
        let body = json!({
            "temperature": "25",
            "humidity": 60,
            "light_intensity": 6000,
            "co2_level": 500
        });
        let err = FeatureSchema::Greenhouse.parse_features(&body).unwrap_err();
        assert_eq!(err.to_string(), "field 'temperature' must be a number");
    }

    #[test]
    fn test_non_object_body_is_malformed() {
        let err = FeatureSchema::Soil.parse_features(&json!([1, 2, 3, 4])).unwrap_err();
        assert!(matches!(err, ClassifierError::MalformedInput(_)));
    }

    #[test]
    fn test_schema_from_str() {
        assert_eq!("Soil".parse::<FeatureSchema>().unwrap(), FeatureSchema::Soil);
        assert_eq!(
            "greenhouse".parse::<FeatureSchema>().unwrap(),
            FeatureSchema::Greenhouse
        );
        assert!("orchard".parse::<FeatureSchema>().is_err());
    }

    #[test]
    fn test_feature_matrix_keeps_row_order() {
        let rows = [
            FeatureVector::new([20.0, 50.0, 5000.0, 400.0]),
            FeatureVector::new([30.0, 70.0, 7000.0, 600.0]),
        ];
        let matrix = feature_matrix(&rows).unwrap();
        assert_eq!(matrix.shape(), (2, N_FEATURES));
        assert_eq!(matrix.get(0, 2), 5000.0);
        assert_eq!(matrix.get(1, 3), 600.0);
        assert_eq!(rows[1].to_matrix().unwrap().shape(), (1, N_FEATURES));
    }
}
