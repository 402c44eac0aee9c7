//! Advisor Input Validation
//!
//! Turns raw request bodies into typed inputs. Anything that fails here is
//! a `MalformedInput` outcome and never reaches the classifier or the
//! remote model.

use axum::extract::{rejection::JsonRejection, DefaultBodyLimit};
use axum::http::StatusCode;
use axum::Json;
use serde_json::Value;

use classifier::{ClassifierError, FeatureSchema, FeatureVector, SustainabilityClass};

/// Maximum request payload size (1 MiB)
pub const MAX_PAYLOAD_SIZE: usize = 1024 * 1024;

/// Error response for validation failures
#[derive(Debug, serde::Serialize)]
pub struct ValidationErrorResponse {
    pub error: String,
    pub code: u16,
}

/// Validation error for API requests
#[derive(Debug, thiserror::Error)]
pub enum ApiValidationError {
    #[error("Invalid request format: {0}")]
    InvalidFormat(String),

    #[error("Request payload too large: {0}")]
    PayloadTooLarge(String),
}

impl ApiValidationError {
    /// The message without the error-kind prefix.
    pub fn detail(&self) -> &str {
        match self {
            Self::InvalidFormat(detail) | Self::PayloadTooLarge(detail) => detail,
        }
    }

    /// Convert to HTTP status code and error response
    pub fn to_response(&self) -> (StatusCode, Json<ValidationErrorResponse>) {
        let status = match self {
            Self::InvalidFormat(_) => StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
        };

        (
            status,
            Json(ValidationErrorResponse {
                error: self.to_string(),
                code: status.as_u16(),
            }),
        )
    }
}

impl From<ClassifierError> for ApiValidationError {
    fn from(err: ClassifierError) -> Self {
        ApiValidationError::InvalidFormat(err.to_string())
    }
}

impl From<JsonRejection> for ApiValidationError {
    fn from(rejection: JsonRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiValidationError::PayloadTooLarge(rejection.body_text())
        } else {
            ApiValidationError::InvalidFormat(rejection.body_text())
        }
    }
}

/// Unwraps the JSON extractor result.
pub fn json_body(payload: Result<Json<Value>, JsonRejection>) -> Result<Value, ApiValidationError> {
    payload.map(|Json(value)| value).map_err(ApiValidationError::from)
}

/// Parses a `/predict` body.
pub fn parse_predict_request(
    schema: FeatureSchema,
    body: &Value,
) -> Result<FeatureVector, ApiValidationError> {
    Ok(schema.parse_features(body)?)
}

/// Parses a `/recommend` body: a `prediction` class name plus the features.
pub fn parse_recommend_request(
    schema: FeatureSchema,
    body: &Value,
) -> Result<(SustainabilityClass, FeatureVector), ApiValidationError> {
    let prediction = match body.get("prediction") {
        None => {
            return Err(ApiValidationError::InvalidFormat(
                "missing field 'prediction'".to_string(),
            ))
        }
        Some(Value::String(name)) => name
            .parse::<SustainabilityClass>()
            .map_err(|e| ApiValidationError::InvalidFormat(e.to_string()))?,
        Some(_) => {
            return Err(ApiValidationError::InvalidFormat(
                "field 'prediction' must be a string".to_string(),
            ))
        }
    };

    let features = schema.parse_features(body)?;
    Ok((prediction, features))
}

/// Body limit enforced by the JSON extractor; oversized bodies surface as a
/// `JsonRejection` with status 413 so each handler decides how to report them.
pub fn payload_limit_config() -> DefaultBodyLimit {
    DefaultBodyLimit::max(MAX_PAYLOAD_SIZE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_predict_request_errors_read_as_invalid_format() {
        let err = parse_predict_request(FeatureSchema::Greenhouse, &json!({"temperature": 20}))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid request format: missing field 'humidity'"
        );
        assert_eq!(err.to_response().0, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_recommend_request_requires_known_prediction() {
        let features = json!({
            "temperature": 20, "humidity": 50, "light_intensity": 5000, "co2_level": 400
        });

        let err = parse_recommend_request(FeatureSchema::Greenhouse, &features).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid request format: missing field 'prediction'"
        );

        let mut unknown = features.clone();
        unknown["prediction"] = json!("Thriving");
        assert!(parse_recommend_request(FeatureSchema::Greenhouse, &unknown).is_err());

        let mut numeric = features.clone();
        numeric["prediction"] = json!(2);
        assert!(parse_recommend_request(FeatureSchema::Greenhouse, &numeric).is_err());

        let mut valid = features;
        valid["prediction"] = json!("Moderate");
        let (class, vector) = parse_recommend_request(FeatureSchema::Greenhouse, &valid).unwrap();
        assert_eq!(class, SustainabilityClass::Moderate);
        assert_eq!(vector.values(), [20.0, 50.0, 5000.0, 400.0]);
    }
}
