use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::DiagnosisOutcome;

// Fallbacks for fields the service may omit. A JSON `null` counts as omitted.
pub const UNKNOWN_DISEASE: &str = "Unknown";
pub const UNKNOWN_MODEL: &str = "Unknown";
pub const UNKNOWN_ERROR: &str = "Unknown error";
pub const DEFAULT_CONFIDENCE: f64 = 0.0;

#[derive(Debug, thiserror::Error)]
pub enum ResponseShapeError {
    #[error("response body is not valid JSON: {0}")]
    NotJson(#[source] serde_json::Error),
    #[error("response body is not a JSON object")]
    NotAnObject,
    #[error("response has no `success` field")]
    MissingSuccess,
    #[error("`success` must be a boolean, got {0}")]
    SuccessNotBoolean(String),
    #[error("unexpected response shape: {0}")]
    InvalidShape(#[source] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PredictionResponse {
    Success(PredictionSuccess),
    Failure(PredictionFailure),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionSuccess {
    pub prediction: Prediction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub disease: String,
    pub confidence: f64,
    pub model_used: String,
    pub low_confidence: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guidance: Option<GuidanceBlock>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuidanceBlock {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity: Option<String>,
    #[serde(default)]
    pub remedies: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub follow_up: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionFailure {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_prediction: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

// Only `success`, `prediction.disease`, `confidence` and `low_confidence` are
// typed strictly. Advisory fields accept any JSON and are kept as text.
#[derive(Debug, Deserialize)]
struct RawSuccess {
    prediction: Option<RawPrediction>,
    warning: Option<Value>,
    suggestion: Option<Value>,
    guidance: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
struct RawPrediction {
    disease: Option<String>,
    confidence: Option<f64>,
    model_used: Option<Value>,
    low_confidence: Option<bool>,
    guidance: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct RawFailure {
    error: Option<Value>,
    suggestion: Option<Value>,
    raw_prediction: Option<Value>,
    confidence: Option<f64>,
}

impl PredictionResponse {
    /// Validates the envelope (`success` boolean) and applies the field fallbacks.
    pub fn parse(body: &[u8]) -> Result<Self, ResponseShapeError> {
        let value: Value = serde_json::from_slice(body).map_err(ResponseShapeError::NotJson)?;
        let success = match value.as_object().map(|map| map.get("success")) {
            None => return Err(ResponseShapeError::NotAnObject),
            Some(None) => return Err(ResponseShapeError::MissingSuccess),
            Some(Some(Value::Bool(b))) => *b,
            Some(Some(other)) => return Err(ResponseShapeError::SuccessNotBoolean(other.to_string())),
        };

        if success {
            let raw: RawSuccess =
                serde_json::from_value(value).map_err(ResponseShapeError::InvalidShape)?;
            Ok(PredictionResponse::Success(raw.into()))
        } else {
            let raw: RawFailure =
                serde_json::from_value(value).map_err(ResponseShapeError::InvalidShape)?;
            Ok(PredictionResponse::Failure(raw.into()))
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, PredictionResponse::Success(_))
    }

    pub fn outcome(&self) -> Option<DiagnosisOutcome> {
        match self {
            PredictionResponse::Success(success) => Some(success.outcome()),
            PredictionResponse::Failure(_) => None,
        }
    }
}

impl PredictionSuccess {
    pub fn outcome(&self) -> DiagnosisOutcome {
        DiagnosisOutcome::from_prediction(&self.prediction)
    }
}

impl PredictionFailure {
    /// Confidence that accompanied a raw prediction, in percent.
    pub fn raw_confidence_pct(&self) -> Option<f64> {
        self.raw_prediction
            .as_ref()
            .map(|_| self.confidence.unwrap_or(DEFAULT_CONFIDENCE) * 100.0)
    }
}

impl GuidanceBlock {
    pub fn is_empty(&self) -> bool {
        self.description.is_none()
            && self.severity.is_none()
            && self.remedies.is_empty()
            && self.follow_up.is_none()
            && self.source.is_none()
    }
}

impl From<RawSuccess> for PredictionSuccess {
    fn from(raw: RawSuccess) -> Self {
        let prediction = raw.prediction.unwrap_or_default();
        // The service nests guidance in the prediction; older builds put it at the top level.
        let guidance = prediction
            .guidance
            .or(raw.guidance)
            .map(GuidanceBlock::from)
            .filter(|g| !g.is_empty());

        Self {
            prediction: Prediction {
                disease: prediction
                    .disease
                    .unwrap_or_else(|| UNKNOWN_DISEASE.to_string()),
                confidence: prediction.confidence.unwrap_or(DEFAULT_CONFIDENCE),
                model_used: text(prediction.model_used)
                    .unwrap_or_else(|| UNKNOWN_MODEL.to_string()),
                low_confidence: prediction.low_confidence.unwrap_or(false),
                guidance,
            },
            warning: non_empty(text(raw.warning)),
            suggestion: non_empty(text(raw.suggestion)),
        }
    }
}

impl From<Value> for GuidanceBlock {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(mut map) => Self {
                description: text(map.remove("description")),
                severity: text(map.remove("severity")),
                remedies: remedies(map.remove("remedies")),
                follow_up: non_empty(text(map.remove("follow_up"))),
                source: text(map.remove("source")),
            },
            Value::Null => Self::default(),
            other => Self {
                description: Some(value_text(&other)),
                ..Self::default()
            },
        }
    }
}

impl From<RawFailure> for PredictionFailure {
    fn from(raw: RawFailure) -> Self {
        Self {
            error: text(raw.error).unwrap_or_else(|| UNKNOWN_ERROR.to_string()),
            suggestion: non_empty(text(raw.suggestion)),
            raw_prediction: raw.raw_prediction,
            confidence: raw.confidence,
        }
    }
}

/// Strings as-is, any other JSON value in its compact form.
pub fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn text(value: Option<Value>) -> Option<String> {
    match value {
        None | Some(Value::Null) => None,
        Some(v) => Some(value_text(&v)),
    }
}

fn remedies(value: Option<Value>) -> Vec<String> {
    match value {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items
            .iter()
            .filter(|item| !item.is_null())
            .map(value_text)
            .collect(),
        Some(other) => vec![value_text(&other)],
    }
}

fn non_empty(s: Option<String>) -> Option<String> {
    s.filter(|s| !s.trim().is_empty())
}
