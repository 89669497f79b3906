use serde::{Deserialize, Serialize};

use crate::core::Prediction;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DiagnosisOutcome {
    pub is_healthy: bool,
    pub confidence_pct: f64,
    pub low_confidence_flag: bool,
}

impl DiagnosisOutcome {
    pub fn from_prediction(prediction: &Prediction) -> Self {
        Self {
            is_healthy: is_healthy(&prediction.disease),
            confidence_pct: prediction.confidence * 100.0,
            low_confidence_flag: prediction.low_confidence,
        }
    }
}

/// Substring heuristic over the label: "UNHEALTHY_X" also counts as healthy.
/// Kept until the service publishes an enumerated label set.
pub fn is_healthy(disease: &str) -> bool {
    disease.to_lowercase().contains("healthy")
}
