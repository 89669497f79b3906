mod health;
mod outcome;
mod report;
mod request;
mod response;

pub use health::HealthStatus;
pub use outcome::{DiagnosisOutcome, is_healthy};
pub use report::{FailureStage, ImageInfo, ReportedFailure, VerificationReport};
pub use request::{DEFAULT_MIME_TYPE, PredictionRequest};
pub use response::{
    GuidanceBlock, Prediction, PredictionFailure, PredictionResponse, PredictionSuccess,
    ResponseShapeError, value_text,
};
