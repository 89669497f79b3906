use std::path::Path;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::core::{PredictionRequest, PredictionResponse};
use crate::error::{EvaluatorError, TransportError};
use crate::transport::{HttpTransport, endpoint};

/// The service may load its model on the first request.
pub const DEFAULT_PREDICT_TIMEOUT: Duration = Duration::from_secs(60);

pub fn predict(
    transport: &dyn HttpTransport,
    base_url: &str,
    image_path: &Path,
    mime_type: &str,
    timeout: Duration,
) -> Result<PredictionResponse, EvaluatorError> {
    let request = PredictionRequest::from_path(image_path, mime_type)?;
    submit(transport, base_url, &request, timeout)
}

pub fn submit(
    transport: &dyn HttpTransport,
    base_url: &str,
    request: &PredictionRequest,
    timeout: Duration,
) -> Result<PredictionResponse, EvaluatorError> {
    let url = endpoint(base_url, "predict");
    info!(
        %url,
        filename = request.filename(),
        bytes = request.size_bytes(),
        mime_type = request.mime_type(),
        "submitting image for prediction"
    );

    let reply = transport.post_image(&url, request, timeout)?;
    if !reply.is_success() {
        warn!(%url, status = reply.status, "prediction returned non-2xx status");
        return Err(TransportError::status(url, reply.status).into());
    }

    let response = PredictionResponse::parse(&reply.body).inspect_err(|err| {
        debug!(body = %String::from_utf8_lossy(&reply.body), "unparseable prediction body");
        warn!(%url, "malformed prediction response: {err}");
    })?;

    match &response {
        PredictionResponse::Success(s) => {
            if s.prediction.confidence.is_nan() || !(0.0..=1.0).contains(&s.prediction.confidence) {
                warn!(
                    confidence = s.prediction.confidence,
                    "confidence outside [0, 1]; reporting as received"
                );
            }
            info!(
                disease = %s.prediction.disease,
                confidence = s.prediction.confidence,
                low_confidence = s.prediction.low_confidence,
                "prediction succeeded"
            );
        }
        PredictionResponse::Failure(f) => {
            info!(error = %f.error, has_raw_prediction = f.raw_prediction.is_some(), "prediction rejected by service");
        }
    }

    Ok(response)
}
