use std::path::Path;
use std::time::Duration;

use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::{error, info};

use crate::core::{
    FailureStage, HealthStatus, ImageInfo, PredictionRequest, PredictionResponse,
    ReportedFailure, VerificationReport,
};
use crate::error::{EvaluatorError, TransportError};
use crate::transport::HttpTransport;

pub const PREDICTION_REJECTED: &str = "prediction_rejected";

#[derive(Debug, Clone)]
pub struct EngineOptions {
    pub base_url: String,
    pub health_timeout: Duration,
    pub predict_timeout: Duration,
    pub mime_type: String,
    pub show_progress: bool,
}

pub struct Engine {
    opts: EngineOptions,
    transport: Box<dyn HttpTransport>,
}

impl Engine {
    pub fn new(opts: EngineOptions, transport: Box<dyn HttpTransport>) -> Self {
        Self { opts, transport }
    }

    /// Probe, then predict only if the probe succeeded.
    pub fn verify(&self, image: &Path) -> VerificationReport {
        let mut report = self.new_report();
        if self.run_health(&mut report) {
            self.run_prediction(&mut report, image);
        }
        report
    }

    pub fn health(&self) -> VerificationReport {
        let mut report = self.new_report();
        self.run_health(&mut report);
        report
    }

    pub fn predict(&self, image: &Path) -> VerificationReport {
        let mut report = self.new_report();
        self.run_prediction(&mut report, image);
        report
    }

    fn run_health(&self, report: &mut VerificationReport) -> bool {
        match crate::probe::check_health(
            self.transport.as_ref(),
            &self.opts.base_url,
            self.opts.health_timeout,
        ) {
            Ok(status) => {
                info!(base_url = %self.opts.base_url, "service is reachable");
                report.health = Some(status);
                true
            }
            Err(err) => {
                report.health = Some(HealthStatus::unreachable());
                report.failure = Some(self.health_failure(&err));
                false
            }
        }
    }

    fn run_prediction(&self, report: &mut VerificationReport, image: &Path) {
        let request = match PredictionRequest::from_path(image, &self.opts.mime_type) {
            Ok(request) => request,
            Err(err) => {
                report.failure = Some(self.prediction_failure(&err));
                return;
            }
        };
        report.image = Some(ImageInfo {
            path: image.display().to_string(),
            filename: request.filename().to_string(),
            size_bytes: request.size_bytes(),
            mime_type: request.mime_type().to_string(),
        });

        let pb = self.spinner("waiting for prediction (the model may be loading)...");
        let result = crate::evaluator::submit(
            self.transport.as_ref(),
            &self.opts.base_url,
            &request,
            self.opts.predict_timeout,
        );
        if let Some(pb) = pb {
            pb.finish_and_clear();
        }

        match result {
            Ok(response) => {
                if let PredictionResponse::Failure(failure) = &response {
                    report.failure = Some(ReportedFailure {
                        stage: FailureStage::Prediction,
                        kind: PREDICTION_REJECTED.to_string(),
                        message: failure.error.clone(),
                        hint: None,
                    });
                }
                report.outcome = response.outcome();
                report.prediction = Some(response);
            }
            Err(err) => {
                report.failure = Some(self.prediction_failure(&err));
            }
        }
    }

    fn health_failure(&self, err: &TransportError) -> ReportedFailure {
        ReportedFailure {
            stage: FailureStage::Health,
            kind: err.kind_name().to_string(),
            message: err.to_string(),
            hint: Some(err.hint(&self.opts.base_url)),
        }
    }

    fn prediction_failure(&self, err: &EvaluatorError) -> ReportedFailure {
        if matches!(err, EvaluatorError::UnexpectedFailure { .. }) {
            error!(error = ?err, "unexpected failure during prediction");
        }
        ReportedFailure {
            stage: FailureStage::Prediction,
            kind: err.kind_name().to_string(),
            message: err.to_string(),
            hint: Some(err.hint(&self.opts.base_url)),
        }
    }

    fn spinner(&self, message: &'static str) -> Option<indicatif::ProgressBar> {
        use std::io::IsTerminal;
        if !(self.opts.show_progress && std::io::stderr().is_terminal()) {
            return None;
        }
        let pb = indicatif::ProgressBar::new_spinner();
        pb.set_draw_target(indicatif::ProgressDrawTarget::stderr());
        pb.set_message(message);
        pb.enable_steady_tick(Duration::from_millis(120));
        Some(pb)
    }

    fn new_report(&self) -> VerificationReport {
        let generated_at = OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .unwrap_or_else(|_| "unknown".to_string());

        VerificationReport {
            schema_version: "1.0".to_string(),
            tool_version: env!("CARGO_PKG_VERSION").to_string(),
            base_url: self.opts.base_url.clone(),
            generated_at,
            image: None,
            health: None,
            prediction: None,
            outcome: None,
            failure: None,
        }
    }
}
