use std::fmt;

use crate::core::{FailureStage, ReportedFailure};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Success,
    InvalidArgs,
    HealthCheckFailed,
    PredictionRejected,
    PredictionFailed,
}

impl ExitCode {
    pub const fn as_i32(self) -> i32 {
        match self {
            ExitCode::Success => 0,
            ExitCode::InvalidArgs => 2,
            ExitCode::HealthCheckFailed => 10,
            ExitCode::PredictionRejected => 20,
            ExitCode::PredictionFailed => 30,
        }
    }
}

#[derive(Debug)]
pub struct ExitError {
    pub code: ExitCode,
    pub err: anyhow::Error,
    pub hint: Option<String>,
}

impl ExitError {
    pub fn new(code: ExitCode, err: anyhow::Error) -> Self {
        Self {
            code,
            err,
            hint: None,
        }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl fmt::Display for ExitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.err.fmt(f)
    }
}

impl std::error::Error for ExitError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.err.source()
    }
}

pub fn exit_code(err: &anyhow::Error) -> i32 {
    if let Some(exit) = err.downcast_ref::<ExitError>() {
        return exit.code.as_i32();
    }
    ExitCode::PredictionFailed.as_i32()
}

pub fn hint(err: &anyhow::Error) -> Option<&str> {
    err.downcast_ref::<ExitError>()
        .and_then(|exit| exit.hint.as_deref())
}

pub fn invalid_args(message: impl Into<String>) -> anyhow::Error {
    ExitError::new(ExitCode::InvalidArgs, anyhow::anyhow!(message.into())).into()
}

pub fn invalid_args_err(err: anyhow::Error) -> anyhow::Error {
    ExitError::new(ExitCode::InvalidArgs, err).into()
}

/// Maps a recorded verification failure to the error `main` reports.
pub fn from_failure(failure: &ReportedFailure) -> anyhow::Error {
    let code = match (failure.stage, failure.kind.as_str()) {
        (FailureStage::Health, _) => ExitCode::HealthCheckFailed,
        (FailureStage::Prediction, "image_not_found") => ExitCode::InvalidArgs,
        (FailureStage::Prediction, crate::engine::PREDICTION_REJECTED) => {
            ExitCode::PredictionRejected
        }
        (FailureStage::Prediction, _) => ExitCode::PredictionFailed,
    };
    let stage = match failure.stage {
        FailureStage::Health => "health check failed",
        FailureStage::Prediction => "prediction failed",
    };

    let mut exit = ExitError::new(
        code,
        anyhow::anyhow!(failure.message.clone()).context(stage),
    );
    exit.hint = failure.hint.clone();
    exit.into()
}
