use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::core::ResponseShapeError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    Timeout,
    Connection,
    Status(u16),
    Other,
}

impl fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportErrorKind::Timeout => f.write_str("timeout"),
            TransportErrorKind::Connection => f.write_str("connection"),
            TransportErrorKind::Status(code) => write!(f, "status {code}"),
            TransportErrorKind::Other => f.write_str("other"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{url}: {message}")]
pub struct TransportError {
    pub kind: TransportErrorKind,
    pub url: String,
    pub message: String,
}

impl TransportError {
    pub fn new(kind: TransportErrorKind, url: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            url: url.into(),
            message: message.into(),
        }
    }

    pub fn timeout(url: impl Into<String>, timeout: Duration) -> Self {
        Self::new(
            TransportErrorKind::Timeout,
            url,
            format!("request timed out after {}s", timeout.as_secs()),
        )
    }

    pub fn status(url: impl Into<String>, code: u16) -> Self {
        Self::new(
            TransportErrorKind::Status(code),
            url,
            format!("server returned HTTP {code}"),
        )
    }

    pub fn kind_name(&self) -> &'static str {
        match self.kind {
            TransportErrorKind::Timeout => "transport_timeout",
            TransportErrorKind::Connection => "transport_connection_failure",
            TransportErrorKind::Status(_) => "transport_bad_status",
            TransportErrorKind::Other => "transport_other_failure",
        }
    }

    pub fn hint(&self, base_url: &str) -> String {
        match self.kind {
            TransportErrorKind::Timeout => {
                "the service did not answer in time; check it is not overloaded".to_string()
            }
            TransportErrorKind::Connection => {
                format!("is the API running at {base_url}? start it and re-run")
            }
            TransportErrorKind::Status(_) => {
                "the service is up but unhealthy; check its logs".to_string()
            }
            TransportErrorKind::Other => "check the base URL and network settings".to_string(),
        }
    }
}

/// Failures that stop the prediction step before a response can be interpreted.
#[derive(Debug, thiserror::Error)]
pub enum EvaluatorError {
    #[error("image not found: {}", path.display())]
    ImageNotFound { path: PathBuf },
    #[error("malformed prediction response: {0}")]
    MalformedResponse(#[from] ResponseShapeError),
    #[error("prediction request timed out: {0}")]
    TransportTimeout(TransportError),
    #[error("could not connect to the prediction service: {0}")]
    TransportConnectionFailure(TransportError),
    #[error("prediction request failed: {0}")]
    TransportOtherFailure(TransportError),
    #[error("unexpected failure: {message}")]
    UnexpectedFailure { message: String },
}

impl From<TransportError> for EvaluatorError {
    fn from(err: TransportError) -> Self {
        match err.kind {
            TransportErrorKind::Timeout => EvaluatorError::TransportTimeout(err),
            TransportErrorKind::Connection => EvaluatorError::TransportConnectionFailure(err),
            TransportErrorKind::Status(_) | TransportErrorKind::Other => {
                EvaluatorError::TransportOtherFailure(err)
            }
        }
    }
}

impl EvaluatorError {
    pub fn kind_name(&self) -> &'static str {
        match self {
            EvaluatorError::ImageNotFound { .. } => "image_not_found",
            EvaluatorError::MalformedResponse(_) => "malformed_response",
            EvaluatorError::TransportTimeout(_) => "transport_timeout",
            EvaluatorError::TransportConnectionFailure(_) => "transport_connection_failure",
            EvaluatorError::TransportOtherFailure(_) => "transport_other_failure",
            EvaluatorError::UnexpectedFailure { .. } => "unexpected_failure",
        }
    }

    pub fn hint(&self, base_url: &str) -> String {
        match self {
            EvaluatorError::ImageNotFound { .. } => {
                let cwd = std::env::current_dir()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|_| "?".to_string());
                format!("check the image path (current directory: {cwd})")
            }
            EvaluatorError::MalformedResponse(_) => {
                "the service answered without a `success` field; check that the URL points at the prediction API"
                    .to_string()
            }
            EvaluatorError::TransportTimeout(_) => {
                "the model may still be loading; wait a few seconds and try again".to_string()
            }
            EvaluatorError::TransportConnectionFailure(_) => {
                format!("is the API running at {base_url}? start it and re-run")
            }
            EvaluatorError::TransportOtherFailure(err) => err.hint(base_url),
            EvaluatorError::UnexpectedFailure { .. } => {
                "re-run with `--verbose` for details".to_string()
            }
        }
    }
}
