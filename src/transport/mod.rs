use std::time::Duration;

use crate::core::PredictionRequest;
use crate::error::TransportError;

pub mod fake;
mod http;

pub use fake::FakeTransport;
pub use http::ReqwestTransport;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpReply {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Blocking HTTP operations the probe and evaluator need. Non-2xx statuses are
/// returned as replies; only failures to get a reply are errors.
pub trait HttpTransport {
    fn get(&self, url: &str, timeout: Duration) -> Result<HttpReply, TransportError>;

    /// Multipart POST with the image in the `image` field.
    fn post_image(
        &self,
        url: &str,
        request: &PredictionRequest,
        timeout: Duration,
    ) -> Result<HttpReply, TransportError>;
}

pub fn endpoint(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
