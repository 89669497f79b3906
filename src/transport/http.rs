use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::blocking::Client as HttpClient;
use reqwest::blocking::multipart::{Form, Part};
use tracing::debug;

use crate::core::PredictionRequest;
use crate::error::{TransportError, TransportErrorKind};
use crate::transport::{HttpReply, HttpTransport};

const USER_AGENT: &str = concat!("cropcheck/", env!("CARGO_PKG_VERSION"));

pub struct ReqwestTransport {
    http: HttpClient,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self> {
        let http = HttpClient::builder()
            .user_agent(USER_AGENT)
            .build()
            .context("failed to initialize the HTTP client")?;
        Ok(Self { http })
    }

    fn send(
        &self,
        url: &str,
        timeout: Duration,
        builder: reqwest::blocking::RequestBuilder,
    ) -> Result<HttpReply, TransportError> {
        let response = builder
            .timeout(timeout)
            .send()
            .map_err(|err| classify(url, timeout, &err))?;
        let status = response.status().as_u16();
        let body = response
            .bytes()
            .map_err(|err| classify(url, timeout, &err))?;
        debug!(url, status, bytes = body.len(), "http reply");
        Ok(HttpReply::new(status, body.to_vec()))
    }
}

impl HttpTransport for ReqwestTransport {
    fn get(&self, url: &str, timeout: Duration) -> Result<HttpReply, TransportError> {
        self.send(url, timeout, self.http.get(url))
    }

    fn post_image(
        &self,
        url: &str,
        request: &PredictionRequest,
        timeout: Duration,
    ) -> Result<HttpReply, TransportError> {
        let part = Part::bytes(request.image_bytes().to_vec())
            .file_name(request.filename().to_string())
            .mime_str(request.mime_type())
            .map_err(|err| {
                TransportError::new(
                    TransportErrorKind::Other,
                    url,
                    format!("invalid mime type {:?}: {err}", request.mime_type()),
                )
            })?;
        let form = Form::new().part("image", part);
        self.send(url, timeout, self.http.post(url).multipart(form))
    }
}

fn classify(url: &str, timeout: Duration, err: &reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::timeout(url, timeout)
    } else if err.is_connect() {
        TransportError::new(TransportErrorKind::Connection, url, error_chain(err))
    } else {
        TransportError::new(TransportErrorKind::Other, url, error_chain(err))
    }
}

// reqwest's Display hides the io error that explains a refused connection.
fn error_chain(err: &reqwest::Error) -> String {
    let mut msg = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        msg.push_str(": ");
        msg.push_str(&cause.to_string());
        source = std::error::Error::source(cause);
    }
    msg
}
