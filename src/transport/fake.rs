use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use crate::core::PredictionRequest;
use crate::error::TransportError;
use crate::transport::{HttpReply, HttpTransport};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub method: &'static str,
    pub url: String,
    pub timeout: Duration,
    pub filename: Option<String>,
    pub mime_type: Option<String>,
}

/// Scripted transport: replies are handed out in order, one queue per method.
#[derive(Debug, Default)]
pub struct FakeTransport {
    gets: Mutex<VecDeque<Result<HttpReply, TransportError>>>,
    posts: Mutex<VecDeque<Result<HttpReply, TransportError>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_get(&self, reply: Result<HttpReply, TransportError>) -> &Self {
        lock(&self.gets).push_back(reply);
        self
    }

    pub fn push_post(&self, reply: Result<HttpReply, TransportError>) -> &Self {
        lock(&self.posts).push_back(reply);
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        lock(&self.calls).clone()
    }

    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }
}

impl HttpTransport for FakeTransport {
    fn get(&self, url: &str, timeout: Duration) -> Result<HttpReply, TransportError> {
        lock(&self.calls).push(RecordedCall {
            method: "GET",
            url: url.to_string(),
            timeout,
            filename: None,
            mime_type: None,
        });
        lock(&self.gets)
            .pop_front()
            .unwrap_or_else(|| Ok(HttpReply::new(404, "no scripted GET reply")))
    }

    fn post_image(
        &self,
        url: &str,
        request: &PredictionRequest,
        timeout: Duration,
    ) -> Result<HttpReply, TransportError> {
        lock(&self.calls).push(RecordedCall {
            method: "POST",
            url: url.to_string(),
            timeout,
            filename: Some(request.filename().to_string()),
            mime_type: Some(request.mime_type().to_string()),
        });
        lock(&self.posts)
            .pop_front()
            .unwrap_or_else(|| Ok(HttpReply::new(404, "no scripted POST reply")))
    }
}

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
