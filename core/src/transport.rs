//! Request execution.
//!
//! # Design
//! `Transport` receives a fully built `HttpRequest` and returns the raw
//! `HttpResponse`; status interpretation stays in `wire`. `UreqTransport`
//! runs ureq's blocking agent on tokio's blocking pool, so the awaiting task
//! is suspended without holding a runtime worker. The join handle resolves
//! exactly once, either with the response or with an error.

use std::io::{self, Read};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tracing::debug;
use ureq::http;
use ureq::{Agent, SendBody};

use crate::error::TransportError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

/// Upload progress callback; receives a fraction in `[0.0, 1.0]`.
pub type ProgressFn = Arc<dyn Fn(f64) + Send + Sync>;

#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Execute one request. Non-2xx statuses are returned as responses, not
    /// errors. When `progress` is given, the request body is streamed and the
    /// callback observes the sent fraction.
    async fn execute(
        &self,
        request: HttpRequest,
        progress: Option<ProgressFn>,
    ) -> Result<HttpResponse, TransportError>;
}

/// Forwards progress fractions, dropping any that would go backwards.
pub struct Progress {
    callback: ProgressFn,
    last: Mutex<Option<f64>>,
}

impl Progress {
    pub fn new(callback: ProgressFn) -> Self {
        Self {
            callback,
            last: Mutex::new(None),
        }
    }

    pub fn report(&self, fraction: f64) {
        let fraction = fraction.clamp(0.0, 1.0);
        let Ok(mut last) = self.last.lock() else {
            return;
        };
        if (*last).is_some_and(|prev| fraction < prev) {
            return;
        }
        *last = Some(fraction);
        drop(last);
        (self.callback)(fraction);
    }

    /// Report 1.0 unless it was already the last value reported.
    pub fn finish(&self) {
        let done = self.last.lock().map(|last| *last == Some(1.0)).unwrap_or(true);
        if !done {
            self.report(1.0);
        }
    }
}

/// A body reader that reports `sent / total` after every read.
pub struct ProgressReader {
    inner: io::Cursor<Vec<u8>>,
    total: usize,
    sent: usize,
    progress: Arc<Progress>,
}

impl ProgressReader {
    pub fn new(body: Vec<u8>, progress: Arc<Progress>) -> Self {
        Self {
            total: body.len(),
            inner: io::Cursor::new(body),
            sent: 0,
            progress,
        }
    }
}

impl Read for ProgressReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        if n > 0 {
            self.sent += n;
            self.progress.report(self.sent as f64 / self.total as f64);
        }
        Ok(n)
    }
}

/// `Transport` backed by a ureq agent.
#[derive(Clone)]
pub struct UreqTransport {
    agent: Agent,
}

impl UreqTransport {
    /// Builds an agent that returns 4xx/5xx responses as data so the core
    /// can interpret statuses itself.
    pub fn new() -> Self {
        let agent = Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .new_agent();
        Self { agent }
    }

    pub fn with_agent(agent: Agent) -> Self {
        Self { agent }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for UreqTransport {
    async fn execute(
        &self,
        request: HttpRequest,
        progress: Option<ProgressFn>,
    ) -> Result<HttpResponse, TransportError> {
        let agent = self.agent.clone();
        let progress = progress.map(|cb| Arc::new(Progress::new(cb)));
        debug!(method = %request.method, url = %request.url, bytes = request.body_len(), "executing request");

        let tracker = progress.clone();
        let response = tokio::task::spawn_blocking(move || run(&agent, request, tracker))
            .await
            .map_err(|e| TransportError::Join(e.to_string()))??;

        if let Some(progress) = progress {
            progress.finish();
        }
        Ok(response)
    }
}

fn run(agent: &Agent, request: HttpRequest, progress: Option<Arc<Progress>>) -> Result<HttpResponse, TransportError> {
    let method = match request.method {
        HttpMethod::Get => http::Method::GET,
        HttpMethod::Post => http::Method::POST,
        HttpMethod::Put => http::Method::PUT,
        HttpMethod::Delete => http::Method::DELETE,
    };

    let mut builder = http::Request::builder().method(method).uri(&request.url);
    for (key, value) in &request.headers {
        builder = builder.header(key, value);
    }

    let mut response = match (request.body, progress) {
        (None, _) => agent.run(builder.body(()).map_err(|e| TransportError::Io(e.to_string()))?)?,
        (Some(body), None) => agent.run(builder.body(body).map_err(|e| TransportError::Io(e.to_string()))?)?,
        (Some(body), Some(progress)) => {
            let built = builder
                .header(http::header::CONTENT_LENGTH, body.len())
                .body(SendBody::from_owned_reader(ProgressReader::new(body, progress)))
                .map_err(|e| TransportError::Io(e.to_string()))?;
            agent.run(built)?
        }
    };
    let status = response.status().as_u16();
    let headers = response
        .headers()
        .iter()
        .map(|(k, v)| (k.to_string(), String::from_utf8_lossy(v.as_bytes()).into_owned()))
        .collect();
    // ureq caps bodies at 10 MiB by default; responses are returned whole.
    let body = response.body_mut().with_config().limit(u64::MAX).read_to_vec()?;

    Ok(HttpResponse { status, headers, body })
}
