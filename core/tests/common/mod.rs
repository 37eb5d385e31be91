//! Shared helpers for coordinator tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use courier_core::transport::Progress;
use courier_core::{HttpRequest, HttpResponse, ProgressFn, Transport, TransportError};

/// A transport that replays canned outcomes and records every request.
///
/// When the script runs out it answers 200 with the request URL as body.
/// Progress steps are fed through `Progress` before the outcome is known;
/// completion is only reported for successful outcomes, as `UreqTransport`
/// does.
#[derive(Default)]
pub struct ScriptedTransport {
    script: Mutex<VecDeque<Result<HttpResponse, String>>>,
    calls: Mutex<Vec<HttpRequest>>,
    steps: Mutex<Vec<f64>>,
    delay: Mutex<Option<Duration>>,
}

impl ScriptedTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn respond(&self, status: u16, body: &str) {
        self.script
            .lock()
            .unwrap()
            .push_back(Ok(HttpResponse::new(status, body.as_bytes().to_vec())));
    }

    pub fn fail(&self, message: &str) {
        self.script.lock().unwrap().push_back(Err(message.to_string()));
    }

    pub fn progress_steps(&self, steps: &[f64]) {
        *self.steps.lock().unwrap() = steps.to_vec();
    }

    /// Hold every subsequent call for `delay` after recording it.
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn urls(&self) -> Vec<String> {
        self.calls.lock().unwrap().iter().map(|r| r.url.clone()).collect()
    }

    pub fn calls(&self) -> Vec<HttpRequest> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn execute(
        &self,
        request: HttpRequest,
        progress: Option<ProgressFn>,
    ) -> Result<HttpResponse, TransportError> {
        let url = request.url.clone();
        self.calls.lock().unwrap().push(request);
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let progress = progress.map(Progress::new);
        if let Some(progress) = &progress {
            for step in self.steps.lock().unwrap().iter() {
                progress.report(*step);
            }
        }

        let next = self.script.lock().unwrap().pop_front();
        let outcome = match next {
            Some(Ok(response)) => Ok(response),
            Some(Err(message)) => Err(TransportError::Io(message)),
            None => Ok(HttpResponse::new(200, url.into_bytes())),
        };
        if let (Some(progress), Ok(_)) = (&progress, &outcome) {
            progress.finish();
        }
        outcome
    }
}

pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("courier_core=debug")
        .with_test_writer()
        .try_init();
}
