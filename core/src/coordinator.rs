//! Connectivity-aware request coordination.
//!
//! # Design
//! `Coordinator` is the sole owner of the connectivity flag and the pending
//! queue; both sit behind one `tokio::sync::Mutex` that is never held across
//! network I/O. Cache writes go straight to the store, which tolerates
//! concurrent writers.
//!
//! Offline behaviour:
//! - a cached response for the request's fingerprint is served without
//!   touching the transport;
//! - GET/POST/REST requests fail fast with `NetworkUnavailable`, uploads are
//!   still attempted;
//! - any failure observed while offline queues the request for one replay.
//!
//! A connected signal takes the whole queue and replays it in FIFO order on a
//! task of its own, so a pass runs to completion even if the signalling
//! future is dropped. Replayed requests that fail are logged and dropped.

use std::sync::{Arc, Weak};

use serde::de::DeserializeOwned;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::cache::{CacheStore, MemoryStore, ResponseCache, SledStore};
use crate::codec;
use crate::config::Config;
use crate::connectivity::ConnectivityMonitor;
use crate::error::{ConfigError, RequestError};
use crate::queue::PendingQueue;
use crate::request::Request;
use crate::transport::{ProgressFn, Transport, UreqTransport};
use crate::wire;

#[derive(Debug)]
struct State {
    connected: bool,
    pending: PendingQueue,
}

struct Inner {
    transport: Arc<dyn Transport>,
    cache: ResponseCache,
    state: Mutex<State>,
}

/// Cheap to clone; clones share state.
#[derive(Clone)]
pub struct Coordinator {
    inner: Arc<Inner>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OnFailure {
    Queue,
    Drop,
}

impl Coordinator {
    /// A coordinator that starts out connected.
    pub fn new(transport: Arc<dyn Transport>, store: Arc<dyn CacheStore>) -> Self {
        Self::with_initial_state(transport, store, true)
    }

    /// A coordinator whose connectivity flag starts at `connected`. Later
    /// changes go through `set_connected`.
    pub fn with_initial_state(transport: Arc<dyn Transport>, store: Arc<dyn CacheStore>, connected: bool) -> Self {
        Self {
            inner: Arc::new(Inner {
                transport,
                cache: ResponseCache::new(store),
                state: Mutex::new(State {
                    connected,
                    pending: PendingQueue::new(),
                }),
            }),
        }
    }

    /// Wire a ureq transport and the store named by `config`.
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let store: Arc<dyn CacheStore> = match &config.cache_path {
            Some(path) => Arc::new(SledStore::open_with_capacity(path, config.cache_capacity_bytes)?),
            None => Arc::new(MemoryStore::new()),
        };
        Ok(Self::with_initial_state(
            Arc::new(UreqTransport::new()),
            store,
            config.start_connected,
        ))
    }

    pub async fn is_connected(&self) -> bool {
        self.inner.state.lock().await.connected
    }

    pub async fn pending_len(&self) -> usize {
        self.inner.state.lock().await.pending.len()
    }

    /// Execute `request`, serving from cache or queueing as connectivity
    /// dictates. Errors always reach the caller, including for requests that
    /// were queued.
    pub async fn handle(&self, request: Request, progress: Option<ProgressFn>) -> Result<Vec<u8>, RequestError> {
        self.dispatch(request, progress, OnFailure::Queue).await
    }

    /// `handle`, then decode the body as JSON.
    pub async fn handle_json<T: DeserializeOwned>(&self, request: Request) -> Result<T, RequestError> {
        let bytes = self.handle(request, None).await?;
        codec::decode(&bytes)
    }

    /// Record a reachability signal. A connected signal starts a drain pass
    /// over everything queued so far; the pass completes before this returns.
    /// Dropping the returned future does not cancel a pass already started.
    pub async fn set_connected(&self, connected: bool) {
        let mut pass = {
            let mut state = self.inner.state.lock().await;
            if state.connected != connected {
                info!(connected, "connectivity changed");
            }
            state.connected = connected;
            if !connected || state.pending.is_empty() {
                return;
            }
            std::mem::take(&mut state.pending)
        };

        info!(pending = pass.len(), "replaying queued requests");
        let coordinator = self.clone();
        let task = tokio::spawn(async move {
            let coordinator = &coordinator;
            pass.drain_all(move |request| coordinator.replay(request)).await;
        });
        if let Err(e) = task.await {
            warn!(error = %e, "drain pass ended abnormally");
        }
    }

    /// Follow `monitor` until the returned subscription is dropped or the
    /// coordinator goes away. Must be called within a tokio runtime.
    pub fn attach(&self, monitor: &dyn ConnectivityMonitor) -> Subscription {
        let mut rx = monitor.watch();
        let owner: Weak<Inner> = Arc::downgrade(&self.inner);
        let task = tokio::spawn(async move {
            let mut connected = *rx.borrow_and_update();
            loop {
                let Some(inner) = owner.upgrade() else {
                    debug!("coordinator dropped, stopping connectivity subscription");
                    break;
                };
                Coordinator { inner }.set_connected(connected).await;
                if rx.changed().await.is_err() {
                    debug!("connectivity monitor closed");
                    break;
                }
                connected = *rx.borrow_and_update();
            }
        });
        Subscription { task }
    }

    async fn replay(&self, request: Request) {
        let endpoint = request.endpoint().to_string();
        match self.dispatch(request, None, OnFailure::Drop).await {
            Ok(_) => debug!(%endpoint, "replayed queued request"),
            Err(e) => warn!(%endpoint, error = %e, "queued request failed again, dropping"),
        }
    }

    async fn dispatch(
        &self,
        request: Request,
        progress: Option<ProgressFn>,
        on_failure: OnFailure,
    ) -> Result<Vec<u8>, RequestError> {
        let fingerprint = request.fingerprint();
        let connected = self.is_connected().await;

        if !connected {
            if let Some(bytes) = self.inner.cache.get(&fingerprint) {
                debug!(%fingerprint, "offline, serving cached response");
                return Ok(bytes);
            }
        }

        match self.execute(&request, connected, progress).await {
            Ok(bytes) => {
                self.inner.cache.put(&fingerprint, &bytes);
                Ok(bytes)
            }
            Err(err) => {
                if on_failure == OnFailure::Queue {
                    let mut state = self.inner.state.lock().await;
                    if !state.connected {
                        debug!(%fingerprint, error = %err, "offline failure, queueing for retry");
                        state.pending.append(request);
                    }
                }
                Err(err)
            }
        }
    }

    async fn execute(
        &self,
        request: &Request,
        connected: bool,
        progress: Option<ProgressFn>,
    ) -> Result<Vec<u8>, RequestError> {
        // Uploads are attempted regardless of the connectivity flag.
        if !connected && !request.is_upload() {
            return Err(RequestError::NetworkUnavailable);
        }
        let response = self.inner.transport.execute(wire::build(request), progress).await?;
        wire::check_status(request, response)
    }
}

/// A live link between a monitor and a coordinator. Dropping it stops
/// forwarding signals.
#[derive(Debug)]
pub struct Subscription {
    task: JoinHandle<()>,
}

impl Subscription {
    pub fn unsubscribe(self) {
        self.task.abort();
    }

    pub fn is_active(&self) -> bool {
        !self.task.is_finished()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.task.abort();
    }
}
