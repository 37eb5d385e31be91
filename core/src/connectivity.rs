//! Reachability signals consumed by the coordinator.
//!
//! # Design
//! A monitor publishes a boolean on a `tokio::sync::watch` channel; `true`
//! means the path is satisfied. No debouncing is applied, so a flapping link
//! yields one signal per observed change. The coordinator subscribes through
//! `Coordinator::attach`, which owns the forwarding task.

use std::time::Duration;

use tokio::net::TcpStream;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

pub trait ConnectivityMonitor: Send + Sync {
    /// A receiver positioned at the current state.
    fn watch(&self) -> watch::Receiver<bool>;
}

/// A signal set by hand, for hosts that bridge an OS reachability API and
/// for tests.
#[derive(Debug, Clone)]
pub struct ManualMonitor {
    tx: watch::Sender<bool>,
}

impl ManualMonitor {
    pub fn new(connected: bool) -> Self {
        let (tx, _rx) = watch::channel(connected);
        Self { tx }
    }

    /// Publish a path change. Every call notifies subscribers, even when the
    /// value is unchanged.
    pub fn set(&self, connected: bool) {
        self.tx.send_replace(connected);
    }

    pub fn current(&self) -> bool {
        *self.tx.borrow()
    }
}

impl ConnectivityMonitor for ManualMonitor {
    fn watch(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}

/// Polls reachability by opening a TCP connection to `addr` every
/// `interval`. Publishes only when the result changes. The probe task stops
/// when the monitor is dropped.
pub struct ProbeMonitor {
    rx: watch::Receiver<bool>,
    task: JoinHandle<()>,
}

impl ProbeMonitor {
    /// Must be called from within a tokio runtime. The initial state is
    /// `initial` until the first probe completes.
    pub fn spawn(addr: impl Into<String>, interval: Duration, timeout: Duration, initial: bool) -> Self {
        let addr = addr.into();
        let (tx, rx) = watch::channel(initial);
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                let reachable = probe(&addr, timeout).await;
                let changed = tx.send_if_modified(|current| {
                    if *current == reachable {
                        false
                    } else {
                        *current = reachable;
                        true
                    }
                });
                if changed {
                    info!(%addr, reachable, "reachability changed");
                }
            }
        });
        Self { rx, task }
    }
}

impl ConnectivityMonitor for ProbeMonitor {
    fn watch(&self) -> watch::Receiver<bool> {
        self.rx.clone()
    }
}

impl Drop for ProbeMonitor {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn probe(addr: &str, timeout: Duration) -> bool {
    match tokio::time::timeout(timeout, TcpStream::connect(addr)).await {
        Ok(Ok(_)) => true,
        Ok(Err(e)) => {
            debug!(%addr, error = %e, "probe failed");
            false
        }
        Err(_) => {
            debug!(%addr, "probe timed out");
            false
        }
    }
}
