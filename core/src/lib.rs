//! Connectivity-aware HTTP request manager.
//!
//! # Overview
//! A `Coordinator` executes GET, POST, REST and multipart-upload requests,
//! caches successful responses by request fingerprint, serves those cached
//! bytes while offline, and queues requests that fail while offline for a
//! single replay when connectivity returns.
//!
//! # Design
//! - `Request` is a closed enum; `wire::build` turns it into plain-data
//!   `HttpRequest`s and `wire::check_status` interprets the `HttpResponse`.
//! - `Transport` only moves bytes (`UreqTransport` in production, scripted
//!   transports in tests).
//! - `CacheStore` is the persistence boundary (`MemoryStore`, `SledStore`).
//! - `ConnectivityMonitor` publishes reachability on a watch channel;
//!   `Coordinator::attach` forwards it without keeping the coordinator alive.
//! - There is no global instance; construct one coordinator and pass it
//!   around.

pub mod cache;
pub mod codec;
pub mod config;
pub mod connectivity;
pub mod coordinator;
pub mod error;
pub mod http;
pub mod multipart;
pub mod queue;
pub mod request;
pub mod transport;
pub mod wire;

pub use cache::{CacheStore, MemoryStore, ResponseCache, SledStore};
pub use config::Config;
pub use connectivity::{ConnectivityMonitor, ManualMonitor, ProbeMonitor};
pub use coordinator::{Coordinator, Subscription};
pub use error::{ConfigError, RequestError, StoreError, TransportError};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use queue::PendingQueue;
pub use request::{FileAttachment, Fingerprint, Request};
pub use transport::{ProgressFn, Transport, UreqTransport};
