//! Error types for the request coordinator and its collaborators.
//!
//! # Design
//! `RequestError` is the only error a caller of `Coordinator::handle` sees.
//! Transport and store failures have their own enums so implementations of
//! those traits stay independent of the coordinator; transport failures are
//! surfaced to callers verbatim as text, store failures never reach callers.

use thiserror::Error;

/// Errors returned by `Coordinator::handle` and the codec helpers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    /// The request was rejected because connectivity is known to be absent.
    #[error("network unavailable")]
    NetworkUnavailable,

    /// A GET returned a status other than 200.
    #[error("invalid response")]
    InvalidResponse,

    /// A non-GET request returned a status other than 200.
    #[error("server error: HTTP {0}")]
    ServerError(u16),

    /// A payload could not be converted to or from the caller's model.
    #[error("decoding failed: {0}")]
    Decoding(String),

    /// The underlying I/O failed before a status was received.
    #[error("transport error: {0}")]
    Transport(String),
}

impl From<TransportError> for RequestError {
    fn from(err: TransportError) -> Self {
        RequestError::Transport(err.to_string())
    }
}

/// Failures reported by a `Transport` implementation.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("{0}")]
    Io(String),

    /// The blocking worker running the request panicked or was cancelled.
    #[error("transport task failed: {0}")]
    Join(String),
}

impl From<ureq::Error> for TransportError {
    fn from(err: ureq::Error) -> Self {
        TransportError::Io(err.to_string())
    }
}

/// Failures reported by a `CacheStore`.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sled(#[from] sled::Error),

    #[error("store lock poisoned")]
    Poisoned,
}

/// Failures while loading configuration or wiring a coordinator from it.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reading config: {0}")]
    Io(#[from] std::io::Error),

    #[error("parsing config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },

    #[error("opening cache store: {0}")]
    Store(#[from] StoreError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_error_text_is_carried_verbatim() {
        let err: RequestError = TransportError::Io("connection refused".to_string()).into();
        assert_eq!(err, RequestError::Transport("connection refused".to_string()));
    }

    #[test]
    fn server_error_mentions_status() {
        assert_eq!(RequestError::ServerError(503).to_string(), "server error: HTTP 503");
    }
}
