//! Caller-facing request values and their cache identity.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::codec;
use crate::error::RequestError;
use crate::http::HttpMethod;

pub type Headers = BTreeMap<String, String>;

/// One request the coordinator can execute, cache, and queue.
///
/// Values are immutable once built; the `with_*` methods consume the request
/// and return a new one. Header keys are case-sensitive and a repeated key
/// replaces the earlier value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Get {
        endpoint: String,
        headers: Headers,
    },
    Post {
        endpoint: String,
        headers: Headers,
        body: Vec<u8>,
    },
    /// Method-parameterized REST call (PUT, DELETE, ...).
    Rest {
        method: HttpMethod,
        endpoint: String,
        headers: Headers,
        body: Option<Vec<u8>>,
    },
    Upload {
        endpoint: String,
        headers: Headers,
        params: BTreeMap<String, String>,
        files: Vec<FileAttachment>,
    },
}

impl Request {
    pub fn get(endpoint: impl Into<String>) -> Self {
        Request::Get {
            endpoint: endpoint.into(),
            headers: Headers::new(),
        }
    }

    pub fn post(endpoint: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        Request::Post {
            endpoint: endpoint.into(),
            headers: Headers::new(),
            body: body.into(),
        }
    }

    /// A POST whose body is `model` serialized as JSON.
    pub fn post_json<T: Serialize>(endpoint: impl Into<String>, model: &T) -> Result<Self, RequestError> {
        Ok(Request::post(endpoint, codec::encode(model)?))
    }

    pub fn rest(method: HttpMethod, endpoint: impl Into<String>, body: Option<Vec<u8>>) -> Self {
        Request::Rest {
            method,
            endpoint: endpoint.into(),
            headers: Headers::new(),
            body,
        }
    }

    pub fn put(endpoint: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        Request::rest(HttpMethod::Put, endpoint, Some(body.into()))
    }

    pub fn delete(endpoint: impl Into<String>) -> Self {
        Request::rest(HttpMethod::Delete, endpoint, None)
    }

    pub fn upload(endpoint: impl Into<String>) -> Self {
        Request::Upload {
            endpoint: endpoint.into(),
            headers: Headers::new(),
            params: BTreeMap::new(),
            files: Vec::new(),
        }
    }

    /// Add a header; the value is stringified.
    pub fn with_header(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.headers_mut().insert(key.into(), value.to_string());
        self
    }

    /// Add a form parameter. Ignored for variants other than `Upload`.
    pub fn with_param(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        if let Request::Upload { params, .. } = &mut self {
            params.insert(key.into(), value.to_string());
        }
        self
    }

    /// Attach a file. Ignored for variants other than `Upload`.
    pub fn with_file(mut self, file: FileAttachment) -> Self {
        if let Request::Upload { files, .. } = &mut self {
            files.push(file);
        }
        self
    }

    pub fn endpoint(&self) -> &str {
        match self {
            Request::Get { endpoint, .. }
            | Request::Post { endpoint, .. }
            | Request::Rest { endpoint, .. }
            | Request::Upload { endpoint, .. } => endpoint,
        }
    }

    pub fn headers(&self) -> &Headers {
        match self {
            Request::Get { headers, .. }
            | Request::Post { headers, .. }
            | Request::Rest { headers, .. }
            | Request::Upload { headers, .. } => headers,
        }
    }

    fn headers_mut(&mut self) -> &mut Headers {
        match self {
            Request::Get { headers, .. }
            | Request::Post { headers, .. }
            | Request::Rest { headers, .. }
            | Request::Upload { headers, .. } => headers,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Request::Get { .. } => "get",
            Request::Post { .. } => "post",
            Request::Rest { .. } => "rest",
            Request::Upload { .. } => "upload",
        }
    }

    pub fn is_upload(&self) -> bool {
        matches!(self, Request::Upload { .. })
    }

    /// Cache and queue identity: variant plus endpoint. Headers, method
    /// parameter, and body do not participate, so differing payloads to one
    /// URL share a cache entry.
    pub fn fingerprint(&self) -> Fingerprint {
        Fingerprint(format!("{}:{}", self.kind(), self.endpoint()))
    }
}

/// A file part of a multipart upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileAttachment {
    field: String,
    name: String,
    mime: String,
    data: Vec<u8>,
}

impl FileAttachment {
    /// A file sent under the form field `file`.
    pub fn new(name: impl Into<String>, mime: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self {
            field: "file".to_string(),
            name: name.into(),
            mime: mime.into(),
            data: data.into(),
        }
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = field.into();
        self
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mime(&self) -> &str {
        &self.mime
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

/// Deterministic identity key derived from a `Request`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
