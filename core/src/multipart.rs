//! `multipart/form-data` body encoding.
//!
//! Parameters are written first in key order, then files in the order they
//! were attached. The framing is byte exact:
//!
//! ```text
//! --{boundary}\r\n
//! Content-Disposition: form-data; name="{key}"\r\n
//! \r\n
//! {value}\r\n
//! ...
//! --{boundary}\r\n
//! Content-Disposition: form-data; name="{field}"; filename="{name}"\r\n
//! Content-Type: {mime}\r\n
//! \r\n
//! {bytes}\r\n
//! --{boundary}--\r\n
//! ```

use std::collections::BTreeMap;

use uuid::Uuid;

use crate::request::FileAttachment;

/// A fresh boundary, unique per request.
pub fn generate_boundary() -> String {
    format!("Boundary-{}", Uuid::new_v4())
}

pub fn content_type(boundary: &str) -> String {
    format!("multipart/form-data; boundary={boundary}")
}

/// Encode form parameters and file parts into one contiguous body.
pub fn encode(boundary: &str, params: &BTreeMap<String, String>, files: &[FileAttachment]) -> Vec<u8> {
    let mut body = Vec::new();

    for (key, value) in params {
        body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
        body.extend_from_slice(format!("Content-Disposition: form-data; name=\"{key}\"\r\n\r\n").as_bytes());
        body.extend_from_slice(value.as_bytes());
        body.extend_from_slice(b"\r\n");
    }

    for file in files {
        body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                file.field(),
                file.name()
            )
            .as_bytes(),
        );
        body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", file.mime()).as_bytes());
        body.extend_from_slice(file.data());
        body.extend_from_slice(b"\r\n");
    }

    body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());
    body
}
