//! JSON conversion between caller models and payload bytes.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::RequestError;

pub fn encode<T: Serialize>(model: &T) -> Result<Vec<u8>, RequestError> {
    serde_json::to_vec(model).map_err(|e| RequestError::Decoding(e.to_string()))
}

pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, RequestError> {
    serde_json::from_slice(bytes).map_err(|e| RequestError::Decoding(e.to_string()))
}
