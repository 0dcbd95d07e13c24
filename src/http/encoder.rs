//! JSON payload encoding and decoding.
//!
//! # Design Decisions
//! - Encoding is total: every `Payload` is already a JSON value
//! - An absent payload encodes to an empty body; the status is left alone
//! - Decoding distinguishes "nothing to parse" from "malformed"

use axum::body::Bytes;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Structured data a handler returns, destined for JSON encoding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Payload(Value);

impl Payload {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// Build a payload from any serializable value.
    pub fn from_serialize<T: Serialize>(value: &T) -> Result<Self, serde_json::Error> {
        serde_json::to_value(value).map(Self)
    }

    /// Deserialize the payload into a concrete type.
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        T::deserialize(&self.0)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }
}

impl From<Value> for Payload {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

impl std::fmt::Display for Payload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Why a body could not be decoded.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The body was empty or whitespace.
    #[error("Unexpected end of JSON input")]
    UnexpectedEnd,

    #[error("Unexpected token in JSON at line {line} column {column}: {source}")]
    Syntax {
        line: usize,
        column: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// Serialize an optional payload to a response body.
pub fn encode(payload: Option<&Payload>) -> Bytes {
    match payload {
        Some(payload) => Bytes::from(payload.0.to_string()),
        None => Bytes::new(),
    }
}

/// Parse a body as JSON.
pub fn decode(body: &[u8]) -> Result<Payload, DecodeError> {
    serde_json::from_slice::<Value>(body)
        .map(Payload)
        .map_err(|e| {
            if e.is_eof() {
                DecodeError::UnexpectedEnd
            } else {
                DecodeError::Syntax {
                    line: e.line(),
                    column: e.column(),
                    source: e,
                }
            }
        })
}
