//! Lenient UTF-8 decoding of store values.
//!
//! Stores hold arbitrary bytes. A value that is not valid UTF-8 does not
//! fail the query: it is logged and carried along as raw bytes.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// A store value after decoding.
///
/// Serializes as a JSON string for text and as an array of byte values for
/// raw data, so both survive a round trip through the result envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Decoded {
    Text(String),
    Raw(Vec<u8>),
}

impl Decoded {
    /// The text, if decoding succeeded.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Decoded::Text(text) => Some(text),
            Decoded::Raw(_) => None,
        }
    }

    pub fn is_raw(&self) -> bool {
        matches!(self, Decoded::Raw(_))
    }
}

impl From<&str> for Decoded {
    fn from(text: &str) -> Self {
        Decoded::Text(text.to_string())
    }
}

/// Decodes `bytes` as UTF-8, falling back to the raw bytes.
pub fn decode(bytes: Bytes) -> Decoded {
    match String::from_utf8(bytes.to_vec()) {
        Ok(text) => Decoded::Text(text),
        Err(e) => {
            warn!(
                len = bytes.len(),
                error = %e.utf8_error(),
                "Problem decoding binary value, passing raw bytes through"
            );
            Decoded::Raw(e.into_bytes())
        }
    }
}
