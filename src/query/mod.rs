//! Query Language Module
//!
//! Turns one line of text into a store call and shapes the reply into a
//! table the host can render.
//!
//! ## Architecture
//!
//! ```text
//! "hash user:1"
//!       │
//!       ▼
//! ┌─────────────────┐
//! │ Command::parse  │  (command)   selector + key + field
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │ execute         │  (normalize) one StoreClient call
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │ shape_*         │  (normalize) lenient UTF-8 decode, rows + columns
//! └────────┬────────┘
//!          │
//!          ▼
//!   QueryOutput::Table / QueryOutput::Value
//! ```
//!
//! Key discovery for editors lives in [`schema`].

pub mod command;
pub mod decode;
pub mod normalize;
pub mod schema;
pub mod table;

use crate::store::StoreError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use command::{Command, CommandParseError, Selector};
pub use decode::{decode, Decoded};
pub use normalize::{execute, run, shape_hash, shape_key, shape_zset};
pub use schema::{discover, inspect, Discovery, Schema, SchemaEntry, SkippedKey};
pub use table::{ColumnDescriptor, ColumnType, ResultTable, Row, Value};

/// Why a query produced no result.
#[derive(Debug, Error)]
pub enum QueryError {
    /// The line is malformed or names an unsupported data structure
    #[error(transparent)]
    Parse(#[from] CommandParseError),

    /// A `key` query found nothing under the key
    #[error("key '{key}' does not exist")]
    NotFound { key: String },

    /// The store call failed
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// What a query returns.
///
/// `hashkey` queries answer with the bare field value rather than a table;
/// callers that render results must handle both shapes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QueryOutput {
    Table(ResultTable),
    Value(Option<Decoded>),
}

impl QueryOutput {
    /// The table, for every selector except `hashkey`.
    pub fn as_table(&self) -> Option<&ResultTable> {
        match self {
            QueryOutput::Table(table) => Some(table),
            QueryOutput::Value(_) => None,
        }
    }

    /// Serializes the output as the host's JSON result document.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
