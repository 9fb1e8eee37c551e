//! Store Client Abstraction
//!
//! The query core never talks to sockets directly. It is handed something
//! implementing [`StoreClient`] and issues the six calls it needs through
//! it:
//!
//! ```text
//! ┌──────────────┐     ┌─────────────────┐     ┌──────────────────┐
//! │ query::run   │────>│  dyn StoreClient │────>│ RespClient (TCP) │
//! │ query::schema│     │                 │     ├──────────────────┤
//! └──────────────┘     └─────────────────┘     │ MemoryStore      │
//!                                              └──────────────────┘
//! ```
//!
//! Calls are issued one at a time and awaited in order. Nothing here retries
//! or times out; a failure comes back as a [`StoreError`] and is passed to
//! the caller unchanged.

pub mod memory;

use crate::protocol::ParseError;
use async_trait::async_trait;
use bytes::Bytes;
use std::fmt;
use thiserror::Error;

pub use memory::MemoryStore;

/// Errors raised by a store client.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Network failure while connecting, reading or writing
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The store sent bytes that are not valid RESP
    #[error("protocol error: {0}")]
    Protocol(#[from] ParseError),

    /// The store answered with an error reply
    #[error("{0}")]
    Server(String),

    /// The reply had a different shape than the command returns
    #[error("unexpected {got} reply to {command}")]
    UnexpectedResponse {
        command: &'static str,
        got: &'static str,
    },

    /// The store closed the connection mid-reply
    #[error("connection closed by store")]
    ConnectionClosed,

    /// A TLS connection was requested
    #[error("TLS connections are not supported by this client")]
    TlsUnsupported,
}

/// Result type for store calls.
pub type StoreResult<T> = Result<T, StoreError>;

/// One end of a ZRANGEBYSCORE interval.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScoreBound {
    NegInf,
    PosInf,
    Inclusive(f64),
    Exclusive(f64),
}

impl ScoreBound {
    /// Returns true if `score` satisfies this bound used as a minimum.
    pub fn admits_above(&self, score: f64) -> bool {
        match *self {
            ScoreBound::NegInf => true,
            ScoreBound::PosInf => false,
            ScoreBound::Inclusive(min) => score >= min,
            ScoreBound::Exclusive(min) => score > min,
        }
    }

    /// Returns true if `score` satisfies this bound used as a maximum.
    pub fn admits_below(&self, score: f64) -> bool {
        match *self {
            ScoreBound::NegInf => false,
            ScoreBound::PosInf => true,
            ScoreBound::Inclusive(max) => score <= max,
            ScoreBound::Exclusive(max) => score < max,
        }
    }
}

/// Formats the bound as a ZRANGEBYSCORE argument.
impl fmt::Display for ScoreBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScoreBound::NegInf => write!(f, "-inf"),
            ScoreBound::PosInf => write!(f, "+inf"),
            ScoreBound::Inclusive(score) => write!(f, "{}", score),
            ScoreBound::Exclusive(score) => write!(f, "({}", score),
        }
    }
}

/// The store operations the query core depends on.
///
/// Keys and fields are passed as typed by the user. Replies stay raw bytes;
/// decoding them is the normalizer's job.
#[async_trait]
pub trait StoreClient: Send + Sync {
    /// GET. `None` when the key does not exist.
    async fn get(&self, key: &str) -> StoreResult<Option<Bytes>>;

    /// ZRANGEBYSCORE. Members in ascending score order.
    async fn zrangebyscore(
        &self,
        key: &str,
        min: ScoreBound,
        max: ScoreBound,
    ) -> StoreResult<Vec<Bytes>>;

    /// HGET. `None` when the key or the field does not exist.
    async fn hget(&self, key: &str, field: &str) -> StoreResult<Option<Bytes>>;

    /// HGETALL. Field/value pairs in the order the store sent them.
    async fn hgetall(&self, key: &str) -> StoreResult<Vec<(Bytes, Bytes)>>;

    /// KEYS with a match-all pattern.
    async fn keys(&self) -> StoreResult<Vec<Bytes>>;

    /// TYPE. The store's tag such as `string`, `zset`, `hash` or `none`.
    async fn key_type(&self, key: &str) -> StoreResult<Bytes>;
}
