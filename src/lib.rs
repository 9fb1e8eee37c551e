//! # FlashQuery - Query Runner for Redis-Compatible Stores
//!
//! FlashQuery lets a data-exploration host treat a Redis-compatible
//! key-value store as a queryable data source. A one-line command such as
//! `hash user:1` is translated into a single store call, and the reply is
//! normalized into a tabular result the host can render.
//!
//! ## Features
//!
//! - **Tiny Query Language**: `key`, `zset`, `hashkey` and `hash` selectors
//! - **Tabular Results**: Serde-serializable `{columns, rows}` envelopes
//! - **Key Discovery**: Lists every key with its type for editor autocomplete
//! - **Async I/O**: Built on Tokio with a hand-written RESP client
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                             FlashQuery                                  │
//! │                                                                         │
//! │  ┌─────────────┐    ┌─────────────┐    ┌─────────────┐                  │
//! │  │  Registry   │───>│ StoreRunner │───>│  Command    │                  │
//! │  │ ("redis")   │    │ (per call)  │    │  Parser     │                  │
//! │  └─────────────┘    └──────┬──────┘    └──────┬──────┘                  │
//! │                            │                  │                         │
//! │                            ▼                  ▼                         │
//! │  ┌─────────────┐    ┌─────────────┐    ┌─────────────┐                  │
//! │  │   RESP      │<───│ RespClient  │<───│  Result     │                  │
//! │  │   Parser    │    │ (TCP)       │    │  Normalizer │                  │
//! │  └─────────────┘    └─────────────┘    └─────────────┘                  │
//! │                            ▲                                            │
//! │                            │                                            │
//! │                     ┌──────┴──────┐                                     │
//! │                     │   Schema    │                                     │
//! │                     │  Inspector  │                                     │
//! │                     └─────────────┘                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```ignore
//! use flashquery::registry::Registry;
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let registry = Registry::with_defaults();
//!     let runner = registry.create("redis", json!({"host": "127.0.0.1", "port": 6379}))?;
//!
//!     let output = runner.run_query("zset leaderboard").await?;
//!     println!("{}", output.to_json()?);
//!     Ok(())
//! }
//! ```
//!
//! ## Query Language
//!
//! - `key <name>`: the string stored under `<name>`
//! - `zset <name>`: every member of a sorted set, lowest score first
//! - `hashkey <name> <field>`: one hash field, returned as a bare value
//! - `hash <name>`: every field of a hash as `key`/`value` rows
//!
//! ## Module Overview
//!
//! - [`protocol`]: RESP protocol parser and types
//! - [`store`]: The store client trait and an in-memory store
//! - [`connection`]: Connection configuration and the TCP client
//! - [`query`]: Command parsing, result shaping and key discovery
//! - [`runner`]: The runner a host holds per data source
//! - [`registry`]: Runner lookup by type id
//!
//! ## Design Highlights
//!
//! ### Lenient Decoding
//!
//! Store values are arbitrary bytes. Anything that is not valid UTF-8 is
//! logged and passed through as raw bytes instead of failing the query.
//!
//! ### Best-Effort Discovery
//!
//! Keys whose name or type cannot be read are skipped with a warning; only
//! a failed key scan fails discovery.

pub mod connection;
pub mod protocol;
pub mod query;
pub mod registry;
pub mod runner;
pub mod store;

// Re-export commonly used types for convenience
pub use connection::{connect, ConnectionConfig, RespClient};
pub use protocol::{ParseError, RespParser, RespValue};
pub use query::{Command, QueryError, QueryOutput, ResultTable, Schema};
pub use registry::{Registry, RegistryError};
pub use runner::{QueryRunner, StoreRunner};
pub use store::{MemoryStore, StoreClient, StoreError};

/// Version of FlashQuery
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
