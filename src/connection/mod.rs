//! Store Connection Module
//!
//! Builds live [`StoreClient`](crate::store::StoreClient)s from the host's
//! configuration object.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────┐   connect()   ┌──────────────────────────────┐
//! │ ConnectionConfig │──────────────>│ RespClient                   │
//! │  host, port, db  │               │  TCP stream + BytesMut       │
//! │  user, password  │               │  AUTH / SELECT on connect    │
//! │  useTLS          │               │  one command at a time       │
//! └──────────────────┘               └──────────────────────────────┘
//! ```
//!
//! A connection is opened per query and dropped afterwards; nothing is
//! pooled.
//!
//! ## Example
//!
//! ```ignore
//! use flashquery::connection::{connect, ConnectionConfig};
//! use flashquery::store::StoreClient;
//!
//! let mut config = ConnectionConfig::new("127.0.0.1");
//! config.port = Some(6379);
//! let client = connect(&config).await?;
//! let value = client.get("greeting").await?;
//! ```

pub mod client;
pub mod config;

pub use client::{connect, RespClient};
pub use config::{
    configuration_schema, ConfigWarning, ConnectionConfig, DEFAULT_DB, DEFAULT_HOST,
    FALLBACK_PORT, STANDARD_PORT,
};
