//! RESP Protocol Implementation
//!
//! Client-side pieces of the Redis Serialization Protocol (RESP2): building
//! commands and parsing the replies that come back.
//!
//! ## Modules
//!
//! - `types`: Defines the `RespValue` enum and serialization
//! - `parser`: Incremental parser for store replies
//!
//! ## Example
//!
//! ```
//! use flashquery::protocol::{parse_message, RespValue};
//!
//! let request = RespValue::command(["HGET", "user:1", "name"]).serialize();
//! assert!(request.starts_with(b"*3\r\n"));
//!
//! let (reply, _) = parse_message(b"$3\r\nbob\r\n").unwrap().unwrap();
//! assert_eq!(reply.into_bytes().as_deref(), Some(&b"bob"[..]));
//! ```

pub mod parser;
pub mod types;

pub use parser::{parse_message, ParseError, ParseResult, RespParser};
pub use types::RespValue;
