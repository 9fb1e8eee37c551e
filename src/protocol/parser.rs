//! Incremental RESP Reply Parser
//!
//! Replies arrive over TCP in arbitrary chunks, so the parser works on
//! whatever is buffered and reports how far it got:
//!
//! - `Ok(Some((value, consumed)))` - a full reply was parsed from the first
//!   `consumed` bytes
//! - `Ok(None)` - the reply is incomplete, read more and try again
//! - `Err(ParseError)` - the bytes are not valid RESP
//!
//! The caller keeps a growing buffer, retries after each read and drops the
//! consumed prefix once a reply comes out.

use crate::protocol::types::{prefix, RespValue, CRLF};
use bytes::Bytes;
use thiserror::Error;

/// Errors that can occur during RESP parsing.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ParseError {
    /// Unknown type prefix byte
    #[error("unknown type prefix: {0:#04x}")]
    UnknownPrefix(u8),

    /// Invalid integer format
    #[error("invalid integer: {0}")]
    InvalidInteger(String),

    /// Invalid UTF-8 in a line that must be text
    #[error("invalid UTF-8: {0}")]
    InvalidUtf8(String),

    /// Bulk string length is negative (but not -1 for null)
    #[error("invalid bulk string length: {0}")]
    InvalidBulkLength(i64),

    /// Array length is negative (but not -1 for null)
    #[error("invalid array length: {0}")]
    InvalidArrayLength(i64),

    /// Protocol violation (missing CRLF, etc.)
    #[error("protocol error: {0}")]
    ProtocolError(String),

    /// The reply exceeds maximum allowed size
    #[error("message too large: {size} bytes (max: {max})")]
    MessageTooLarge { size: usize, max: usize },
}

/// Result type for parsing operations.
pub type ParseResult<T> = Result<T, ParseError>;

/// Maximum size for a single bulk string (512 MB, same as Redis)
pub const MAX_BULK_SIZE: usize = 512 * 1024 * 1024;

/// Maximum array nesting depth
pub const MAX_NESTING_DEPTH: usize = 32;

/// Parser for RESP replies.
///
/// # Example
///
/// ```
/// use flashquery::protocol::{RespParser, RespValue};
/// use bytes::Bytes;
///
/// let mut parser = RespParser::new();
/// let (value, consumed) = parser.parse(b"$5\r\nhello\r\n").unwrap().unwrap();
/// assert_eq!(value, RespValue::BulkString(Bytes::from("hello")));
/// assert_eq!(consumed, 11);
/// ```
#[derive(Debug, Default)]
pub struct RespParser {
    depth: usize,
}

impl RespParser {
    /// Creates a new parser instance.
    pub fn new() -> Self {
        Self { depth: 0 }
    }

    /// Attempts to parse one reply from the front of `buf`.
    pub fn parse(&mut self, buf: &[u8]) -> ParseResult<Option<(RespValue, usize)>> {
        self.depth = 0;
        self.parse_value(buf)
    }

    fn parse_value(&mut self, buf: &[u8]) -> ParseResult<Option<(RespValue, usize)>> {
        let Some(&type_byte) = buf.first() else {
            return Ok(None);
        };

        if self.depth > MAX_NESTING_DEPTH {
            return Err(ParseError::ProtocolError(format!(
                "maximum nesting depth exceeded: {}",
                MAX_NESTING_DEPTH
            )));
        }

        match type_byte {
            prefix::SIMPLE_STRING => Ok(read_text_line(buf)?
                .map(|(text, used)| (RespValue::SimpleString(text.to_string()), used))),
            prefix::ERROR => Ok(read_text_line(buf)?
                .map(|(text, used)| (RespValue::Error(text.to_string()), used))),
            prefix::INTEGER => Ok(read_integer_line(buf)?
                .map(|(n, used)| (RespValue::Integer(n), used))),
            prefix::BULK_STRING => self.parse_bulk_string(buf),
            prefix::ARRAY => self.parse_array(buf),
            other => Err(ParseError::UnknownPrefix(other)),
        }
    }

    /// `$<length>\r\n<data>\r\n`, or `$-1\r\n` for null
    fn parse_bulk_string(&mut self, buf: &[u8]) -> ParseResult<Option<(RespValue, usize)>> {
        let Some((length, header)) = read_integer_line(buf)? else {
            return Ok(None);
        };

        if length == -1 {
            return Ok(Some((RespValue::Null, header)));
        }
        if length < 0 {
            return Err(ParseError::InvalidBulkLength(length));
        }

        let length = length as usize;
        if length > MAX_BULK_SIZE {
            return Err(ParseError::MessageTooLarge {
                size: length,
                max: MAX_BULK_SIZE,
            });
        }

        let total = header + length + CRLF.len();
        if buf.len() < total {
            return Ok(None);
        }
        if &buf[header + length..total] != CRLF {
            return Err(ParseError::ProtocolError(
                "bulk string missing trailing CRLF".to_string(),
            ));
        }

        let data = Bytes::copy_from_slice(&buf[header..header + length]);
        Ok(Some((RespValue::BulkString(data), total)))
    }

    /// `*<count>\r\n<elements...>`, or `*-1\r\n` for null
    fn parse_array(&mut self, buf: &[u8]) -> ParseResult<Option<(RespValue, usize)>> {
        let Some((count, header)) = read_integer_line(buf)? else {
            return Ok(None);
        };

        if count == -1 {
            return Ok(Some((RespValue::Null, header)));
        }
        if count < 0 {
            return Err(ParseError::InvalidArrayLength(count));
        }

        let count = count as usize;
        // The count is attacker-controlled; cap the preallocation.
        let mut elements = Vec::with_capacity(count.min(1024));
        let mut consumed = header;

        self.depth += 1;
        for _ in 0..count {
            match self.parse_value(&buf[consumed..])? {
                Some((value, used)) => {
                    elements.push(value);
                    consumed += used;
                }
                None => {
                    self.depth -= 1;
                    return Ok(None);
                }
            }
        }
        self.depth -= 1;

        Ok(Some((RespValue::Array(elements), consumed)))
    }
}

/// Reads the line after the type byte as UTF-8 text.
///
/// Returns the text and the number of bytes used including prefix and CRLF.
fn read_text_line(buf: &[u8]) -> ParseResult<Option<(&str, usize)>> {
    let Some(pos) = find_crlf(&buf[1..]) else {
        return Ok(None);
    };
    let text =
        std::str::from_utf8(&buf[1..1 + pos]).map_err(|e| ParseError::InvalidUtf8(e.to_string()))?;
    Ok(Some((text, 1 + pos + CRLF.len())))
}

/// Reads the line after the type byte as a signed integer.
fn read_integer_line(buf: &[u8]) -> ParseResult<Option<(i64, usize)>> {
    let Some((text, used)) = read_text_line(buf)? else {
        return Ok(None);
    };
    let n = text
        .parse::<i64>()
        .map_err(|e| ParseError::InvalidInteger(format!("{:?}: {}", text, e)))?;
    Ok(Some((n, used)))
}

/// Finds the position of CRLF in the buffer.
#[inline]
fn find_crlf(buf: &[u8]) -> Option<usize> {
    buf.windows(2).position(|w| w == CRLF)
}

/// Parses a single reply with a fresh parser.
pub fn parse_message(buf: &[u8]) -> ParseResult<Option<(RespValue, usize)>> {
    RespParser::new().parse(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_string() {
        let (value, consumed) = parse_message(b"+OK\r\n").unwrap().unwrap();
        assert_eq!(value, RespValue::simple_string("OK"));
        assert_eq!(consumed, 5);
    }

    #[test]
    fn test_parse_error_reply() {
        let input = b"-WRONGTYPE Operation against a key holding the wrong kind of value\r\n";
        let (value, consumed) = parse_message(input).unwrap().unwrap();
        assert!(value.is_error());
        assert_eq!(consumed, input.len());
    }

    #[test]
    fn test_parse_integer() {
        let (value, _) = parse_message(b":-42\r\n").unwrap().unwrap();
        assert_eq!(value, RespValue::Integer(-42));
    }

    #[test]
    fn test_parse_bad_integer() {
        assert!(matches!(
            parse_message(b":abc\r\n"),
            Err(ParseError::InvalidInteger(_))
        ));
    }

    #[test]
    fn test_parse_bulk_string() {
        let (value, consumed) = parse_message(b"$5\r\nhello\r\n").unwrap().unwrap();
        assert_eq!(value, RespValue::bulk_string(Bytes::from("hello")));
        assert_eq!(consumed, 11);
    }

    #[test]
    fn test_parse_bulk_string_with_crlf_inside() {
        let (value, _) = parse_message(b"$4\r\na\r\nb\r\n").unwrap().unwrap();
        assert_eq!(value, RespValue::bulk_string(Bytes::from("a\r\nb")));
    }

    #[test]
    fn test_parse_null_bulk_and_array() {
        assert_eq!(parse_message(b"$-1\r\n").unwrap().unwrap().0, RespValue::Null);
        assert_eq!(parse_message(b"*-1\r\n").unwrap().unwrap().0, RespValue::Null);
    }

    #[test]
    fn test_parse_hgetall_reply() {
        let input = b"*4\r\n$4\r\nname\r\n$3\r\nbob\r\n$3\r\nage\r\n$2\r\n30\r\n";
        let (value, consumed) = parse_message(input).unwrap().unwrap();
        assert_eq!(consumed, input.len());
        assert_eq!(
            value,
            RespValue::array(vec![
                RespValue::bulk_string(Bytes::from("name")),
                RespValue::bulk_string(Bytes::from("bob")),
                RespValue::bulk_string(Bytes::from("age")),
                RespValue::bulk_string(Bytes::from("30")),
            ])
        );
    }

    #[test]
    fn test_parse_empty_array() {
        let (value, consumed) = parse_message(b"*0\r\n").unwrap().unwrap();
        assert_eq!(value, RespValue::array(vec![]));
        assert_eq!(consumed, 4);
    }

    #[test]
    fn test_incomplete_replies() {
        assert!(parse_message(b"").unwrap().is_none());
        assert!(parse_message(b"+OK").unwrap().is_none());
        assert!(parse_message(b"$5\r\nhel").unwrap().is_none());
        assert!(parse_message(b"*2\r\n$1\r\na\r\n").unwrap().is_none());
    }

    #[test]
    fn test_parser_reusable_after_incomplete() {
        let mut parser = RespParser::new();
        let full = b"*2\r\n$1\r\na\r\n$1\r\nb\r\n";
        assert!(parser.parse(&full[..10]).unwrap().is_none());
        let (value, consumed) = parser.parse(full).unwrap().unwrap();
        assert_eq!(consumed, full.len());
        assert_eq!(value.into_array().map(|a| a.len()), Some(2));
    }

    #[test]
    fn test_pipelined_replies() {
        let input = b"+OK\r\n$3\r\nbar\r\n";
        let (first, used) = parse_message(input).unwrap().unwrap();
        assert_eq!(first, RespValue::simple_string("OK"));
        let (second, _) = parse_message(&input[used..]).unwrap().unwrap();
        assert_eq!(second, RespValue::bulk_string(Bytes::from("bar")));
    }

    #[test]
    fn test_bulk_missing_crlf() {
        assert!(matches!(
            parse_message(b"$3\r\nfooXX"),
            Err(ParseError::ProtocolError(_))
        ));
    }

    #[test]
    fn test_negative_lengths() {
        assert_eq!(
            parse_message(b"$-5\r\n"),
            Err(ParseError::InvalidBulkLength(-5))
        );
        assert_eq!(
            parse_message(b"*-3\r\n"),
            Err(ParseError::InvalidArrayLength(-3))
        );
    }

    #[test]
    fn test_unknown_prefix() {
        assert_eq!(parse_message(b"?x\r\n"), Err(ParseError::UnknownPrefix(b'?')));
    }

    #[test]
    fn test_nesting_limit() {
        let mut input = Vec::new();
        for _ in 0..(MAX_NESTING_DEPTH + 2) {
            input.extend_from_slice(b"*1\r\n");
        }
        input.extend_from_slice(b":1\r\n");
        assert!(matches!(
            parse_message(&input),
            Err(ParseError::ProtocolError(_))
        ));
    }
}
