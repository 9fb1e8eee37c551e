//! Query Line Parser
//!
//! A query is one line of whitespace-separated tokens:
//!
//! ```text
//! key     <name>
//! zset    <name>
//! hash    <name>
//! hashkey <name> <field>
//! ```
//!
//! The first token picks the data structure and is matched without regard
//! to case. Names and fields are kept exactly as typed. Tokens after the
//! last one a selector needs are ignored.

use std::fmt;
use thiserror::Error;

/// Why a query line could not be turned into a [`Command`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CommandParseError {
    #[error("query must include a data structure name (missing data-structure name)")]
    MissingSelector,

    #[error("query must include a key name (missing key name)")]
    MissingKey,

    #[error("hashkey queries must include a field (missing hash field name)")]
    MissingField,

    #[error("query not supported for '{0}' data structures")]
    UnsupportedSelector(String),
}

/// The data structure a query reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Selector {
    /// A plain string value
    Key,
    /// Every member of a sorted set
    ZSet,
    /// One field of a hash
    HashKey,
    /// Every field of a hash
    Hash,
}

impl Selector {
    /// All selectors, in the order they are documented.
    pub const ALL: [Selector; 4] = [
        Selector::Key,
        Selector::ZSet,
        Selector::HashKey,
        Selector::Hash,
    ];

    /// Matches a selector token, ignoring case.
    pub fn from_token(token: &str) -> Option<Self> {
        match token.to_ascii_lowercase().as_str() {
            "key" => Some(Selector::Key),
            "zset" => Some(Selector::ZSet),
            "hashkey" => Some(Selector::HashKey),
            "hash" => Some(Selector::Hash),
            _ => None,
        }
    }

    /// The canonical, lower-case keyword.
    pub fn as_str(&self) -> &'static str {
        match self {
            Selector::Key => "key",
            Selector::ZSet => "zset",
            Selector::HashKey => "hashkey",
            Selector::Hash => "hash",
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub selector: Selector,
    pub key: String,
    /// Present exactly when `selector` is [`Selector::HashKey`]
    pub field: Option<String>,
}

impl Command {
    /// Parses one query line.
    ///
    /// # Example
    ///
    /// ```
    /// use flashquery::query::{Command, Selector};
    ///
    /// let cmd = Command::parse("HASHKEY user:1 name").unwrap();
    /// assert_eq!(cmd.selector, Selector::HashKey);
    /// assert_eq!(cmd.key, "user:1");
    /// assert_eq!(cmd.field.as_deref(), Some("name"));
    /// ```
    pub fn parse(line: &str) -> Result<Self, CommandParseError> {
        let mut tokens = line.split_whitespace();

        let selector_token = tokens.next().ok_or(CommandParseError::MissingSelector)?;
        let key = tokens.next().ok_or(CommandParseError::MissingKey)?;

        let selector = Selector::from_token(selector_token)
            .ok_or_else(|| CommandParseError::UnsupportedSelector(selector_token.to_string()))?;

        let field = match selector {
            Selector::HashKey => Some(
                tokens
                    .next()
                    .ok_or(CommandParseError::MissingField)?
                    .to_string(),
            ),
            _ => None,
        };

        Ok(Command {
            selector,
            key: key.to_string(),
            field,
        })
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.selector, self.key)?;
        if let Some(field) = &self.field {
            write!(f, " {}", field)?;
        }
        Ok(())
    }
}
