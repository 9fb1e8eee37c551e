//! Connection Configuration
//!
//! The host hands over connection settings as a JSON object whose shape is
//! described by [`configuration_schema`]. [`ConnectionConfig`] deserializes
//! that object, fills in defaults and reports anything suspicious through
//! [`ConnectionConfig::validate`].

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::json;
use std::fmt;
use std::str::FromStr;

/// Host used when the configuration names none
pub const DEFAULT_HOST: &str = "localhost";

/// Database index used when the configuration names none
pub const DEFAULT_DB: u32 = 0;

/// Port used when the configuration names none.
///
/// This is the value existing deployments fall back to. It is not the
/// store's conventional port, so [`ConnectionConfig::validate`] warns
/// whenever it is used.
pub const FALLBACK_PORT: u16 = 3306;

/// The port Redis-compatible stores listen on by convention
pub const STANDARD_PORT: u16 = 6379;

/// Settings for one store connection.
///
/// # Example
///
/// ```
/// use flashquery::connection::ConnectionConfig;
///
/// let config: ConnectionConfig =
///     serde_json::from_str(r#"{"host": "cache.local", "port": 6380, "db": "2"}"#).unwrap();
/// assert_eq!(config.effective_port(), 6380);
/// assert_eq!(config.db_index(), 2);
/// assert!(!config.use_tls);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(
        default,
        deserialize_with = "deserialize_numeric",
        skip_serializing_if = "Option::is_none"
    )]
    pub port: Option<u16>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    #[serde(
        default,
        deserialize_with = "deserialize_numeric",
        skip_serializing_if = "Option::is_none"
    )]
    pub db: Option<u32>,

    #[serde(default, rename = "useTLS", alias = "useSSL")]
    pub use_tls: bool,
}

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: None,
            username: None,
            password: None,
            db: None,
            use_tls: false,
        }
    }
}

impl ConnectionConfig {
    /// Creates a configuration for `host` with every other field defaulted.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            ..Self::default()
        }
    }

    /// Parses the host's JSON configuration object.
    pub fn from_json(value: serde_json::Value) -> serde_json::Result<Self> {
        serde_json::from_value(value)
    }

    /// The port to dial, falling back to [`FALLBACK_PORT`].
    pub fn effective_port(&self) -> u16 {
        self.port.unwrap_or(FALLBACK_PORT)
    }

    /// The database index to SELECT.
    pub fn db_index(&self) -> u32 {
        self.db.unwrap_or(DEFAULT_DB)
    }

    /// `host:port` for logging and dialing.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.effective_port())
    }

    /// Reports settings that are accepted but probably not what was meant.
    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();
        if self.port.is_none() {
            warnings.push(ConfigWarning::PortNotSet {
                fallback: FALLBACK_PORT,
            });
        }
        if self.username.is_some() && self.password.is_none() {
            warnings.push(ConfigWarning::UsernameWithoutPassword);
        }
        warnings
    }
}

/// A non-fatal configuration finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigWarning {
    /// No port was configured and the fallback will be dialed
    PortNotSet { fallback: u16 },
    /// A username without a password is never sent
    UsernameWithoutPassword,
}

impl fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigWarning::PortNotSet { fallback } => write!(
                f,
                "no port configured, falling back to {} (stores usually listen on {})",
                fallback, STANDARD_PORT
            ),
            ConfigWarning::UsernameWithoutPassword => {
                write!(f, "username is ignored because no password is configured")
            }
        }
    }
}

/// Accepts a JSON number or a numeric string. Null and blank strings are `None`.
fn deserialize_numeric<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Numeric {
        Int(u64),
        Text(String),
    }

    match Option::<Numeric>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Numeric::Int(n)) => n
            .to_string()
            .parse()
            .map(Some)
            .map_err(|_| D::Error::custom(format!("{} is out of range", n))),
        Some(Numeric::Text(s)) if s.trim().is_empty() => Ok(None),
        Some(Numeric::Text(s)) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| D::Error::custom(format!("expected a number, got {:?}", s))),
    }
}

/// JSON schema of the configuration object, in the form the host's
/// settings form consumes.
pub fn configuration_schema() -> serde_json::Value {
    json!({
        "type": "object",
        "properties": {
            "host": {"type": "string", "default": DEFAULT_HOST},
            "port": {"type": "number"},
            "useTLS": {"type": "boolean", "title": "Use TLS"},
            "username": {"type": "string"},
            "password": {"type": "string"},
            "db": {"type": "string", "title": "Database Index"},
        },
        "order": ["host", "port", "username", "password", "db", "useTLS"],
        "required": ["host"],
        "secret": ["password"],
    })
}
