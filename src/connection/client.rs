//! RESP Store Client
//!
//! A single TCP connection to a Redis-compatible store. Requests are written
//! whole, then the reply is read into a `BytesMut` buffer until the parser
//! can produce a complete value:
//!
//! ```text
//!   request(cmd)
//!        │
//!        ▼
//!   write + flush ──> ┌────────────────────────────┐
//!                     │ parse buffer               │
//!                     │   complete  -> return      │
//!                     │   partial   -> read more ──┼─┐
//!                     └────────────────────────────┘ │
//!                                  ▲                 │
//!                                  └─────────────────┘
//! ```
//!
//! The connection sits behind a `tokio::sync::Mutex`, so a client shared by
//! reference still sends one command at a time.

use crate::connection::config::ConnectionConfig;
use crate::protocol::{RespParser, RespValue};
use crate::store::{ScoreBound, StoreClient, StoreError, StoreResult};
use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncReadExt, AsyncWriteExt, BufWriter};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tracing::{debug, info, trace, warn};

/// Initial read buffer capacity
const INITIAL_BUFFER_SIZE: usize = 4096;

/// Opens a connection described by `config`, authenticates and selects the
/// database.
///
/// Configuration warnings are logged, not returned.
pub async fn connect(config: &ConnectionConfig) -> StoreResult<RespClient> {
    for warning in config.validate() {
        warn!(host = %config.host, "{}", warning);
    }

    info!(
        host = %config.host,
        port = config.effective_port(),
        db = config.db_index(),
        tls = config.use_tls,
        "Starting store connection"
    );

    if config.use_tls {
        return Err(StoreError::TlsUnsupported);
    }

    let stream = TcpStream::connect((config.host.as_str(), config.effective_port())).await?;
    stream.set_nodelay(true)?;

    let client = RespClient::new(stream, config.address());

    if let Some(password) = &config.password {
        let mut args: Vec<&str> = vec!["AUTH"];
        if let Some(username) = &config.username {
            args.push(username);
        }
        args.push(password);
        client.expect_ok("AUTH", RespValue::command(args)).await?;
        debug!(peer = %client.peer, "Authenticated");
    }

    let db = config.db_index();
    if db != 0 {
        let db = db.to_string();
        client
            .expect_ok("SELECT", RespValue::command(["SELECT", db.as_str()]))
            .await?;
        debug!(peer = %client.peer, db = %db, "Selected database");
    }

    Ok(client)
}

/// The socket half of a client.
struct Connection {
    stream: BufWriter<TcpStream>,
    buffer: BytesMut,
    parser: RespParser,
}

impl Connection {
    async fn request(&mut self, command: &RespValue) -> StoreResult<RespValue> {
        let bytes = command.serialize();
        self.stream.write_all(&bytes).await?;
        self.stream.flush().await?;
        trace!(bytes = bytes.len(), "Sent command");

        loop {
            if let Some((reply, consumed)) = self.parser.parse(&self.buffer)? {
                let _ = self.buffer.split_to(consumed);
                trace!(consumed, remaining = self.buffer.len(), "Parsed reply");
                return Ok(reply);
            }

            if self.buffer.capacity() - self.buffer.len() < 1024 {
                self.buffer.reserve(INITIAL_BUFFER_SIZE);
            }

            let n = self.stream.get_mut().read_buf(&mut self.buffer).await?;
            if n == 0 {
                return Err(StoreError::ConnectionClosed);
            }
            trace!(bytes = n, "Read data");
        }
    }
}

/// A [`StoreClient`] speaking RESP2 over TCP.
pub struct RespClient {
    conn: Mutex<Connection>,
    peer: String,
}

impl std::fmt::Debug for RespClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RespClient").field("peer", &self.peer).finish()
    }
}

impl RespClient {
    /// Wraps an already connected stream. No handshake is performed.
    pub fn new(stream: TcpStream, peer: impl Into<String>) -> Self {
        Self {
            conn: Mutex::new(Connection {
                stream: BufWriter::new(stream),
                buffer: BytesMut::with_capacity(INITIAL_BUFFER_SIZE),
                parser: RespParser::new(),
            }),
            peer: peer.into(),
        }
    }

    /// The address this client talks to.
    pub fn peer(&self) -> &str {
        &self.peer
    }

    /// Sends one command and returns its reply. Error replies become
    /// [`StoreError::Server`].
    pub async fn call(&self, command: RespValue) -> StoreResult<RespValue> {
        let mut conn = self.conn.lock().await;
        match conn.request(&command).await? {
            RespValue::Error(message) => Err(StoreError::Server(message)),
            reply => Ok(reply),
        }
    }

    async fn expect_ok(&self, name: &'static str, command: RespValue) -> StoreResult<()> {
        match self.call(command).await? {
            RespValue::SimpleString(_) => Ok(()),
            other => Err(unexpected(name, &other)),
        }
    }

    async fn call_optional_bulk(
        &self,
        name: &'static str,
        command: RespValue,
    ) -> StoreResult<Option<Bytes>> {
        match self.call(command).await? {
            RespValue::BulkString(data) => Ok(Some(data)),
            RespValue::Null => Ok(None),
            other => Err(unexpected(name, &other)),
        }
    }

    async fn call_bulk_array(
        &self,
        name: &'static str,
        command: RespValue,
    ) -> StoreResult<Vec<Bytes>> {
        let reply = self.call(command).await?;
        if reply.is_null() {
            return Ok(Vec::new());
        }
        let items = match reply {
            RespValue::Array(items) => items,
            other => return Err(unexpected(name, &other)),
        };
        items
            .into_iter()
            .map(|item| match item {
                RespValue::BulkString(data) => Ok(data),
                other => Err(unexpected(name, &other)),
            })
            .collect()
    }

    /// Sends PING and returns the payload of the reply.
    pub async fn ping(&self) -> StoreResult<Bytes> {
        let reply = self.call(RespValue::command(["PING"])).await?;
        let kind = reply.kind();
        reply.into_bytes().ok_or(StoreError::UnexpectedResponse {
            command: "PING",
            got: kind,
        })
    }
}

fn unexpected(command: &'static str, reply: &RespValue) -> StoreError {
    StoreError::UnexpectedResponse {
        command,
        got: reply.kind(),
    }
}

#[async_trait]
impl StoreClient for RespClient {
    async fn get(&self, key: &str) -> StoreResult<Option<Bytes>> {
        self.call_optional_bulk("GET", RespValue::command(["GET", key]))
            .await
    }

    async fn zrangebyscore(
        &self,
        key: &str,
        min: ScoreBound,
        max: ScoreBound,
    ) -> StoreResult<Vec<Bytes>> {
        let (min, max) = (min.to_string(), max.to_string());
        self.call_bulk_array(
            "ZRANGEBYSCORE",
            RespValue::command(["ZRANGEBYSCORE", key, min.as_str(), max.as_str()]),
        )
        .await
    }

    async fn hget(&self, key: &str, field: &str) -> StoreResult<Option<Bytes>> {
        self.call_optional_bulk("HGET", RespValue::command(["HGET", key, field]))
            .await
    }

    async fn hgetall(&self, key: &str) -> StoreResult<Vec<(Bytes, Bytes)>> {
        let flat = self
            .call_bulk_array("HGETALL", RespValue::command(["HGETALL", key]))
            .await?;
        if flat.len() % 2 != 0 {
            return Err(StoreError::UnexpectedResponse {
                command: "HGETALL",
                got: "odd-length array",
            });
        }

        let mut pairs = Vec::with_capacity(flat.len() / 2);
        let mut items = flat.into_iter();
        while let (Some(field), Some(value)) = (items.next(), items.next()) {
            pairs.push((field, value));
        }
        Ok(pairs)
    }

    async fn keys(&self) -> StoreResult<Vec<Bytes>> {
        self.call_bulk_array("KEYS", RespValue::command(["KEYS", "*"]))
            .await
    }

    async fn key_type(&self, key: &str) -> StoreResult<Bytes> {
        let reply = self.call(RespValue::command(["TYPE", key])).await?;
        let kind = reply.kind();
        reply.into_bytes().ok_or(StoreError::UnexpectedResponse {
            command: "TYPE",
            got: kind,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::parse_message;
    use tokio::net::TcpListener;
    use tokio::sync::mpsc;

    /// Starts a server that answers each incoming command with the next
    /// canned reply and reports the commands it saw.
    async fn scripted_server(
        replies: Vec<&'static [u8]>,
    ) -> (ConnectionConfig, mpsc::UnboundedReceiver<Vec<String>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut buffer = BytesMut::new();
            for reply in replies {
                let command = loop {
                    if let Some((value, used)) = parse_message(&buffer).unwrap() {
                        let _ = buffer.split_to(used);
                        break value;
                    }
                    if stream.read_buf(&mut buffer).await.unwrap() == 0 {
                        return;
                    }
                };
                let args = command
                    .into_array()
                    .unwrap()
                    .into_iter()
                    .map(|arg| String::from_utf8(arg.into_bytes().unwrap().to_vec()).unwrap())
                    .collect();
                let _ = tx.send(args);
                stream.write_all(reply).await.unwrap();
            }
        });

        let mut config = ConnectionConfig::new("127.0.0.1");
        config.port = Some(addr.port());
        (config, rx)
    }

    #[tokio::test]
    async fn test_get_and_missing() {
        let (config, mut seen) = scripted_server(vec![b"$5\r\nhello\r\n", b"$-1\r\n"]).await;
        let client = connect(&config).await.unwrap();

        assert_eq!(client.get("mykey").await.unwrap(), Some(Bytes::from("hello")));
        assert_eq!(client.get("missing").await.unwrap(), None);
        assert_eq!(seen.recv().await.unwrap(), vec!["GET", "mykey"]);
        assert_eq!(seen.recv().await.unwrap(), vec!["GET", "missing"]);
    }

    #[tokio::test]
    async fn test_zrangebyscore_sends_infinite_bounds() {
        let (config, mut seen) =
            scripted_server(vec![b"*2\r\n$1\r\na\r\n$1\r\nb\r\n"]).await;
        let client = connect(&config).await.unwrap();

        let members = client
            .zrangebyscore("board", ScoreBound::NegInf, ScoreBound::PosInf)
            .await
            .unwrap();
        assert_eq!(members, vec!["a", "b"]);
        assert_eq!(
            seen.recv().await.unwrap(),
            vec!["ZRANGEBYSCORE", "board", "-inf", "+inf"]
        );
    }

    #[tokio::test]
    async fn test_hgetall_pairs() {
        let (config, _seen) = scripted_server(vec![
            b"*4\r\n$4\r\nname\r\n$3\r\nbob\r\n$3\r\nage\r\n$2\r\n30\r\n",
            b"*3\r\n$1\r\na\r\n$1\r\nb\r\n$1\r\nc\r\n",
        ])
        .await;
        let client = connect(&config).await.unwrap();

        let pairs = client.hgetall("user:1").await.unwrap();
        assert_eq!(
            pairs,
            vec![
                (Bytes::from("name"), Bytes::from("bob")),
                (Bytes::from("age"), Bytes::from("30")),
            ]
        );
        assert!(matches!(
            client.hgetall("broken").await,
            Err(StoreError::UnexpectedResponse { command: "HGETALL", .. })
        ));
    }

    #[tokio::test]
    async fn test_auth_and_select_handshake() {
        let (mut config, mut seen) =
            scripted_server(vec![b"+OK\r\n", b"+OK\r\n", b"+hash\r\n"]).await;
        config.username = Some("app".to_string());
        config.password = Some("secret".to_string());
        config.db = Some(2);

        let client = connect(&config).await.unwrap();
        assert_eq!(client.key_type("user:1").await.unwrap(), "hash");

        assert_eq!(seen.recv().await.unwrap(), vec!["AUTH", "app", "secret"]);
        assert_eq!(seen.recv().await.unwrap(), vec!["SELECT", "2"]);
        assert_eq!(seen.recv().await.unwrap(), vec!["TYPE", "user:1"]);
    }

    #[tokio::test]
    async fn test_server_error_passes_through() {
        let (mut config, _seen) =
            scripted_server(vec![b"-WRONGPASS invalid username-password pair\r\n"]).await;
        config.password = Some("nope".to_string());

        let err = connect(&config).await.unwrap_err();
        assert_eq!(err.to_string(), "WRONGPASS invalid username-password pair");
    }

    #[tokio::test]
    async fn test_keys_scan() {
        let (config, _seen) = scripted_server(vec![b"*1\r\n$6\r\nuser:1\r\n"]).await;
        let client = connect(&config).await.unwrap();
        assert_eq!(client.keys().await.unwrap(), vec!["user:1"]);
    }

    #[tokio::test]
    async fn test_closed_connection() {
        let (config, _seen) = scripted_server(vec![]).await;
        let client = connect(&config).await.unwrap();
        assert!(matches!(
            client.get("k").await,
            Err(StoreError::ConnectionClosed) | Err(StoreError::Io(_))
        ));
    }

    #[tokio::test]
    async fn test_tls_is_rejected() {
        let mut config = ConnectionConfig::new("127.0.0.1");
        config.port = Some(1);
        config.use_tls = true;
        assert!(matches!(
            connect(&config).await,
            Err(StoreError::TlsUnsupported)
        ));
    }
}
