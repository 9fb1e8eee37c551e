//! Query Execution and Result Shaping
//!
//! Each selector maps to one store call and one shaping rule:
//!
//! | Selector  | Store call                    | Result                         |
//! |-----------|-------------------------------|--------------------------------|
//! | `key`     | GET key                       | table `value`                  |
//! | `zset`    | ZRANGEBYSCORE key -inf +inf   | table `member`, one row each   |
//! | `hashkey` | HGET key field                | the bare field value           |
//! | `hash`    | HGETALL key                   | table `key`, `value`, per field|
//!
//! The shaping functions are pure so they can be exercised without a store.

use crate::query::command::{Command, CommandParseError, Selector};
use crate::query::decode::decode;
use crate::query::table::{ColumnDescriptor, ResultTable, Value};
use crate::query::{QueryError, QueryOutput};
use crate::store::{ScoreBound, StoreClient};
use bytes::Bytes;
use tracing::{debug, info};

/// Parses `line` and runs it against `client`.
///
/// # Example
///
/// ```
/// use flashquery::query::{run, QueryOutput, Value};
/// use flashquery::store::MemoryStore;
///
/// # tokio_test::block_on(async {
/// let store = MemoryStore::new();
/// store.set("mykey", "hello");
///
/// let QueryOutput::Table(table) = run(&store, "key mykey").await.unwrap() else {
///     panic!("expected a table");
/// };
/// assert_eq!(table.rows[0]["value"], Value::from("hello"));
/// # });
/// ```
pub async fn run(client: &dyn StoreClient, line: &str) -> Result<QueryOutput, QueryError> {
    let command = Command::parse(line)?;
    execute(client, &command).await
}

/// Runs an already parsed command.
pub async fn execute(
    client: &dyn StoreClient,
    command: &Command,
) -> Result<QueryOutput, QueryError> {
    debug!(command = %command, "Executing query");

    let table = match (command.selector, command.field.as_deref()) {
        (Selector::Key, _) => {
            let value = client
                .get(&command.key)
                .await?
                .ok_or_else(|| QueryError::NotFound {
                    key: command.key.clone(),
                })?;
            shape_key(value)
        }
        (Selector::ZSet, _) => {
            let members = client
                .zrangebyscore(&command.key, ScoreBound::NegInf, ScoreBound::PosInf)
                .await?;
            shape_zset(members)
        }
        (Selector::HashKey, Some(field)) => {
            let value = client.hget(&command.key, field).await?;
            return Ok(QueryOutput::Value(value.map(decode)));
        }
        (Selector::HashKey, None) => {
            return Err(CommandParseError::MissingField.into());
        }
        (Selector::Hash, _) => shape_hash(client.hgetall(&command.key).await?),
    };

    info!(command = %command, rows = table.len(), result = ?table, "Query result");
    Ok(QueryOutput::Table(table))
}

/// One `value` row holding the string stored under a key.
pub fn shape_key(value: Bytes) -> ResultTable {
    let mut table = ResultTable::new(vec![ColumnDescriptor::string("value")]);
    table.push_row([Value::from(decode(value))]);
    table
}

/// One `member` row per sorted set member, in the order given.
pub fn shape_zset(members: Vec<Bytes>) -> ResultTable {
    let mut table = ResultTable::new(vec![ColumnDescriptor::string("member")]);
    for member in members {
        table.push_row([Value::from(decode(member))]);
    }
    table
}

/// One `key`/`value` row per hash field, in the order given.
pub fn shape_hash(fields: Vec<(Bytes, Bytes)>) -> ResultTable {
    let mut table = ResultTable::new(vec![
        ColumnDescriptor::string("key"),
        ColumnDescriptor::string("value"),
    ]);
    for (field, value) in fields {
        table.push_row([Value::from(decode(field)), Value::from(decode(value))]);
    }
    table
}
