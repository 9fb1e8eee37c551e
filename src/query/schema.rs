//! Key Discovery
//!
//! Lists every key in the store with its type tag so a query editor can
//! offer them for browsing and autocomplete. Discovery is best effort: a
//! key whose name or type cannot be read is logged and left out, and never
//! fails the scan as a whole.

use crate::store::{StoreClient, StoreResult};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{info, warn};

/// One discovered key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaEntry {
    pub name: String,
    /// A single `"<type> <name>"` entry
    pub columns: Vec<String>,
}

/// Discovered keys by name.
pub type Schema = BTreeMap<String, SchemaEntry>;

/// A key left out of the schema, and why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedKey {
    /// The key name, lossily decoded for display
    pub key: String,
    pub reason: String,
}

/// The outcome of a discovery scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Discovery {
    pub schema: Schema,
    pub skipped: Vec<SkippedKey>,
}

/// Lists keys and their types.
///
/// Only a failure of the key scan itself is returned as an error.
pub async fn inspect(client: &dyn StoreClient) -> StoreResult<Schema> {
    Ok(discover(client).await?.schema)
}

/// Like [`inspect`], also reporting the keys that were skipped.
pub async fn discover(client: &dyn StoreClient) -> StoreResult<Discovery> {
    let keys = client.keys().await?;
    let mut discovery = Discovery::default();

    for raw in keys {
        match describe_key(client, &raw, &discovery.schema).await {
            Ok(Some(entry)) => {
                discovery.schema.insert(entry.name.clone(), entry);
            }
            Ok(None) => {}
            Err(reason) => {
                let key = String::from_utf8_lossy(&raw).into_owned();
                warn!(key = %key, reason = %reason, "Problem getting type for key, skipping");
                discovery.skipped.push(SkippedKey { key, reason });
            }
        }
    }

    info!(
        keys = discovery.schema.len(),
        skipped = discovery.skipped.len(),
        "Schema discovered"
    );
    Ok(discovery)
}

/// Builds the entry for one key. `Ok(None)` when the key is already known.
async fn describe_key(
    client: &dyn StoreClient,
    raw: &Bytes,
    known: &Schema,
) -> Result<Option<SchemaEntry>, String> {
    let name = std::str::from_utf8(raw)
        .map_err(|e| format!("key is not valid UTF-8: {}", e))?
        .to_string();

    if known.contains_key(&name) {
        return Ok(None);
    }

    let tag = client.key_type(&name).await.map_err(|e| e.to_string())?;
    let tag = std::str::from_utf8(&tag)
        .map_err(|e| format!("type tag is not valid UTF-8: {}", e))?;

    Ok(Some(SchemaEntry {
        columns: vec![format!("{} {}", tag, name)],
        name,
    }))
}
