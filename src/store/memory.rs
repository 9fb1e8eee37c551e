//! In-Process Store
//!
//! A small store holding the three value kinds the query language reads:
//! strings, sorted sets and hashes. It answers the [`StoreClient`] calls the
//! same way a Redis server would, including `WRONGTYPE` errors, which makes
//! it a stand-in for a live server in tests, benches and offline runs.
//!
//! ## Ordering
//!
//! - `keys()` returns keys in byte order.
//! - Sorted set members are kept ordered by `(score, member)`, the order
//!   ZRANGEBYSCORE returns them in.
//! - Hash fields keep insertion order; overwriting a field keeps its slot.

use crate::store::{ScoreBound, StoreClient, StoreError, StoreResult};
use async_trait::async_trait;
use bytes::Bytes;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock};

const WRONGTYPE: &str = "WRONGTYPE Operation against a key holding the wrong kind of value";

/// A value held under one key.
#[derive(Debug, Clone, PartialEq)]
pub enum StoredValue {
    String(Bytes),
    /// Sorted by `(score, member)`
    ZSet(Vec<(f64, Bytes)>),
    /// Insertion ordered
    Hash(Vec<(Bytes, Bytes)>),
}

impl StoredValue {
    /// The tag TYPE reports for this value.
    pub fn type_name(&self) -> &'static str {
        match self {
            StoredValue::String(_) => "string",
            StoredValue::ZSet(_) => "zset",
            StoredValue::Hash(_) => "hash",
        }
    }
}

/// Thread-safe in-memory store.
///
/// # Example
///
/// ```
/// use flashquery::store::MemoryStore;
///
/// let store = MemoryStore::new();
/// store.set("greeting", "hello");
/// store.zadd("board", 2.0, "b");
/// store.zadd("board", 1.0, "a");
/// store.hset("user:1", "name", "bob");
/// assert_eq!(store.len(), 3);
/// ```
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: RwLock<BTreeMap<Bytes, StoredValue>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a string value, replacing whatever the key held.
    pub fn set(&self, key: impl Into<Bytes>, value: impl Into<Bytes>) {
        let mut data = self.data.write().unwrap_or_else(PoisonError::into_inner);
        data.insert(key.into(), StoredValue::String(value.into()));
    }

    /// Adds or re-scores a sorted set member.
    ///
    /// Returns false if the key holds a different kind of value.
    pub fn zadd(&self, key: impl Into<Bytes>, score: f64, member: impl Into<Bytes>) -> bool {
        let member = member.into();
        let mut data = self.data.write().unwrap_or_else(PoisonError::into_inner);
        let entry = data
            .entry(key.into())
            .or_insert_with(|| StoredValue::ZSet(Vec::new()));

        let StoredValue::ZSet(members) = entry else {
            return false;
        };

        members.retain(|(_, m)| *m != member);
        let pos = members
            .binary_search_by(|(s, m)| compare_member(*s, m, score, &member))
            .unwrap_or_else(|pos| pos);
        members.insert(pos, (score, member));
        true
    }

    /// Sets a hash field.
    ///
    /// Returns false if the key holds a different kind of value.
    pub fn hset(
        &self,
        key: impl Into<Bytes>,
        field: impl Into<Bytes>,
        value: impl Into<Bytes>,
    ) -> bool {
        let (field, value) = (field.into(), value.into());
        let mut data = self.data.write().unwrap_or_else(PoisonError::into_inner);
        let entry = data
            .entry(key.into())
            .or_insert_with(|| StoredValue::Hash(Vec::new()));

        let StoredValue::Hash(fields) = entry else {
            return false;
        };

        match fields.iter_mut().find(|(f, _)| *f == field) {
            Some(slot) => slot.1 = value,
            None => fields.push((field, value)),
        }
        true
    }

    /// Removes a key. Returns true if it existed.
    pub fn delete(&self, key: &[u8]) -> bool {
        let mut data = self.data.write().unwrap_or_else(PoisonError::into_inner);
        data.remove(key).is_some()
    }

    /// Number of keys held.
    pub fn len(&self) -> usize {
        self.data.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Returns true if the store holds no keys.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Runs `f` on the value stored under `key`, if any.
    fn with_value<T>(&self, key: &str, f: impl FnOnce(Option<&StoredValue>) -> T) -> T {
        let data = self.data.read().unwrap_or_else(PoisonError::into_inner);
        f(data.get(key.as_bytes()))
    }
}

fn compare_member(a_score: f64, a_member: &Bytes, b_score: f64, b_member: &Bytes) -> Ordering {
    a_score
        .total_cmp(&b_score)
        .then_with(|| a_member.cmp(b_member))
}

fn wrong_type() -> StoreError {
    StoreError::Server(WRONGTYPE.to_string())
}

#[async_trait]
impl StoreClient for MemoryStore {
    async fn get(&self, key: &str) -> StoreResult<Option<Bytes>> {
        self.with_value(key, |value| match value {
            None => Ok(None),
            Some(StoredValue::String(v)) => Ok(Some(v.clone())),
            Some(_) => Err(wrong_type()),
        })
    }

    async fn zrangebyscore(
        &self,
        key: &str,
        min: ScoreBound,
        max: ScoreBound,
    ) -> StoreResult<Vec<Bytes>> {
        self.with_value(key, |value| match value {
            None => Ok(Vec::new()),
            Some(StoredValue::ZSet(members)) => Ok(members
                .iter()
                .filter(|(score, _)| min.admits_above(*score) && max.admits_below(*score))
                .map(|(_, member)| member.clone())
                .collect()),
            Some(_) => Err(wrong_type()),
        })
    }

    async fn hget(&self, key: &str, field: &str) -> StoreResult<Option<Bytes>> {
        self.with_value(key, |value| match value {
            None => Ok(None),
            Some(StoredValue::Hash(fields)) => Ok(fields
                .iter()
                .find(|(f, _)| f.as_ref() == field.as_bytes())
                .map(|(_, v)| v.clone())),
            Some(_) => Err(wrong_type()),
        })
    }

    async fn hgetall(&self, key: &str) -> StoreResult<Vec<(Bytes, Bytes)>> {
        self.with_value(key, |value| match value {
            None => Ok(Vec::new()),
            Some(StoredValue::Hash(fields)) => Ok(fields.clone()),
            Some(_) => Err(wrong_type()),
        })
    }

    async fn keys(&self) -> StoreResult<Vec<Bytes>> {
        let data = self.data.read().unwrap_or_else(PoisonError::into_inner);
        Ok(data.keys().cloned().collect())
    }

    async fn key_type(&self, key: &str) -> StoreResult<Bytes> {
        self.with_value(key, |value| {
            Ok(Bytes::from_static(
                value.map_or("none", StoredValue::type_name).as_bytes(),
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_and_get() {
        let store = MemoryStore::new();
        store.set("key", "value");
        assert_eq!(store.get("key").await.unwrap(), Some(Bytes::from("value")));
        assert_eq!(store.get("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_zset_orders_by_score_then_member() {
        let store = MemoryStore::new();
        store.zadd("z", 2.0, "c");
        store.zadd("z", 1.0, "b");
        store.zadd("z", 1.0, "a");
        store.zadd("z", -5.0, "neg");

        let members = store
            .zrangebyscore("z", ScoreBound::NegInf, ScoreBound::PosInf)
            .await
            .unwrap();
        assert_eq!(members, vec!["neg", "a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_zadd_rescores_member() {
        let store = MemoryStore::new();
        store.zadd("z", 1.0, "a");
        store.zadd("z", 2.0, "b");
        store.zadd("z", 3.0, "a");

        let members = store
            .zrangebyscore("z", ScoreBound::NegInf, ScoreBound::PosInf)
            .await
            .unwrap();
        assert_eq!(members, vec!["b", "a"]);
    }

    #[tokio::test]
    async fn test_zrangebyscore_bounds() {
        let store = MemoryStore::new();
        for (score, member) in [(1.0, "a"), (2.0, "b"), (3.0, "c")] {
            store.zadd("z", score, member);
        }

        let members = store
            .zrangebyscore("z", ScoreBound::Exclusive(1.0), ScoreBound::Inclusive(3.0))
            .await
            .unwrap();
        assert_eq!(members, vec!["b", "c"]);
    }

    #[tokio::test]
    async fn test_hash_keeps_insertion_order() {
        let store = MemoryStore::new();
        store.hset("h", "name", "bob");
        store.hset("h", "age", "30");
        store.hset("h", "name", "alice");

        let fields = store.hgetall("h").await.unwrap();
        assert_eq!(
            fields,
            vec![
                (Bytes::from("name"), Bytes::from("alice")),
                (Bytes::from("age"), Bytes::from("30")),
            ]
        );
        assert_eq!(store.hget("h", "age").await.unwrap(), Some(Bytes::from("30")));
        assert_eq!(store.hget("h", "nope").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_wrong_type_errors() {
        let store = MemoryStore::new();
        store.set("s", "v");
        assert!(!store.hset("s", "f", "v"));
        assert!(!store.zadd("s", 1.0, "m"));

        let err = store.hgetall("s").await.unwrap_err();
        assert!(err.to_string().starts_with("WRONGTYPE"));
        assert!(store.get("s").await.is_ok());
    }

    #[tokio::test]
    async fn test_missing_collections_are_empty() {
        let store = MemoryStore::new();
        assert!(store
            .zrangebyscore("nope", ScoreBound::NegInf, ScoreBound::PosInf)
            .await
            .unwrap()
            .is_empty());
        assert!(store.hgetall("nope").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_keys_and_types() {
        let store = MemoryStore::new();
        store.set("b", "1");
        store.zadd("a", 1.0, "m");
        store.hset("c", "f", "v");

        assert_eq!(store.keys().await.unwrap(), vec!["a", "b", "c"]);
        assert_eq!(store.key_type("a").await.unwrap(), "zset");
        assert_eq!(store.key_type("b").await.unwrap(), "string");
        assert_eq!(store.key_type("c").await.unwrap(), "hash");
        assert_eq!(store.key_type("d").await.unwrap(), "none");
    }

    #[test]
    fn test_delete_and_len() {
        let store = MemoryStore::new();
        assert!(store.is_empty());
        store.set("k", "v");
        assert_eq!(store.len(), 1);
        assert!(store.delete(b"k"));
        assert!(!store.delete(b"k"));
        assert!(store.is_empty());
    }
}
