//! Query Runners
//!
//! A [`QueryRunner`] is what a host holds for one configured data source.
//! The store-backed runner keeps only the configuration and opens a fresh
//! connection for every call; the connection is dropped when the call
//! returns.

use crate::connection::{connect, ConnectionConfig};
use crate::query::{self, Command, QueryError, QueryOutput, Schema};
use crate::store::StoreClient;
use async_trait::async_trait;
use tracing::{debug, info};

/// Operations a host performs against a data source.
#[async_trait]
pub trait QueryRunner: Send + Sync {
    /// Parses and runs one command line.
    async fn run_query(&self, line: &str) -> Result<QueryOutput, QueryError>;

    /// Lists the keys in the store with their types.
    async fn schema(&self) -> Result<Schema, QueryError>;

    /// Checks that the store is reachable and answers a key scan.
    async fn test_connection(&self) -> Result<(), QueryError>;
}

/// Runner for RESP key-value stores.
#[derive(Debug, Clone)]
pub struct StoreRunner {
    config: ConnectionConfig,
}

impl StoreRunner {
    pub fn new(config: ConnectionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }
}

#[async_trait]
impl QueryRunner for StoreRunner {
    async fn run_query(&self, line: &str) -> Result<QueryOutput, QueryError> {
        let command = Command::parse(line)?;
        let client = connect(&self.config).await?;
        query::execute(&client, &command).await
    }

    async fn schema(&self) -> Result<Schema, QueryError> {
        let client = connect(&self.config).await?;
        Ok(query::inspect(&client).await?)
    }

    async fn test_connection(&self) -> Result<(), QueryError> {
        let client = connect(&self.config).await?;
        let keys = client.keys().await?;
        debug!(keys = keys.len(), "Key scan succeeded");
        info!(peer = %client.peer(), "Connection test passed");
        Ok(())
    }
}
