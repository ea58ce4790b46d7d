//! Snapshot storage keyed by (region, service_type, year, month).

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::RankingError;
use crate::model::{RankingEntry, RankingKey};

pub mod postgres;
pub mod sqlite;

pub use postgres::PgRankingStore;
pub use sqlite::SqliteRankingStore;

pub(crate) const INSERT_PREFIX: &str = "INSERT INTO tool_rankings \
    (region, service_type, year, month, ranking_position, tool_name, tool_description, features, website_link) ";

#[async_trait]
pub trait RankingStore: Send + Sync {
    /// True when at least one row exists for `key`.
    async fn exists(&self, key: &RankingKey) -> Result<bool, RankingError>;

    /// All rows for `key`, ordered by position ascending.
    async fn read_all(&self, key: &RankingKey) -> Result<Vec<RankingEntry>, RankingError>;

    /// Delete every row for `key` and insert `entries` in one transaction.
    /// Positions are written as index + 1 in slice order.
    async fn replace_all(&self, key: &RankingKey, entries: &[RankingEntry]) -> Result<(), RankingError>;

    /// Create the table and indexes if missing.
    async fn ensure_schema(&self) -> Result<(), RankingError>;

    /// Cheap round-trip used by the health endpoint.
    async fn ping(&self) -> Result<(), RankingError>;
}

/// Connect to the backend named by the URL scheme (`sqlite:` or postgres).
pub async fn connect_store(
    database_url: &str,
    max_connections: u32,
) -> anyhow::Result<Arc<dyn RankingStore>> {
    if database_url.starts_with("sqlite:") {
        let store = SqliteRankingStore::connect(database_url, max_connections).await?;
        Ok(Arc::new(store))
    } else {
        let store = PgRankingStore::connect(database_url, max_connections).await?;
        Ok(Arc::new(store))
    }
}
