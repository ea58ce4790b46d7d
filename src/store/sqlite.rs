use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    types::Json,
    QueryBuilder, Row, Sqlite, SqlitePool,
};
use tracing::{info, instrument};

use super::{RankingStore, INSERT_PREFIX};
use crate::error::RankingError;
use crate::model::{decode_strengths_text, RankingEntry, RankingKey};

const SCHEMA: &str = include_str!("../../migrations/sqlite/0001_tool_rankings.sql");

/// SQLite-backed store for local runs and tests. `features` holds JSON text.
#[derive(Clone)]
pub struct SqliteRankingStore {
    pub pool: SqlitePool,
}

impl SqliteRankingStore {
    pub async fn connect(database_url: &str, max_connections: u32) -> anyhow::Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let mut pool_options = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(10));
        // Every connection to `:memory:` is a separate database; keep exactly one alive.
        if database_url.contains(":memory:") {
            pool_options = pool_options
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None);
        }
        let pool = pool_options.connect_with(options).await?;
        info!("connected to sqlite");
        Ok(Self { pool })
    }

    /// Fresh in-memory database with the schema applied.
    pub async fn in_memory() -> anyhow::Result<Self> {
        let store = Self::connect("sqlite::memory:", 1).await?;
        store.ensure_schema().await?;
        Ok(store)
    }
}

#[async_trait]
impl RankingStore for SqliteRankingStore {
    async fn exists(&self, key: &RankingKey) -> Result<bool, RankingError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM tool_rankings \
             WHERE region = ? AND service_type = ? AND year = ? AND month = ?",
        )
        .bind(key.region())
        .bind(key.service_type().as_str())
        .bind(key.year())
        .bind(key.month() as i32)
        .fetch_one(&self.pool)
        .await?;
        Ok(count > 0)
    }

    async fn read_all(&self, key: &RankingKey) -> Result<Vec<RankingEntry>, RankingError> {
        let rows = sqlx::query(
            "SELECT ranking_position, tool_name, tool_description, features, website_link \
             FROM tool_rankings \
             WHERE region = ? AND service_type = ? AND year = ? AND month = ? \
             ORDER BY ranking_position ASC",
        )
        .bind(key.region())
        .bind(key.service_type().as_str())
        .bind(key.year())
        .bind(key.month() as i32)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| -> Result<RankingEntry, RankingError> {
                let features: Option<String> = row.try_get("features")?;
                Ok(RankingEntry {
                    position: row.try_get("ranking_position")?,
                    name: row.try_get("tool_name")?,
                    description: row.try_get("tool_description")?,
                    strengths: features.as_deref().map(decode_strengths_text).unwrap_or_default(),
                    website_link: row.try_get("website_link")?,
                })
            })
            .collect()
    }

    #[instrument(skip_all, fields(key = %key, rows = entries.len()))]
    async fn replace_all(&self, key: &RankingKey, entries: &[RankingEntry]) -> Result<(), RankingError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "DELETE FROM tool_rankings \
             WHERE region = ? AND service_type = ? AND year = ? AND month = ?",
        )
        .bind(key.region())
        .bind(key.service_type().as_str())
        .bind(key.year())
        .bind(key.month() as i32)
        .execute(&mut *tx)
        .await?;

        if !entries.is_empty() {
            let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(INSERT_PREFIX);
            qb.push_values(entries.iter().zip(1i32..), |mut b, (entry, position)| {
                b.push_bind(key.region())
                    .push_bind(key.service_type().as_str())
                    .push_bind(key.year())
                    .push_bind(key.month() as i32)
                    .push_bind(position)
                    .push_bind(&entry.name)
                    .push_bind(&entry.description)
                    .push_bind(Json(&entry.strengths))
                    .push_bind(&entry.website_link);
            });
            qb.build().execute(&mut *tx).await?;
        }

        tx.commit().await?;
        info!("snapshot replaced");
        Ok(())
    }

    async fn ensure_schema(&self) -> Result<(), RankingError> {
        sqlx::raw_sql(SCHEMA).execute(&self.pool).await?;
        info!("tool_rankings schema ensured (sqlite)");
        Ok(())
    }

    async fn ping(&self) -> Result<(), RankingError> {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ServiceType;

    fn entry(name: &str) -> RankingEntry {
        RankingEntry {
            position: 0,
            name: name.to_string(),
            description: Some(format!("{name} description")),
            strengths: vec![format!("{name} strength 1"), format!("{name} strength 2")],
            website_link: Some(format!("https://{}.example", name.to_lowercase())),
        }
    }

    fn key() -> RankingKey {
        RankingKey::new("japan", ServiceType::Eor, 2025, 3).unwrap()
    }

    #[tokio::test]
    async fn replace_assigns_dense_positions() {
        let store = SqliteRankingStore::in_memory().await.unwrap();
        assert!(!store.exists(&key()).await.unwrap());

        store
            .replace_all(&key(), &[entry("Beta"), entry("Alpha"), entry("Gamma")])
            .await
            .unwrap();

        let rows = store.read_all(&key()).await.unwrap();
        let got: Vec<(i32, &str)> = rows.iter().map(|r| (r.position, r.name.as_str())).collect();
        assert_eq!(got, vec![(1, "Beta"), (2, "Alpha"), (3, "Gamma")]);
        assert_eq!(rows[0].strengths, vec!["Beta strength 1", "Beta strength 2"]);
        assert!(store.exists(&key()).await.unwrap());
    }

    #[tokio::test]
    async fn replace_overwrites_whole_snapshot() {
        let store = SqliteRankingStore::in_memory().await.unwrap();
        store
            .replace_all(&key(), &[entry("A"), entry("B"), entry("C")])
            .await
            .unwrap();
        store.replace_all(&key(), &[entry("Z")]).await.unwrap();

        let rows = store.read_all(&key()).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!((rows[0].position, rows[0].name.as_str()), (1, "Z"));
    }

    #[tokio::test]
    async fn failed_insert_leaves_absent_key_absent() {
        let store = SqliteRankingStore::in_memory().await.unwrap();
        // The blank name violates the table's CHECK constraint on the second row.
        let err = store
            .replace_all(&key(), &[entry("Good"), entry("  ")])
            .await
            .unwrap_err();
        assert!(matches!(err, RankingError::Storage(_)));
        assert!(!store.exists(&key()).await.unwrap());
        assert!(store.read_all(&key()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn failed_insert_keeps_previous_snapshot() {
        let store = SqliteRankingStore::in_memory().await.unwrap();
        store.replace_all(&key(), &[entry("Old")]).await.unwrap();
        assert!(store
            .replace_all(&key(), &[entry("New"), entry("")])
            .await
            .is_err());

        let rows = store.read_all(&key()).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].name, "Old");
    }

    #[tokio::test]
    async fn keys_are_independent() {
        let store = SqliteRankingStore::in_memory().await.unwrap();
        let other = RankingKey::new("japan", ServiceType::Payroll, 2025, 3).unwrap();
        store.replace_all(&key(), &[entry("A")]).await.unwrap();
        assert!(!store.exists(&other).await.unwrap());
        store.replace_all(&other, &[]).await.unwrap();
        assert!(store.exists(&key()).await.unwrap());
    }

    #[tokio::test]
    async fn reads_legacy_text_features() {
        let store = SqliteRankingStore::in_memory().await.unwrap();
        sqlx::query(
            "INSERT INTO tool_rankings (region, service_type, year, month, ranking_position, tool_name, features) \
             VALUES ('japan', 'eor', 2025, 3, 1, 'Legacy Co', 'Fast onboarding')",
        )
        .execute(&store.pool)
        .await
        .unwrap();
        let rows = store.read_all(&key()).await.unwrap();
        assert_eq!(rows[0].strengths, vec!["Fast onboarding"]);
        assert_eq!(rows[0].description, None);
    }

    #[tokio::test]
    async fn stores_long_names_and_urls() {
        let store = SqliteRankingStore::in_memory().await.unwrap();
        let mut long = entry("Long");
        long.name = "N".repeat(400);
        long.website_link = Some(format!("https://long.example/{}", "p".repeat(800)));
        store.replace_all(&key(), &[long.clone()]).await.unwrap();

        let rows = store.read_all(&key()).await.unwrap();
        assert_eq!(rows[0].name, long.name);
        assert_eq!(rows[0].website_link, long.website_link);
    }
}
