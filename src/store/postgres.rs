use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::{
    postgres::{PgConnectOptions, PgPoolOptions, PgSslMode},
    types::Json,
    PgPool, Postgres, QueryBuilder, Row,
};
use tracing::{info, instrument};

use super::{RankingStore, INSERT_PREFIX};
use crate::error::RankingError;
use crate::model::{decode_strengths, RankingEntry, RankingKey};

const SCHEMA: &str = include_str!("../../migrations/postgres/0001_tool_rankings.sql");

#[derive(Clone)]
pub struct PgRankingStore {
    pub pool: PgPool,
}

impl PgRankingStore {
    // SECURITY: never include raw DSNs in tracing spans (they may contain credentials).
    #[instrument(skip(database_url))]
    pub async fn connect(database_url: &str, max_connections: u32) -> anyhow::Result<Self> {
        let use_prepared = crate::util::env::env_flag("USE_PREPARED", false);
        let mut connect_options = PgConnectOptions::from_str(database_url)?;

        if database_url.contains("sslmode=require") {
            connect_options = connect_options.ssl_mode(PgSslMode::Require);
        }
        if !use_prepared {
            // PgBouncer txn mode safe
            connect_options = connect_options.statement_cache_capacity(0);
        }

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(600))
            .connect_with(connect_options)
            .await?;
        info!("connected to postgres");
        Ok(Self { pool })
    }
}

#[async_trait]
impl RankingStore for PgRankingStore {
    async fn exists(&self, key: &RankingKey) -> Result<bool, RankingError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM tool_rankings \
             WHERE region = $1 AND service_type = $2 AND year = $3 AND month = $4",
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
             WHERE region = $1 AND service_type = $2 AND year = $3 AND month = $4 \
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
                let features: Option<serde_json::Value> = row.try_get("features")?;
                Ok(RankingEntry {
                    position: row.try_get("ranking_position")?,
                    name: row.try_get("tool_name")?,
                    description: row.try_get("tool_description")?,
                    strengths: decode_strengths(features.unwrap_or_default()),
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
             WHERE region = $1 AND service_type = $2 AND year = $3 AND month = $4",
        )
        .bind(key.region())
        .bind(key.service_type().as_str())
        .bind(key.year())
        .bind(key.month() as i32)
        .execute(&mut *tx)
        .await?;

        if !entries.is_empty() {
            let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(INSERT_PREFIX);
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

        // Dropping `tx` on any error above rolls the delete back.
        tx.commit().await?;
        info!("snapshot replaced");
        Ok(())
    }

    async fn ensure_schema(&self) -> Result<(), RankingError> {
        sqlx::raw_sql(SCHEMA).execute(&self.pool).await?;
        info!("tool_rankings schema ensured (postgres)");
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
    use super::SCHEMA;

    #[test]
    fn generated_text_columns_are_unbounded() {
        for column in ["tool_name TEXT", "tool_description TEXT", "website_link TEXT"] {
            assert!(SCHEMA.contains(column), "{column}");
        }
        assert!(!SCHEMA.contains("VARCHAR(255)"));
        assert!(!SCHEMA.contains("VARCHAR(500)"));
    }
}
