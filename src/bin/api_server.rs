// HTTP API server binary for region rankings
// Serves ranking snapshots and runs the monthly refresh job

use anyhow::{Context, Result};
use region_rankings::api::{ApiServer, AppState};
use region_rankings::config::{RankingConfig, LOGGED_ENV};
use region_rankings::logging::{init_tracing, DEFAULT_FILTER};
use region_rankings::util::env as env_util;
use region_rankings::{build_pipeline, connect_store};

#[actix_web::main]
async fn main() -> Result<()> {
    env_util::init_env();
    init_tracing(DEFAULT_FILTER)?;

    tracing::info!("Initializing rankings API server");
    env_util::preflight_check("api_server", &[], LOGGED_ENV)?;

    let server = ApiServer::from_env()?;
    let cfg = RankingConfig::from_env()?;

    let database_url = env_util::db_url()?;
    let max_connections: u32 = env_util::env_parse("DB_MAX_CONNS", 10u32);
    let store = connect_store(&database_url, max_connections)
        .await
        .context("connecting to ranking store")?;
    if env_util::env_flag("AUTO_MIGRATE", true) {
        store.ensure_schema().await.context("ensuring tool_rankings schema")?;
    } else {
        tracing::info!("AUTO_MIGRATE disabled; skipping schema setup");
    }
    tracing::info!("Database connected successfully");

    let (orchestrator, scheduler) = build_pipeline(&cfg, store)?;
    // Keep the handle alive for the lifetime of the server.
    let _cron = scheduler.start().await?;

    server
        .run(AppState {
            orchestrator,
            scheduler,
        })
        .await
}
