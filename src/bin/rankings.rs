use anyhow::{Context, Result};
use chrono::{Datelike, Utc};
use clap::{Parser, Subcommand};
use region_rankings::config::RankingConfig;
use region_rankings::logging::{init_tracing, DEFAULT_FILTER};
use region_rankings::util::env;
use region_rankings::{build_pipeline, connect_store, RankingKey, RankingStore, ServiceType};
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "rankings", version, about = "Region rankings admin CLI")]
struct Cli {
    /// Optional override for the database URL
    #[arg(long, global = true)]
    db_url: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
#[command(rename_all = "kebab-case")]
enum Commands {
    /// Print the snapshot for one key, generating it if absent
    Resolve {
        #[arg(long)]
        region: String,
        /// eor, payroll, devTools or productivityApps
        #[arg(long)]
        service_type: ServiceType,
        /// Defaults to the current year
        #[arg(long)]
        year: Option<i32>,
        /// Defaults to the current month
        #[arg(long)]
        month: Option<u32>,
        /// Generate even when a snapshot exists and replace it
        #[arg(long, default_value_t = false)]
        force: bool,
    },
    /// Run the batch for the configured regions and service types (current period)
    Update,
    /// Create the tool_rankings table and indexes if missing
    Migrate,
}

async fn open_store(db_url: Option<String>) -> Result<Arc<dyn RankingStore>> {
    let url = match db_url {
        Some(url) => url,
        None => env::db_url()?,
    };
    let max_connections: u32 = env::env_parse("DB_MAX_CONNS", 5u32);
    connect_store(&url, max_connections).await
}

#[tokio::main]
async fn main() -> Result<()> {
    env::init_env();
    init_tracing(DEFAULT_FILTER)?;
    let cli = Cli::parse();

    let store = open_store(cli.db_url).await.context("connecting to ranking store")?;
    store.ensure_schema().await?;

    match cli.command {
        Commands::Migrate => {
            println!("tool_rankings schema is up to date");
        }
        Commands::Resolve {
            region,
            service_type,
            year,
            month,
            force,
        } => {
            let now = Utc::now();
            let key = RankingKey::new(
                region,
                service_type,
                year.unwrap_or(now.year()),
                month.unwrap_or(now.month()),
            )?;
            let cfg = RankingConfig::from_env()?;
            let (orchestrator, _) = build_pipeline(&cfg, store)?;
            let records = if force {
                orchestrator.regenerate(&key).await?
            } else {
                orchestrator.resolve(&key).await?
            };
            println!("{}", serde_json::to_string_pretty(&records)?);
        }
        Commands::Update => {
            let cfg = RankingConfig::from_env()?;
            let (_, scheduler) = build_pipeline(&cfg, store)?;
            let report = scheduler.run_current_period().await;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }
    Ok(())
}
