//! Region/service-type rankings of business-service providers.
//!
//! A ranking snapshot is served from the `tool_rankings` table when present.
//! Otherwise it is generated on demand: a prompt goes to a text-generation
//! API, the returned JSON array is parsed, each candidate's website is probed,
//! and the survivors are stored atomically before being read back and
//! returned in both the legacy company schema and the current tool schema.

pub mod api;
pub mod config;
pub mod error;
pub mod generator;
pub mod inflight;
pub mod logging;
pub mod model;
pub mod orchestrator;
pub mod parser;
pub mod prompt;
pub mod scheduler;
pub mod store;
pub mod validator;

pub mod util {
    pub mod env;
}

pub use config::RankingConfig;
pub use error::RankingError;
pub use model::{RankingEntry, RankingKey, RankingRecord, ServiceType};
pub use orchestrator::Orchestrator;
pub use scheduler::{BatchReport, Scheduler};
pub use store::{connect_store, RankingStore};

use std::sync::Arc;

use generator::{ContentGenerator, OpenAiGenerator};
use validator::HttpProbe;

/// Wire the production orchestrator and scheduler from configuration.
///
/// A missing generator credential is logged, not fatal: cached snapshots are
/// still served and generation attempts fail with a configuration error.
pub fn build_pipeline(
    cfg: &RankingConfig,
    store: Arc<dyn RankingStore>,
) -> anyhow::Result<(Arc<Orchestrator>, Arc<Scheduler>)> {
    let generator: Option<Arc<dyn ContentGenerator>> = match cfg.generator.api_key {
        Some(_) => Some(Arc::new(OpenAiGenerator::from_config(&cfg.generator)?)),
        None => {
            tracing::warn!("OPENAI_API_KEY not set; only cached rankings can be served");
            None
        }
    };
    let probe = Arc::new(HttpProbe::new(&cfg.probe)?);

    let orchestrator = Arc::new(
        Orchestrator::new(store, generator, probe, cfg.orchestrator.clone())
            .with_probe_concurrency(cfg.probe.concurrency),
    );
    let scheduler = Arc::new(Scheduler::new(orchestrator.clone(), cfg.schedule.clone()));
    Ok((orchestrator, scheduler))
}
