//! Serve-or-generate pipeline for ranking snapshots.

use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::config::{EmptySnapshotPolicy, OrchestratorSettings, ProbeConfig};
use crate::error::RankingError;
use crate::generator::ContentGenerator;
use crate::inflight::KeyedLocks;
use crate::model::{RankingEntry, RankingKey, RankingRecord};
use crate::parser::ResponseParser;
use crate::prompt::build_prompt;
use crate::store::RankingStore;
use crate::validator::ReachabilityProbe;

pub struct Orchestrator {
    store: Arc<dyn RankingStore>,
    /// `None` when no generator credential is configured.
    generator: Option<Arc<dyn ContentGenerator>>,
    probe: Arc<dyn ReachabilityProbe>,
    settings: OrchestratorSettings,
    probe_concurrency: usize,
    inflight: KeyedLocks,
}

impl Orchestrator {
    pub fn new(
        store: Arc<dyn RankingStore>,
        generator: Option<Arc<dyn ContentGenerator>>,
        probe: Arc<dyn ReachabilityProbe>,
        settings: OrchestratorSettings,
    ) -> Self {
        Self {
            store,
            generator,
            probe,
            settings,
            probe_concurrency: ProbeConfig::default().concurrency,
            inflight: KeyedLocks::new(),
        }
    }

    pub fn with_probe_concurrency(mut self, concurrency: usize) -> Self {
        self.probe_concurrency = concurrency.max(1);
        self
    }

    pub fn store(&self) -> &Arc<dyn RankingStore> {
        &self.store
    }

    /// Return the stored snapshot for `key`, generating and persisting it first
    /// when none exists. An existing snapshot is never overwritten here.
    #[instrument(skip_all, fields(key = %key))]
    pub async fn resolve(&self, key: &RankingKey) -> Result<Vec<RankingRecord>, RankingError> {
        let lock_key = key.to_string();
        self.inflight
            .run(&lock_key, async {
                if self.store.exists(key).await? {
                    info!("serving cached snapshot");
                    return self.read_records(key).await;
                }
                info!("no cached snapshot; generating");
                self.generate_and_store(key).await?;
                self.read_records(key).await
            })
            .await
    }

    /// Generate a fresh snapshot and replace whatever is stored for `key`.
    /// An empty generation never replaces an existing snapshot.
    #[instrument(skip_all, fields(key = %key))]
    pub async fn regenerate(&self, key: &RankingKey) -> Result<Vec<RankingRecord>, RankingError> {
        let lock_key = key.to_string();
        self.inflight
            .run(&lock_key, async {
                self.generate_and_store(key).await?;
                self.read_records(key).await
            })
            .await
    }

    async fn read_records(&self, key: &RankingKey) -> Result<Vec<RankingRecord>, RankingError> {
        let entries = self.store.read_all(key).await?;
        Ok(entries.iter().map(RankingRecord::from).collect())
    }

    async fn generate_and_store(&self, key: &RankingKey) -> Result<(), RankingError> {
        let generator = self
            .generator
            .as_ref()
            .ok_or_else(|| RankingError::config("OPENAI_API_KEY not set, cannot generate new rankings"))?;

        let prompt = build_prompt(key.region(), key.service_type(), self.settings.candidate_count);
        let raw = generator.complete(&prompt).await?;

        let parser = ResponseParser::new(self.probe.as_ref(), self.probe_concurrency);
        let candidates = parser.parse(&raw).await?;

        if candidates.is_empty() {
            // A stored snapshot is only ever replaced by a non-empty one.
            if self.store.exists(key).await? {
                warn!("no candidates survived validation; keeping stored snapshot");
                return Err(RankingError::generation(
                    "no candidates survived website validation; stored snapshot kept",
                ));
            }
            match self.settings.empty_snapshot {
                EmptySnapshotPolicy::Persist => {
                    warn!("no candidates survived validation; writing empty snapshot");
                }
                EmptySnapshotPolicy::Reject => {
                    warn!("no candidates survived validation; leaving key untouched");
                    return Err(RankingError::generation(
                        "no candidates survived website validation",
                    ));
                }
            }
        }

        let entries = RankingEntry::from_candidates(candidates);
        self.store.replace_all(key, &entries).await?;
        info!(count = entries.len(), "snapshot generated and stored");
        Ok(())
    }
}
