//! Batch refresh of the configured region × service-type keys.

use std::sync::Arc;

use anyhow::Context;
use chrono::{DateTime, Utc};
use itertools::iproduct;
use serde::Serialize;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::config::ScheduleConfig;
use crate::model::RankingKey;
use crate::orchestrator::Orchestrator;

/// Outcome of one batch run.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct BatchReport {
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub failed_keys: Vec<String>,
}

pub struct Scheduler {
    orchestrator: Arc<Orchestrator>,
    config: ScheduleConfig,
}

impl Scheduler {
    pub fn new(orchestrator: Arc<Orchestrator>, config: ScheduleConfig) -> Self {
        Self {
            orchestrator,
            config,
        }
    }

    pub fn config(&self) -> &ScheduleConfig {
        &self.config
    }

    /// Cross product of configured regions and service types for `now`'s period.
    /// Regions that fail key validation are logged and skipped.
    pub fn current_period_keys(&self, now: DateTime<Utc>) -> Vec<RankingKey> {
        iproduct!(self.config.regions.iter(), self.config.service_types.iter())
            .filter_map(|(region, service_type)| {
                match RankingKey::current(region.as_str(), *service_type, now) {
                    Ok(key) => Some(key),
                    Err(e) => {
                        warn!(region = %region, error = %e, "skipping invalid scheduled key");
                        None
                    }
                }
            })
            .collect()
    }

    /// Resolve every key in order. Per-key failures and timeouts are logged
    /// and never stop the batch.
    pub async fn run_batch(&self, keys: &[RankingKey]) -> BatchReport {
        let run_id = Uuid::new_v4();
        let span = info_span!("ranking_batch", %run_id, keys = keys.len());
        async {
            let mut report = BatchReport::default();
            for key in keys {
                report.attempted += 1;
                info!(key = %key, "updating rankings");
                let outcome =
                    tokio::time::timeout(self.config.key_timeout, self.orchestrator.resolve(key)).await;
                match outcome {
                    Ok(Ok(records)) => {
                        report.succeeded += 1;
                        info!(key = %key, entries = records.len(), "rankings up to date");
                    }
                    Ok(Err(e)) => {
                        report.failed += 1;
                        report.failed_keys.push(key.to_string());
                        error!(key = %key, error = %e, "failed to update rankings");
                    }
                    Err(_) => {
                        report.failed += 1;
                        report.failed_keys.push(key.to_string());
                        error!(key = %key, timeout = ?self.config.key_timeout, "ranking update timed out");
                    }
                }
            }
            info!(
                attempted = report.attempted,
                succeeded = report.succeeded,
                failed = report.failed,
                "ranking batch finished"
            );
            report
        }
        .instrument(span)
        .await
    }

    /// Batch for the period containing the current instant.
    pub async fn run_current_period(&self) -> BatchReport {
        let keys = self.current_period_keys(Utc::now());
        self.run_batch(&keys).await
    }

    /// Register the monthly job and start the cron scheduler.
    /// Returns `None` when scheduling is disabled.
    pub async fn start(self: &Arc<Self>) -> anyhow::Result<Option<JobScheduler>> {
        if !self.config.enabled {
            info!("ranking scheduler disabled");
            return Ok(None);
        }

        let sched = JobScheduler::new().await.context("creating scheduler")?;
        let this = Arc::clone(self);
        let job = Job::new_async(self.config.cron.as_str(), move |_uuid, _l| {
            let this = Arc::clone(&this);
            Box::pin(async move {
                info!("starting monthly ranking update");
                this.run_current_period().await;
            })
        })
        .with_context(|| format!("creating scheduler job for cron {}", self.config.cron))?;
        sched.add(job).await.context("adding scheduler job")?;
        sched.start().await.context("starting scheduler")?;
        info!(cron = %self.config.cron, "ranking auto-update task started");
        Ok(Some(sched))
    }
}
