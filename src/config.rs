//! Pipeline configuration, sourced from the environment once at startup and
//! passed explicitly into the components that need it.

use std::time::Duration;

use crate::model::ServiceType;
use crate::util::env::{env_flag, env_list, env_opt, env_parse};

pub const DEFAULT_CANDIDATE_COUNT: usize = 15;
pub const DEFAULT_REGIONS: &str = "usa,china,hong-kong,singapore";
pub const DEFAULT_SERVICE_TYPES: &str = "eor,payroll";
/// 02:00 UTC on the 1st of every month (sec min hour day-of-month month day-of-week).
pub const DEFAULT_CRON: &str = "0 0 2 1 * *";

/// What to do when every candidate was dropped by the probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptySnapshotPolicy {
    /// Run the replace with zero rows and return an empty list.
    Persist,
    /// Fail the resolve call without writing.
    Reject,
}

#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// `None` means generation is unavailable; cached snapshots are still served.
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout: Duration,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.openai.com/v1".into(),
            model: "gpt-4-turbo-preview".into(),
            temperature: 0.7,
            max_tokens: 4000,
            timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProbeConfig {
    pub timeout: Duration,
    pub max_redirects: usize,
    /// Candidates probed at once; output order is unaffected.
    pub concurrency: usize,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            max_redirects: 5,
            concurrency: 4,
        }
    }
}

#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
    pub candidate_count: usize,
    pub empty_snapshot: EmptySnapshotPolicy,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            candidate_count: DEFAULT_CANDIDATE_COUNT,
            empty_snapshot: EmptySnapshotPolicy::Persist,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScheduleConfig {
    pub regions: Vec<String>,
    pub service_types: Vec<ServiceType>,
    pub cron: String,
    pub enabled: bool,
    /// Upper bound for one key inside a batch.
    pub key_timeout: Duration,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            regions: crate::util::env::split_list(DEFAULT_REGIONS),
            service_types: vec![ServiceType::Eor, ServiceType::Payroll],
            cron: DEFAULT_CRON.into(),
            enabled: true,
            key_timeout: Duration::from_secs(600),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RankingConfig {
    pub generator: GeneratorConfig,
    pub probe: ProbeConfig,
    pub orchestrator: OrchestratorSettings,
    pub schedule: ScheduleConfig,
}

impl RankingConfig {
    /// Read every pipeline setting from the environment.
    pub fn from_env() -> anyhow::Result<Self> {
        let gen_defaults = GeneratorConfig::default();
        let generator = GeneratorConfig {
            api_key: env_opt("OPENAI_API_KEY"),
            base_url: env_opt("OPENAI_BASE_URL")
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or(gen_defaults.base_url),
            model: env_opt("OPENAI_MODEL").unwrap_or(gen_defaults.model),
            temperature: env_parse("OPENAI_TEMPERATURE", gen_defaults.temperature),
            max_tokens: env_parse("OPENAI_MAX_TOKENS", gen_defaults.max_tokens),
            timeout: Duration::from_secs(env_parse("OPENAI_TIMEOUT_SECS", 30u64)),
        };

        let probe_defaults = ProbeConfig::default();
        let probe = ProbeConfig {
            timeout: Duration::from_secs(env_parse("PROBE_TIMEOUT_SECS", 10u64)),
            max_redirects: env_parse("PROBE_MAX_REDIRECTS", probe_defaults.max_redirects),
            concurrency: env_parse("PROBE_CONCURRENCY", probe_defaults.concurrency).max(1),
        };

        let orchestrator = OrchestratorSettings {
            candidate_count: env_parse("RANKING_CANDIDATE_COUNT", DEFAULT_CANDIDATE_COUNT).max(1),
            empty_snapshot: if env_flag("PERSIST_EMPTY_SNAPSHOTS", true) {
                EmptySnapshotPolicy::Persist
            } else {
                EmptySnapshotPolicy::Reject
            },
        };

        let service_types = env_list("RANKING_SERVICE_TYPES", DEFAULT_SERVICE_TYPES)
            .iter()
            .map(|raw| raw.parse::<ServiceType>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| anyhow::anyhow!("RANKING_SERVICE_TYPES: {e}"))?;
        let schedule = ScheduleConfig {
            regions: env_list("RANKING_REGIONS", DEFAULT_REGIONS),
            service_types,
            cron: env_opt("RANKING_CRON").unwrap_or_else(|| DEFAULT_CRON.into()),
            enabled: env_flag("SCHEDULER_ENABLED", true),
            key_timeout: Duration::from_secs(env_parse("SCHEDULER_KEY_TIMEOUT_SECS", 600u64)),
        };

        Ok(Self {
            generator,
            probe,
            orchestrator,
            schedule,
        })
    }
}

/// Keys logged (redacted) at startup.
pub const LOGGED_ENV: &[&str] = &[
    "DATABASE_URL",
    "DB_HOST",
    "DB_USER",
    "DB_NAME",
    "OPENAI_API_KEY",
    "OPENAI_BASE_URL",
    "OPENAI_MODEL",
    "RANKING_REGIONS",
    "RANKING_SERVICE_TYPES",
    "RANKING_CRON",
    "SCHEDULER_ENABLED",
    "API_HOST",
    "API_PORT",
];
