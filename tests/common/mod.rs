#![allow(dead_code)]

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use region_rankings::config::{OrchestratorSettings, ScheduleConfig};
use region_rankings::generator::ContentGenerator;
use region_rankings::store::SqliteRankingStore;
use region_rankings::validator::{has_http_scheme, ReachabilityProbe};
use region_rankings::{Orchestrator, RankingError, Scheduler};
use serde_json::json;

/// Scripted generator: pops one reply per call, falling back to `default_reply`.
#[derive(Default)]
pub struct FakeGenerator {
    replies: Mutex<VecDeque<Result<String, String>>>,
    default_reply: Mutex<Option<String>>,
    /// Prompts containing any of these substrings fail.
    fail_when_contains: Mutex<Vec<String>>,
    pub delay: Option<Duration>,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl FakeGenerator {
    pub fn replying(reply: impl Into<String>) -> Self {
        let g = Self::default();
        *g.default_reply.lock().unwrap() = Some(reply.into());
        g
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn push_reply(&self, reply: impl Into<String>) {
        self.replies.lock().unwrap().push_back(Ok(reply.into()));
    }

    pub fn push_failure(&self, message: impl Into<String>) {
        self.replies.lock().unwrap().push_back(Err(message.into()));
    }

    pub fn fail_when_prompt_contains(&self, needle: impl Into<String>) {
        self.fail_when_contains.lock().unwrap().push(needle.into());
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl ContentGenerator for FakeGenerator {
    async fn complete(&self, prompt: &str) -> Result<String, RankingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let poisoned = self
            .fail_when_contains
            .lock()
            .unwrap()
            .iter()
            .any(|needle| prompt.contains(needle.as_str()));
        if poisoned {
            return Err(RankingError::generation("upstream unavailable"));
        }
        let next = self.replies.lock().unwrap().pop_front();
        match next {
            Some(Ok(reply)) => Ok(reply),
            Some(Err(message)) => Err(RankingError::generation(message)),
            None => self
                .default_reply
                .lock()
                .unwrap()
                .clone()
                .ok_or_else(|| RankingError::generation("no scripted reply")),
        }
    }
}

/// Reachability oracle with a fixed answer per URL. Unknown http(s) URLs are
/// reachable unless listed as down.
#[derive(Default)]
pub struct StaticProbe {
    down: HashSet<String>,
    checked: Mutex<HashMap<String, usize>>,
}

impl StaticProbe {
    pub fn all_up() -> Self {
        Self::default()
    }

    pub fn with_down(urls: &[&str]) -> Self {
        Self {
            down: urls.iter().map(|u| u.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn times_checked(&self, url: &str) -> usize {
        self.checked.lock().unwrap().get(url).copied().unwrap_or(0)
    }
}

#[async_trait]
impl ReachabilityProbe for StaticProbe {
    async fn is_reachable(&self, url: &str) -> bool {
        *self.checked.lock().unwrap().entry(url.to_string()).or_default() += 1;
        has_http_scheme(url) && !self.down.contains(url)
    }
}

/// JSON array reply in the legacy company schema.
pub fn company_reply(names: &[&str]) -> String {
    let items: Vec<_> = names
        .iter()
        .map(|name| {
            json!({
                "company_name": name,
                "description": format!("{name} provides services."),
                "strengths": [format!("{name} strength A"), format!("{name} strength B")],
                "website": format!("https://{}.example", name.to_lowercase()),
            })
        })
        .collect();
    format!(
        "Here is the ranking you asked for:\n{}\nLet me know if you need more.",
        serde_json::to_string_pretty(&items).unwrap()
    )
}

pub async fn memory_store() -> Arc<SqliteRankingStore> {
    Arc::new(SqliteRankingStore::in_memory().await.unwrap())
}

pub fn orchestrator(
    store: Arc<SqliteRankingStore>,
    generator: Option<Arc<FakeGenerator>>,
    probe: Arc<StaticProbe>,
    settings: OrchestratorSettings,
) -> Arc<Orchestrator> {
    let generator = generator.map(|g| g as Arc<dyn ContentGenerator>);
    Arc::new(Orchestrator::new(store, generator, probe, settings))
}

pub fn scheduler(orchestrator: Arc<Orchestrator>, regions: &[&str]) -> Arc<Scheduler> {
    let config = ScheduleConfig {
        regions: regions.iter().map(|r| r.to_string()).collect(),
        enabled: false,
        ..ScheduleConfig::default()
    };
    Arc::new(Scheduler::new(orchestrator, config))
}
