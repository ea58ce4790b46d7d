//! Best-effort website reachability probe.

use async_trait::async_trait;
use reqwest::redirect::Policy;
use tracing::{debug, warn};

use crate::config::ProbeConfig;
use crate::error::RankingError;

const PROBE_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
(KHTML, like Gecko) Chrome/124.0 Safari/537.36";

/// Boolean oracle: is `url` reachable right now? Never fails.
#[async_trait]
pub trait ReachabilityProbe: Send + Sync {
    async fn is_reachable(&self, url: &str) -> bool;
}

/// True when `url` carries an explicit http(s) scheme and parses as a URL.
pub fn has_http_scheme(url: &str) -> bool {
    let url = url.trim();
    (url.starts_with("http://") || url.starts_with("https://"))
        && url::Url::parse(url).map(|u| u.host_str().is_some()).unwrap_or(false)
}

/// GETs the URL; 2xx and 3xx count as reachable.
#[derive(Debug, Clone)]
pub struct HttpProbe {
    client: reqwest::Client,
}

impl HttpProbe {
    pub fn new(cfg: &ProbeConfig) -> Result<Self, RankingError> {
        let client = reqwest::Client::builder()
            .timeout(cfg.timeout)
            .redirect(Policy::limited(cfg.max_redirects))
            .user_agent(PROBE_USER_AGENT)
            .build()
            .map_err(|e| RankingError::config(format!("failed to create probe client: {e}")))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ReachabilityProbe for HttpProbe {
    async fn is_reachable(&self, url: &str) -> bool {
        if !has_http_scheme(url) {
            debug!(url, "rejecting url without http(s) scheme");
            return false;
        }
        match self.client.get(url.trim()).send().await {
            Ok(resp) => {
                let status = resp.status();
                let ok = status.is_success() || status.is_redirection();
                if !ok {
                    warn!(url, status = status.as_u16(), "website probe returned error status");
                }
                ok
            }
            Err(e) => {
                warn!(url, error = %e, "website probe failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scheme_gate() {
        assert!(has_http_scheme("https://good.example"));
        assert!(has_http_scheme("http://good.example/path?q=1"));
        assert!(!has_http_scheme("ftp://x"));
        assert!(!has_http_scheme("good.example"));
        assert!(!has_http_scheme("https://"));
        assert!(!has_http_scheme(""));
    }

    #[tokio::test]
    async fn rejects_non_http_without_network() {
        let probe = HttpProbe::new(&ProbeConfig::default()).unwrap();
        assert!(!probe.is_reachable("ftp://x").await);
        assert!(!probe.is_reachable("mailto:someone@example.com").await);
    }
}
