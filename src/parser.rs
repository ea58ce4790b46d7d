//! Extracts the JSON array from generator output and filters it through the
//! reachability probe.

use futures::stream::{self, StreamExt};
use serde_json::Value;
use tracing::{info, warn};

use crate::error::RankingError;
use crate::model::CandidateEntry;
use crate::validator::ReachabilityProbe;

/// Slice from the first `[` to the last `]`, inclusive.
pub fn extract_json_array(raw: &str) -> Option<&str> {
    let start = raw.find('[')?;
    let end = raw.rfind(']')?;
    (end > start).then(|| &raw[start..=end])
}

fn excerpt(raw: &str) -> String {
    raw.chars().take(2_000).collect()
}

/// Parse generator output into candidates, without probing.
///
/// Only text that is not a JSON array fails. Array elements that do not fit
/// the candidate shape are dropped one by one.
pub fn parse_candidates(raw: &str) -> Result<Vec<CandidateEntry>, RankingError> {
    let Some(json) = extract_json_array(raw) else {
        warn!(content = %excerpt(raw), "generator output has no JSON array");
        return Err(RankingError::parse("no JSON array found"));
    };
    let items = serde_json::from_str::<Vec<Value>>(json).map_err(|e| {
        warn!(error = %e, content = %excerpt(raw), "generator output is not a valid JSON array");
        RankingError::Parse {
            message: e.to_string(),
            source: Some(e),
        }
    })?;

    Ok(items
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| match serde_json::from_value::<CandidateEntry>(item) {
            Ok(candidate) => Some(candidate),
            Err(e) => {
                warn!(index, error = %e, "skipping malformed candidate");
                None
            }
        })
        .collect())
}

/// Parses generator output and keeps only candidates whose website passes the probe.
pub struct ResponseParser<'a> {
    probe: &'a dyn ReachabilityProbe,
    concurrency: usize,
}

impl<'a> ResponseParser<'a> {
    pub fn new(probe: &'a dyn ReachabilityProbe, concurrency: usize) -> Self {
        Self {
            probe,
            concurrency: concurrency.max(1),
        }
    }

    /// Surviving candidates keep the relative order the generator returned.
    pub async fn parse(&self, raw: &str) -> Result<Vec<CandidateEntry>, RankingError> {
        let candidates = parse_candidates(raw)?;
        let total = candidates.len();

        let probe = self.probe;
        let checked: Vec<(CandidateEntry, bool)> = stream::iter(candidates)
            .map(|candidate| async move {
                if candidate.name.trim().is_empty() {
                    return (candidate, false);
                }
                let ok = match candidate.website.as_deref() {
                    Some(url) => probe.is_reachable(url).await,
                    None => false,
                };
                (candidate, ok)
            })
            .buffered(self.concurrency)
            .collect()
            .await;

        let kept: Vec<CandidateEntry> = checked
            .into_iter()
            .filter_map(|(candidate, ok)| {
                if !ok {
                    warn!(
                        name = %candidate.name,
                        website = ?candidate.website,
                        "skipping candidate with unreachable or missing website"
                    );
                }
                ok.then_some(candidate)
            })
            .collect();
        info!(total, kept = kept.len(), "validated generator candidates");
        Ok(kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct SchemeOnly;

    #[async_trait]
    impl ReachabilityProbe for SchemeOnly {
        async fn is_reachable(&self, url: &str) -> bool {
            crate::validator::has_http_scheme(url)
        }
    }

    #[test]
    fn extracts_outermost_array() {
        assert_eq!(extract_json_array("x [1, [2]] y"), Some("[1, [2]]"));
        assert_eq!(extract_json_array("no array"), None);
        assert_eq!(extract_json_array("] backwards ["), None);
    }

    #[test]
    fn malformed_array_is_a_parse_error() {
        let err = parse_candidates("blah blah [not json").unwrap_err();
        assert!(matches!(err, RankingError::Parse { .. }));
        let err = parse_candidates("[not json]").unwrap_err();
        assert!(matches!(err, RankingError::Parse { source: Some(_), .. }));
    }

    #[test]
    fn odd_elements_are_dropped_individually() {
        let raw = r#"[
  {"company_name": "Good Co", "description": "d", "strengths": ["y"], "website": "https://good.example"},
  {"company_name": "Odd Co", "description": "d", "strengths": null, "website": "https://odd.example"},
  {"company_name": "Numbers Co", "strengths": ["fast", 7], "website": "https://numbers.example"},
  "just a string",
  42,
  {"description": "no name at all"},
  {"company_name": ["not", "a", "string"]}
]"#;
        let got = parse_candidates(raw).unwrap();
        let names: Vec<&str> = got.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Good Co", "Odd Co", "Numbers Co"]);
        assert!(got[1].strengths.is_empty());
        assert_eq!(got[2].strengths, vec!["fast", "7"]);
    }

    #[tokio::test]
    async fn odd_element_does_not_lose_good_ones() {
        let raw = r#"[
  {"company_name": "Good Co", "strengths": ["y"], "website": "https://good.example"},
  {"company_name": "Odd Co", "strengths": null, "website": "ftp://odd"},
  null
]"#;
        let probe = SchemeOnly;
        let kept = ResponseParser::new(&probe, 2).parse(raw).await.unwrap();
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].name, "Good Co");
    }

    #[test]
    fn tolerates_surrounding_prose() {
        let raw = r#"prefix [{"name":"A","description":"d","strengths":["x"],"website":"https://a.com"}] suffix"#;
        let got = parse_candidates(raw).unwrap();
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].name, "A");
        assert_eq!(got[0].strengths, vec!["x"]);
    }

    #[tokio::test]
    async fn drops_unreachable_and_keeps_order() {
        let raw = r#"```json
[
  {"company_name": "One", "website": "https://one.example"},
  {"company_name": "Bad", "website": "ftp://x"},
  {"company_name": "NoSite"},
  {"company_name": "  ", "website": "https://blank.example"},
  {"company_name": "Two", "website": "https://two.example"}
]
```"#;
        let probe = SchemeOnly;
        let parser = ResponseParser::new(&probe, 2);
        let names: Vec<String> = parser
            .parse(raw)
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["One", "Two"]);
    }

    #[tokio::test]
    async fn empty_array_parses_to_empty_list() {
        let probe = SchemeOnly;
        let parser = ResponseParser::new(&probe, 4);
        assert!(parser.parse("[]").await.unwrap().is_empty());
    }
}
