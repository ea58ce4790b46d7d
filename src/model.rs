//! Ranking keys, entries and the dual-schema wire record.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use chrono::{DateTime, Datelike, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::RankingError;

/// First year a snapshot can exist for.
pub const MIN_YEAR: i32 = 2025;

fn region_slug() -> &'static Regex {
    static SLUG: OnceLock<Regex> = OnceLock::new();
    SLUG.get_or_init(|| Regex::new(r"^[a-z0-9]+(-[a-z0-9]+)*$").expect("static regex"))
}

/// Category of provider being ranked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ServiceType {
    #[serde(rename = "eor")]
    Eor,
    #[serde(rename = "payroll")]
    Payroll,
    #[serde(rename = "devTools")]
    DevTools,
    #[serde(rename = "productivityApps")]
    ProductivityApps,
}

impl ServiceType {
    pub const ALL: [ServiceType; 4] = [
        ServiceType::Eor,
        ServiceType::Payroll,
        ServiceType::DevTools,
        ServiceType::ProductivityApps,
    ];

    /// Value stored in `service_type` and used in URLs.
    pub fn as_str(self) -> &'static str {
        match self {
            ServiceType::Eor => "eor",
            ServiceType::Payroll => "payroll",
            ServiceType::DevTools => "devTools",
            ServiceType::ProductivityApps => "productivityApps",
        }
    }

    /// Human label rendered into the generator prompt.
    pub fn label(self) -> &'static str {
        match self {
            ServiceType::Eor => "Employer of Record (EOR)",
            ServiceType::Payroll => "Payroll",
            ServiceType::DevTools => "software development tools",
            ServiceType::ProductivityApps => "productivity apps for teams",
        }
    }

    /// Legacy types rank service companies; current types rank tools/apps.
    pub fn is_legacy(self) -> bool {
        matches!(self, ServiceType::Eor | ServiceType::Payroll)
    }
}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ServiceType {
    type Err = RankingError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        ServiceType::ALL
            .into_iter()
            .find(|t| t.as_str() == raw.trim())
            .ok_or_else(|| RankingError::invalid_key(format!("unknown service type '{raw}'")))
    }
}

/// Identifies one ranking snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RankingKey {
    region: String,
    service_type: ServiceType,
    year: i32,
    month: u32,
}

impl RankingKey {
    pub fn new(
        region: impl Into<String>,
        service_type: ServiceType,
        year: i32,
        month: u32,
    ) -> Result<Self, RankingError> {
        let region = region.into();
        if !region_slug().is_match(&region) {
            return Err(RankingError::invalid_key(format!(
                "region '{region}' must be a lowercase hyphenated slug"
            )));
        }
        if year < MIN_YEAR {
            return Err(RankingError::invalid_key(format!(
                "year {year} is before {MIN_YEAR}"
            )));
        }
        if !(1..=12).contains(&month) {
            return Err(RankingError::invalid_key(format!(
                "month {month} is outside 1-12"
            )));
        }
        Ok(Self {
            region,
            service_type,
            year,
            month,
        })
    }

    /// Parse the four raw path segments of a lookup.
    pub fn parse(region: &str, service_type: &str, year: &str, month: &str) -> Result<Self, RankingError> {
        let service_type = service_type.parse()?;
        let year = year
            .trim()
            .parse::<i32>()
            .map_err(|_| RankingError::invalid_key(format!("year '{year}' is not a number")))?;
        let month = month
            .trim()
            .parse::<u32>()
            .map_err(|_| RankingError::invalid_key(format!("month '{month}' is not a number")))?;
        Self::new(region.trim(), service_type, year, month)
    }

    /// Key for the period containing `now`.
    pub fn current(
        region: impl Into<String>,
        service_type: ServiceType,
        now: DateTime<Utc>,
    ) -> Result<Self, RankingError> {
        Self::new(region, service_type, now.year(), now.month())
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn service_type(&self) -> ServiceType {
        self.service_type
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }
}

impl fmt::Display for RankingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}-{:02}",
            self.region, self.service_type, self.year, self.month
        )
    }
}

/// One entry as emitted by the generator, before probing.
///
/// Both naming schemes are accepted on input.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CandidateEntry {
    #[serde(alias = "company_name", alias = "tool_name")]
    pub name: String,
    #[serde(default, alias = "tool_description")]
    pub description: Option<String>,
    #[serde(default, alias = "features", deserialize_with = "strengths_from_any")]
    pub strengths: Vec<String>,
    #[serde(default, alias = "website_link")]
    pub website: Option<String>,
}

/// `null`, a bare string or a mixed array all decode to a list.
fn strengths_from_any<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(decode_strengths(Value::deserialize(deserializer)?))
}

/// Canonical stored entry of a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankingEntry {
    pub position: i32,
    pub name: String,
    pub description: Option<String>,
    pub strengths: Vec<String>,
    pub website_link: Option<String>,
}

impl RankingEntry {
    /// Assigns positions 1..=N in the given order.
    pub fn from_candidates(candidates: Vec<CandidateEntry>) -> Vec<RankingEntry> {
        candidates
            .into_iter()
            .zip(1..)
            .map(|(c, position)| RankingEntry {
                position,
                name: c.name,
                description: c.description,
                strengths: c.strengths,
                website_link: c.website,
            })
            .collect()
    }
}

/// Outgoing record carrying both the legacy company fields and the current
/// tool fields with identical values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingRecord {
    pub ranking_position: i32,
    pub tool_name: String,
    pub company_name: String,
    pub tool_description: Option<String>,
    pub description: Option<String>,
    pub features: Vec<String>,
    pub strengths: Vec<String>,
    pub website_link: Option<String>,
    pub website: Option<String>,
}

impl From<&RankingEntry> for RankingRecord {
    fn from(entry: &RankingEntry) -> Self {
        Self {
            ranking_position: entry.position,
            tool_name: entry.name.clone(),
            company_name: entry.name.clone(),
            tool_description: entry.description.clone(),
            description: entry.description.clone(),
            features: entry.strengths.clone(),
            strengths: entry.strengths.clone(),
            website_link: entry.website_link.clone(),
            website: entry.website_link.clone(),
        }
    }
}

/// Decode a stored `features` value into an ordered list.
///
/// Rows may hold a JSON array, a JSON array serialized into a string, or a
/// bare string written by older tooling.
pub fn decode_strengths(value: Value) -> Vec<String> {
    match value {
        Value::Null => Vec::new(),
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s),
                Value::Null => None,
                other => Some(other.to_string()),
            })
            .collect(),
        Value::String(text) => decode_strengths_text(&text),
        other => vec![other.to_string()],
    }
}

/// Text variant of [`decode_strengths`] for drivers that return the column as a string.
pub fn decode_strengths_text(text: &str) -> Vec<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }
    match serde_json::from_str::<Value>(trimmed) {
        Ok(Value::String(inner)) => decode_strengths_text(&inner),
        Ok(parsed @ Value::Array(_)) => decode_strengths(parsed),
        _ => vec![trimmed.to_string()],
    }
}
