// Request/response models for API endpoints

use serde::{Deserialize, Serialize};

use crate::scheduler::BatchReport;

/// Error payload returned with every non-2xx response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
            path: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }
}

/// Query-string form of a ranking lookup; every field is required
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankingQuery {
    pub region: Option<String>,
    pub service_type: Option<String>,
    pub year: Option<String>,
    pub month: Option<String>,
}

/// Response of the manual update trigger
#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateResponse {
    pub message: String,
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
}

impl From<BatchReport> for UpdateResponse {
    fn from(report: BatchReport) -> Self {
        Self {
            message: "Ranking update triggered".to_string(),
            attempted: report.attempted,
            succeeded: report.succeeded,
            failed: report.failed,
        }
    }
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub database: String,
}
