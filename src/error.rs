//! Error taxonomy for the ranking pipeline.

use thiserror::Error;

/// Failure of a single `resolve` call.
///
/// A candidate that fails the reachability probe is not an error; it is
/// dropped by the parser and logged at warn level.
#[derive(Debug, Error)]
pub enum RankingError {
    /// Missing or unusable configuration (e.g. no generator credential).
    #[error("configuration error: {0}")]
    Config(String),

    /// The lookup key failed validation.
    #[error("invalid ranking key: {0}")]
    InvalidKey(String),

    /// The upstream text-generation call failed or timed out.
    #[error("generation failed: {0}")]
    Generation(String),

    /// Generator output did not contain a usable JSON array.
    #[error("failed to parse ranking data: {message}")]
    Parse {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    /// Reading or replacing a snapshot failed.
    #[error("storage error: {0}")]
    Storage(#[from] sqlx::Error),
}

impl RankingError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub fn invalid_key(message: impl Into<String>) -> Self {
        Self::InvalidKey(message.into())
    }

    pub fn generation(message: impl Into<String>) -> Self {
        Self::Generation(message.into())
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
            source: None,
        }
    }

    /// True when the caller supplied a bad key rather than the pipeline failing.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidKey(_))
    }
}

impl From<reqwest::Error> for RankingError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Generation(format!("request timed out: {err}"))
        } else {
            Self::Generation(err.to_string())
        }
    }
}
