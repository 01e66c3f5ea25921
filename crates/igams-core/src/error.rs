use chrono::NaiveDate;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ControlError {
    #[error("log store unavailable: {0}")]
    DataAccess(String),

    #[error("malformed execution record '{id}': {reason}")]
    MalformedRecord { id: String, reason: String },

    #[error("invalid date range {start}..={end}: {reason}")]
    InvalidRange {
        start: NaiveDate,
        end: NaiveDate,
        reason: String,
    },

    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl ControlError {
    pub fn malformed(id: impl Into<String>, reason: impl Into<String>) -> Self {
        ControlError::MalformedRecord {
            id: id.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ControlError>;
