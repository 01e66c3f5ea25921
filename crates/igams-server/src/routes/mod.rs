pub mod ai;
pub mod control;
pub mod measurement;

use crate::error::AppError;
use chrono::NaiveDate;

/// `?actor=<id>` selector shared by every endpoint.
#[derive(serde::Deserialize)]
pub struct ActorParams {
    pub actor: Option<String>,
}

pub(crate) fn require_actor(actor: Option<String>) -> Result<String, AppError> {
    match actor {
        Some(a) if !a.trim().is_empty() => Ok(a),
        _ => Err(AppError::bad_request("missing required query parameter 'actor'")),
    }
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| AppError::bad_request(format!("invalid date '{raw}', expected YYYY-MM-DD")))
}

pub(crate) fn join_error(e: tokio::task::JoinError) -> AppError {
    AppError(anyhow::anyhow!("task join error: {e}"))
}
