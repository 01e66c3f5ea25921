use axum::extract::{Query, State};
use axum::Json;

use super::{join_error, parse_date, require_actor};
use crate::error::AppError;
use crate::state::AppState;

pub const ANALYZE_NOTE: &str =
    "Focused on reducing effort and improving method, not adding pressure";

#[derive(serde::Deserialize)]
pub struct AnalyzeParams {
    pub actor: Option<String>,
    pub date: String,
}

/// GET /api/control/analyze?date= — improvement suggestions for one day.
pub async fn analyze(
    State(app): State<AppState>,
    Query(params): Query<AnalyzeParams>,
) -> Result<Json<serde_json::Value>, AppError> {
    let actor = require_actor(params.actor)?;
    let date = parse_date(&params.date)?;
    let result = tokio::task::spawn_blocking(move || {
        let analysis =
            igams_core::analysis::analyze_day(app.store.as_ref(), &app.config, &actor, date)?;
        Ok::<_, igams_core::ControlError>(serde_json::json!({
            "date": date,
            "count": analysis.suggestions.len(),
            "suggestions": analysis.suggestions,
            "note": ANALYZE_NOTE,
        }))
    })
    .await
    .map_err(join_error)??;

    Ok(Json(result))
}
