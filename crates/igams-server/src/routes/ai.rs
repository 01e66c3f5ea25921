use axum::extract::{Path, Query, State};
use axum::Json;

use super::{join_error, parse_date, require_actor, ActorParams};
use crate::error::AppError;
use crate::state::AppState;

/// GET /api/ai/analyze/:date — structured analysis plus advisory text.
///
/// A degraded bridge still yields 200; the `advisory` field reports
/// `unavailable` with a reason. Only log-store failures become errors.
pub async fn analyze(
    State(app): State<AppState>,
    Path(date): Path<String>,
    Query(params): Query<ActorParams>,
) -> Result<Json<serde_json::Value>, AppError> {
    let actor = require_actor(params.actor)?;
    let date = parse_date(&date)?;
    let result = tokio::task::spawn_blocking(move || {
        let analysis =
            igams_core::analysis::analyze_day(app.store.as_ref(), &app.config, &actor, date)?;
        let advised = igams_core::analysis::advise(analysis, app.bridge.as_ref());
        Ok::<_, igams_core::ControlError>(serde_json::to_value(advised)?)
    })
    .await
    .map_err(join_error)??;

    Ok(Json(result))
}

/// GET /api/ai/health
pub async fn health(State(app): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!(app.bridge.describe()))
}
